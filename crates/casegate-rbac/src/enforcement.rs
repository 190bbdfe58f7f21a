//! Field masking enforcement.
//!
//! Applies one rule-set snapshot to field values at render time.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::masking::{AccessLevel, MaskingOptions, MaskingType, apply_masking, derive_access_level};
use crate::policy::{FieldCatalog, MaskingRuleSet};

/// What the rendering layer shows for a field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum DisplayValue {
    /// The raw or transformed value.
    Value(String),
    /// Withheld by policy; carries the placeholder to render.
    Redacted(String),
    /// Visible, but there is no data.
    Absent,
}

impl DisplayValue {
    /// The text to render, if any.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            DisplayValue::Value(v) | DisplayValue::Redacted(v) => Some(v),
            DisplayValue::Absent => None,
        }
    }

    pub fn is_redacted(&self) -> bool {
        matches!(self, DisplayValue::Redacted(_))
    }
}

/// The decision for one field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaskedField {
    pub access_level: AccessLevel,
    pub display_value: DisplayValue,
}

impl MaskedField {

    pub fn is_hidden(&self) -> bool {
        self.access_level == AccessLevel::HiddenAccess
    }
}

/// Field masking evaluator.
///
/// Holds a read-only snapshot of the rule set for one (role, report type)
/// and decides, per field:
/// - Visibility (the `selectedFields` gate)
/// - Access level (derived, never stored)
/// - Display value (raw, transformed, or the redacted marker)
///
/// Fields unknown to both the rule set and the catalog are hidden.
#[derive(Debug, Clone)]
pub struct FieldMaskingEvaluator {
    rule_set: Arc<MaskingRuleSet>,
    catalog: Arc<FieldCatalog>,
    options: MaskingOptions,
    /// BLAKE3 derive-key context for `ANONYMIZE`.
    key_context: String,
    audit_enabled: bool,
}

impl FieldMaskingEvaluator {
    pub fn new(
        rule_set: Arc<MaskingRuleSet>,
        catalog: Arc<FieldCatalog>,
        options: MaskingOptions,
    ) -> Self {
        let key_context =
            options.pseudonym_key_context(rule_set.role, rule_set.report_type.as_str());
        Self {
            rule_set,
            catalog,
            options,
            key_context,
            audit_enabled: true,
        }
    }

    /// Disables audit logging (for testing).
    pub fn without_audit(mut self) -> Self {
        self.audit_enabled = false;
        self
    }

    pub fn rule_set(&self) -> &MaskingRuleSet {
        &self.rule_set
    }

    /// The rule's masking type, `NONE` for a catalog field without a rule,
    /// `None` for an unknown field.
    pub fn effective_masking_type(&self, field: &str) -> Option<MaskingType> {
        match self.rule_set.rule_for(field) {
            Some(rule) => Some(rule.masking_type),
            None if self.catalog.contains(field) => Some(MaskingType::None),
            None => None,
        }
    }

    pub fn access_level(&self, field: &str) -> AccessLevel {
        self.mask_field(field, None).access_level
    }

    /// Decides how `field` is displayed.
    ///
    /// `raw` of `None` means the record has no value; a visible field then
    /// renders [`DisplayValue::Absent`], a hidden one still renders the
    /// redacted marker.
    pub fn mask_field(&self, field: &str, raw: Option<&str>) -> MaskedField {
        // Unknown fields count as unselected, so they derive as hidden.
        let effective = self.effective_masking_type(field);
        if effective.is_none() && self.audit_enabled {
            warn!(
                field = %field,
                role = %self.rule_set.role,
                report_type = %self.rule_set.report_type,
                "Unknown field hidden"
            );
        }
        let masking_type = effective.unwrap_or_default();
        let selected = effective.is_some() && self.rule_set.is_selected(field);
        let access_level = derive_access_level(selected, masking_type);

        let display_value = if access_level.is_visible() {
            raw.map_or(DisplayValue::Absent, |value| {
                DisplayValue::Value(apply_masking(
                    value,
                    masking_type,
                    &self.options,
                    &self.key_context,
                ))
            })
        } else {
            DisplayValue::Redacted(self.options.redacted_marker.clone())
        };

        if self.audit_enabled {
            debug!(
                field = %field,
                role = %self.rule_set.role,
                report_type = %self.rule_set.report_type,
                selected,
                masking_type = %masking_type,
                access_level = %access_level,
                "Field masking decision"
            );
        }

        MaskedField {
            access_level,
            display_value,
        }
    }

    /// Masks every field of a record against this snapshot.
    ///
    /// **Audit:** logs hidden fields (if any).
    pub fn mask_record(
        &self,
        record: &BTreeMap<String, Option<String>>,
    ) -> BTreeMap<String, MaskedField> {
        let masked: BTreeMap<String, MaskedField> = record
            .iter()
            .map(|(field, raw)| (field.clone(), self.mask_field(field, raw.as_deref())))
            .collect();

        if self.audit_enabled {
            let hidden: Vec<&String> = masked
                .iter()
                .filter(|(_, m)| m.is_hidden())
                .map(|(field, _)| field)
                .collect();

            if !hidden.is_empty() {
                info!(
                    role = %self.rule_set.role,
                    report_type = %self.rule_set.report_type,
                    hidden_fields = ?hidden,
                    "Fields hidden by masking policy"
                );
            }
        }

        masked
    }

    /// Selected fields that end up visible, in selection order.
    pub fn visible_fields(&self) -> Vec<&str> {
        self.rule_set
            .selected_fields
            .iter()
            .map(String::as_str)
            .filter(|field| self.access_level(field).is_visible())
            .collect()
    }
}
