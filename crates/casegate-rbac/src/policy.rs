//! Masking rule sets and the field catalog.
//!
//! A [`MaskingRuleSet`] is the policy for one (role, report type): a masking
//! rule per field plus the explicit list of fields the role may see at all.
//! Rule sets are immutable snapshots once fetched; edits go through the rule
//! provider and produce a new set.

use std::fmt::{self, Display};

use casegate_types::CanonicalRole;
use serde::{Deserialize, Serialize};

use crate::masking::MaskingType;

/// Report context a rule set applies to, e.g. `TIMESHEET_REPORT`.
///
/// Names are trimmed and upper-cased so that lookups are stable.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct ReportType(String);

impl ReportType {
    pub const TIMESHEET: &'static str = "TIMESHEET_REPORT";

    pub fn new(name: &str) -> Self {
        Self(name.trim().to_ascii_uppercase())
    }

    pub fn timesheet() -> Self {
        Self::new(Self::TIMESHEET)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ReportType {
    fn from(name: String) -> Self {
        Self::new(&name)
    }
}

impl From<&str> for ReportType {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<ReportType> for String {
    fn from(report: ReportType) -> Self {
        report.0
    }
}

/// Masking rule for one field.
///
/// Carries no access level; that is derived from selection and masking type
/// at evaluation time. An `accessLevel` key in incoming JSON is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldMaskingRule {
    pub field_name: String,
    #[serde(default)]
    pub masking_type: MaskingType,
    /// Free text shown to administrators.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl FieldMaskingRule {
    pub fn new(field_name: impl Into<String>, masking_type: MaskingType) -> Self {
        Self {
            field_name: field_name.into(),
            masking_type,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// The masking policy for one (role, report type).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaskingRuleSet {
    pub role: CanonicalRole,
    pub report_type: ReportType,
    #[serde(default)]
    pub rules: Vec<FieldMaskingRule>,
    /// Fields the role may see. Absent means none.
    #[serde(default)]
    pub selected_fields: Vec<String>,
}

impl MaskingRuleSet {
    /// Creates an empty rule set: no rules, nothing selected.
    pub fn new(role: CanonicalRole, report_type: ReportType) -> Self {
        Self {
            role,
            report_type,
            rules: Vec::new(),
            selected_fields: Vec::new(),
        }
    }

    /// Adds (or replaces) the rule for a field.
    pub fn with_rule(mut self, rule: FieldMaskingRule) -> Self {
        self.rules.retain(|r| r.field_name != rule.field_name);
        self.rules.push(rule);
        self
    }

    /// Makes a field visible.
    pub fn select(mut self, field: impl Into<String>) -> Self {
        let field = field.into();
        if !self.selected_fields.contains(&field) {
            self.selected_fields.push(field);
        }
        self
    }

    /// Adds a rule and selects its field.
    pub fn with_selected_rule(self, rule: FieldMaskingRule) -> Self {
        let field = rule.field_name.clone();
        self.with_rule(rule).select(field)
    }

    /// Default policy used when the provider has no rule set: every catalog
    /// field is `NONE`, and nothing is selected.
    pub fn catalog_default(
        role: CanonicalRole,
        report_type: ReportType,
        catalog: &FieldCatalog,
    ) -> Self {
        Self {
            role,
            report_type,
            rules: catalog
                .iter()
                .map(|f| FieldMaskingRule::new(f.name.clone(), MaskingType::None))
                .collect(),
            selected_fields: Vec::new(),
        }
    }

    /// Field names match exactly.
    pub fn rule_for(&self, field: &str) -> Option<&FieldMaskingRule> {
        self.rules.iter().find(|r| r.field_name == field)
    }

    pub fn is_selected(&self, field: &str) -> bool {
        self.selected_fields.iter().any(|f| f == field)
    }

    /// Parses the JSON a rule provider returns.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error for malformed input.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

/// Value type of a catalog field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Number,
    Date,
    Timestamp,
}

/// One reportable field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    pub name: String,
    pub display_name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
}

impl FieldDescriptor {
    pub fn new(name: &str, display_name: &str, field_type: FieldType) -> Self {
        Self {
            name: name.to_string(),
            display_name: display_name.to_string(),
            field_type,
        }
    }
}

/// The fields the portal knows about.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldCatalog {
    fields: Vec<FieldDescriptor>,
}

impl FieldCatalog {
    pub fn new(fields: Vec<FieldDescriptor>) -> Self {
        Self { fields }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Built-in catalogs.
pub struct StandardCatalogs;

impl StandardCatalogs {
    /// Timesheet report fields.
    pub fn timesheet() -> FieldCatalog {
        use FieldType::{Date, Number, Text, Timestamp};

        let fields = [
            ("id", "ID", Text),
            ("timesheetId", "Timesheet ID", Text),
            ("employeeId", "Employee ID", Text),
            ("providerId", "Provider ID", Text),
            ("employeeName", "Employee Name", Text),
            ("providerName", "Provider Name", Text),
            ("userId", "User ID", Text),
            ("department", "Department", Text),
            ("location", "Location", Text),
            ("serviceLocation", "Service Location", Text),
            ("providerCounty", "Provider County", Text),
            ("payPeriodStart", "Pay Period Start", Date),
            ("startDate", "Start Date", Date),
            ("payPeriodEnd", "Pay Period End", Date),
            ("endDate", "End Date", Date),
            ("regularHours", "Regular Hours", Number),
            ("overtimeHours", "Overtime Hours", Number),
            ("sickHours", "Sick Hours", Number),
            ("vacationHours", "Vacation Hours", Number),
            ("holidayHours", "Holiday Hours", Number),
            ("totalHours", "Total Hours", Number),
            ("status", "Status", Text),
            ("comments", "Comments", Text),
            ("supervisorComments", "Supervisor Comments", Text),
            ("submittedAt", "Submitted At", Timestamp),
            ("submittedBy", "Submitted By", Text),
            ("approvedAt", "Approved At", Timestamp),
            ("approvedBy", "Approved By", Text),
            ("createdAt", "Created At", Timestamp),
            ("updatedAt", "Updated At", Timestamp),
        ];

        FieldCatalog::new(
            fields
                .into_iter()
                .map(|(name, display, ty)| FieldDescriptor::new(name, display, ty))
                .collect(),
        )
    }
}

/// Built-in rule sets seeded for new deployments.
pub struct StandardRuleSets;

impl StandardRuleSets {
    /// Admin: every catalog field visible, unmasked.
    pub fn admin(report_type: ReportType, catalog: &FieldCatalog) -> MaskingRuleSet {
        Self::unmasked(CanonicalRole::Admin, report_type, catalog)
    }

    /// Supervisor: everything visible; employee identity masked.
    pub fn supervisor(report_type: ReportType, catalog: &FieldCatalog) -> MaskingRuleSet {
        Self::employee_masked(CanonicalRole::Supervisor, report_type, catalog)
    }

    /// Case worker: same masking as supervisor.
    pub fn case_worker(report_type: ReportType, catalog: &FieldCatalog) -> MaskingRuleSet {
        Self::employee_masked(CanonicalRole::CaseWorker, report_type, catalog)
    }

    fn unmasked(
        role: CanonicalRole,
        report_type: ReportType,
        catalog: &FieldCatalog,
    ) -> MaskingRuleSet {
        catalog.iter().fold(MaskingRuleSet::new(role, report_type), |set, field| {
            set.with_selected_rule(FieldMaskingRule::new(field.name.clone(), MaskingType::None))
        })
    }

    fn employee_masked(
        role: CanonicalRole,
        report_type: ReportType,
        catalog: &FieldCatalog,
    ) -> MaskingRuleSet {
        Self::unmasked(role, report_type, catalog)
            .with_rule(
                FieldMaskingRule::new("employeeId", MaskingType::HashMask)
                    .with_description("Employee identifier is hashed"),
            )
            .with_rule(
                FieldMaskingRule::new("employeeName", MaskingType::Anonymize)
                    .with_description("Employee name is pseudonymized"),
            )
    }
}
