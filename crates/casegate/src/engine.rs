//! The engine façade used by the rendering layer.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use casegate_claims::{ClaimsCollector, CountyExtractor, TokenClaims, jwt};
use casegate_config::{CasegateConfig, ConfigError, ConfigLoader};
use casegate_rbac::{
    FieldCatalog, FieldMaskingEvaluator, MaskedField, MaskingOptions, MaskingRuleSet,
    PermissionEvaluator, PermissionQuery, ReportType, RoleResolver,
};
use casegate_types::{CanonicalRole, FidSet, Principal, SubjectId};
use tracing::{info, warn};

use crate::cached::CachedRuleProvider;
use crate::provider::RuleProvider;

/// Authorization and field-masking engine.
///
/// Role resolution and principal construction are synchronous and pure. The
/// permission and masking operations fetch from the rule provider once per
/// call, then evaluate against that snapshot.
#[derive(Debug)]
pub struct Engine<P> {
    provider: P,
    resolver: RoleResolver,
    counties: CountyExtractor,
    options: MaskingOptions,
    permissions: PermissionEvaluator,
    audit_enabled: bool,
}

impl<P: RuleProvider> Engine<P> {
    /// Creates an engine with default settings.
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            resolver: RoleResolver::new(),
            counties: CountyExtractor::new(),
            options: MaskingOptions::default(),
            permissions: PermissionEvaluator::new(),
            audit_enabled: true,
        }
    }

    /// Creates an engine from configuration, wrapping `provider` in the
    /// configured rule-set cache.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the configuration fails validation.
    pub fn from_config(
        provider: P,
        config: &CasegateConfig,
    ) -> Result<Engine<CachedRuleProvider<P>>, ConfigError> {
        config.validate()?;

        let collector = config.claims.extra_ignored_roles.iter().fold(
            ClaimsCollector::new().with_default_roles_prefix(&config.claims.default_role_prefix),
            |collector, role| collector.with_ignored_role(role),
        );
        let counties =
            CountyExtractor::with_codes(config.claims.county_codes.iter().map(String::as_str));

        let mut permissions = PermissionEvaluator::new();
        if !config.audit.enabled {
            permissions = permissions.without_audit();
        }

        info!(
            cache_enabled = config.cache.enabled,
            cache_capacity = config.cache.capacity,
            audit_enabled = config.audit.enabled,
            keyed_hash = config.masking.hash_secret.is_some(),
            "Casegate engine configured"
        );

        Ok(Engine {
            provider: CachedRuleProvider::from_config(provider, &config.cache),
            resolver: RoleResolver::new().with_collector(collector),
            counties,
            options: config.masking.clone(),
            permissions,
            audit_enabled: config.audit.enabled,
        })
    }

    /// Loads layered configuration for `project_dir` and builds an engine.
    pub fn load(
        provider: P,
        project_dir: impl AsRef<Path>,
    ) -> anyhow::Result<Engine<CachedRuleProvider<P>>> {
        let config = ConfigLoader::new().with_project_dir(project_dir).load()?;
        Self::from_config(provider, &config).context("Failed to build engine")
    }

    /// Disables decision audit logging (for testing).
    pub fn without_audit(mut self) -> Self {
        self.audit_enabled = false;
        self.permissions = self.permissions.without_audit();
        self
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn masking_options(&self) -> &MaskingOptions {
        &self.options
    }

    // ------------------------------------------------------------------
    // Identity
    // ------------------------------------------------------------------

    pub fn resolve_role(&self, claims: &TokenClaims) -> CanonicalRole {
        self.resolver.resolve_claims(claims)
    }

    /// Resolves straight from a compact token. An undecodable token is
    /// [`CanonicalRole::User`].
    pub fn resolve_role_from_token(&self, token: &str) -> CanonicalRole {
        self.resolver
            .resolve_set(&self.resolver.collector().collect_from_token(token))
    }

    /// Builds the session principal.
    pub fn authenticate(&self, claims: &TokenClaims) -> Principal {
        let roles = self.resolver.collector().collect(claims);
        let role = self.resolver.resolve_set(&roles);
        let subject = claims
            .subject()
            .map_or_else(SubjectId::anonymous, |sub| SubjectId::new(sub));

        let principal = Principal::new(subject, roles, role);
        match self.counties.extract(claims) {
            Some(county) => principal.with_county(county),
            None => principal,
        }
    }

    /// Builds the session principal from a compact token. `None` if the
    /// token cannot be decoded, which callers treat as no session.
    pub fn authenticate_token(&self, token: &str) -> Option<Principal> {
        jwt::decode_payload(token).map(|claims| self.authenticate(&claims))
    }

    // ------------------------------------------------------------------
    // Permissions
    // ------------------------------------------------------------------

    /// FIDs granted to `role`. A provider failure grants nothing.
    pub async fn granted_fids(&self, role: CanonicalRole) -> FidSet {
        match self.provider.granted_fids(role).await {
            Ok(fids) => fids,
            Err(e) => {
                warn!(role = %role, error = %e, "FID fetch failed; granting nothing");
                FidSet::empty()
            }
        }
    }

    pub async fn check_permission(
        &self,
        principal: Option<&Principal>,
        query: &PermissionQuery,
    ) -> bool {
        let needs_fids = !matches!(query, PermissionQuery::Role(_));
        let granted = match principal {
            Some(p) if needs_fids => self.granted_fids(p.role()).await,
            _ => FidSet::empty(),
        };
        self.permissions.check(principal, &granted, query)
    }

    // ------------------------------------------------------------------
    // Field masking
    // ------------------------------------------------------------------

    /// Fetches the rule-set snapshot for (role, report type).
    ///
    /// A missing rule set, or a failed fetch, falls back to the catalog
    /// default: every known field `NONE`, nothing selected.
    pub async fn evaluator(
        &self,
        role: CanonicalRole,
        report_type: &ReportType,
    ) -> FieldMaskingEvaluator {
        let catalog = match self.provider.field_catalog().await {
            Ok(catalog) => catalog,
            Err(e) => {
                warn!(error = %e, "Field catalog fetch failed; using empty catalog");
                Arc::new(FieldCatalog::empty())
            }
        };

        let rule_set = match self.provider.masking_rules(role, report_type).await {
            Ok(Some(rule_set)) => rule_set,
            Ok(None) => {
                warn!(
                    role = %role,
                    report_type = %report_type,
                    "No masking rule set; using catalog default"
                );
                Arc::new(MaskingRuleSet::catalog_default(role, report_type.clone(), &catalog))
            }
            Err(e) => {
                warn!(
                    role = %role,
                    report_type = %report_type,
                    error = %e,
                    "Masking rule fetch failed; using catalog default"
                );
                Arc::new(MaskingRuleSet::catalog_default(role, report_type.clone(), &catalog))
            }
        };

        let evaluator = FieldMaskingEvaluator::new(rule_set, catalog, self.options.clone());
        if self.audit_enabled {
            evaluator
        } else {
            evaluator.without_audit()
        }
    }

    pub async fn mask_field(
        &self,
        role: CanonicalRole,
        report_type: &ReportType,
        field: &str,
        raw: Option<&str>,
    ) -> MaskedField {
        self.evaluator(role, report_type).await.mask_field(field, raw)
    }

    /// Masks every field of a record against one snapshot.
    pub async fn mask_record(
        &self,
        role: CanonicalRole,
        report_type: &ReportType,
        record: &BTreeMap<String, Option<String>>,
    ) -> BTreeMap<String, MaskedField> {
        self.evaluator(role, report_type).await.mask_record(record)
    }
}
