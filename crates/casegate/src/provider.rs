//! Rule provider seam.
//!
//! Rule catalogs are persisted elsewhere; the engine only reads them through
//! [`RuleProvider`]. Every fetch returns a snapshot that is never mutated
//! afterwards.

use std::sync::Arc;

use async_trait::async_trait;
use casegate_rbac::{FieldCatalog, MaskingRuleSet, ReportType};
use casegate_types::{CanonicalRole, FidSet};

use crate::error::ProviderResult;

/// Read side of the rule store.
#[async_trait]
pub trait RuleProvider: Send + Sync {
    /// FIDs granted to a canonical role.
    async fn granted_fids(&self, role: CanonicalRole) -> ProviderResult<FidSet>;

    /// The rule set for (role, report type), if one is configured.
    async fn masking_rules(
        &self,
        role: CanonicalRole,
        report_type: &ReportType,
    ) -> ProviderResult<Option<Arc<MaskingRuleSet>>>;

    /// Every reportable field.
    async fn field_catalog(&self) -> ProviderResult<Arc<FieldCatalog>>;
}

/// Write side of the rule store, used by the administration screens.
#[async_trait]
pub trait RuleStore: RuleProvider {
    /// Replaces the rules and selected fields for the rule set's
    /// (role, report type).
    async fn update_rules(&self, rule_set: MaskingRuleSet) -> ProviderResult<()>;
}

#[async_trait]
impl<P: RuleProvider + ?Sized> RuleProvider for Arc<P> {
    async fn granted_fids(&self, role: CanonicalRole) -> ProviderResult<FidSet> {
        (**self).granted_fids(role).await
    }

    async fn masking_rules(
        &self,
        role: CanonicalRole,
        report_type: &ReportType,
    ) -> ProviderResult<Option<Arc<MaskingRuleSet>>> {
        (**self).masking_rules(role, report_type).await
    }

    async fn field_catalog(&self) -> ProviderResult<Arc<FieldCatalog>> {
        (**self).field_catalog().await
    }
}

#[async_trait]
impl<P: RuleStore + ?Sized> RuleStore for Arc<P> {
    async fn update_rules(&self, rule_set: MaskingRuleSet) -> ProviderResult<()> {
        (**self).update_rules(rule_set).await
    }
}
