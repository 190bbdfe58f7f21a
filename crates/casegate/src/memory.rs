//! In-memory rule provider.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use casegate_rbac::{
    FieldCatalog, MaskingRuleSet, ReportType, StandardCatalogs, StandardRuleSets,
};
use casegate_types::{CanonicalRole, Fid, FidSet};
use tracing::info;

use crate::error::{ProviderError, ProviderResult};
use crate::provider::{RuleProvider, RuleStore};

type RuleSetKey = (CanonicalRole, ReportType);

#[derive(Debug, Default)]
struct State {
    catalog: Arc<FieldCatalog>,
    grants: HashMap<CanonicalRole, FidSet>,
    rule_sets: HashMap<RuleSetKey, Arc<MaskingRuleSet>>,
}

/// A [`RuleStore`] held entirely in memory.
///
/// Suitable for tests, demos and deployments that load rules from a file at
/// startup.
#[derive(Debug, Default)]
pub struct InMemoryRuleProvider {
    state: RwLock<State>,
    rule_fetches: AtomicU64,
}

impl InMemoryRuleProvider {
    /// Empty catalog, no grants, no rule sets.
    pub fn new() -> Self {
        Self::default()
    }

    /// Timesheet catalog with the standard admin, supervisor and case worker
    /// rule sets for `TIMESHEET_REPORT`.
    pub fn with_timesheet_defaults() -> Self {
        let catalog = StandardCatalogs::timesheet();
        let report = ReportType::timesheet();
        let rule_sets = [
            StandardRuleSets::admin(report.clone(), &catalog),
            StandardRuleSets::supervisor(report.clone(), &catalog),
            StandardRuleSets::case_worker(report, &catalog),
        ];

        rule_sets
            .into_iter()
            .fold(Self::new().with_catalog(catalog), Self::with_rule_set)
    }

    pub fn with_catalog(self, catalog: FieldCatalog) -> Self {
        if let Ok(mut state) = self.state.write() {
            state.catalog = Arc::new(catalog);
        }
        self
    }

    pub fn with_rule_set(self, rule_set: MaskingRuleSet) -> Self {
        if let Ok(mut state) = self.state.write() {
            let key = (rule_set.role, rule_set.report_type.clone());
            state.rule_sets.insert(key, Arc::new(rule_set));
        }
        self
    }

    /// Grants FIDs to a role, in addition to any already granted.
    pub fn with_grants<F: Into<Fid>>(
        self,
        role: CanonicalRole,
        fids: impl IntoIterator<Item = F>,
    ) -> Self {
        if let Ok(mut state) = self.state.write() {
            let granted = state.grants.entry(role).or_default();
            for fid in fids {
                granted.grant(fid);
            }
        }
        self
    }

    /// Revokes one FID from a role. Returns whether it was granted.
    pub fn revoke(&self, role: CanonicalRole, fid: &str) -> ProviderResult<bool> {
        let mut state = self.write()?;
        Ok(state
            .grants
            .get_mut(&role)
            .is_some_and(|granted| granted.revoke(fid)))
    }

    /// Number of `masking_rules` calls served so far.
    pub fn rule_fetches(&self) -> u64 {
        self.rule_fetches.load(Ordering::Relaxed)
    }

    fn read(&self) -> ProviderResult<RwLockReadGuard<'_, State>> {
        self.state
            .read()
            .map_err(|_| ProviderError::Unavailable("rule store lock poisoned".to_string()))
    }

    fn write(&self) -> ProviderResult<RwLockWriteGuard<'_, State>> {
        self.state
            .write()
            .map_err(|_| ProviderError::Unavailable("rule store lock poisoned".to_string()))
    }
}

#[async_trait]
impl RuleProvider for InMemoryRuleProvider {
    async fn granted_fids(&self, role: CanonicalRole) -> ProviderResult<FidSet> {
        Ok(self.read()?.grants.get(&role).cloned().unwrap_or_default())
    }

    async fn masking_rules(
        &self,
        role: CanonicalRole,
        report_type: &ReportType,
    ) -> ProviderResult<Option<Arc<MaskingRuleSet>>> {
        self.rule_fetches.fetch_add(1, Ordering::Relaxed);
        let key = (role, report_type.clone());
        Ok(self.read()?.rule_sets.get(&key).cloned())
    }

    async fn field_catalog(&self) -> ProviderResult<Arc<FieldCatalog>> {
        Ok(Arc::clone(&self.read()?.catalog))
    }
}

#[async_trait]
impl RuleStore for InMemoryRuleProvider {
    async fn update_rules(&self, rule_set: MaskingRuleSet) -> ProviderResult<()> {
        if let Some(field) = rule_set
            .rules
            .iter()
            .map(|r| r.field_name.as_str())
            .find(|name| name.trim().is_empty())
        {
            return Err(ProviderError::InvalidRuleSet(format!(
                "blank field name {field:?}"
            )));
        }

        let key = (rule_set.role, rule_set.report_type.clone());
        info!(
            role = %key.0,
            report_type = %key.1,
            rules = rule_set.rules.len(),
            selected = rule_set.selected_fields.len(),
            "Masking rules updated"
        );
        self.write()?.rule_sets.insert(key, Arc::new(rule_set));
        Ok(())
    }
}
