//! Rule-set cache in front of a [`RuleProvider`].

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use casegate_config::CacheConfig;
use casegate_rbac::{FieldCatalog, MaskingRuleSet, ReportType};
use casegate_types::{CanonicalRole, FidSet};
use tracing::{debug, warn};

use crate::error::ProviderResult;
use crate::provider::{RuleProvider, RuleStore};
use crate::sieve::SieveCache;

type RuleSetKey = (CanonicalRole, ReportType);

#[derive(Debug)]
struct CacheState {
    entries: SieveCache<RuleSetKey, Arc<MaskingRuleSet>>,
    /// Bumped by every invalidation. A fetch that started under an older
    /// generation is not stored.
    generation: u64,
}

/// Caches masking rule sets by (role, report type).
///
/// - Only present rule sets are cached; a missing set is fetched again.
/// - [`RuleStore::update_rules`] writes through and then drops the key.
/// - FID grants and the catalog are not cached.
#[derive(Debug)]
pub struct CachedRuleProvider<P> {
    inner: P,
    state: Mutex<CacheState>,
    enabled: bool,
}

impl<P> CachedRuleProvider<P> {
    pub fn new(inner: P, capacity: NonZeroUsize) -> Self {
        Self {
            inner,
            state: Mutex::new(CacheState {
                entries: SieveCache::new(capacity),
                generation: 0,
            }),
            enabled: true,
        }
    }

    /// Honors `[cache] enabled`; a disabled cache passes every call through.
    pub fn from_config(inner: P, config: &CacheConfig) -> Self {
        let capacity = NonZeroUsize::new(config.capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            enabled: config.enabled,
            ..Self::new(inner, capacity)
        }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Number of cached rule sets.
    pub fn len(&self) -> usize {
        self.state.lock().map_or(0, |state| state.entries.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops the cached set for one key.
    pub fn invalidate(&self, role: CanonicalRole, report_type: &ReportType) {
        if let Ok(mut state) = self.state.lock() {
            state.generation += 1;
            state.entries.remove(&(role, report_type.clone()));
        }
    }

    /// Drops every cached set.
    pub fn invalidate_all(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.generation += 1;
            state.entries.clear();
        }
    }

    /// Returns a hit and the generation observed.
    fn lookup(&self, key: &RuleSetKey) -> (Option<Arc<MaskingRuleSet>>, u64) {
        match self.state.lock() {
            Ok(mut state) => {
                let hit = state.entries.get(key).cloned();
                (hit, state.generation)
            }
            Err(_) => {
                warn!("Rule-set cache lock poisoned; bypassing cache");
                (None, u64::MAX)
            }
        }
    }

    fn store(&self, key: RuleSetKey, rule_set: Arc<MaskingRuleSet>, generation: u64) {
        if let Ok(mut state) = self.state.lock() {
            if state.generation == generation {
                state.entries.insert(key, rule_set);
            }
        }
    }
}

#[async_trait]
impl<P: RuleProvider> RuleProvider for CachedRuleProvider<P> {
    async fn granted_fids(&self, role: CanonicalRole) -> ProviderResult<FidSet> {
        self.inner.granted_fids(role).await
    }

    async fn masking_rules(
        &self,
        role: CanonicalRole,
        report_type: &ReportType,
    ) -> ProviderResult<Option<Arc<MaskingRuleSet>>> {
        if !self.enabled {
            return self.inner.masking_rules(role, report_type).await;
        }

        let key = (role, report_type.clone());
        let (hit, generation) = self.lookup(&key);
        if let Some(rule_set) = hit {
            debug!(role = %role, report_type = %report_type, "Rule-set cache hit");
            return Ok(Some(rule_set));
        }

        let fetched = self.inner.masking_rules(role, report_type).await?;
        if let Some(rule_set) = &fetched {
            self.store(key, Arc::clone(rule_set), generation);
        }
        Ok(fetched)
    }

    async fn field_catalog(&self) -> ProviderResult<Arc<FieldCatalog>> {
        self.inner.field_catalog().await
    }
}

#[async_trait]
impl<P: RuleStore> RuleStore for CachedRuleProvider<P> {
    async fn update_rules(&self, rule_set: MaskingRuleSet) -> ProviderResult<()> {
        let role = rule_set.role;
        let report_type = rule_set.report_type.clone();
        let result = self.inner.update_rules(rule_set).await;
        self.invalidate(role, &report_type);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryRuleProvider;
    use casegate_rbac::{FieldMaskingRule, MaskingType};

    fn provider() -> CachedRuleProvider<InMemoryRuleProvider> {
        CachedRuleProvider::new(
            InMemoryRuleProvider::with_timesheet_defaults(),
            NonZeroUsize::new(8).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_second_fetch_is_cached() {
        let cached = provider();
        let report = ReportType::timesheet();

        let first = cached.masking_rules(CanonicalRole::Admin, &report).await.unwrap();
        let second = cached.masking_rules(CanonicalRole::Admin, &report).await.unwrap();

        assert!(Arc::ptr_eq(&first.unwrap(), &second.unwrap()));
        assert_eq!(cached.inner().rule_fetches(), 1);
        assert_eq!(cached.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_sets_not_cached() {
        let cached = provider();
        let report = ReportType::new("PAYROLL_REPORT");

        assert!(cached.masking_rules(CanonicalRole::Admin, &report).await.unwrap().is_none());
        assert!(cached.masking_rules(CanonicalRole::Admin, &report).await.unwrap().is_none());

        assert_eq!(cached.inner().rule_fetches(), 2);
        assert!(cached.is_empty());
    }

    #[tokio::test]
    async fn test_update_invalidates() {
        let cached = provider();
        let report = ReportType::timesheet();
        cached.masking_rules(CanonicalRole::CaseWorker, &report).await.unwrap();

        let replacement = MaskingRuleSet::new(CanonicalRole::CaseWorker, report.clone())
            .with_selected_rule(FieldMaskingRule::new("status", MaskingType::None));
        cached.update_rules(replacement.clone()).await.unwrap();

        let fresh = cached
            .masking_rules(CanonicalRole::CaseWorker, &report)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(*fresh, replacement);
        assert_eq!(cached.inner().rule_fetches(), 2);
    }

    #[tokio::test]
    async fn test_invalidate_all() {
        let cached = provider();
        let report = ReportType::timesheet();
        for role in [CanonicalRole::Admin, CanonicalRole::Supervisor] {
            cached.masking_rules(role, &report).await.unwrap();
        }
        assert_eq!(cached.len(), 2);

        cached.invalidate_all();
        assert!(cached.is_empty());
    }

    #[tokio::test]
    async fn test_disabled_passes_through() {
        let cached = CachedRuleProvider::from_config(
            InMemoryRuleProvider::with_timesheet_defaults(),
            &CacheConfig {
                enabled: false,
                capacity: 0,
            },
        );
        let report = ReportType::timesheet();

        cached.masking_rules(CanonicalRole::Admin, &report).await.unwrap();
        cached.masking_rules(CanonicalRole::Admin, &report).await.unwrap();

        assert!(!cached.is_enabled());
        assert_eq!(cached.inner().rule_fetches(), 2);
        assert!(cached.is_empty());
    }

    #[test]
    fn test_stale_fetch_not_stored() {
        let cached = provider();
        let key = (CanonicalRole::Admin, ReportType::timesheet());
        let (_, generation) = cached.lookup(&key);

        cached.invalidate_all();
        cached.store(
            key,
            Arc::new(MaskingRuleSet::new(CanonicalRole::Admin, ReportType::timesheet())),
            generation,
        );

        assert!(cached.is_empty());
    }
}
