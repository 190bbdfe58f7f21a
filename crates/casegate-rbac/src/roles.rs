//! Canonical role resolution.
//!
//! Identity providers hand the portal dozens of role names: legacy
//! application roles, county security groups, plain functional names. Every
//! authorization decision instead runs against exactly one
//! [`CanonicalRole`]. Each raw name is classified by the first matching entry
//! of [`CLASSIFICATION_RULES`]; the principal gets the highest-priority
//! classification across all of its names, or [`CanonicalRole::User`] when
//! nothing classifies.
//!
//! The table is ordered. The exact `PROVIDER` / `RECIPIENT` entries sit in
//! front of the staff substring markers, so a compound staff role such as
//! `PROVIDERMANAGEMENTROLE` classifies as case work and never as the
//! self-service provider role.

use casegate_claims::{ClaimsCollector, TokenClaims};
use casegate_types::{CanonicalRole, RoleSet};
use tracing::debug;

/// Administrator role names (exact match).
pub const ADMIN_ROLES: &[&str] = &[
    "ADMIN",
    "UAADMINROLE",
    "HPADMIN",
    "COUNTYSECURITYADMINROLE",
    "SYSTEMROLE",
];

/// Supervisor role names (exact match). Any name containing `SUPERVISOR` is
/// also a supervisor.
pub const SUPERVISOR_ROLES: &[&str] = &[
    "SUPERVISOR",
    "SUPERVISORROLE",
    "SUPERROLE",
    "CASEMANAGEMENTSUPERVISORROLE",
    "ELIGIBILITYSUPERVISORROLE",
    "INTAKESUPERVISORROLE",
    "HOMEMAKERSUPERVISOR",
];

/// Substrings that mark a staff function.
pub const STAFF_MARKERS: &[&str] = &[
    "CASEMANAGEMENT",
    "PAYROLL",
    "INTAKE",
    "ELIGIBILITY",
    "PROVIDERMANAGEMENT",
    "REFERRAL",
    "TIMESHEET",
    "AUDIT",
    "CDSS",
    "HELPDESK",
    "CALLCENTER",
    "INVESTIGATOR",
    "BVI",
    "COLLECTION",
    "OVERPAYMENT",
    "STATEHEARING",
    "WARRANT",
    "PAYMENTCORRECTION",
    "ICT",
    "FORMSCORR",
    "HOMEVISIT",
    "CASENOTES",
    "PERSONNOTES",
    "QUALITYASSURANCE",
    "SPECTRAN",
    "CASEAPPROVAL",
    "DPPROCESS",
    "IHSSPAYROLL",
    "CMIPSCORE",
    "NORMALLOGIN",
    "CASELOAD",
    "COUNTY",
    "PUBLICAUTHORITY",
    "PABENEFITS",
    "PAPROVIDER",
    "PROGRAMMGMT",
    "CIROLE",
    "COMBINEDROLE",
    "WEBSERVICESROLE",
    "WPCSROLE",
    "TPF",
];

/// Suffixes of otherwise unrecognized staff roles and groups.
pub const STAFF_SUFFIXES: &[&str] = &["ROLE", "GROUP"];

/// Predicate over an upper-cased, trimmed role name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleMatcher {
    /// Equal to one of the names.
    OneOf(&'static [&'static str]),
    /// Contains the marker.
    Contains(&'static str),
    /// Contains any of the markers.
    ContainsAny(&'static [&'static str]),
    /// Contains `marker` and does not end with `suffix`.
    ContainsNotEndingWith {
        marker: &'static str,
        suffix: &'static str,
    },
    /// Contains `marker` and does not contain `other`.
    ContainsWithout {
        marker: &'static str,
        other: &'static str,
    },
    /// Ends with any of the suffixes.
    EndsWithAny(&'static [&'static str]),
}

impl RoleMatcher {
    /// Evaluates against an already normalized (trimmed, upper-cased) name.
    pub fn matches(&self, role: &str) -> bool {
        match *self {
            RoleMatcher::OneOf(names) => names.contains(&role),
            RoleMatcher::Contains(marker) => role.contains(marker),
            RoleMatcher::ContainsAny(markers) => markers.iter().any(|m| role.contains(m)),
            RoleMatcher::ContainsNotEndingWith { marker, suffix } => {
                role.contains(marker) && !role.ends_with(suffix)
            }
            RoleMatcher::ContainsWithout { marker, other } => {
                role.contains(marker) && !role.contains(other)
            }
            RoleMatcher::EndsWithAny(suffixes) => suffixes.iter().any(|s| role.ends_with(s)),
        }
    }
}

/// One row of the classification table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassificationRule {
    /// Stable name, used in logs and tests.
    pub name: &'static str,
    pub matcher: RoleMatcher,
    pub role: CanonicalRole,
}

impl ClassificationRule {
    const fn new(name: &'static str, matcher: RoleMatcher, role: CanonicalRole) -> Self {
        Self {
            name,
            matcher,
            role,
        }
    }
}

/// Classification table, evaluated top-down; the first match wins for a
/// given role name.
pub const CLASSIFICATION_RULES: &[ClassificationRule] = &[
    ClassificationRule::new(
        "admin-names",
        RoleMatcher::OneOf(ADMIN_ROLES),
        CanonicalRole::Admin,
    ),
    ClassificationRule::new(
        "supervisor-names",
        RoleMatcher::OneOf(SUPERVISOR_ROLES),
        CanonicalRole::Supervisor,
    ),
    ClassificationRule::new(
        "supervisor-marker",
        RoleMatcher::Contains("SUPERVISOR"),
        CanonicalRole::Supervisor,
    ),
    ClassificationRule::new(
        "provider-exact",
        RoleMatcher::OneOf(&["PROVIDER"]),
        CanonicalRole::Provider,
    ),
    ClassificationRule::new(
        "recipient-exact",
        RoleMatcher::OneOf(&["RECIPIENT"]),
        CanonicalRole::Recipient,
    ),
    ClassificationRule::new(
        "staff-markers",
        RoleMatcher::ContainsAny(STAFF_MARKERS),
        CanonicalRole::CaseWorker,
    ),
    ClassificationRule::new(
        "homemaker-marker",
        RoleMatcher::ContainsNotEndingWith {
            marker: "HOMEMAKER",
            suffix: "PROVIDER",
        },
        CanonicalRole::CaseWorker,
    ),
    ClassificationRule::new(
        "hp-marker",
        RoleMatcher::ContainsWithout {
            marker: "HP",
            other: "PROVIDER",
        },
        CanonicalRole::CaseWorker,
    ),
    ClassificationRule::new(
        "case-worker-name",
        RoleMatcher::OneOf(&["CASE_WORKER"]),
        CanonicalRole::CaseWorker,
    ),
    ClassificationRule::new(
        "staff-suffix",
        RoleMatcher::EndsWithAny(STAFF_SUFFIXES),
        CanonicalRole::CaseWorker,
    ),
];

/// Maps raw role names to a [`CanonicalRole`].
#[derive(Debug, Clone)]
pub struct RoleResolver {
    rules: &'static [ClassificationRule],
    collector: ClaimsCollector,
}

impl RoleResolver {
    /// Creates a resolver over [`CLASSIFICATION_RULES`] with the default
    /// ignore list.
    pub fn new() -> Self {
        Self {
            rules: CLASSIFICATION_RULES,
            collector: ClaimsCollector::new(),
        }
    }

    /// Uses `collector` for ignore-list checks and claim collection.
    pub fn with_collector(mut self, collector: ClaimsCollector) -> Self {
        self.collector = collector;
        self
    }

    pub fn collector(&self) -> &ClaimsCollector {
        &self.collector
    }

    /// Returns the first rule matching `role`, if any.
    ///
    /// Ignored roles never match.
    pub fn classify(&self, role: &str) -> Option<&'static ClassificationRule> {
        if self.collector.is_ignored(role) {
            return None;
        }
        let normalized = role.trim().to_ascii_uppercase();
        self.rules.iter().find(|rule| rule.matcher.matches(&normalized))
    }

    /// Resolves any collection of raw names. Total: the empty input is
    /// [`CanonicalRole::User`].
    pub fn resolve<'a>(&self, roles: impl IntoIterator<Item = &'a str>) -> CanonicalRole {
        let mut best = CanonicalRole::User;
        for role in roles {
            let Some(rule) = self.classify(role) else {
                continue;
            };
            if rule.role > best {
                debug!(role = %role, rule = rule.name, canonical = %rule.role, "Role classified");
                best = rule.role;
            }
            if best == CanonicalRole::Admin {
                break;
            }
        }
        best
    }

    pub fn resolve_set(&self, roles: &RoleSet) -> CanonicalRole {
        self.resolve(roles.iter())
    }

    /// Collects and resolves in one step.
    pub fn resolve_claims(&self, claims: &TokenClaims) -> CanonicalRole {
        self.resolve_set(&self.collector.collect(claims))
    }
}

impl Default for RoleResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Classifies a single role name with the default table.
pub fn classify_role(role: &str) -> Option<CanonicalRole> {
    RoleResolver::new().classify(role).map(|rule| rule.role)
}

/// Resolves a role set with the default table and ignore list.
pub fn resolve_role(roles: &RoleSet) -> CanonicalRole {
    RoleResolver::new().resolve_set(roles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;
    use test_case::test_case;

    #[test_case("ADMIN", CanonicalRole::Admin; "admin")]
    #[test_case("uaadminrole", CanonicalRole::Admin; "admin lower case")]
    #[test_case("CountySecurityAdminRole", CanonicalRole::Admin; "county security admin")]
    #[test_case("SUPERROLE", CanonicalRole::Supervisor; "super role")]
    #[test_case("HOMEMAKERSUPERVISOR", CanonicalRole::Supervisor; "homemaker supervisor")]
    #[test_case("PAYROLLSUPERVISORROLE", CanonicalRole::Supervisor; "supervisor substring")]
    #[test_case("PROVIDER", CanonicalRole::Provider; "provider exact")]
    #[test_case(" provider ", CanonicalRole::Provider; "provider trimmed")]
    #[test_case("RECIPIENT", CanonicalRole::Recipient; "recipient exact")]
    #[test_case("PROVIDERMANAGEMENTROLE", CanonicalRole::CaseWorker; "provider management")]
    #[test_case("CASEMANAGEMENTROLE", CanonicalRole::CaseWorker; "case management")]
    #[test_case("IHSSPAYROLL", CanonicalRole::CaseWorker; "payroll marker")]
    #[test_case("TPFUSER", CanonicalRole::CaseWorker; "tpf marker")]
    #[test_case("HOMEMAKERSTAFF", CanonicalRole::CaseWorker; "homemaker staff")]
    #[test_case("HPSTAFF", CanonicalRole::CaseWorker; "hp staff")]
    #[test_case("case_worker", CanonicalRole::CaseWorker; "case worker literal")]
    #[test_case("UNKNOWNNEWROLE", CanonicalRole::CaseWorker; "role suffix catch all")]
    #[test_case("LEGACYGROUP", CanonicalRole::CaseWorker; "group suffix catch all")]
    fn test_classify(role: &str, expected: CanonicalRole) {
        assert_eq!(classify_role(role), Some(expected));
    }

    #[test_case("HOMEMAKERPROVIDER"; "homemaker provider")]
    #[test_case("HPPROVIDER"; "hp provider")]
    #[test_case("PROVIDERS"; "provider plural")]
    #[test_case("RECIPIENTS"; "recipient plural")]
    #[test_case("guest"; "unclassified")]
    #[test_case("offline_access"; "ignored system role")]
    #[test_case("default-roles-cmips"; "ignored default role")]
    #[test_case(""; "blank")]
    fn test_unclassified(role: &str) {
        assert_eq!(classify_role(role), None);
    }

    #[test]
    fn test_rule_names_are_unique() {
        let mut names: Vec<&str> = CLASSIFICATION_RULES.iter().map(|r| r.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), CLASSIFICATION_RULES.len());
    }

    #[test]
    fn test_exact_provider_runs_before_staff_markers() {
        let provider = CLASSIFICATION_RULES
            .iter()
            .position(|r| r.name == "provider-exact")
            .unwrap();
        let markers = CLASSIFICATION_RULES
            .iter()
            .position(|r| r.name == "staff-markers")
            .unwrap();
        assert!(provider < markers);
    }

    #[test]
    fn test_classify_reports_rule() {
        let rule = RoleResolver::new().classify("PAPROVIDER").unwrap();
        assert_eq!(rule.name, "staff-markers");
        assert_eq!(rule.role, CanonicalRole::CaseWorker);
    }

    #[test]
    fn test_empty_set_is_user() {
        assert_eq!(resolve_role(&RoleSet::new()), CanonicalRole::User);
    }

    #[test]
    fn test_highest_priority_wins() {
        let roles: RoleSet = ["RECIPIENT", "PAYROLLROLE", "PROVIDER"].into_iter().collect();
        assert_eq!(resolve_role(&roles), CanonicalRole::CaseWorker);
    }

    #[test]
    fn test_supervisor_over_default_role() {
        let roles: RoleSet = ["default-roles-cmips", "SUPERVISORROLE"].into_iter().collect();
        assert_eq!(resolve_role(&roles), CanonicalRole::Supervisor);
    }

    #[test]
    fn test_staff_roles_resolve_to_case_worker() {
        let roles: RoleSet = ["CASEMANAGEMENTROLE", "PAYROLLROLE"].into_iter().collect();
        assert_eq!(resolve_role(&roles), CanonicalRole::CaseWorker);
    }

    #[test]
    fn test_compound_provider_role_alone() {
        let roles: RoleSet = ["PROVIDERMANAGEMENTROLE"].into_iter().collect();
        assert_eq!(resolve_role(&roles), CanonicalRole::CaseWorker);
    }

    #[test]
    fn test_only_ignored_roles_is_user() {
        let resolver = RoleResolver::new();
        assert_eq!(
            resolver.resolve(["offline_access", "uma_authorization", "BASESECURITYGROUP"]),
            CanonicalRole::User
        );
    }

    #[test]
    fn test_configured_ignore_list_applies() {
        let resolver = RoleResolver::new()
            .with_collector(ClaimsCollector::new().with_ignored_role("LEGACYLOGINROLE"));
        assert_eq!(resolver.resolve(["LEGACYLOGINROLE"]), CanonicalRole::User);
        assert_eq!(resolver.resolve(["OTHERROLE"]), CanonicalRole::CaseWorker);
    }

    #[test]
    fn test_resolve_claims() {
        let claims = TokenClaims::from_value(json!({
            "realm_access": { "roles": ["RECIPIENT"] },
            "resource_access": { "portal": { "roles": ["HPADMIN"] } }
        }))
        .unwrap();

        assert_eq!(RoleResolver::new().resolve_claims(&claims), CanonicalRole::Admin);
    }

    fn any_role_name() -> impl Strategy<Value = String> {
        prop_oneof![
            "[A-Za-z_]{0,16}",
            prop::sample::select(STAFF_MARKERS.to_vec()).prop_map(str::to_string),
            prop::sample::select(SUPERVISOR_ROLES.to_vec()).prop_map(str::to_string),
            Just("PROVIDER".to_string()),
            Just("RECIPIENT".to_string()),
        ]
    }

    proptest! {
        #[test]
        fn prop_admin_always_wins(
            mut roles in prop::collection::vec(any_role_name(), 0..8),
            at in any::<prop::sample::Index>(),
        ) {
            let position = at.index(roles.len() + 1);
            roles.insert(position, "ADMIN".to_string());
            let set: RoleSet = roles.into_iter().collect();

            prop_assert_eq!(resolve_role(&set), CanonicalRole::Admin);
        }

        #[test]
        fn prop_resolution_is_order_independent(
            roles in prop::collection::vec(any_role_name(), 0..8),
        ) {
            let resolver = RoleResolver::new();
            let forward = resolver.resolve(roles.iter().map(String::as_str));
            let backward = resolver.resolve(roles.iter().rev().map(String::as_str));
            prop_assert_eq!(forward, backward);
        }

        #[test]
        fn prop_result_is_max_of_classifications(
            roles in prop::collection::vec(any_role_name(), 0..8),
        ) {
            let expected = roles
                .iter()
                .filter_map(|r| classify_role(r))
                .max()
                .unwrap_or(CanonicalRole::User);
            let set: RoleSet = roles.iter().map(String::as_str).collect();
            prop_assert_eq!(resolve_role(&set), expected);
        }
    }
}
