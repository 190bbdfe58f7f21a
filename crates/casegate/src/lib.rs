//! # casegate: Authorization & field-masking policy engine
//!
//! Answers three questions for a case-management portal:
//!
//! 1. **Who is this?** Identity-token claims → normalized role set → one
//!    [`CanonicalRole`].
//! 2. **May they do this?** Functional-identifier (FID) queries against the
//!    FIDs granted to that role.
//! 3. **What may they see?** Per role and report type, whether each field is
//!    visible and how its value is transformed before display.
//!
//! Rule sets, FID grants and the field catalog come from a [`RuleProvider`].
//! Each evaluation works on one fetched snapshot; a missing or unreachable
//! rule set degrades to "nothing visible", never to raw data.
//!
//! ## Quick start
//!
//! ```
//! use casegate::{Engine, InMemoryRuleProvider, PermissionQuery, ReportType, TokenClaims};
//! use casegate::{AccessLevel, CanonicalRole};
//!
//! # tokio_test();
//! # fn tokio_test() {
//! # let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
//! # rt.block_on(async {
//! let provider = InMemoryRuleProvider::with_timesheet_defaults()
//!     .with_grants(CanonicalRole::Supervisor, ["timesheet.approve"]);
//! let engine = Engine::new(provider);
//!
//! let claims = TokenClaims::from_json(r#"{
//!     "sub": "u-42",
//!     "realm_access": { "roles": ["default-roles-cmips", "SUPERVISORROLE"] }
//! }"#).unwrap();
//! let principal = engine.authenticate(&claims);
//! assert_eq!(principal.role(), CanonicalRole::Supervisor);
//!
//! let query = PermissionQuery::single("timesheet.approve");
//! assert!(engine.check_permission(Some(&principal), &query).await);
//!
//! let field = engine
//!     .mask_field(principal.role(), &ReportType::timesheet(), "employeeId", Some("E-1001"))
//!     .await;
//! assert_eq!(field.access_level, AccessLevel::MaskedAccess);
//! # });
//! # }
//! ```

mod cached;
mod engine;
mod error;
mod memory;
mod provider;
mod sieve;

pub use cached::CachedRuleProvider;
pub use engine::Engine;
pub use error::{ProviderError, ProviderResult};
pub use memory::InMemoryRuleProvider;
pub use provider::{RuleProvider, RuleStore};

pub use casegate_claims::{ClaimsCollector, CountyExtractor, TokenClaims};
pub use casegate_config::{CasegateConfig, ConfigError};
pub use casegate_rbac::{
    AccessLevel, DisplayValue, FieldCatalog, FieldDescriptor, FieldMaskingEvaluator,
    FieldMaskingRule, FieldType, MaskedField, MaskingOptions, MaskingRuleSet, MaskingType,
    PermissionQuery, ReportType, RoleResolver,
};
pub use casegate_types::{CanonicalRole, CountyCode, Fid, FidSet, Principal, RoleSet, SubjectId};

/// Resolves the canonical role of decoded claims with the default role
/// table and ignore list.
pub fn resolve_role(claims: &TokenClaims) -> CanonicalRole {
    RoleResolver::new().resolve_claims(claims)
}

/// Builds a principal from decoded claims with default settings.
pub fn principal_from_claims(claims: &TokenClaims) -> Principal {
    Engine::new(InMemoryRuleProvider::new()).authenticate(claims)
}

/// Answers a permission query against an already fetched FID set.
pub fn check_permission(
    principal: Option<&Principal>,
    granted: &FidSet,
    query: &PermissionQuery,
) -> bool {
    casegate_rbac::check_permission(principal, granted, query)
}
