//! # casegate-rbac: Role resolution, permissions and field masking
//!
//! The pure half of the `Casegate` engine:
//! - **Role resolution** (raw identity-provider roles → one [`CanonicalRole`])
//! - **FID permissions** (single / any / all / role queries)
//! - **Field masking** (visibility gate + value transforms per role and report)
//!
//! Nothing here performs I/O. Rule sets arrive as snapshots from the rule
//! provider and are never mutated during an evaluation.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │  Token claims                                 │
//! └─────────────────┬────────────────────────────┘
//!                   │  ClaimsCollector
//!                   ▼
//! ┌──────────────────────────────────────────────┐
//! │  RoleResolver (CLASSIFICATION_RULES)          │
//! └─────────────────┬────────────────────────────┘
//!                   │  CanonicalRole
//!          ┌────────┴─────────┐
//!          ▼                  ▼
//! ┌──────────────────┐ ┌──────────────────────────┐
//! │ PermissionEval.  │ │ FieldMaskingEvaluator     │
//! │ FID queries      │ │ selectedFields gate       │
//! │                  │ │ derive_access_level       │
//! │                  │ │ value transforms          │
//! └──────────────────┘ └──────────────────────────┘
//! ```
//!
//! ## Roles
//!
//! | Canonical role | Priority | Classified from                             |
//! |----------------|----------|---------------------------------------------|
//! | `ADMIN`        | 5        | fixed admin names                           |
//! | `SUPERVISOR`   | 4        | fixed supervisor names, `*SUPERVISOR*`      |
//! | `CASE_WORKER`  | 3        | staff markers, `*ROLE` / `*GROUP` catch-all |
//! | `PROVIDER`     | 2        | exactly `PROVIDER`                          |
//! | `RECIPIENT`    | 1        | exactly `RECIPIENT`                         |
//! | `USER`         | 0        | nothing classified                          |
//!
//! ## Examples
//!
//! ### Role resolution
//!
//! ```
//! use casegate_rbac::roles::resolve_role;
//! use casegate_types::{CanonicalRole, RoleSet};
//!
//! let roles: RoleSet = ["default-roles-cmips", "SUPERVISORROLE"].into_iter().collect();
//! assert_eq!(resolve_role(&roles), CanonicalRole::Supervisor);
//!
//! // A compound provider-management role is staff, not the provider role.
//! let roles: RoleSet = ["PROVIDERMANAGEMENTROLE"].into_iter().collect();
//! assert_eq!(resolve_role(&roles), CanonicalRole::CaseWorker);
//! ```
//!
//! ### Permissions
//!
//! ```
//! use casegate_rbac::permissions::{PermissionQuery, check_permission};
//! use casegate_types::{CanonicalRole, FidSet, Principal, RoleSet, SubjectId};
//!
//! let principal = Principal::new(SubjectId::new("u-1"), RoleSet::new(), CanonicalRole::CaseWorker);
//! let granted: FidSet = ["case.view"].into_iter().collect();
//!
//! assert!(check_permission(Some(&principal), &granted, &PermissionQuery::single("case.view")));
//! assert!(!check_permission(None, &granted, &PermissionQuery::single("case.view")));
//! assert!(!check_permission(Some(&principal), &granted, &PermissionQuery::all(Vec::<String>::new())));
//! ```
//!
//! ### Field masking
//!
//! ```
//! use std::sync::Arc;
//!
//! use casegate_rbac::enforcement::FieldMaskingEvaluator;
//! use casegate_rbac::masking::{AccessLevel, MaskingOptions, MaskingType};
//! use casegate_rbac::policy::{FieldCatalog, FieldMaskingRule, MaskingRuleSet, ReportType};
//! use casegate_types::CanonicalRole;
//!
//! let rules = MaskingRuleSet::new(CanonicalRole::CaseWorker, ReportType::new("CASE_REPORT"))
//!     .with_selected_rule(FieldMaskingRule::new("ssn", MaskingType::PartialMask));
//!
//! let evaluator = FieldMaskingEvaluator::new(
//!     Arc::new(rules),
//!     Arc::new(FieldCatalog::empty()),
//!     MaskingOptions::default(),
//! );
//!
//! let ssn = evaluator.mask_field("ssn", Some("123-45-6789"));
//! assert_eq!(ssn.access_level, AccessLevel::MaskedAccess);
//! assert_eq!(ssn.display_value.as_str(), Some("***6789"));
//!
//! // Anything not selected, or not known at all, is hidden.
//! assert_eq!(evaluator.access_level("dob"), AccessLevel::HiddenAccess);
//! ```

pub mod enforcement;
pub mod masking;
pub mod permissions;
pub mod policy;
pub mod roles;

pub use casegate_types::CanonicalRole;

// Re-export commonly used types
pub use enforcement::{DisplayValue, FieldMaskingEvaluator, MaskedField};
pub use masking::{AccessLevel, MaskingError, MaskingOptions, MaskingType, derive_access_level};
pub use permissions::{PermissionEvaluator, PermissionQuery, check_permission};
pub use policy::{
    FieldCatalog, FieldDescriptor, FieldMaskingRule, FieldType, MaskingRuleSet, ReportType,
    StandardCatalogs, StandardRuleSets,
};
pub use roles::{CLASSIFICATION_RULES, RoleResolver, resolve_role};
