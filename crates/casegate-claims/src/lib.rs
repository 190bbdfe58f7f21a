//! # casegate-claims: Identity-token claim normalization
//!
//! Turns the decoded payload of an identity token into the inputs the rest
//! of the engine needs:
//!
//! - [`TokenClaims`]: a narrow typed view over the raw claim object. Every
//!   "is this optional nested field present" check lives here.
//! - [`ClaimsCollector`]: merges realm and per-client role lists into a
//!   deduplicated [`RoleSet`](casegate_types::RoleSet), dropping system roles.
//! - [`jwt`]: payload decoding for compact JWS tokens.
//! - [`county`]: county attribute extraction.
//!
//! ## Failure model
//!
//! Nothing in the total API fails. A token that cannot be decoded yields an
//! empty role set, which the role resolver maps to `USER`. The `try_*`
//! functions expose the underlying [`ClaimsError`] for callers that want it.
//!
//! ```
//! use casegate_claims::{ClaimsCollector, TokenClaims};
//!
//! let claims = TokenClaims::from_json(r#"{
//!     "sub": "u-7",
//!     "realm_access": { "roles": ["default-roles-cmips", "PayrollRole"] },
//!     "resource_access": { "portal": { "roles": ["PAYROLLROLE", "INTAKEROLE"] } }
//! }"#)?;
//!
//! let roles = ClaimsCollector::new().collect(&claims);
//! assert_eq!(roles.iter().collect::<Vec<_>>(), vec!["PayrollRole", "INTAKEROLE"]);
//! # Ok::<(), casegate_claims::ClaimsError>(())
//! ```

mod claims;
mod collector;
pub mod county;
mod error;
pub mod jwt;

pub use claims::TokenClaims;
pub use collector::{
    ClaimsCollector, DEFAULT_ROLES_PREFIX, SYSTEM_ROLES, collect_roles, collect_roles_from_token,
};
pub use county::CountyExtractor;
pub use error::{ClaimsError, Result};
