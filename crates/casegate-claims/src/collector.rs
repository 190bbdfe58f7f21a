//! Role collection from token claims.
//!
//! Realm roles are merged with the roles of *every* client in
//! `resource_access`, deduplicated by upper-cased name, and filtered:
//!
//! | Dropped                        | Example                 |
//! |--------------------------------|-------------------------|
//! | Blank entries                  | `""`, `"  "`            |
//! | Identity-provider default role | `default-roles-cmips`   |
//! | System roles                   | `offline_access`        |
//! | Configured extras              | `LEGACYLOGINROLE`       |

use casegate_types::RoleSet;
use tracing::{debug, warn};

use crate::claims::TokenClaims;
use crate::jwt;

/// Roles the identity provider attaches to every account.
pub const SYSTEM_ROLES: &[&str] = &["offline_access", "uma_authorization", "BASESECURITYGROUP"];

/// Prefix of the per-realm composite default role.
pub const DEFAULT_ROLES_PREFIX: &str = "default-roles-";

/// Normalizes raw role claims into a [`RoleSet`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimsCollector {
    /// Upper-cased names that never reach the role set.
    ignored: Vec<String>,
    /// Lower-cased default-role prefix.
    default_prefix: String,
}

impl ClaimsCollector {
    /// Creates a collector that ignores [`SYSTEM_ROLES`] and
    /// [`DEFAULT_ROLES_PREFIX`] roles.
    pub fn new() -> Self {
        Self {
            ignored: SYSTEM_ROLES.iter().map(|r| r.to_ascii_uppercase()).collect(),
            default_prefix: DEFAULT_ROLES_PREFIX.to_string(),
        }
    }

    /// Adds a role name to the ignore list.
    pub fn with_ignored_role(mut self, role: &str) -> Self {
        let role = role.trim().to_ascii_uppercase();
        if !role.is_empty() && !self.ignored.contains(&role) {
            self.ignored.push(role);
        }
        self
    }

    /// Replaces the default-role prefix.
    pub fn with_default_roles_prefix(mut self, prefix: &str) -> Self {
        self.default_prefix = prefix.trim().to_ascii_lowercase();
        self
    }

    /// Returns whether `role` must never influence authorization.
    ///
    /// Matching ignores ASCII case and surrounding whitespace.
    pub fn is_ignored(&self, role: &str) -> bool {
        let role = role.trim();
        if role.is_empty() {
            return true;
        }

        let upper = role.to_ascii_uppercase();
        if self.ignored.contains(&upper) {
            return true;
        }

        !self.default_prefix.is_empty()
            && role
                .get(..self.default_prefix.len())
                .is_some_and(|head| head.eq_ignore_ascii_case(&self.default_prefix))
    }

    /// Collects the role set from decoded claims.
    pub fn collect(&self, claims: &TokenClaims) -> RoleSet {
        let realm = claims.realm_roles();
        let clients = claims.client_role_lists();

        let mut roles = RoleSet::new();
        for role in realm.into_iter().chain(clients.into_iter().flatten()) {
            if self.is_ignored(role) {
                continue;
            }
            roles.insert(role.trim());
        }

        debug!(roles = roles.len(), "Collected identity-provider roles");
        roles
    }

    /// Collects the role set from a compact JWS token.
    ///
    /// An undecodable token yields the empty set.
    pub fn collect_from_token(&self, token: &str) -> RoleSet {
        match jwt::try_decode_payload(token) {
            Ok(claims) => self.collect(&claims),
            Err(e) => {
                warn!(error = %e, "Undecodable token claims; no roles collected");
                RoleSet::new()
            }
        }
    }
}

impl Default for ClaimsCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Collects roles with the default ignore list.
pub fn collect_roles(claims: &TokenClaims) -> RoleSet {
    ClaimsCollector::new().collect(claims)
}

/// Decodes a token and collects roles with the default ignore list.
pub fn collect_roles_from_token(token: &str) -> RoleSet {
    ClaimsCollector::new().collect_from_token(token)
}
