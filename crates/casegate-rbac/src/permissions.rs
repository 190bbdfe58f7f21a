//! Functional-identifier (FID) permission queries.
//!
//! The rendering layer gates buttons, menu entries and workflow actions on
//! FIDs. The set of FIDs a role is granted comes from the rule provider;
//! this module only answers questions against it.

use casegate_types::{CanonicalRole, Fid, FidSet, Principal};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// A single authorization question.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum PermissionQuery {
    /// The FID is granted.
    Single(Fid),
    /// At least one FID is granted. An empty list is never satisfied.
    Any(Vec<Fid>),
    /// Every FID is granted. An empty list is never satisfied.
    All(Vec<Fid>),
    /// The principal's canonical role has this name (case-insensitive).
    ///
    /// Kept as a name so that an unrecognized role denies instead of
    /// failing.
    Role(String),
}

impl PermissionQuery {
    pub fn single(fid: impl Into<Fid>) -> Self {
        PermissionQuery::Single(fid.into())
    }

    pub fn any<F: Into<Fid>>(fids: impl IntoIterator<Item = F>) -> Self {
        PermissionQuery::Any(fids.into_iter().map(Into::into).collect())
    }

    pub fn all<F: Into<Fid>>(fids: impl IntoIterator<Item = F>) -> Self {
        PermissionQuery::All(fids.into_iter().map(Into::into).collect())
    }

    pub fn role(role: impl Into<String>) -> Self {
        PermissionQuery::Role(role.into())
    }

    /// Evaluates against a principal's granted FIDs.
    pub fn is_satisfied_by(&self, principal: &Principal, granted: &FidSet) -> bool {
        match self {
            PermissionQuery::Single(fid) => granted.contains(fid.as_str()),
            PermissionQuery::Any(fids) => fids.iter().any(|f| granted.contains(f.as_str())),
            PermissionQuery::All(fids) => {
                !fids.is_empty() && fids.iter().all(|f| granted.contains(f.as_str()))
            }
            PermissionQuery::Role(name) => {
                principal.role().as_str().eq_ignore_ascii_case(name.trim())
            }
        }
    }
}

impl From<CanonicalRole> for PermissionQuery {
    fn from(role: CanonicalRole) -> Self {
        PermissionQuery::Role(role.as_str().to_string())
    }
}

/// Answers [`PermissionQuery`]s and audits the outcome.
#[derive(Debug, Clone)]
pub struct PermissionEvaluator {
    audit_enabled: bool,
}

impl PermissionEvaluator {
    pub fn new() -> Self {
        Self {
            audit_enabled: true,
        }
    }

    /// Disables audit logging (for testing).
    pub fn without_audit(mut self) -> Self {
        self.audit_enabled = false;
        self
    }

    /// Evaluates `query` for `principal`.
    ///
    /// Without a principal (no active session) every query is denied.
    ///
    /// **Audit:** logs every decision.
    pub fn check(
        &self,
        principal: Option<&Principal>,
        granted: &FidSet,
        query: &PermissionQuery,
    ) -> bool {
        let Some(principal) = principal else {
            if self.audit_enabled {
                warn!(query = ?query, "Permission denied: no active session");
            }
            return false;
        };

        let allowed = query.is_satisfied_by(principal, granted);

        if self.audit_enabled {
            if allowed {
                info!(
                    subject = %principal.subject(),
                    role = %principal.role(),
                    query = ?query,
                    "Permission granted"
                );
            } else {
                warn!(
                    subject = %principal.subject(),
                    role = %principal.role(),
                    query = ?query,
                    "Permission denied"
                );
            }
        }

        allowed
    }
}

impl Default for PermissionEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

/// Evaluates `query` without audit logging.
pub fn check_permission(
    principal: Option<&Principal>,
    granted: &FidSet,
    query: &PermissionQuery,
) -> bool {
    PermissionEvaluator::new()
        .without_audit()
        .check(principal, granted, query)
}
