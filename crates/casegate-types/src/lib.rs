//! # casegate-types: Core types for `Casegate`
//!
//! This crate contains shared types used across the `Casegate` engine:
//! - Canonical operating roles ([`CanonicalRole`])
//! - Functional identifiers ([`Fid`], [`FidSet`])
//! - Identity attributes ([`SubjectId`], [`CountyCode`])
//! - Normalized identity-provider roles ([`RoleSet`])
//! - Authenticated principals ([`Principal`])

use std::{
    collections::BTreeSet,
    fmt::{Debug, Display},
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Errors
// ============================================================================

/// Errors raised when a caller hands the engine a value outside a closed set.
///
/// These are programmer errors, not business input: untrusted token content
/// never reaches these paths.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeError {
    #[error("unknown canonical role: {0:?}")]
    UnknownCanonicalRole(String),
}

// ============================================================================
// Canonical Role
// ============================================================================

/// The single normalized operating role every authorization decision uses.
///
/// Variants are declared in ascending priority so the derived `Ord` matches
/// resolution precedence: `User < Recipient < Provider < CaseWorker <
/// Supervisor < Admin`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CanonicalRole {
    /// Authenticated, but no role classified. The bottom of the lattice.
    #[default]
    User,
    /// IHSS recipient self-service.
    Recipient,
    /// IHSS provider self-service.
    Provider,
    /// Any county or state staff function.
    CaseWorker,
    /// Staff with approval and oversight duties.
    Supervisor,
    /// Portal and identity administration.
    Admin,
}

impl CanonicalRole {
    /// All roles, lowest priority first.
    pub const ALL: [CanonicalRole; 6] = [
        CanonicalRole::User,
        CanonicalRole::Recipient,
        CanonicalRole::Provider,
        CanonicalRole::CaseWorker,
        CanonicalRole::Supervisor,
        CanonicalRole::Admin,
    ];

    /// Resolution priority, `0` for [`CanonicalRole::User`] up to `5` for
    /// [`CanonicalRole::Admin`].
    pub fn priority(self) -> u8 {
        match self {
            CanonicalRole::User => 0,
            CanonicalRole::Recipient => 1,
            CanonicalRole::Provider => 2,
            CanonicalRole::CaseWorker => 3,
            CanonicalRole::Supervisor => 4,
            CanonicalRole::Admin => 5,
        }
    }

    /// Wire name, e.g. `"CASE_WORKER"`.
    pub fn as_str(self) -> &'static str {
        match self {
            CanonicalRole::User => "USER",
            CanonicalRole::Recipient => "RECIPIENT",
            CanonicalRole::Provider => "PROVIDER",
            CanonicalRole::CaseWorker => "CASE_WORKER",
            CanonicalRole::Supervisor => "SUPERVISOR",
            CanonicalRole::Admin => "ADMIN",
        }
    }

    /// Returns whether this role is staff (case worker or above).
    pub fn is_staff(self) -> bool {
        self >= CanonicalRole::CaseWorker
    }

    /// Returns whether a principal resolved to `self` may open the dashboard
    /// belonging to `target`.
    ///
    /// Staff roles nest (`Admin ⊇ Supervisor ⊇ CaseWorker`); the self-service
    /// dashboards only admit their own role, and `User` has no dashboard.
    ///
    /// ```
    /// use casegate_types::CanonicalRole;
    ///
    /// assert!(CanonicalRole::Admin.can_access_dashboard(CanonicalRole::CaseWorker));
    /// assert!(!CanonicalRole::Admin.can_access_dashboard(CanonicalRole::Provider));
    /// assert!(!CanonicalRole::User.can_access_dashboard(CanonicalRole::User));
    /// ```
    pub fn can_access_dashboard(self, target: CanonicalRole) -> bool {
        match target {
            CanonicalRole::Admin | CanonicalRole::Supervisor | CanonicalRole::CaseWorker => {
                self.is_staff() && self >= target
            }
            CanonicalRole::Provider | CanonicalRole::Recipient => self == target,
            CanonicalRole::User => false,
        }
    }
}

impl Display for CanonicalRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CanonicalRole {
    type Err = TypeError;

    /// Case-insensitive; surrounding whitespace is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        CanonicalRole::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| TypeError::UnknownCanonicalRole(s.to_string()))
    }
}

// ============================================================================
// Functional Identifiers
// ============================================================================

/// Opaque name of one grantable capability (e.g. `"case.edit"`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fid(String);

impl Fid {
    pub fn new(fid: impl Into<String>) -> Self {
        Self(fid.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Fid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Fid {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for Fid {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl AsRef<str> for Fid {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::borrow::Borrow<str> for Fid {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// The set of FIDs granted to a role.
///
/// Ordered so that iteration and serialization are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FidSet(BTreeSet<Fid>);

impl FidSet {
    /// Creates an empty set. Nothing is granted.
    pub fn empty() -> Self {
        Self(BTreeSet::new())
    }

    /// Returns whether `fid` is granted. Matching is exact.
    pub fn contains(&self, fid: &str) -> bool {
        self.0.contains(fid)
    }

    /// Grants a FID. Returns `false` if it was already granted.
    pub fn grant(&mut self, fid: impl Into<Fid>) -> bool {
        self.0.insert(fid.into())
    }

    /// Revokes a FID. Returns `false` if it was not granted.
    pub fn revoke(&mut self, fid: &str) -> bool {
        self.0.remove(fid)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Fid> {
        self.0.iter()
    }
}

impl<F: Into<Fid>> FromIterator<F> for FidSet {
    fn from_iter<T: IntoIterator<Item = F>>(iter: T) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

// ============================================================================
// Identity attributes
// ============================================================================

/// Identity-provider subject (`sub` claim).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectId(String);

impl SubjectId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Subject used when a token carries neither `sub` nor a username.
    pub fn anonymous() -> Self {
        Self(String::new())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_anonymous(&self) -> bool {
        self.0.is_empty()
    }
}

impl Display for SubjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// County (tenant) a principal operates in. Always upper-case.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CountyCode(String);

impl CountyCode {
    pub fn new(code: &str) -> Self {
        Self(code.trim().to_ascii_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for CountyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Role Set
// ============================================================================

/// Identity-provider role names, deduplicated case-insensitively.
///
/// The first spelling seen is the one kept for display; the upper-cased form
/// is the identity. Insertion order is preserved. Deserialization goes
/// through the same dedup as [`RoleSet::insert`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct RoleSet {
    roles: Vec<String>,
}

impl RoleSet {
    pub fn new() -> Self {
        Self { roles: Vec::new() }
    }

    /// Inserts a role unless an equal one (ignoring ASCII case) is present.
    ///
    /// Returns `true` if the role was added.
    pub fn insert(&mut self, role: impl Into<String>) -> bool {
        let role = role.into();
        if self.contains(&role) {
            return false;
        }
        self.roles.push(role);
        true
    }

    /// Case-insensitive membership.
    pub fn contains(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r.eq_ignore_ascii_case(role))
    }

    /// Returns whether any of `roles` is present. An empty list is `false`.
    pub fn has_any_role<S: AsRef<str>>(&self, roles: &[S]) -> bool {
        roles.iter().any(|r| self.contains(r.as_ref()))
    }

    /// Returns whether all of `roles` are present. An empty list is `false`.
    pub fn has_all_roles<S: AsRef<str>>(&self, roles: &[S]) -> bool {
        !roles.is_empty() && roles.iter().all(|r| self.contains(r.as_ref()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.roles.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for RoleSet {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        let mut set = RoleSet::new();
        for role in iter {
            set.insert(role);
        }
        set
    }
}

impl From<Vec<String>> for RoleSet {
    fn from(roles: Vec<String>) -> Self {
        roles.into_iter().collect()
    }
}

impl From<RoleSet> for Vec<String> {
    fn from(set: RoleSet) -> Self {
        set.roles
    }
}

// ============================================================================
// Principal
// ============================================================================

/// An authenticated caller, built once per session from decoded claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    subject: SubjectId,
    roles: RoleSet,
    role: CanonicalRole,
    county: Option<CountyCode>,
}

impl Principal {
    pub fn new(subject: SubjectId, roles: RoleSet, role: CanonicalRole) -> Self {
        Self {
            subject,
            roles,
            role,
            county: None,
        }
    }

    pub fn with_county(mut self, county: CountyCode) -> Self {
        self.county = Some(county);
        self
    }

    pub fn subject(&self) -> &SubjectId {
        &self.subject
    }

    /// The normalized identity-provider roles the canonical role came from.
    pub fn roles(&self) -> &RoleSet {
        &self.roles
    }

    pub fn role(&self) -> CanonicalRole {
        self.role
    }

    pub fn county(&self) -> Option<&CountyCode> {
        self.county.as_ref()
    }
}
