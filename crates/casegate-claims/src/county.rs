//! County attribute extraction.
//!
//! Lookup order:
//! 1. A group (top-level `groups`, then `realm_access.groups`) whose name, or
//!    any `/`-separated path segment, is a known county code.
//! 2. The `county`, `location`, `userCounty` claims.
//! 3. `attributes.county[0]`, then `attributes.location[0]`.

use casegate_types::CountyCode;

use crate::claims::TokenClaims;

/// County codes recognized in group names when none are configured.
pub const DEFAULT_COUNTY_CODES: &[&str] = &["CTA", "CTB", "CTC"];

const COUNTY_CLAIMS: &[&str] = &["county", "location", "userCounty"];
const COUNTY_ATTRIBUTES: &[&str] = &["county", "location"];

/// Extracts a principal's county from claims.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountyExtractor {
    codes: Vec<String>,
}

impl CountyExtractor {
    pub fn new() -> Self {
        Self::with_codes(DEFAULT_COUNTY_CODES.iter().copied())
    }

    /// Recognizes exactly `codes` in group names.
    pub fn with_codes<'a>(codes: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            codes: codes
                .into_iter()
                .map(|c| c.trim().to_ascii_uppercase())
                .filter(|c| !c.is_empty())
                .collect(),
        }
    }

    pub fn extract(&self, claims: &TokenClaims) -> Option<CountyCode> {
        self.from_groups(claims)
            .or_else(|| COUNTY_CLAIMS.iter().find_map(|c| claims.string_claim(c)))
            .or_else(|| COUNTY_ATTRIBUTES.iter().find_map(|a| claims.attribute(a)))
            .map(CountyCode::new)
    }

    fn from_groups<'c>(&self, claims: &'c TokenClaims) -> Option<&'c str> {
        claims.groups().into_iter().find_map(|group| {
            group
                .split('/')
                .map(str::trim)
                .find(|segment| self.codes.iter().any(|c| c.eq_ignore_ascii_case(segment)))
        })
    }
}

impl Default for CountyExtractor {
    fn default() -> Self {
        Self::new()
    }
}
