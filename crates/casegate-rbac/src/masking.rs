//! Field masking model and value transforms.
//!
//! ## Masking types
//!
//! | Type           | Access level   | Display value                          |
//! |----------------|----------------|----------------------------------------|
//! | `NONE`         | `FULL_ACCESS`  | raw value                              |
//! | `HIDDEN`       | `HIDDEN_ACCESS`| redacted marker (`***HIDDEN***`)       |
//! | `PARTIAL_MASK` | `MASKED_ACCESS`| `***` + last 4 characters              |
//! | `HASH_MASK`    | `MASKED_ACCESS`| `HASH_` + keyed BLAKE3 or SHA-256 hex  |
//! | `ANONYMIZE`    | `MASKED_ACCESS`| `ANON_` + 16 hex of a keyed BLAKE3     |
//! | `AGGREGATE`    | `MASKED_ACCESS`| `lo-hi` bucket, or `AGGREGATED`        |
//!
//! `HASH_MASK` is keyed when [`MaskingOptions::hash_secret`] is set. Without
//! a secret it falls back to plain SHA-256, which is guessable for short
//! identifiers.
//!
//! A field that is not selected for a role is always `HIDDEN_ACCESS`,
//! whatever its masking type. [`derive_access_level`] is the only place that
//! mapping lives.
//!
//! ## Examples
//!
//! ```
//! use casegate_rbac::masking::{MaskingOptions, MaskingType, apply_masking};
//!
//! let options = MaskingOptions::default();
//! let masked = apply_masking("123-45-6789", MaskingType::PartialMask, &options, "ctx");
//! assert_eq!(masked, "***6789");
//! ```

use std::fmt::{self, Display};
use std::str::FromStr;

use casegate_types::CanonicalRole;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Invalid masking configuration or enum names.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MaskingError {
    #[error("unknown masking type: {0:?}")]
    UnknownMaskingType(String),

    #[error("unknown access level: {0:?}")]
    UnknownAccessLevel(String),

    /// `AGGREGATE` needs a positive bucket width.
    #[error("aggregate bucket width must be > 0")]
    InvalidBucketWidth,

    /// The hidden placeholder must be distinguishable from "no data".
    #[error("redacted marker must not be empty")]
    EmptyRedactedMarker,

    #[error("hash secret must not be blank when set")]
    EmptyHashSecret,
}

/// Result type for masking operations.
pub type Result<T> = std::result::Result<T, MaskingError>;

// ---------------------------------------------------------------------------
// Masking type & access level
// ---------------------------------------------------------------------------

/// How a visible field's value is transformed before display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MaskingType {
    #[default]
    None,
    Hidden,
    PartialMask,
    HashMask,
    Anonymize,
    Aggregate,
}

impl MaskingType {
    pub const ALL: [MaskingType; 6] = [
        MaskingType::None,
        MaskingType::Hidden,
        MaskingType::PartialMask,
        MaskingType::HashMask,
        MaskingType::Anonymize,
        MaskingType::Aggregate,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MaskingType::None => "NONE",
            MaskingType::Hidden => "HIDDEN",
            MaskingType::PartialMask => "PARTIAL_MASK",
            MaskingType::HashMask => "HASH_MASK",
            MaskingType::Anonymize => "ANONYMIZE",
            MaskingType::Aggregate => "AGGREGATE",
        }
    }

    /// Returns whether the value is shown, but transformed.
    pub fn transforms_value(self) -> bool {
        matches!(
            self,
            MaskingType::PartialMask
                | MaskingType::HashMask
                | MaskingType::Anonymize
                | MaskingType::Aggregate
        )
    }
}

impl Display for MaskingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MaskingType {
    type Err = MaskingError;

    fn from_str(s: &str) -> Result<Self> {
        let needle = s.trim();
        MaskingType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| MaskingError::UnknownMaskingType(s.to_string()))
    }
}

/// How much of a field a role gets to see.
///
/// Ordered from least to most visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccessLevel {
    HiddenAccess,
    MaskedAccess,
    FullAccess,
}

impl AccessLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            AccessLevel::HiddenAccess => "HIDDEN_ACCESS",
            AccessLevel::MaskedAccess => "MASKED_ACCESS",
            AccessLevel::FullAccess => "FULL_ACCESS",
        }
    }

    pub fn is_visible(self) -> bool {
        self != AccessLevel::HiddenAccess
    }
}

impl Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccessLevel {
    type Err = MaskingError;

    fn from_str(s: &str) -> Result<Self> {
        let needle = s.trim();
        [
            AccessLevel::HiddenAccess,
            AccessLevel::MaskedAccess,
            AccessLevel::FullAccess,
        ]
        .into_iter()
        .find(|l| l.as_str().eq_ignore_ascii_case(needle))
        .ok_or_else(|| MaskingError::UnknownAccessLevel(s.to_string()))
    }
}

/// Derives the access level of a field.
///
/// An unselected field is hidden. A selected `HIDDEN` field is also hidden.
pub fn derive_access_level(selected: bool, masking_type: MaskingType) -> AccessLevel {
    if !selected {
        return AccessLevel::HiddenAccess;
    }
    match masking_type {
        MaskingType::None => AccessLevel::FullAccess,
        MaskingType::Hidden => AccessLevel::HiddenAccess,
        MaskingType::PartialMask
        | MaskingType::HashMask
        | MaskingType::Anonymize
        | MaskingType::Aggregate => AccessLevel::MaskedAccess,
    }
}

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Placeholder rendered for hidden fields.
pub const DEFAULT_REDACTED_MARKER: &str = "***HIDDEN***";

/// Prefix of every partially masked value.
pub const PARTIAL_MASK_PREFIX: &str = "***";

/// Value of an `AGGREGATE` field that is not a non-negative number.
pub const AGGREGATED_PLACEHOLDER: &str = "AGGREGATED";

/// Knobs for the value transforms.
///
/// Also the `[masking]` section of the configuration file.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaskingOptions {
    /// Display value of hidden fields.
    pub redacted_marker: String,
    /// Characters kept by `PARTIAL_MASK`.
    pub partial_visible_suffix: usize,
    /// Bucket width for `AGGREGATE`.
    pub aggregate_bucket_width: u64,
    /// Key-derivation context for `ANONYMIZE`.
    pub pseudonym_context: String,
    /// Secret keying `HASH_MASK`. `None` uses plain SHA-256.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash_secret: Option<String>,
}

impl fmt::Debug for MaskingOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MaskingOptions")
            .field("redacted_marker", &self.redacted_marker)
            .field("partial_visible_suffix", &self.partial_visible_suffix)
            .field("aggregate_bucket_width", &self.aggregate_bucket_width)
            .field("pseudonym_context", &self.pseudonym_context)
            .field("hash_secret", &self.hash_secret.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Default for MaskingOptions {
    fn default() -> Self {
        Self {
            redacted_marker: DEFAULT_REDACTED_MARKER.to_string(),
            partial_visible_suffix: 4,
            aggregate_bucket_width: 10,
            pseudonym_context: "casegate field pseudonym v1".to_string(),
            hash_secret: None,
        }
    }
}

impl MaskingOptions {
    /// # Errors
    ///
    /// - [`MaskingError::InvalidBucketWidth`] for a zero bucket width
    /// - [`MaskingError::EmptyRedactedMarker`] for a blank marker
    /// - [`MaskingError::EmptyHashSecret`] for a blank hash secret
    pub fn validate(&self) -> Result<()> {
        if self.aggregate_bucket_width == 0 {
            return Err(MaskingError::InvalidBucketWidth);
        }
        if self.redacted_marker.trim().is_empty() {
            return Err(MaskingError::EmptyRedactedMarker);
        }
        if self
            .hash_secret
            .as_deref()
            .is_some_and(|secret| secret.trim().is_empty())
        {
            return Err(MaskingError::EmptyHashSecret);
        }
        Ok(())
    }

    /// BLAKE3 derive-key context for pseudonyms of one (role, report type).
    ///
    /// Pseudonyms are stable within a report and unlinkable across roles
    /// and reports.
    pub fn pseudonym_key_context(&self, role: CanonicalRole, report_type: &str) -> String {
        format!("{} {role} {report_type}", self.pseudonym_context)
    }
}

// ---------------------------------------------------------------------------
// Transforms
// ---------------------------------------------------------------------------

/// Applies `masking_type` to a raw value.
///
/// `key_context` is the string from
/// [`MaskingOptions::pseudonym_key_context`]; only `ANONYMIZE` reads it.
pub fn apply_masking(
    value: &str,
    masking_type: MaskingType,
    options: &MaskingOptions,
    key_context: &str,
) -> String {
    match masking_type {
        MaskingType::None => value.to_string(),
        MaskingType::Hidden => options.redacted_marker.clone(),
        MaskingType::PartialMask => partial_mask(value, options.partial_visible_suffix),
        MaskingType::HashMask => match options.hash_secret.as_deref() {
            Some(secret) => keyed_hash_mask(value, secret),
            None => hash_mask(value),
        },
        MaskingType::Anonymize => anonymize(value, key_context),
        MaskingType::Aggregate => aggregate(value, options.aggregate_bucket_width),
    }
}

/// `123-45-6789` -> `***6789`. Values no longer than `visible` become `***`.
pub fn partial_mask(value: &str, visible: usize) -> String {
    let len = value.chars().count();
    if len <= visible {
        return PARTIAL_MASK_PREFIX.to_string();
    }
    let suffix: String = value.chars().skip(len - visible).collect();
    format!("{PARTIAL_MASK_PREFIX}{suffix}")
}

/// `HASH_` followed by the hex SHA-256 of the value.
pub fn hash_mask(value: &str) -> String {
    use sha2::Digest;

    let digest = sha2::Sha256::digest(value.as_bytes());
    let hex = bytes_to_hex(&digest);

    debug_assert_eq!(hex.len(), 64, "SHA-256 hex must be 64 characters");

    format!("HASH_{hex}")
}

/// BLAKE3 derive-key context turning the configured secret into a hash key.
const HASH_KEY_CONTEXT: &str = "casegate hash mask key v1";

/// `HASH_` followed by the hex BLAKE3 keyed hash of the value.
///
/// The key is derived from `secret`; without it the digest cannot be
/// recomputed by enumerating candidate values.
pub fn keyed_hash_mask(value: &str, secret: &str) -> String {
    let key = blake3::derive_key(HASH_KEY_CONTEXT, secret.as_bytes());
    let hex = blake3::keyed_hash(&key, value.as_bytes()).to_hex();
    format!("HASH_{hex}")
}

/// `ANON_` followed by the first 16 hex characters of a BLAKE3 hash keyed
/// by `key_context`.
pub fn anonymize(value: &str, key_context: &str) -> String {
    let mut hasher = blake3::Hasher::new_derive_key(key_context);
    hasher.update(value.as_bytes());
    let hex = hasher.finalize().to_hex();
    format!("ANON_{}", &hex[..16])
}

/// Generalizes a non-negative number to its `lo-hi` bucket.
///
/// The fractional part is dropped before bucketing. Anything else,
/// including negative numbers and a zero width, is `AGGREGATED`.
pub fn aggregate(value: &str, bucket_width: u64) -> String {
    match parse_non_negative(value) {
        Some(n) if bucket_width > 0 => {
            let lo = (n / bucket_width) * bucket_width;
            let hi = lo.saturating_add(bucket_width - 1);
            format!("{lo}-{hi}")
        }
        _ => AGGREGATED_PLACEHOLDER.to_string(),
    }
}

/// Whole part of a plain decimal like `37` or `37.5`.
fn parse_non_negative(value: &str) -> Option<u64> {
    let value = value.trim();
    let (whole, fraction) = value.split_once('.').unwrap_or((value, ""));
    let digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if whole.is_empty() || !digits(whole) || !digits(fraction) {
        return None;
    }
    whole.parse().ok()
}

fn bytes_to_hex(bytes: &[u8]) -> String {
    use std::fmt::Write;

    let mut hex = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        let _ = write!(hex, "{byte:02x}");
    }
    hex
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use test_case::test_case;

    #[test_case("123-45-6789", "***6789"; "ssn")]
    #[test_case("12345", "***2345"; "five chars")]
    #[test_case("1234", "***"; "exactly four")]
    #[test_case("ab", "***"; "short")]
    #[test_case("", "***"; "empty")]
    #[test_case("añoñoñ", "***oñoñ"; "multibyte")]
    fn test_partial_mask(raw: &str, expected: &str) {
        assert_eq!(partial_mask(raw, 4), expected);
    }

    #[test]
    fn test_partial_mask_custom_suffix() {
        assert_eq!(partial_mask("555-123-4567", 2), "***67");
        assert_eq!(partial_mask("555", 0), "***");
    }

    #[test]
    fn test_hash_mask_shape() {
        let hashed = hash_mask("E-1001");
        assert!(hashed.starts_with("HASH_"));
        assert_eq!(hashed.len(), 5 + 64);
        assert!(hashed[5..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_hash_mask_known_vector() {
        assert_eq!(
            hash_mask("abc"),
            "HASH_ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_anonymize_shape_and_context() {
        let a = anonymize("Jane Doe", "ctx SUPERVISOR TIMESHEET");
        assert!(a.starts_with("ANON_"));
        assert_eq!(a.len(), 5 + 16);
        assert_eq!(a, anonymize("Jane Doe", "ctx SUPERVISOR TIMESHEET"));
        assert_ne!(a, anonymize("Jane Doe", "ctx CASE_WORKER TIMESHEET"));
        assert!(!a.contains("Jane"));
    }

    #[test_case("82", "80-89"; "integer")]
    #[test_case("5", "0-9"; "first bucket")]
    #[test_case("37.5", "30-39"; "fraction dropped")]
    #[test_case(" 40 ", "40-49"; "trimmed")]
    #[test_case("-3", "AGGREGATED"; "negative")]
    #[test_case("+3", "AGGREGATED"; "explicit sign")]
    #[test_case("N/A", "AGGREGATED"; "text")]
    #[test_case("", "AGGREGATED"; "empty")]
    #[test_case(".5", "AGGREGATED"; "no whole part")]
    #[test_case("1e3", "AGGREGATED"; "exponent")]
    fn test_aggregate(raw: &str, expected: &str) {
        assert_eq!(aggregate(raw, 10), expected);
    }

    #[test]
    fn test_aggregate_edges() {
        assert_eq!(aggregate("5", 0), "AGGREGATED");
        assert_eq!(
            aggregate(&u64::MAX.to_string(), 10),
            format!("{}-{}", u64::MAX / 10 * 10, u64::MAX)
        );
    }

    #[test]
    fn test_derive_access_level() {
        for masking_type in MaskingType::ALL {
            assert_eq!(
                derive_access_level(false, masking_type),
                AccessLevel::HiddenAccess
            );
        }
        assert_eq!(derive_access_level(true, MaskingType::None), AccessLevel::FullAccess);
        assert_eq!(derive_access_level(true, MaskingType::Hidden), AccessLevel::HiddenAccess);
        for masking_type in MaskingType::ALL.into_iter().filter(|t| t.transforms_value()) {
            assert_eq!(
                derive_access_level(true, masking_type),
                AccessLevel::MaskedAccess
            );
        }
    }

    #[test]
    fn test_keyed_hash_mask() {
        let masked = keyed_hash_mask("123-45-6789", "s3cret");

        assert!(masked.starts_with("HASH_"));
        assert_eq!(masked.len(), "HASH_".len() + 64);
        assert_eq!(masked, keyed_hash_mask("123-45-6789", "s3cret"));
        assert_ne!(masked, keyed_hash_mask("123-45-6789", "other"));
        assert_ne!(masked, hash_mask("123-45-6789"));
    }

    #[test]
    fn test_hash_secret_selects_keyed_hash() {
        let keyed = MaskingOptions {
            hash_secret: Some("s3cret".to_string()),
            ..MaskingOptions::default()
        };

        assert_eq!(
            apply_masking("E-1001", MaskingType::HashMask, &keyed, ""),
            keyed_hash_mask("E-1001", "s3cret")
        );
        assert_eq!(
            apply_masking("E-1001", MaskingType::HashMask, &MaskingOptions::default(), ""),
            hash_mask("E-1001")
        );
    }

    #[test]
    fn test_hash_secret_validated_and_redacted() {
        let options = MaskingOptions {
            hash_secret: Some("  ".to_string()),
            ..MaskingOptions::default()
        };
        assert_eq!(options.validate(), Err(MaskingError::EmptyHashSecret));

        let options = MaskingOptions {
            hash_secret: Some("s3cret".to_string()),
            ..MaskingOptions::default()
        };
        assert!(!format!("{options:?}").contains("s3cret"));
    }

    #[test]
    fn test_apply_masking_dispatch() {
        let options = MaskingOptions::default();
        assert_eq!(apply_masking("x", MaskingType::None, &options, ""), "x");
        assert_eq!(apply_masking("x", MaskingType::Hidden, &options, ""), "***HIDDEN***");
        assert_eq!(apply_masking("12", MaskingType::Aggregate, &options, ""), "10-19");
    }

    #[test_case("partial_mask", MaskingType::PartialMask; "lower")]
    #[test_case(" HASH_MASK ", MaskingType::HashMask; "padded")]
    #[test_case("Anonymize", MaskingType::Anonymize; "mixed")]
    fn test_masking_type_from_str(raw: &str, expected: MaskingType) {
        assert_eq!(raw.parse::<MaskingType>().unwrap(), expected);
    }

    #[test]
    fn test_unknown_names_rejected() {
        assert_eq!(
            "REDACT".parse::<MaskingType>(),
            Err(MaskingError::UnknownMaskingType("REDACT".into()))
        );
        assert_eq!(
            "PARTIAL".parse::<AccessLevel>(),
            Err(MaskingError::UnknownAccessLevel("PARTIAL".into()))
        );
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(
            serde_json::to_string(&MaskingType::PartialMask).unwrap(),
            r#""PARTIAL_MASK""#
        );
        assert_eq!(
            serde_json::from_str::<AccessLevel>(r#""MASKED_ACCESS""#).unwrap(),
            AccessLevel::MaskedAccess
        );
        assert_eq!("full_access".parse::<AccessLevel>(), Ok(AccessLevel::FullAccess));
    }

    #[test]
    fn test_options_validation() {
        assert!(MaskingOptions::default().validate().is_ok());

        let options = MaskingOptions {
            aggregate_bucket_width: 0,
            ..MaskingOptions::default()
        };
        assert_eq!(options.validate(), Err(MaskingError::InvalidBucketWidth));

        let options = MaskingOptions {
            redacted_marker: "  ".into(),
            ..MaskingOptions::default()
        };
        assert_eq!(options.validate(), Err(MaskingError::EmptyRedactedMarker));
    }

    #[test]
    fn test_pseudonym_key_context() {
        let options = MaskingOptions::default();
        assert_eq!(
            options.pseudonym_key_context(CanonicalRole::Supervisor, "TIMESHEET_REPORT"),
            "casegate field pseudonym v1 SUPERVISOR TIMESHEET_REPORT"
        );
    }

    proptest! {
        #[test]
        fn prop_hash_mask_stable_and_never_raw(a in ".{0,40}", b in ".{0,40}") {
            prop_assert_eq!(hash_mask(&a), hash_mask(&a));
            prop_assert_ne!(hash_mask(&a), a.clone());
            if a != b {
                prop_assert_ne!(hash_mask(&a), hash_mask(&b));
            }
        }

        #[test]
        fn prop_partial_mask_keeps_suffix(raw in "\\PC{0,30}", visible in 0usize..8) {
            let masked = partial_mask(&raw, visible);
            prop_assert!(masked.starts_with(PARTIAL_MASK_PREFIX));
            let len = raw.chars().count();
            if len > visible {
                let kept: String = raw.chars().skip(len - visible).collect();
                prop_assert!(masked.ends_with(&kept));
                prop_assert_eq!(masked.chars().count(), PARTIAL_MASK_PREFIX.len() + visible);
            } else {
                prop_assert_eq!(masked, PARTIAL_MASK_PREFIX);
            }
        }

        #[test]
        fn prop_aggregate_bucket_contains_value(n in 0u64..1_000_000, width in 1u64..1_000) {
            let bucket = aggregate(&n.to_string(), width);
            let (lo, hi) = bucket.split_once('-').unwrap();
            let (lo, hi): (u64, u64) = (lo.parse().unwrap(), hi.parse().unwrap());
            prop_assert!(lo <= n && n <= hi);
            prop_assert_eq!(hi - lo + 1, width);
        }
    }
}
