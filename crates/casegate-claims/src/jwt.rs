//! Compact JWS payload decoding.
//!
//! Only the payload segment is read. Signature verification belongs to the
//! layer that accepted the token; by the time claims reach this engine the
//! token has already been validated.

use base64::Engine as _;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use tracing::warn;

use crate::claims::TokenClaims;
use crate::error::{ClaimsError, Result};

/// base64url that accepts both padded and unpadded input.
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Decodes the payload of `header.payload.signature`.
///
/// # Errors
///
/// - [`ClaimsError::MalformedToken`] if the token does not have 3 segments
/// - [`ClaimsError::Base64`] if the payload is not base64url
/// - [`ClaimsError::Json`] / [`ClaimsError::NotAnObject`] if it is not a
///   JSON object
pub fn try_decode_payload(token: &str) -> Result<TokenClaims> {
    let segments: Vec<&str> = token.trim().split('.').collect();
    if segments.len() != 3 {
        return Err(ClaimsError::MalformedToken {
            segments: segments.len(),
        });
    }

    let bytes = URL_SAFE_LENIENT.decode(segments[1])?;
    let value: serde_json::Value = serde_json::from_slice(&bytes)?;
    TokenClaims::from_value(value)
}

/// Decodes a token payload, returning `None` on any failure.
pub fn decode_payload(token: &str) -> Option<TokenClaims> {
    match try_decode_payload(token) {
        Ok(claims) => Some(claims),
        Err(e) => {
            warn!(error = %e, "Failed to decode token payload");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD};

    fn token_with_payload(payload: &str) -> String {
        format!("eyJhbGciOiJub25lIn0.{}.sig", URL_SAFE_NO_PAD.encode(payload))
    }

    #[test]
    fn test_decode_unpadded_payload() {
        let token = token_with_payload(r#"{"sub":"u-1","realm_access":{"roles":["ADMIN"]}}"#);

        let claims = try_decode_payload(&token).unwrap();
        assert_eq!(claims.subject(), Some("u-1"));
        assert_eq!(claims.realm_roles(), vec!["ADMIN"]);
    }

    #[test]
    fn test_decode_padded_payload() {
        let payload = r#"{"sub":"ab"}"#;
        let token = format!("h.{}.s", URL_SAFE.encode(payload));

        assert_eq!(try_decode_payload(&token).unwrap().subject(), Some("ab"));
    }

    #[test]
    fn test_wrong_segment_count() {
        assert!(matches!(
            try_decode_payload("only.two"),
            Err(ClaimsError::MalformedToken { segments: 2 })
        ));
        assert!(matches!(
            try_decode_payload(""),
            Err(ClaimsError::MalformedToken { segments: 1 })
        ));
    }

    #[test]
    fn test_bad_base64() {
        assert!(matches!(
            try_decode_payload("h.!!!.s"),
            Err(ClaimsError::Base64(_))
        ));
    }

    #[test]
    fn test_payload_not_object() {
        let token = token_with_payload("[1,2]");
        assert!(matches!(
            try_decode_payload(&token),
            Err(ClaimsError::NotAnObject { .. })
        ));
        assert!(decode_payload(&token).is_none());
    }

    #[test]
    fn test_payload_not_json() {
        let token = token_with_payload("plain text");
        assert!(matches!(try_decode_payload(&token), Err(ClaimsError::Json(_))));
    }
}
