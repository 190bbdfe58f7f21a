//! Claim decoding errors.

use thiserror::Error;

/// Why a token payload could not be turned into [`TokenClaims`](crate::TokenClaims).
#[derive(Debug, Error)]
pub enum ClaimsError {
    /// The token is not a three-segment compact JWS.
    #[error("Malformed token: expected 3 dot-separated segments, found {segments}")]
    MalformedToken { segments: usize },

    /// The payload segment is not valid base64url.
    #[error("Token payload is not valid base64url: {0}")]
    Base64(#[from] base64::DecodeError),

    /// The payload is not valid JSON.
    #[error("Token payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The payload is valid JSON but not an object.
    #[error("Token payload must be a JSON object, found {found}")]
    NotAnObject { found: &'static str },
}

/// Result type for claim decoding.
pub type Result<T> = std::result::Result<T, ClaimsError>;
