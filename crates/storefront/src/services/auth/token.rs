//! Bearer token claim decoding.
//!
//! The backend issues JWTs. The storefront only reads the subject and expiry
//! to drive session state; signature verification is the backend's job on
//! every authenticated call.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::AuthError;

/// Claims the storefront reads from the token payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TokenClaims {
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default, alias = "userId", alias = "_id")]
    pub id: Option<String>,
    /// Expiry as seconds since the epoch.
    #[serde(default)]
    pub exp: Option<i64>,
}

impl TokenClaims {
    /// User id from `sub`, falling back to `id`.
    #[must_use]
    pub fn user_id(&self) -> Option<&str> {
        self.sub.as_deref().or(self.id.as_deref())
    }

    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp.and_then(|exp| DateTime::from_timestamp(exp, 0))
    }
}

/// Decode the payload segment of a JWT without verifying it.
///
/// # Errors
///
/// Returns [`AuthError::MalformedToken`] if the token is not three
/// dot-separated segments or the payload is not base64url JSON.
pub fn decode_claims(token: &str) -> Result<TokenClaims, AuthError> {
    let mut segments = token.split('.');
    let (Some(_header), Some(payload), Some(_signature), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(AuthError::MalformedToken("expected three segments".to_string()));
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| AuthError::MalformedToken(e.to_string()))?;

    serde_json::from_slice(&bytes).map_err(|e| AuthError::MalformedToken(e.to_string()))
}
