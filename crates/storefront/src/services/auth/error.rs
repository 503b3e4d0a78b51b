//! Authentication error types.

use thiserror::Error;

use crate::api::ApiError;

/// Errors that can occur during OTP login.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Phone number failed validation.
    #[error("invalid phone number: {0}")]
    InvalidPhone(#[from] shreeaura_core::PhoneError),

    /// OTP is not 4-6 digits, or the backend rejected it.
    #[error("invalid OTP")]
    InvalidOtp,

    /// The token issued by the backend could not be decoded.
    #[error("malformed token: {0}")]
    MalformedToken(String),

    /// The token has expired.
    #[error("session expired")]
    SessionExpired,

    /// Backend call failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),
}

impl AuthError {
    /// Message that is safe to show to the shopper in a toast.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidPhone(err) => format!("Please enter a valid mobile number: {err}."),
            Self::InvalidOtp => "That code didn't match. Please check and try again.".to_string(),
            Self::SessionExpired => "Your session has expired. Please log in again.".to_string(),
            Self::MalformedToken(_) => "We couldn't sign you in. Please try again.".to_string(),
            Self::Api(err) => err.user_message(),
        }
    }
}
