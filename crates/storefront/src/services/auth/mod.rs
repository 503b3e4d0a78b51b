//! Authentication service.
//!
//! Phone + one-time password login against the backend.

mod error;
mod token;

pub use error::AuthError;
pub use token::{TokenClaims, decode_claims};

use chrono::Utc;
use tracing::instrument;

use shreeaura_core::{Phone, UserId};

use crate::api::{ApiClient, ApiError};
use crate::models::CurrentCustomer;

/// Accepted OTP lengths.
const OTP_LENGTH: std::ops::RangeInclusive<usize> = 4..=6;

/// Authentication service.
///
/// Handles sending and verifying one-time passwords.
pub struct AuthService<'a> {
    api: &'a ApiClient,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(api: &'a ApiClient) -> Self {
        Self { api }
    }

    /// Validate `phone` and ask the backend to send it an OTP.
    ///
    /// Returns the normalised phone number, which the caller keeps in the
    /// session until verification.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidPhone` for an invalid number, or
    /// `AuthError::Api` if the backend call fails.
    #[instrument(skip(self, phone))]
    pub async fn send_otp(&self, phone: &str) -> Result<Phone, AuthError> {
        let phone = Phone::parse(phone)?;
        self.api.send_otp(phone.as_str()).await?;
        tracing::info!(phone = %phone.masked(), "OTP sent");
        Ok(phone)
    }

    /// Verify an OTP and build the session identity.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidOtp` if the code is not 4-6 digits or the
    /// backend rejects it, `AuthError::MalformedToken` if the issued token
    /// cannot be decoded, and `AuthError::SessionExpired` if it is already
    /// expired.
    #[instrument(skip(self, phone, otp))]
    pub async fn verify_otp(&self, phone: &Phone, otp: &str) -> Result<CurrentCustomer, AuthError> {
        let otp = otp.trim();
        validate_otp(otp)?;

        let response = self
            .api
            .verify_otp(phone.as_str(), otp)
            .await
            .map_err(|e| match e {
                ApiError::Unauthorized => AuthError::InvalidOtp,
                other => AuthError::Api(other),
            })?;

        let claims = decode_claims(response.token.expose())?;
        let user_id = claims
            .user_id()
            .map_or_else(|| response.user.id.clone(), UserId::new);

        let customer = CurrentCustomer {
            user_id,
            name: response.user.name,
            phone: phone.clone(),
            token: response.token,
            expires_at: claims.expires_at(),
        };

        if customer.is_expired(Utc::now()) {
            return Err(AuthError::SessionExpired);
        }

        tracing::info!(user_id = %customer.user_id, "Customer logged in");
        Ok(customer)
    }
}

/// An OTP is 4 to 6 ASCII digits.
///
/// # Errors
///
/// Returns `AuthError::InvalidOtp` otherwise.
pub fn validate_otp(otp: &str) -> Result<(), AuthError> {
    if OTP_LENGTH.contains(&otp.len()) && otp.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(AuthError::InvalidOtp)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_otp() {
        assert!(validate_otp("1234").is_ok());
        assert!(validate_otp("123456").is_ok());
        assert!(validate_otp("123").is_err());
        assert!(validate_otp("1234567").is_err());
        assert!(validate_otp("12a4").is_err());
        assert!(validate_otp("").is_err());
    }

    #[test]
    fn test_user_message_for_invalid_phone() {
        let err = AuthError::from(Phone::parse("12345").unwrap_err());
        assert!(err.user_message().starts_with("Please enter a valid mobile number"));
    }
}
