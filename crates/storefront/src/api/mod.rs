//! Client for the Shree Aura REST API.
//!
//! # Architecture
//!
//! - The backend is the source of truth - no local sync, direct API calls
//! - Catalogue responses (categories, listings, products) are cached in memory
//!   via `moka` with a configurable TTL
//! - Customer calls (profile, orders, payments) are never cached and carry the
//!   customer's bearer token
//!
//! # Example
//!
//! ```rust,ignore
//! use shreeaura_storefront::api::ApiClient;
//!
//! let client = ApiClient::new(&config.api)?;
//! let categories = client.categories().await?;
//! let product = client.product("kumkumadi-face-oil").await?;
//! ```

mod cache;
mod client;
pub mod types;

pub use client::ApiClient;
pub use types::*;

use thiserror::Error;

/// Errors that can occur when calling the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed (connection, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body was not the expected JSON.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Endpoint URL could not be built.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Token missing, expired or rejected.
    #[error("Unauthorized")]
    Unauthorized,

    /// Rate limited by the backend.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Any other non-success status.
    #[error("HTTP {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Backend-provided message, or a truncated body.
        message: String,
    },
}

impl ApiError {
    /// Message that is safe to show to the shopper in a toast.
    ///
    /// Validation messages from the backend (4xx) are passed through; server
    /// and transport failures get a generic message.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Status { status, message } if (400..500).contains(status) && !message.is_empty() => {
                message.clone()
            }
            Self::NotFound(_) => "We couldn't find what you were looking for.".to_string(),
            Self::Unauthorized => "Your session has expired. Please log in again.".to_string(),
            Self::RateLimited(secs) => {
                format!("Too many attempts. Please try again in {secs} seconds.")
            }
            _ => "Something went wrong. Please try again.".to_string(),
        }
    }

    /// Whether the error means the customer's token is no longer valid.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let err = ApiError::NotFound("product p1".to_string());
        assert_eq!(err.to_string(), "Not found: product p1");

        let err = ApiError::Status {
            status: 422,
            message: "Invalid pincode".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP 422: Invalid pincode");
    }

    #[test]
    fn test_user_message_passes_through_validation() {
        let err = ApiError::Status {
            status: 400,
            message: "OTP expired".to_string(),
        };
        assert_eq!(err.user_message(), "OTP expired");
    }

    #[test]
    fn test_user_message_hides_server_errors() {
        let err = ApiError::Status {
            status: 500,
            message: "MongoServerError: connection reset".to_string(),
        };
        assert_eq!(err.user_message(), "Something went wrong. Please try again.");
    }

    #[test]
    fn test_rate_limited_message() {
        let err = ApiError::RateLimited(30);
        assert_eq!(err.to_string(), "Rate limited, retry after 30 seconds");
        assert!(err.user_message().contains("30 seconds"));
    }
}
