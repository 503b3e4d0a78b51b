//! Session-related types.
//!
//! Types stored in the session for authentication and checkout state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shreeaura_core::{OrderId, Phone, UserId};

use crate::api::{AccessToken, PaymentOrder};

/// Session-stored customer identity.
///
/// Holds the backend bearer token so authenticated API calls can be made on
/// the customer's behalf.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentCustomer {
    /// Backend user id.
    pub user_id: UserId,
    /// Display name, if the customer has set one.
    pub name: Option<String>,
    pub phone: Phone,
    pub token: AccessToken,
    /// Token expiry from the `exp` claim, when present.
    pub expires_at: Option<DateTime<Utc>>,
}

impl CurrentCustomer {
    /// Whether the token has passed its expiry.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|exp| exp <= now)
    }

    /// Name for greetings, falling back to the masked phone number.
    #[must_use]
    pub fn display_name(&self) -> String {
        self.name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map_or_else(|| self.phone.masked(), str::to_owned)
    }
}

/// An online payment started at checkout and not yet confirmed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingPayment {
    pub order_id: OrderId,
    pub payment: PaymentOrder,
}

/// Session keys.
pub mod keys {
    /// Key for storing the logged-in customer.
    pub const CURRENT_CUSTOMER: &str = "current_customer";

    /// Key for the cart.
    pub const CART: &str = "cart";

    /// Key for queued toast notifications.
    pub const TOASTS: &str = "toasts";

    /// Key for the phone number an OTP was sent to.
    pub const PENDING_PHONE: &str = "pending_phone";

    /// Key for the gateway order awaiting the payment callback.
    pub const PENDING_PAYMENT: &str = "pending_payment";

    /// Key for the page to return to after login.
    pub const LOGIN_REDIRECT: &str = "login_redirect";
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn customer(name: Option<&str>, expires_at: Option<DateTime<Utc>>) -> CurrentCustomer {
        CurrentCustomer {
            user_id: UserId::new("u1"),
            name: name.map(str::to_owned),
            phone: Phone::parse("9876543210").unwrap(),
            token: AccessToken::new("t"),
            expires_at,
        }
    }

    #[test]
    fn test_expiry() {
        let now = Utc::now();
        assert!(customer(None, Some(now - Duration::minutes(1))).is_expired(now));
        assert!(!customer(None, Some(now + Duration::hours(1))).is_expired(now));
        assert!(!customer(None, None).is_expired(now));
    }

    #[test]
    fn test_display_name_falls_back_to_masked_phone() {
        assert_eq!(customer(Some("Meera"), None).display_name(), "Meera");
        assert_eq!(customer(Some("  "), None).display_name(), "******3210");
    }
}
