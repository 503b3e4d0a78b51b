//! Status enums for orders and payments, and their shopper-facing labels.
//!
//! The backend is not consistent about casing (`"OUT_FOR_DELIVERY"`,
//! `"Out for delivery"` and `"out-for-delivery"` all appear), so parsing
//! normalises the wire value before matching and never fails: anything
//! unrecognised becomes `Unknown`.

use serde::{Deserialize, Serialize};

/// Badge tone used when rendering a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusTone {
    Neutral,
    Info,
    Success,
    Danger,
}

impl StatusTone {
    /// CSS modifier for the status badge.
    #[must_use]
    pub const fn css_class(self) -> &'static str {
        match self {
            Self::Neutral => "badge-neutral",
            Self::Info => "badge-info",
            Self::Success => "badge-success",
            Self::Danger => "badge-danger",
        }
    }
}

/// Lowercase and strip separators: `"Out for-Delivery"` -> `"outfordelivery"`.
fn normalise(raw: &str) -> String {
    raw.chars()
        .filter(|c| !matches!(c, ' ' | '_' | '-'))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Order lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(from = "String", into = "String")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Processing,
    Packed,
    Shipped,
    OutForDelivery,
    Delivered,
    Cancelled,
    Returned,
    Unknown,
}

impl OrderStatus {
    /// Parse a wire value. Unrecognised values map to [`OrderStatus::Unknown`].
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match normalise(raw).as_str() {
            "pending" | "placed" => Self::Pending,
            "confirmed" | "accepted" => Self::Confirmed,
            "processing" => Self::Processing,
            "packed" => Self::Packed,
            "shipped" | "dispatched" => Self::Shipped,
            "outfordelivery" => Self::OutForDelivery,
            "delivered" => Self::Delivered,
            "cancelled" | "canceled" => Self::Cancelled,
            "returned" => Self::Returned,
            _ => Self::Unknown,
        }
    }

    /// Canonical snake_case wire value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Processing => "processing",
            Self::Packed => "packed",
            Self::Shipped => "shipped",
            Self::OutForDelivery => "out_for_delivery",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
            Self::Returned => "returned",
            Self::Unknown => "unknown",
        }
    }

    /// Text shown to the shopper.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Order placed",
            Self::Confirmed => "Confirmed",
            Self::Processing => "Being prepared",
            Self::Packed => "Packed",
            Self::Shipped => "Shipped",
            Self::OutForDelivery => "Out for delivery",
            Self::Delivered => "Delivered",
            Self::Cancelled => "Cancelled",
            Self::Returned => "Returned",
            Self::Unknown => "Status unavailable",
        }
    }

    #[must_use]
    pub const fn tone(self) -> StatusTone {
        match self {
            Self::Pending | Self::Unknown => StatusTone::Neutral,
            Self::Confirmed
            | Self::Processing
            | Self::Packed
            | Self::Shipped
            | Self::OutForDelivery => StatusTone::Info,
            Self::Delivered => StatusTone::Success,
            Self::Cancelled | Self::Returned => StatusTone::Danger,
        }
    }

    /// Orders can be cancelled by the shopper until they are being prepared.
    #[must_use]
    pub const fn is_cancellable(self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed)
    }

    /// No further transitions are expected.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled | Self::Returned)
    }
}

impl From<String> for OrderStatus {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl From<OrderStatus> for String {
    fn from(status: OrderStatus) -> Self {
        status.as_str().to_owned()
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Payment status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(from = "String", into = "String")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Failed,
    Refunded,
    Unknown,
}

impl PaymentStatus {
    /// Parse a wire value. Unrecognised values map to [`PaymentStatus::Unknown`].
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match normalise(raw).as_str() {
            "pending" | "created" | "unpaid" => Self::Pending,
            "paid" | "captured" | "success" | "completed" => Self::Paid,
            "failed" => Self::Failed,
            "refunded" => Self::Refunded,
            _ => Self::Unknown,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Failed => "failed",
            Self::Refunded => "refunded",
            Self::Unknown => "unknown",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Payment pending",
            Self::Paid => "Paid",
            Self::Failed => "Payment failed",
            Self::Refunded => "Refunded",
            Self::Unknown => "Payment status unavailable",
        }
    }

    #[must_use]
    pub const fn tone(self) -> StatusTone {
        match self {
            Self::Pending | Self::Unknown => StatusTone::Neutral,
            Self::Paid => StatusTone::Success,
            Self::Refunded => StatusTone::Info,
            Self::Failed => StatusTone::Danger,
        }
    }
}

impl From<String> for PaymentStatus {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl From<PaymentStatus> for String {
    fn from(status: PaymentStatus) -> Self {
        status.as_str().to_owned()
    }
}

/// How the shopper pays for an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    #[serde(rename = "cod", alias = "COD")]
    CashOnDelivery,
    #[serde(alias = "ONLINE", alias = "prepaid")]
    Online,
}

impl PaymentMethod {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CashOnDelivery => "cod",
            Self::Online => "online",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::CashOnDelivery => "Cash on delivery",
            Self::Online => "Paid online",
        }
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalise(s).as_str() {
            "cod" | "cashondelivery" => Ok(Self::CashOnDelivery),
            "online" | "prepaid" => Ok(Self::Online),
            _ => Err(format!("invalid payment method: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_parse_tolerates_casing() {
        assert_eq!(OrderStatus::parse("OUT_FOR_DELIVERY"), OrderStatus::OutForDelivery);
        assert_eq!(OrderStatus::parse("Out for delivery"), OrderStatus::OutForDelivery);
        assert_eq!(OrderStatus::parse("out-for-delivery"), OrderStatus::OutForDelivery);
        assert_eq!(OrderStatus::parse("Canceled"), OrderStatus::Cancelled);
        assert_eq!(OrderStatus::parse("teleported"), OrderStatus::Unknown);
    }

    #[test]
    fn test_every_status_has_label() {
        let all = [
            OrderStatus::Pending,
            OrderStatus::Confirmed,
            OrderStatus::Processing,
            OrderStatus::Packed,
            OrderStatus::Shipped,
            OrderStatus::OutForDelivery,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
            OrderStatus::Returned,
            OrderStatus::Unknown,
        ];
        for status in all {
            assert!(!status.label().is_empty());
            if status != OrderStatus::Unknown {
                assert_eq!(OrderStatus::parse(status.as_str()), status);
            }
        }
    }

    #[test]
    fn test_cancellable_and_terminal() {
        assert!(OrderStatus::Pending.is_cancellable());
        assert!(OrderStatus::Confirmed.is_cancellable());
        assert!(!OrderStatus::Shipped.is_cancellable());
        assert!(OrderStatus::Delivered.is_terminal());
        assert!(!OrderStatus::OutForDelivery.is_terminal());
    }

    #[test]
    fn test_tones() {
        assert_eq!(OrderStatus::Delivered.tone(), StatusTone::Success);
        assert_eq!(OrderStatus::Cancelled.tone().css_class(), "badge-danger");
        assert_eq!(PaymentStatus::Failed.tone(), StatusTone::Danger);
    }

    #[test]
    fn test_status_serde() {
        let status: OrderStatus = serde_json::from_str("\"Delivered\"").unwrap();
        assert_eq!(status, OrderStatus::Delivered);
        assert_eq!(serde_json::to_string(&status).unwrap(), "\"delivered\"");

        let payment: PaymentStatus = serde_json::from_str("\"captured\"").unwrap();
        assert_eq!(payment, PaymentStatus::Paid);
    }

    #[test]
    fn test_payment_method() {
        let method: PaymentMethod = serde_json::from_str("\"COD\"").unwrap();
        assert_eq!(method, PaymentMethod::CashOnDelivery);
        assert_eq!(serde_json::to_string(&PaymentMethod::Online).unwrap(), "\"online\"");
        assert_eq!("cash_on_delivery".parse::<PaymentMethod>().unwrap(), PaymentMethod::CashOnDelivery);
        assert!("cheque".parse::<PaymentMethod>().is_err());
    }
}
