//! Checkout orchestration.
//!
//! Placing an order is a linear sequence of backend calls: sync the profile,
//! post the order, then (for online payment) open a gateway order. A failure
//! part way through is reported to the shopper; nothing is rolled back.

use serde::Deserialize;
use tracing::instrument;

use shreeaura_core::{
    Cart, Email, FeeSchedule, OrderId, OrderTotals, PaymentMethod, Phone, Pincode,
};

use crate::api::{
    Address, ApiClient, ApiError, OrderItemRequest, OrderResponse, PaymentOrder,
    PaymentVerification, PlaceOrderRequest, ProfileUpdate,
};
use crate::config::PaymentConfig;
use crate::models::CurrentCustomer;

/// Address form field that failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressField {
    FullName,
    Phone,
    Email,
    Line1,
    City,
    State,
    Pincode,
}

impl AddressField {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::FullName => "full name",
            Self::Phone => "phone number",
            Self::Email => "email address",
            Self::Line1 => "address",
            Self::City => "city",
            Self::State => "state",
            Self::Pincode => "pincode",
        }
    }
}

/// Errors that can occur during checkout.
#[derive(Debug, thiserror::Error)]
pub enum CheckoutError {
    #[error("cart is empty")]
    EmptyCart,

    #[error("invalid {}", .0.label())]
    InvalidAddress(AddressField),

    /// Online payment was chosen but no gateway key is configured.
    #[error("online payment is not available")]
    PaymentUnavailable,

    /// The order was placed but the gateway order could not be created.
    #[error("could not start payment for order {order_id}: {source}")]
    PaymentSetup {
        order_id: OrderId,
        #[source]
        source: ApiError,
    },

    /// The backend rejected the payment signature.
    #[error("payment verification failed: {0}")]
    PaymentFailed(String),

    #[error("API error: {0}")]
    Api(#[from] ApiError),
}

impl CheckoutError {
    /// Message that is safe to show to the shopper in a toast.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::EmptyCart => "Your cart is empty.".to_string(),
            Self::InvalidAddress(field) => format!("Please enter a valid {}.", field.label()),
            Self::PaymentUnavailable => {
                "Online payment is unavailable right now. Please choose cash on delivery."
                    .to_string()
            }
            Self::PaymentSetup { .. } => {
                "Your order was placed but we couldn't start the payment. You can pay on delivery or contact support."
                    .to_string()
            }
            Self::PaymentFailed(_) => {
                "We couldn't confirm your payment. If money was debited it will be refunded."
                    .to_string()
            }
            Self::Api(err) => err.user_message(),
        }
    }
}

/// The checkout address form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckoutForm {
    pub full_name: String,
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    pub line1: String,
    #[serde(default)]
    pub line2: Option<String>,
    #[serde(default)]
    pub landmark: Option<String>,
    pub city: String,
    pub state: String,
    pub pincode: String,
    #[serde(default)]
    pub payment_method: PaymentMethod,
}

/// A checkout form that passed validation.
#[derive(Debug, Clone)]
pub struct ValidatedCheckout {
    pub address: Address,
    pub email: Option<Email>,
    pub payment_method: PaymentMethod,
}

impl CheckoutForm {
    /// Pre-fill the form from a saved profile address.
    #[must_use]
    pub fn from_address(address: &Address, email: Option<&str>) -> Self {
        Self {
            full_name: address.full_name.clone(),
            phone: address.phone.clone(),
            email: email.map(str::to_owned),
            line1: address.line1.clone(),
            line2: address.line2.clone(),
            landmark: address.landmark.clone(),
            city: address.city.clone(),
            state: address.state.clone(),
            pincode: address.pincode.clone(),
            payment_method: PaymentMethod::default(),
        }
    }

    /// Validate and normalise the form.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::InvalidAddress` naming the first bad field.
    pub fn validate(&self) -> Result<ValidatedCheckout, CheckoutError> {
        let full_name = required(&self.full_name, AddressField::FullName)?;
        let phone =
            Phone::parse(&self.phone).map_err(|_| CheckoutError::InvalidAddress(AddressField::Phone))?;
        let email = Email::parse_optional(self.email.as_deref())
            .map_err(|_| CheckoutError::InvalidAddress(AddressField::Email))?;
        let line1 = required(&self.line1, AddressField::Line1)?;
        let city = required(&self.city, AddressField::City)?;
        let state = required(&self.state, AddressField::State)?;
        let pincode = Pincode::parse(&self.pincode)
            .map_err(|_| CheckoutError::InvalidAddress(AddressField::Pincode))?;

        Ok(ValidatedCheckout {
            address: Address {
                full_name,
                phone: phone.as_str().to_owned(),
                line1,
                line2: optional(self.line2.as_deref()),
                landmark: optional(self.landmark.as_deref()),
                city,
                state,
                pincode: pincode.as_str().to_owned(),
            },
            email,
            payment_method: self.payment_method,
        })
    }
}

fn required(value: &str, field: AddressField) -> Result<String, CheckoutError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(CheckoutError::InvalidAddress(field));
    }
    Ok(value.to_owned())
}

fn optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

/// Result of a successful checkout submission.
#[derive(Debug)]
pub enum CheckoutOutcome {
    /// Cash on delivery: the order is placed and nothing else is needed.
    Placed(Box<OrderResponse>),
    /// Online payment: the shopper must complete the gateway checkout.
    AwaitingPayment {
        order: Box<OrderResponse>,
        payment: PaymentOrder,
    },
}

/// Checkout service.
pub struct CheckoutService<'a> {
    api: &'a ApiClient,
    fees: &'a FeeSchedule,
    payment: &'a PaymentConfig,
}

impl<'a> CheckoutService<'a> {
    #[must_use]
    pub const fn new(api: &'a ApiClient, fees: &'a FeeSchedule, payment: &'a PaymentConfig) -> Self {
        Self { api, fees, payment }
    }

    /// Quote totals for a cart.
    #[must_use]
    pub fn quote(&self, cart: &Cart) -> OrderTotals {
        self.fees.quote(cart.subtotal())
    }

    /// Place an order for the cart.
    ///
    /// The cart is left untouched; the caller clears it once the outcome is
    /// known.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::EmptyCart`, `CheckoutError::InvalidAddress`,
    /// `CheckoutError::PaymentUnavailable`, or an API failure.
    #[instrument(skip_all, fields(user_id = %customer.user_id, items = cart.items.len()))]
    pub async fn place_order(
        &self,
        customer: &CurrentCustomer,
        cart: &Cart,
        form: &CheckoutForm,
    ) -> Result<CheckoutOutcome, CheckoutError> {
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let checkout = form.validate()?;

        if checkout.payment_method == PaymentMethod::Online && !self.payment.online_enabled() {
            return Err(CheckoutError::PaymentUnavailable);
        }

        self.sync_profile(customer, &checkout).await;

        let totals = self.quote(cart);
        let request = PlaceOrderRequest {
            items: cart
                .items
                .iter()
                .map(|line| OrderItemRequest {
                    product_id: line.product_id.clone(),
                    name: line.name.clone(),
                    quantity: line.quantity,
                    price: line.unit_price.amount,
                })
                .collect(),
            shipping_address: checkout.address,
            payment_method: checkout.payment_method,
            subtotal: totals.subtotal.amount,
            shipping_fee: totals.shipping.amount,
            handling_fee: totals.handling.amount,
            total: totals.total.amount,
        };

        let order = self.api.place_order(&customer.token, &request).await?;
        tracing::info!(order_id = %order.id, total = %order.total, "Order placed");

        match checkout.payment_method {
            PaymentMethod::CashOnDelivery => Ok(CheckoutOutcome::Placed(Box::new(order))),
            PaymentMethod::Online => {
                let payment = self
                    .api
                    .create_payment_order(&customer.token, &order.id)
                    .await
                    .map_err(|source| CheckoutError::PaymentSetup {
                        order_id: order.id.clone(),
                        source,
                    })?;
                Ok(CheckoutOutcome::AwaitingPayment {
                    order: Box::new(order),
                    payment,
                })
            }
        }
    }

    /// Relay the gateway callback to the backend.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::PaymentFailed` if the backend rejects the
    /// signature, or an API failure.
    #[instrument(skip_all, fields(order_id = %verification.order_id))]
    pub async fn confirm_payment(
        &self,
        customer: &CurrentCustomer,
        verification: &PaymentVerification,
    ) -> Result<(), CheckoutError> {
        let result = self
            .api
            .verify_payment(&customer.token, verification)
            .await?;

        if !result.success {
            let message = result
                .message
                .unwrap_or_else(|| "signature rejected".to_string());
            tracing::warn!(%message, "Payment verification failed");
            return Err(CheckoutError::PaymentFailed(message));
        }

        tracing::info!("Payment verified");
        Ok(())
    }

    /// Save the delivery details to the profile. Failure does not block the
    /// order.
    async fn sync_profile(&self, customer: &CurrentCustomer, checkout: &ValidatedCheckout) {
        let update = ProfileUpdate {
            name: checkout.address.full_name.clone(),
            email: checkout.email.as_ref().map(|e| e.as_str().to_owned()),
            address: Some(checkout.address.clone()),
        };
        if let Err(e) = self.api.update_profile(&customer.token, &update).await {
            tracing::warn!(error = %e, "Profile sync failed, continuing with order");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form() -> CheckoutForm {
        CheckoutForm {
            full_name: " Meera Iyer ".to_string(),
            phone: "+91 98765 43210".to_string(),
            email: Some(String::new()),
            line1: "12 MG Road".to_string(),
            line2: Some("  ".to_string()),
            landmark: None,
            city: "Pune".to_string(),
            state: "Maharashtra".to_string(),
            pincode: "411001".to_string(),
            payment_method: PaymentMethod::CashOnDelivery,
        }
    }

    #[test]
    fn test_valid_form_is_normalised() {
        let checkout = form().validate().unwrap();
        assert_eq!(checkout.address.full_name, "Meera Iyer");
        assert_eq!(checkout.address.phone, "9876543210");
        assert_eq!(checkout.address.line2, None);
        assert_eq!(checkout.email, None);
    }

    #[test]
    fn test_invalid_fields() {
        let cases: [(fn(&mut CheckoutForm), AddressField); 5] = [
            (|f| f.full_name = "  ".to_string(), AddressField::FullName),
            (|f| f.phone = "12345".to_string(), AddressField::Phone),
            (|f| f.email = Some("meera@".to_string()), AddressField::Email),
            (|f| f.city = String::new(), AddressField::City),
            (|f| f.pincode = "011001".to_string(), AddressField::Pincode),
        ];

        for (mutate, field) in cases {
            let mut form = form();
            mutate(&mut form);
            let err = form.validate().unwrap_err();
            assert!(
                matches!(err, CheckoutError::InvalidAddress(f) if f == field),
                "expected {field:?}, got {err:?}"
            );
        }
    }

    #[test]
    fn test_user_messages() {
        assert_eq!(
            CheckoutError::InvalidAddress(AddressField::Pincode).user_message(),
            "Please enter a valid pincode."
        );
        assert_eq!(CheckoutError::EmptyCart.to_string(), "cart is empty");
    }

    #[test]
    fn test_form_deserializes_payment_method() {
        let form: CheckoutForm = serde_json::from_value(serde_json::json!({
            "full_name": "A", "phone": "9876543210", "line1": "x",
            "city": "Pune", "state": "MH", "pincode": "411001",
            "payment_method": "online"
        }))
        .unwrap();
        assert_eq!(form.payment_method, PaymentMethod::Online);
    }
}
