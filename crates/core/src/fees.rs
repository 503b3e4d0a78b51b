//! Shipping and handling fee computation.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{CurrencyCode, Price};

/// Delivery fee rules applied at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSchedule {
    /// Flat delivery charge below the free shipping threshold.
    pub shipping_fee: Price,
    /// Subtotal at or above which delivery is free.
    pub free_shipping_threshold: Price,
    /// Per-order packing/handling charge.
    pub handling_fee: Price,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            shipping_fee: Price::new(Decimal::from(49), CurrencyCode::INR),
            free_shipping_threshold: Price::new(Decimal::from(499), CurrencyCode::INR),
            handling_fee: Price::new(Decimal::from(9), CurrencyCode::INR),
        }
    }
}

/// A fee quote for a given subtotal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTotals {
    pub subtotal: Price,
    pub shipping: Price,
    pub handling: Price,
    pub total: Price,
    /// How much more the shopper must add to get free delivery, when
    /// delivery is being charged.
    pub free_shipping_gap: Option<Price>,
}

impl FeeSchedule {
    /// Quote fees for a cart subtotal.
    ///
    /// An empty cart (zero subtotal) carries no fees. Delivery is waived once
    /// the subtotal reaches the threshold; handling always applies otherwise.
    #[must_use]
    pub fn quote(&self, subtotal: Price) -> OrderTotals {
        if subtotal.is_zero() {
            return OrderTotals {
                subtotal,
                shipping: Price::zero(),
                handling: Price::zero(),
                total: subtotal,
                free_shipping_gap: None,
            };
        }

        let free_shipping = subtotal.amount >= self.free_shipping_threshold.amount;
        let shipping = if free_shipping {
            Price::zero()
        } else {
            self.shipping_fee
        };
        let free_shipping_gap =
            (!free_shipping).then(|| self.free_shipping_threshold.saturating_sub(subtotal));

        OrderTotals {
            subtotal,
            shipping,
            handling: self.handling_fee,
            total: subtotal + shipping + self.handling_fee,
            free_shipping_gap,
        }
    }
}
