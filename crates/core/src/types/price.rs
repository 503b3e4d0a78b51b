//! Type-safe price representation using decimal arithmetic.
//!
//! All catalogue prices are in Indian rupees. Amounts are kept as
//! [`Decimal`] in rupees (not paise) so backend values like `249.5` survive
//! untouched; conversion to paise only happens at the payment gateway edge.

use std::iter::Sum;
use std::ops::Add;

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// Errors constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// Prices are never negative.
    #[error("price cannot be negative: {0}")]
    Negative(Decimal),
}

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (rupees, not paise).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    #[serde(default)]
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// A zero rupee price.
    #[must_use]
    pub const fn zero() -> Self {
        Self::new(Decimal::ZERO, CurrencyCode::INR)
    }

    /// Create a rupee price, rejecting negative amounts.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Negative`] for amounts below zero.
    pub fn inr(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative(amount));
        }
        Ok(Self::new(amount, CurrencyCode::INR))
    }

    /// Create a rupee price from a whole number of paise.
    #[must_use]
    pub fn from_paise(paise: u64) -> Self {
        Self::new(Decimal::from(paise) / Decimal::ONE_HUNDRED, CurrencyCode::INR)
    }

    /// Amount in paise, rounded half away from zero.
    ///
    /// Returns `None` if the amount does not fit in a `u64`.
    #[must_use]
    pub fn paise(&self) -> Option<u64> {
        (self.amount * Decimal::ONE_HUNDRED)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_u64()
    }

    /// Multiply a unit price by a quantity.
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Self::new(self.amount * Decimal::from(quantity), self.currency_code)
    }

    /// Add two prices of the same currency.
    ///
    /// Returns `None` on a currency mismatch or overflow.
    #[must_use]
    pub fn checked_add(self, other: Self) -> Option<Self> {
        if self.currency_code != other.currency_code {
            return None;
        }
        self.amount
            .checked_add(other.amount)
            .map(|amount| Self::new(amount, self.currency_code))
    }

    /// Subtract, flooring at zero.
    #[must_use]
    pub fn saturating_sub(self, other: Self) -> Self {
        let diff = self.amount - other.amount;
        Self::new(diff.max(Decimal::ZERO), self.currency_code)
    }

    /// Whether the amount is exactly zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    /// Format for display, e.g. `₹1,23,456.50`.
    ///
    /// Rupee amounts use Indian digit grouping (last three digits, then
    /// pairs).
    #[must_use]
    pub fn display(&self) -> String {
        let rounded = self.amount.round_dp(2);
        let text = format!("{rounded:.2}");
        let (sign, unsigned) = text
            .strip_prefix('-')
            .map_or(("", text.as_str()), |rest| ("-", rest));
        let (whole, frac) = unsigned.split_once('.').unwrap_or((unsigned, "00"));

        let grouped = match self.currency_code {
            CurrencyCode::INR => group_indian(whole),
            CurrencyCode::USD => group_thousands(whole),
        };

        format!("{sign}{}{grouped}.{frac}", self.currency_code.symbol())
    }
}

impl Default for Price {
    fn default() -> Self {
        Self::zero()
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.amount + rhs.amount, self.currency_code)
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::zero(), Add::add)
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.display())
    }
}

/// ISO 4217 currency codes the storefront can display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    INR,
    USD,
}

impl CurrencyCode {
    /// Currency symbol for display.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::INR => "₹",
            Self::USD => "$",
        }
    }

    /// ISO code, as sent to the payment gateway.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::INR => "INR",
            Self::USD => "USD",
        }
    }
}

/// `1234567` -> `12,34,567`
fn group_indian(digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_owned();
    }
    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups: Vec<&str> = Vec::new();
    let mut rest = head;
    while rest.len() > 2 {
        let (front, pair) = rest.split_at(rest.len() - 2);
        groups.push(pair);
        rest = front;
    }
    if !rest.is_empty() {
        groups.push(rest);
    }
    groups.reverse();
    format!("{},{tail}", groups.join(","))
}

/// `1234567` -> `1,234,567`
fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn inr(s: &str) -> Price {
        Price::inr(Decimal::from_str(s).unwrap()).unwrap()
    }

    #[test]
    fn test_display_indian_grouping() {
        assert_eq!(inr("0").display(), "₹0.00");
        assert_eq!(inr("49").display(), "₹49.00");
        assert_eq!(inr("999.5").display(), "₹999.50");
        assert_eq!(inr("1234.5").display(), "₹1,234.50");
        assert_eq!(inr("123456").display(), "₹1,23,456.00");
        assert_eq!(inr("12345678.999").display(), "₹1,23,45,679.00");
    }

    #[test]
    fn test_display_usd_grouping() {
        let price = Price::new(Decimal::from(1_234_567), CurrencyCode::USD);
        assert_eq!(price.display(), "$1,234,567.00");
    }

    #[test]
    fn test_negative_rejected() {
        assert!(matches!(
            Price::inr(Decimal::from(-1)),
            Err(PriceError::Negative(_))
        ));
    }

    #[test]
    fn test_paise_round_trip() {
        let price = inr("249.99");
        assert_eq!(price.paise(), Some(24_999));
        assert_eq!(Price::from_paise(24_999), price);
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(inr("12.5").times(3), inr("37.5"));
        assert_eq!(inr("10") + inr("2.25"), inr("12.25"));
        assert_eq!(inr("10").saturating_sub(inr("25")), Price::zero());
        let total: Price = [inr("1"), inr("2"), inr("3")].into_iter().sum();
        assert_eq!(total, inr("6"));
    }

    #[test]
    fn test_checked_add_rejects_mixed_currency() {
        assert_eq!(inr("1").checked_add(inr("2")), Some(inr("3")));
        let usd = Price::new(Decimal::ONE, CurrencyCode::USD);
        assert_eq!(inr("1").checked_add(usd), None);
    }
}
