//! Shopping cart state and quantity math.
//!
//! The cart is a flat list of lines keyed by product. It carries a snapshot of
//! the product (name, image, price, stock) taken when the line was last
//! touched so the cart page renders without a catalogue round trip.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Price, ProductId};

/// Upper bound on the quantity of a single line, independent of stock.
pub const MAX_LINE_QUANTITY: u32 = 10;

/// Default lifetime of an untouched cart.
pub const DEFAULT_CART_TTL_DAYS: i64 = 7;

/// Errors from cart mutations.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CartError {
    /// The product has no stock.
    #[error("{0} is out of stock")]
    OutOfStock(String),
    /// No line exists for the product.
    #[error("item not in cart: {0}")]
    ItemNotFound(ProductId),
}

/// A single cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: ProductId,
    pub name: String,
    pub image_url: Option<String>,
    /// Pack size, e.g. "500 g" or "100 ml".
    pub unit: Option<String>,
    pub unit_price: Price,
    /// Printed retail price, when higher than `unit_price`.
    pub mrp: Option<Price>,
    pub quantity: u32,
    /// Stock available when the line was last updated.
    pub max_quantity: u32,
}

impl CartItem {
    /// Price of the whole line.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.unit_price.times(self.quantity)
    }

    /// Amount saved against MRP for the whole line.
    #[must_use]
    pub fn savings(&self) -> Price {
        self.mrp.map_or_else(Price::zero, |mrp| {
            mrp.saturating_sub(self.unit_price).times(self.quantity)
        })
    }

    /// Highest quantity this line may hold.
    #[must_use]
    pub fn limit(&self) -> u32 {
        self.max_quantity.min(MAX_LINE_QUANTITY)
    }
}

/// The shopper's cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    pub items: Vec<CartItem>,
    pub updated_at: DateTime<Utc>,
}

impl Default for Cart {
    fn default() -> Self {
        Self::new()
    }
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            updated_at: Utc::now(),
        }
    }

    /// Add an item. If the product is already in the cart its quantity is
    /// increased instead of adding a second line.
    ///
    /// The product snapshot (price, stock, image) is refreshed from `item`.
    /// Returns the resulting line quantity, clamped to the line limit.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::OutOfStock`] when `item.max_quantity` is zero.
    pub fn add(&mut self, item: CartItem) -> Result<u32, CartError> {
        if item.limit() == 0 {
            return Err(CartError::OutOfStock(item.name));
        }

        let requested = item.quantity.max(1);
        let limit = item.limit();
        let existing = self
            .items
            .iter()
            .position(|line| line.product_id == item.product_id);

        let quantity = match existing.and_then(|index| self.items.get_mut(index)) {
            Some(line) => {
                let quantity = line.quantity.saturating_add(requested).min(limit);
                *line = CartItem { quantity, ..item };
                quantity
            }
            None => {
                let quantity = requested.min(limit);
                self.items.push(CartItem { quantity, ..item });
                quantity
            }
        };

        self.touch();
        Ok(quantity)
    }

    /// Set the quantity of a line. Zero removes the line; other values are
    /// clamped to `1..=limit`.
    ///
    /// Returns the resulting quantity (zero if removed).
    ///
    /// # Errors
    ///
    /// Returns [`CartError::ItemNotFound`] if the product is not in the cart.
    pub fn set_quantity(&mut self, product_id: &ProductId, quantity: u32) -> Result<u32, CartError> {
        if quantity == 0 {
            self.remove(product_id)?;
            return Ok(0);
        }

        let line = self
            .line_mut(product_id)
            .ok_or_else(|| CartError::ItemNotFound(product_id.clone()))?;
        let clamped = quantity.clamp(1, line.limit().max(1));
        line.quantity = clamped;
        self.touch();
        Ok(clamped)
    }

    /// Increase a line by one, up to its limit.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::ItemNotFound`] if the product is not in the cart.
    pub fn increment(&mut self, product_id: &ProductId) -> Result<u32, CartError> {
        let current = self
            .quantity_of(product_id)
            .ok_or_else(|| CartError::ItemNotFound(product_id.clone()))?;
        self.set_quantity(product_id, current.saturating_add(1))
    }

    /// Decrease a line by one; decrementing a single item removes the line.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::ItemNotFound`] if the product is not in the cart.
    pub fn decrement(&mut self, product_id: &ProductId) -> Result<u32, CartError> {
        let current = self
            .quantity_of(product_id)
            .ok_or_else(|| CartError::ItemNotFound(product_id.clone()))?;
        self.set_quantity(product_id, current.saturating_sub(1))
    }

    /// Remove a line.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::ItemNotFound`] if the product is not in the cart.
    pub fn remove(&mut self, product_id: &ProductId) -> Result<CartItem, CartError> {
        let index = self
            .items
            .iter()
            .position(|line| &line.product_id == product_id)
            .ok_or_else(|| CartError::ItemNotFound(product_id.clone()))?;
        let removed = self.items.remove(index);
        self.touch();
        Ok(removed)
    }

    /// Remove every line.
    pub fn clear(&mut self) {
        self.items.clear();
        self.touch();
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Quantity of a product, if present.
    #[must_use]
    pub fn quantity_of(&self, product_id: &ProductId) -> Option<u32> {
        self.items
            .iter()
            .find(|line| &line.product_id == product_id)
            .map(|line| line.quantity)
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|line| line.quantity).sum()
    }

    /// Sum of price x quantity over all lines.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Total saved against MRP.
    #[must_use]
    pub fn savings(&self) -> Price {
        self.items.iter().map(CartItem::savings).sum()
    }

    /// Whether the cart has gone untouched for longer than `ttl`.
    #[must_use]
    pub fn is_stale(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        self.updated_at + ttl < now
    }

    fn line_mut(&mut self, product_id: &ProductId) -> Option<&mut CartItem> {
        self.items
            .iter_mut()
            .find(|line| &line.product_id == product_id)
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn item(id: &str, price: i64, quantity: u32, stock: u32) -> CartItem {
        CartItem {
            product_id: ProductId::new(id),
            name: format!("Product {id}"),
            image_url: None,
            unit: Some("1 kg".to_string()),
            unit_price: Price::inr(Decimal::from(price)).unwrap(),
            mrp: None,
            quantity,
            max_quantity: stock,
        }
    }

    #[test]
    fn test_adding_same_product_increments() {
        let mut cart = Cart::new();
        cart.add(item("rice", 120, 1, 50)).unwrap();
        cart.add(item("rice", 120, 2, 50)).unwrap();

        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.quantity_of(&ProductId::new("rice")), Some(3));
    }

    #[test]
    fn test_add_refreshes_snapshot_price() {
        let mut cart = Cart::new();
        cart.add(item("dal", 100, 1, 50)).unwrap();
        cart.add(item("dal", 90, 1, 50)).unwrap();
        assert_eq!(cart.subtotal(), Price::inr(Decimal::from(180)).unwrap());
    }

    #[test]
    fn test_add_clamps_to_stock_and_line_limit() {
        let mut cart = Cart::new();
        assert_eq!(cart.add(item("ghee", 500, 5, 3)).unwrap(), 3);
        assert_eq!(cart.add(item("ghee", 500, 1, 3)).unwrap(), 3);

        assert_eq!(cart.add(item("salt", 20, 8, 100)).unwrap(), 8);
        assert_eq!(cart.add(item("salt", 20, 8, 100)).unwrap(), MAX_LINE_QUANTITY);
    }

    #[test]
    fn test_add_zero_quantity_counts_as_one() {
        let mut cart = Cart::new();
        assert_eq!(cart.add(item("soap", 35, 0, 10)).unwrap(), 1);
    }

    #[test]
    fn test_add_out_of_stock() {
        let mut cart = Cart::new();
        let err = cart.add(item("saffron", 900, 1, 0)).unwrap_err();
        assert!(matches!(err, CartError::OutOfStock(_)));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_set_quantity_zero_removes() {
        let mut cart = Cart::new();
        cart.add(item("tea", 250, 2, 10)).unwrap();
        assert_eq!(cart.set_quantity(&ProductId::new("tea"), 0).unwrap(), 0);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_set_quantity_clamps() {
        let mut cart = Cart::new();
        cart.add(item("oil", 180, 1, 4)).unwrap();
        assert_eq!(cart.set_quantity(&ProductId::new("oil"), 9).unwrap(), 4);
    }

    #[test]
    fn test_set_quantity_unknown_item() {
        let mut cart = Cart::new();
        assert_eq!(
            cart.set_quantity(&ProductId::new("nope"), 2),
            Err(CartError::ItemNotFound(ProductId::new("nope")))
        );
    }

    #[test]
    fn test_increment_decrement() {
        let mut cart = Cart::new();
        let id = ProductId::new("atta");
        cart.add(item("atta", 300, 1, 5)).unwrap();
        assert_eq!(cart.increment(&id).unwrap(), 2);
        assert_eq!(cart.decrement(&id).unwrap(), 1);
        assert_eq!(cart.decrement(&id).unwrap(), 0);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_totals() {
        let mut cart = Cart::new();
        cart.add(item("a", 120, 2, 10)).unwrap();
        cart.add(item("b", 45, 3, 10)).unwrap();

        assert_eq!(cart.item_count(), 5);
        assert_eq!(cart.subtotal(), Price::inr(Decimal::from(375)).unwrap());
    }

    #[test]
    fn test_savings_against_mrp() {
        let mut cart = Cart::new();
        let mut line = item("cream", 240, 2, 10);
        line.mrp = Some(Price::inr(Decimal::from(300)).unwrap());
        cart.add(line).unwrap();
        assert_eq!(cart.savings(), Price::inr(Decimal::from(120)).unwrap());
    }

    #[test]
    fn test_staleness() {
        let mut cart = Cart::new();
        let now = Utc::now();
        cart.updated_at = now - Duration::days(8);
        assert!(cart.is_stale(now, Duration::days(DEFAULT_CART_TTL_DAYS)));
        cart.updated_at = now - Duration::days(6);
        assert!(!cart.is_stale(now, Duration::days(DEFAULT_CART_TTL_DAYS)));
    }

    #[test]
    fn test_clear() {
        let mut cart = Cart::new();
        cart.add(item("a", 1, 1, 1)).unwrap();
        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.subtotal(), Price::zero());
    }
}
