//! Records exchanged with the Shree Aura REST API.
//!
//! The backend speaks camelCase JSON with document-style `_id` fields. These
//! types mirror that contract; validation beyond what serde enforces happens
//! at the call sites (checkout, review forms).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use shreeaura_core::{
    CartItem, CategoryId, OrderId, OrderStatus, PaymentMethod, PaymentStatus, Price, ProductId,
    ReviewId, UserId,
};

// =============================================================================
// Auth Types
// =============================================================================

/// Bearer token issued by the backend after OTP verification.
///
/// Implements `Debug` manually so tokens never end up in logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessToken(String);

impl AccessToken {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token, for the `Authorization` header.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AccessToken([REDACTED])")
    }
}

#[derive(Debug, Serialize)]
pub struct SendOtpRequest<'a> {
    pub phone: &'a str,
}

#[derive(Debug, Serialize)]
pub struct VerifyOtpRequest<'a> {
    pub phone: &'a str,
    pub otp: &'a str,
}

/// Successful OTP verification.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub token: AccessToken,
    pub user: User,
}

// =============================================================================
// Catalogue Types
// =============================================================================

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    #[serde(rename = "_id", alias = "id")]
    pub id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

impl Category {
    /// URL segment for the category page: slug when present, else the id.
    #[must_use]
    pub fn path_segment(&self) -> &str {
        self.slug.as_deref().unwrap_or_else(|| self.id.as_str())
    }
}

/// A product's category: the backend sends either a bare id or a populated
/// category document depending on the endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CategoryRef {
    Populated(Category),
    Id(CategoryId),
}

impl CategoryRef {
    /// Whether this reference points at the category with the given slug or id.
    #[must_use]
    pub fn matches(&self, slug_or_id: &str) -> bool {
        match self {
            Self::Populated(category) => {
                category.id.as_str() == slug_or_id
                    || category
                        .slug
                        .as_deref()
                        .is_some_and(|slug| slug.eq_ignore_ascii_case(slug_or_id))
            }
            Self::Id(id) => id.as_str() == slug_or_id,
        }
    }

    /// Display name, when the category was populated.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Populated(category) => Some(&category.name),
            Self::Id(_) => None,
        }
    }
}

/// A catalogue product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(rename = "_id", alias = "id")]
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub category: Option<CategoryRef>,
    #[serde(default)]
    pub images: Vec<String>,
    pub price: Decimal,
    #[serde(default)]
    pub mrp: Option<Decimal>,
    /// Pack size, e.g. "500 g".
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub stock: u32,
    #[serde(default)]
    pub rating: Option<f32>,
    #[serde(default, alias = "numReviews")]
    pub review_count: u32,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Product {
    /// Selling price.
    #[must_use]
    pub fn selling_price(&self) -> Price {
        Price::inr(self.price).unwrap_or_default()
    }

    /// Printed retail price, only when it is above the selling price.
    #[must_use]
    pub fn mrp_price(&self) -> Option<Price> {
        self.mrp
            .filter(|mrp| *mrp > self.price)
            .and_then(|mrp| Price::inr(mrp).ok())
    }

    /// Whole-number discount against MRP, e.g. `20` for 20% off.
    #[must_use]
    pub fn discount_percent(&self) -> Option<u32> {
        let mrp = self.mrp.filter(|mrp| *mrp > self.price && !mrp.is_zero())?;
        let percent = (mrp - self.price) / mrp * Decimal::ONE_HUNDRED;
        percent.round().to_u32().filter(|p| *p > 0)
    }

    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }

    /// First image, used for cards and cart lines.
    #[must_use]
    pub fn primary_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }

    /// Snapshot this product as a cart line.
    #[must_use]
    pub fn to_cart_item(&self, quantity: u32) -> CartItem {
        CartItem {
            product_id: self.id.clone(),
            name: self.name.clone(),
            image_url: self.primary_image().map(str::to_owned),
            unit: self.unit.clone(),
            unit_price: self.selling_price(),
            mrp: self.mrp_price(),
            quantity,
            max_quantity: self.stock,
        }
    }
}

/// One page of a product listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductPage {
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default)]
    pub total: u32,
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(default = "first_page")]
    pub pages: u32,
}

const fn first_page() -> u32 {
    1
}

/// Query for the product listing endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProductQuery {
    pub page: u32,
    pub limit: u32,
    /// Category slug or id.
    pub category: Option<String>,
    /// Backend sort key.
    pub sort: Option<String>,
    pub featured: bool,
}

impl Default for ProductQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 24,
            category: None,
            sort: None,
            featured: false,
        }
    }
}

/// A product review.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    #[serde(rename = "_id", alias = "id")]
    pub id: ReviewId,
    #[serde(default, alias = "name")]
    pub user_name: Option<String>,
    pub rating: u8,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct NewReview<'a> {
    pub rating: u8,
    pub comment: &'a str,
}

// =============================================================================
// Customer Types
// =============================================================================

/// A delivery address as stored by the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub full_name: String,
    pub phone: String,
    pub line1: String,
    #[serde(default)]
    pub line2: Option<String>,
    #[serde(default)]
    pub landmark: Option<String>,
    pub city: String,
    pub state: String,
    pub pincode: String,
}

impl Address {
    /// Address lines for display, skipping blanks.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![self.line1.clone()];
        lines.extend(
            [&self.line2, &self.landmark]
                .into_iter()
                .flatten()
                .filter(|line| !line.trim().is_empty())
                .cloned(),
        );
        lines.push(format!("{}, {} {}", self.city, self.state, self.pincode));
        lines
    }
}

/// The logged-in customer's profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id", alias = "id")]
    pub id: UserId,
    #[serde(default)]
    pub name: Option<String>,
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<Address>,
}

/// Profile fields the storefront can update.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
}

// =============================================================================
// Order Types
// =============================================================================

/// A line of a placed order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    #[serde(alias = "product")]
    pub product_id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub quantity: u32,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
}

impl OrderItem {
    #[must_use]
    pub fn unit_price(&self) -> Price {
        Price::inr(self.price).unwrap_or_default()
    }

    #[must_use]
    pub fn line_total(&self) -> Price {
        self.unit_price().times(self.quantity)
    }
}

/// An order as returned by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    #[serde(rename = "_id", alias = "id")]
    pub id: OrderId,
    #[serde(default)]
    pub order_number: Option<String>,
    pub items: Vec<OrderItem>,
    pub shipping_address: Address,
    pub subtotal: Decimal,
    #[serde(default)]
    pub shipping_fee: Decimal,
    #[serde(default)]
    pub handling_fee: Decimal,
    #[serde(alias = "totalAmount")]
    pub total: Decimal,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    pub created_at: DateTime<Utc>,
}

impl OrderResponse {
    /// Human-facing order number: the backend's, or the id's tail.
    #[must_use]
    pub fn display_number(&self) -> String {
        if let Some(number) = self.order_number.as_deref().filter(|n| !n.is_empty()) {
            return number.to_owned();
        }
        let id = self.id.as_str();
        let tail = id
            .char_indices()
            .rev()
            .nth(7)
            .map_or(id, |(index, _)| &id[index..]);
        tail.to_uppercase()
    }

    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    #[must_use]
    pub fn total_price(&self) -> Price {
        Price::inr(self.total).unwrap_or_default()
    }
}

/// Line of an order being placed.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemRequest {
    pub product_id: ProductId,
    pub name: String,
    pub quantity: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
}

/// Payload for `POST /api/orders`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderRequest {
    pub items: Vec<OrderItemRequest>,
    pub shipping_address: Address,
    pub payment_method: PaymentMethod,
    #[serde(with = "rust_decimal::serde::float")]
    pub subtotal: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub shipping_fee: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub handling_fee: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
}

// =============================================================================
// Payment Types
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentRequest<'a> {
    pub order_id: &'a OrderId,
}

/// A payment gateway order created for an online-paid order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentOrder {
    #[serde(alias = "id", alias = "razorpayOrderId")]
    pub gateway_order_id: String,
    /// Amount in paise.
    pub amount: u64,
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Public key id, when the backend supplies one.
    #[serde(default)]
    pub key_id: Option<String>,
}

fn default_currency() -> String {
    "INR".to_string()
}

/// Callback fields posted by the gateway checkout widget.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentVerification {
    pub order_id: OrderId,
    pub gateway_order_id: String,
    pub payment_id: String,
    pub signature: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentVerificationResult {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// Error body returned by the backend.
#[derive(Debug, Default, Deserialize)]
pub struct ApiMessage {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn product_json() -> serde_json::Value {
        json!({
            "_id": "p1",
            "name": "Kumkumadi Face Oil",
            "slug": "kumkumadi-face-oil",
            "brand": "Aura Naturals",
            "category": { "_id": "c1", "name": "Skin Care", "slug": "skin-care" },
            "images": ["https://cdn.shreeaura.in/p1.jpg"],
            "price": 799.0,
            "mrp": 999,
            "unit": "30 ml",
            "stock": 12,
            "rating": 4.6,
            "numReviews": 38,
            "createdAt": "2024-11-02T10:00:00Z"
        })
    }

    #[test]
    fn test_product_deserializes_backend_shape() {
        let product: Product = serde_json::from_value(product_json()).unwrap();
        assert_eq!(product.id.as_str(), "p1");
        assert_eq!(product.review_count, 38);
        assert!(product.category.as_ref().unwrap().matches("skin-care"));
        assert!(product.category.as_ref().unwrap().matches("c1"));
        assert_eq!(product.discount_percent(), Some(20));
        assert_eq!(product.primary_image(), Some("https://cdn.shreeaura.in/p1.jpg"));
    }

    #[test]
    fn test_category_ref_as_bare_id() {
        let mut value = product_json();
        value["category"] = json!("c9");
        let product: Product = serde_json::from_value(value).unwrap();
        assert_eq!(product.category, Some(CategoryRef::Id(CategoryId::new("c9"))));
        assert!(product.category.unwrap().name().is_none());
    }

    #[test]
    fn test_discount_requires_higher_mrp() {
        let mut product: Product = serde_json::from_value(product_json()).unwrap();
        product.mrp = Some(Decimal::from(500));
        assert_eq!(product.discount_percent(), None);
        assert_eq!(product.mrp_price(), None);
    }

    #[test]
    fn test_to_cart_item_snapshot() {
        let product: Product = serde_json::from_value(product_json()).unwrap();
        let item = product.to_cart_item(2);
        assert_eq!(item.quantity, 2);
        assert_eq!(item.max_quantity, 12);
        assert_eq!(item.unit_price.display(), "₹799.00");
        assert_eq!(item.mrp.unwrap().display(), "₹999.00");
    }

    #[test]
    fn test_order_display_number() {
        let order: OrderResponse = serde_json::from_value(json!({
            "_id": "65f0c9a1b2c3d4e5f6a7b8c9",
            "items": [],
            "shippingAddress": {
                "fullName": "Meera", "phone": "9876543210", "line1": "12 MG Road",
                "city": "Pune", "state": "MH", "pincode": "411001"
            },
            "subtotal": 100,
            "totalAmount": 158,
            "status": "Shipped",
            "paymentMethod": "COD",
            "createdAt": "2025-01-05T08:30:00Z"
        }))
        .unwrap();

        assert_eq!(order.display_number(), "F6A7B8C9");
        assert_eq!(order.status, OrderStatus::Shipped);
        assert_eq!(order.payment_method, PaymentMethod::CashOnDelivery);
        assert_eq!(order.total_price().display(), "₹158.00");
    }

    #[test]
    fn test_place_order_serializes_numbers() {
        let request = PlaceOrderRequest {
            items: vec![OrderItemRequest {
                product_id: ProductId::new("p1"),
                name: "Oil".to_string(),
                quantity: 2,
                price: Decimal::new(2495, 1),
            }],
            shipping_address: Address::default(),
            payment_method: PaymentMethod::Online,
            subtotal: Decimal::new(499, 0),
            shipping_fee: Decimal::ZERO,
            handling_fee: Decimal::new(9, 0),
            total: Decimal::new(508, 0),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["items"][0]["price"], json!(249.5));
        assert_eq!(value["total"], json!(508.0));
        assert_eq!(value["paymentMethod"], json!("online"));
        assert_eq!(value["items"][0]["productId"], json!("p1"));
    }

    #[test]
    fn test_access_token_debug_redacted() {
        let token = AccessToken::new("eyJhbGciOi.secret.sig");
        assert!(!format!("{token:?}").contains("secret"));
    }

    #[test]
    fn test_address_lines_skip_blanks() {
        let address = Address {
            full_name: "Meera".to_string(),
            phone: "9876543210".to_string(),
            line1: "12 MG Road".to_string(),
            line2: Some("  ".to_string()),
            landmark: Some("Near temple".to_string()),
            city: "Pune".to_string(),
            state: "Maharashtra".to_string(),
            pincode: "411001".to_string(),
        };
        assert_eq!(
            address.lines(),
            vec!["12 MG Road", "Near temple", "Pune, Maharashtra 411001"]
        );
    }
}
