//! Printable invoices for placed orders.

use askama::Template;
use chrono::{DateTime, Utc};

use shreeaura_core::{PaymentMethod, PaymentStatus, Price};

use crate::api::{Address, OrderResponse};
use crate::config::StoreInfo;
use crate::filters;

/// One invoice line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceLine {
    pub name: String,
    pub unit: Option<String>,
    pub quantity: u32,
    pub unit_price: Price,
    pub line_total: Price,
}

/// An invoice built from a backend order.
#[derive(Debug, Clone)]
pub struct Invoice {
    pub number: String,
    pub order_number: String,
    pub order_date: DateTime<Utc>,
    pub issued_at: DateTime<Utc>,
    pub store: StoreInfo,
    pub bill_to: Address,
    pub lines: Vec<InvoiceLine>,
    pub subtotal: Price,
    pub shipping: Price,
    pub handling: Price,
    pub total: Price,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
}

impl Invoice {
    /// Build an invoice for `order`.
    ///
    /// Line totals are recomputed from unit price and quantity. The subtotal
    /// and total printed are always the backend's figures.
    #[must_use]
    pub fn from_order(order: &OrderResponse, store: &StoreInfo, issued_at: DateTime<Utc>) -> Self {
        let lines: Vec<InvoiceLine> = order
            .items
            .iter()
            .map(|item| InvoiceLine {
                name: item.name.clone(),
                unit: item.unit.clone(),
                quantity: item.quantity,
                unit_price: item.unit_price(),
                line_total: item.line_total(),
            })
            .collect();

        let subtotal = Price::inr(order.subtotal).unwrap_or_default();
        let recomputed: Price = lines.iter().map(|line| line.line_total).sum();
        if recomputed != subtotal {
            tracing::warn!(
                order_id = %order.id,
                backend = %subtotal,
                recomputed = %recomputed,
                "Invoice line totals disagree with order subtotal"
            );
        }

        let order_number = order.display_number();
        Self {
            number: format!("INV-{order_number}"),
            order_number,
            order_date: order.created_at,
            issued_at,
            store: store.clone(),
            bill_to: order.shipping_address.clone(),
            lines,
            subtotal,
            shipping: Price::inr(order.shipping_fee).unwrap_or_default(),
            handling: Price::inr(order.handling_fee).unwrap_or_default(),
            total: order.total_price(),
            payment_method: order.payment_method,
            payment_status: order.payment_status,
        }
    }

    /// Render as a standalone HTML document.
    ///
    /// # Errors
    ///
    /// Returns an error if the template fails to render.
    pub fn render_html(&self) -> Result<String, askama::Error> {
        InvoiceTemplate { invoice: self }.render()
    }
}

/// Printable invoice page.
#[derive(Template)]
#[template(path = "invoice.html")]
pub struct InvoiceTemplate<'a> {
    pub invoice: &'a Invoice,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn order(subtotal: f64) -> OrderResponse {
        serde_json::from_value(json!({
            "_id": "65f0c9a1b2c3d4e5f6a7b8c9",
            "orderNumber": "SA10042",
            "items": [
                { "product": "p1", "name": "Kumkumadi Oil", "price": 799, "quantity": 1, "unit": "30 ml" },
                { "product": "p2", "name": "Rose Water", "price": 120.5, "quantity": 2 }
            ],
            "shippingAddress": {
                "fullName": "Meera Iyer", "phone": "9876543210", "line1": "12 MG Road",
                "city": "Pune", "state": "Maharashtra", "pincode": "411001"
            },
            "subtotal": subtotal,
            "shippingFee": 0,
            "handlingFee": 9,
            "totalAmount": subtotal + 9.0,
            "status": "confirmed",
            "paymentStatus": "paid",
            "paymentMethod": "online",
            "createdAt": "2025-01-05T08:30:00Z"
        }))
        .unwrap()
    }

    #[test]
    fn test_invoice_numbering_and_totals() {
        let invoice = Invoice::from_order(&order(1040.0), &StoreInfo::default(), Utc::now());
        assert_eq!(invoice.number, "INV-SA10042");
        assert_eq!(invoice.lines.len(), 2);
        assert_eq!(invoice.lines[1].line_total.display(), "₹241.00");
        assert_eq!(invoice.subtotal.display(), "₹1,040.00");
        assert_eq!(invoice.total.display(), "₹1,049.00");
        assert_eq!(invoice.payment_status, PaymentStatus::Paid);
    }

    #[test]
    fn test_backend_subtotal_wins_on_mismatch() {
        let invoice = Invoice::from_order(&order(1000.0), &StoreInfo::default(), Utc::now());
        assert_eq!(invoice.subtotal.display(), "₹1,000.00");
    }

    #[test]
    fn test_render_html() {
        let store = StoreInfo {
            gstin: Some("27ABCDE1234F1Z5".to_string()),
            ..StoreInfo::default()
        };
        let invoice = Invoice::from_order(&order(1040.0), &store, Utc::now());
        let html = invoice.render_html().unwrap();
        assert!(html.contains("INV-SA10042"));
        assert!(html.contains("27ABCDE1234F1Z5"));
        assert!(html.contains("Meera Iyer"));
        assert!(html.contains("Kumkumadi Oil"));
    }
}
