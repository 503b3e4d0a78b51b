//! Order history, detail, cancellation and invoices.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use chrono::Utc;
use tower_sessions::Session;
use tracing::instrument;

use shreeaura_core::OrderId;

use crate::api::{ApiError, OrderItem, OrderResponse};
use crate::error::AppError;
use crate::filters;
use crate::flash::{self, Toast};
use crate::invoice::Invoice;
use crate::middleware::{PageContext, RequireAuth};
use crate::state::AppState;

/// Order summary row for the history page.
#[derive(Debug, Clone)]
pub struct OrderSummaryView {
    pub id: String,
    pub number: String,
    pub date: String,
    pub item_count: u32,
    pub total: String,
    pub status_label: &'static str,
    pub status_class: &'static str,
}

impl From<&OrderResponse> for OrderSummaryView {
    fn from(order: &OrderResponse) -> Self {
        Self {
            id: order.id.to_string(),
            number: order.display_number(),
            date: order.created_at.format("%d %b %Y").to_string(),
            item_count: order.item_count(),
            total: order.total_price().display(),
            status_label: order.status.label(),
            status_class: order.status.tone().css_class(),
        }
    }
}

/// Order line for the detail page.
#[derive(Debug, Clone)]
pub struct OrderLineView {
    pub href: String,
    pub name: String,
    pub unit: Option<String>,
    pub image: Option<String>,
    pub quantity: u32,
    pub unit_price: String,
    pub line_total: String,
}

impl From<&OrderItem> for OrderLineView {
    fn from(item: &OrderItem) -> Self {
        Self {
            href: format!("/products/{}", item.product_id),
            name: item.name.clone(),
            unit: item.unit.clone(),
            image: item.image.clone(),
            quantity: item.quantity,
            unit_price: item.unit_price().display(),
            line_total: item.line_total().display(),
        }
    }
}

/// Full order detail.
#[derive(Debug, Clone)]
pub struct OrderDetailView {
    pub summary: OrderSummaryView,
    pub lines: Vec<OrderLineView>,
    pub address_name: String,
    pub address_phone: String,
    pub address_lines: Vec<String>,
    pub subtotal: String,
    pub shipping: String,
    pub handling: String,
    pub payment_method: &'static str,
    pub payment_status: &'static str,
    pub payment_class: &'static str,
    pub cancellable: bool,
}

impl From<&OrderResponse> for OrderDetailView {
    fn from(order: &OrderResponse) -> Self {
        let price = |amount| {
            shreeaura_core::Price::inr(amount)
                .unwrap_or_default()
                .display()
        };
        Self {
            summary: OrderSummaryView::from(order),
            lines: order.items.iter().map(OrderLineView::from).collect(),
            address_name: order.shipping_address.full_name.clone(),
            address_phone: order.shipping_address.phone.clone(),
            address_lines: order.shipping_address.lines(),
            subtotal: price(order.subtotal),
            shipping: price(order.shipping_fee),
            handling: price(order.handling_fee),
            payment_method: order.payment_method.label(),
            payment_status: order.payment_status.label(),
            payment_class: order.payment_status.tone().css_class(),
            cancellable: order.status.is_cancellable(),
        }
    }
}

/// Order history template.
#[derive(Template, WebTemplate)]
#[template(path = "account/orders.html")]
pub struct OrdersTemplate {
    pub page: PageContext,
    pub orders: Vec<OrderSummaryView>,
}

/// Order detail template.
#[derive(Template, WebTemplate)]
#[template(path = "account/order.html")]
pub struct OrderTemplate {
    pub page: PageContext,
    pub order: OrderDetailView,
}

/// Sort newest first.
fn newest_first(orders: &mut [OrderResponse]) {
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

/// Fetch one of the customer's orders, mapping a missing order to 404.
async fn fetch_order(
    state: &AppState,
    token: &crate::api::AccessToken,
    id: &OrderId,
) -> Result<OrderResponse, AppError> {
    match state.api().order(token, id).await {
        Ok(order) => Ok(order),
        Err(ApiError::NotFound(_)) => Err(AppError::NotFound(format!("order {id}"))),
        Err(e) => Err(e.into()),
    }
}

/// Display the order history.
#[instrument(skip(state, page, customer))]
pub async fn index(
    State(state): State<AppState>,
    page: PageContext,
    RequireAuth(customer): RequireAuth,
) -> Result<impl IntoResponse, AppError> {
    let mut orders = state.api().my_orders(&customer.token).await?;
    newest_first(&mut orders);

    Ok(OrdersTemplate {
        page,
        orders: orders.iter().map(OrderSummaryView::from).collect(),
    })
}

/// Display one order.
#[instrument(skip(state, page, customer))]
pub async fn show(
    State(state): State<AppState>,
    page: PageContext,
    RequireAuth(customer): RequireAuth,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let order = fetch_order(&state, &customer.token, &OrderId::new(id)).await?;

    Ok(OrderTemplate {
        page,
        order: OrderDetailView::from(&order),
    })
}

/// Cancel an order that has not been prepared yet.
#[instrument(skip(state, session, customer))]
pub async fn cancel(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(customer): RequireAuth,
    Path(id): Path<String>,
) -> Result<Redirect, AppError> {
    let id = OrderId::new(id);
    let back = format!("/account/orders/{id}");
    let order = fetch_order(&state, &customer.token, &id).await?;

    if !order.status.is_cancellable() {
        flash::push(
            &session,
            Toast::error(format!(
                "This order can no longer be cancelled ({}).",
                order.status.label()
            )),
        )
        .await;
        return Ok(Redirect::to(&back));
    }

    match state.api().cancel_order(&customer.token, &id).await {
        Ok(_) => {
            tracing::info!(order_id = %id, "Order cancelled");
            flash::push(&session, Toast::success("Your order has been cancelled.")).await;
        }
        Err(e) if e.is_unauthorized() => return Err(e.into()),
        Err(e) => {
            tracing::warn!(order_id = %id, "Cancel failed: {e}");
            flash::push(&session, Toast::error(e.user_message())).await;
        }
    }

    Ok(Redirect::to(&back))
}

/// Printable invoice for an order.
#[instrument(skip(state, customer))]
pub async fn invoice(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let order = fetch_order(&state, &customer.token, &OrderId::new(id)).await?;
    let invoice = Invoice::from_order(&order, &state.config().store, Utc::now());

    let html = invoice
        .render_html()
        .map_err(|e| AppError::Internal(format!("invoice render failed: {e}")))?;
    Ok(Html(html).into_response())
}
