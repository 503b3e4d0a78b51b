//! Cart route handlers.
//!
//! The cart lives in the session. Mutations are plain form posts that answer
//! with a redirect and a toast.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use shreeaura_core::{Cart, CartError, CartItem, OrderTotals, ProductId};

use crate::api::ApiError;
use crate::cart_store::{self, CartStoreError};
use crate::error::{AppError, add_breadcrumb};
use crate::filters;
use crate::flash::{self, Toast};
use crate::middleware::PageContext;
use crate::state::AppState;

/// Cart line display data for templates.
#[derive(Debug, Clone)]
pub struct CartLineView {
    pub product_id: String,
    pub href: String,
    pub name: String,
    pub unit: Option<String>,
    pub image: Option<String>,
    pub quantity: u32,
    pub unit_price: String,
    pub line_total: String,
    pub can_increment: bool,
}

impl From<&CartItem> for CartLineView {
    fn from(item: &CartItem) -> Self {
        Self {
            product_id: item.product_id.to_string(),
            href: format!("/products/{}", item.product_id),
            name: item.name.clone(),
            unit: item.unit.clone(),
            image: item.image_url.clone(),
            quantity: item.quantity,
            unit_price: item.unit_price.display(),
            line_total: item.line_total().display(),
            can_increment: item.quantity < item.limit(),
        }
    }
}

/// Fee quote display data, shared with the checkout page.
#[derive(Debug, Clone)]
pub struct TotalsView {
    pub subtotal: String,
    pub shipping: String,
    pub free_shipping: bool,
    pub handling: String,
    pub total: String,
    pub savings: Option<String>,
    /// "Add ₹X more for free delivery".
    pub free_shipping_gap: Option<String>,
}

impl TotalsView {
    #[must_use]
    pub fn new(totals: &OrderTotals, cart: &Cart) -> Self {
        let savings = cart.savings();
        Self {
            subtotal: totals.subtotal.display(),
            shipping: totals.shipping.display(),
            free_shipping: totals.shipping.is_zero(),
            handling: totals.handling.display(),
            total: totals.total.display(),
            savings: (!savings.is_zero()).then(|| savings.display()),
            free_shipping_gap: totals.free_shipping_gap.map(|gap| gap.display()),
        }
    }
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart.html")]
pub struct CartTemplate {
    pub page: PageContext,
    pub lines: Vec<CartLineView>,
    pub totals: TotalsView,
}

/// Display the cart page.
#[instrument(skip(state, page, session))]
pub async fn show(
    State(state): State<AppState>,
    page: PageContext,
    session: Session,
) -> Result<impl IntoResponse, AppError> {
    let cart = cart_store::load(&session).await?;
    let totals = state.config().fees.quote(cart.subtotal());

    Ok(CartTemplate {
        page,
        lines: cart.items.iter().map(CartLineView::from).collect(),
        totals: TotalsView::new(&totals, &cart),
    })
}

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: String,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    /// Page to return to; defaults to the cart.
    #[serde(default)]
    pub redirect: Option<String>,
}

const fn default_quantity() -> u32 {
    1
}

/// Same-site redirect target from a form field.
fn back_to(redirect: Option<&str>) -> &str {
    match redirect {
        Some(path) if path.starts_with('/') && !path.starts_with("//") => path,
        _ => "/cart",
    }
}

/// Add a product to the cart.
///
/// The product is re-fetched so the cart snapshot carries current price and
/// stock.
#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<AddToCartForm>,
) -> Result<Response, AppError> {
    let back = back_to(form.redirect.as_deref()).to_string();

    let product = match state.api().product(&form.product_id).await {
        Ok(product) => product,
        Err(ApiError::NotFound(_)) => {
            flash::push(&session, Toast::error("That product is no longer available.")).await;
            return Ok(Redirect::to(&back).into_response());
        }
        Err(e) => return Err(e.into()),
    };

    match cart_store::add_product(&session, &product, form.quantity.max(1)).await {
        Ok(quantity) => {
            add_breadcrumb(
                "cart",
                "Added to cart",
                Some(&[("product_id", product.id.as_str())]),
            );
            let message = if quantity < form.quantity {
                format!("Only {quantity} of {} can be ordered.", product.name)
            } else {
                format!("{} added to cart.", product.name)
            };
            flash::push(&session, Toast::success(message)).await;
        }
        Err(CartStoreError::Cart(e @ CartError::OutOfStock(_))) => {
            flash::push(&session, Toast::error(format!("Sorry, {e}."))).await;
        }
        Err(e) => return Err(e.into()),
    }

    Ok(Redirect::to(&back).into_response())
}

/// Quantity change direction from the +/- buttons.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuantityAction {
    Increment,
    Decrement,
}

/// Update cart line form data.
///
/// Either an explicit `quantity` or an `action`; an action wins.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub product_id: String,
    #[serde(default)]
    pub quantity: Option<u32>,
    #[serde(default)]
    pub action: Option<QuantityAction>,
}

/// Change a line's quantity.
#[instrument(skip(session))]
pub async fn update(session: Session, Form(form): Form<UpdateCartForm>) -> Result<Redirect, AppError> {
    let product_id = ProductId::new(form.product_id);
    let mut cart = cart_store::load(&session).await?;

    let result = match (form.action, form.quantity) {
        (Some(QuantityAction::Increment), _) => cart.increment(&product_id),
        (Some(QuantityAction::Decrement), _) => cart.decrement(&product_id),
        (None, Some(quantity)) => cart.set_quantity(&product_id, quantity),
        (None, None) => return Err(AppError::BadRequest("missing quantity".to_string())),
    };

    match result {
        Ok(_) => cart_store::save(&session, &cart).await?,
        Err(CartError::ItemNotFound(_)) => {
            flash::push(&session, Toast::info("That item is no longer in your cart.")).await;
        }
        Err(e) => flash::push(&session, Toast::error(e.to_string())).await,
    }

    Ok(Redirect::to("/cart"))
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub product_id: String,
}

/// Remove a line from the cart.
#[instrument(skip(session))]
pub async fn remove(
    session: Session,
    Form(form): Form<RemoveFromCartForm>,
) -> Result<Redirect, AppError> {
    match cart_store::remove(&session, &ProductId::new(form.product_id)).await {
        Ok(()) => flash::push(&session, Toast::info("Item removed from cart.")).await,
        Err(CartStoreError::Cart(CartError::ItemNotFound(_))) => {}
        Err(e) => return Err(e.into()),
    }
    Ok(Redirect::to("/cart"))
}

/// Empty the cart.
#[instrument(skip(session))]
pub async fn clear(session: Session) -> Result<Redirect, AppError> {
    cart_store::clear(&session).await?;
    flash::push(&session, Toast::info("Your cart is empty.")).await;
    Ok(Redirect::to("/cart"))
}
