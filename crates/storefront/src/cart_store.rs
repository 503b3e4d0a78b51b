//! Session-backed cart.
//!
//! The cart lives in the visitor's session and is written back after every
//! mutation, so the session store always holds the latest copy.

use chrono::{Duration, Utc};
use tower_sessions::Session;

use shreeaura_core::cart::DEFAULT_CART_TTL_DAYS;
use shreeaura_core::{Cart, CartError, ProductId};

use crate::api::Product;
use crate::models::session_keys;

/// Errors from cart persistence or cart rules.
#[derive(Debug, thiserror::Error)]
pub enum CartStoreError {
    #[error(transparent)]
    Cart(#[from] CartError),
    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),
}

/// Load the cart. A cart untouched for longer than the TTL is discarded.
///
/// # Errors
///
/// Returns an error if the session cannot be read or the stale cart cannot
/// be removed.
pub async fn load(session: &Session) -> Result<Cart, CartStoreError> {
    let Some(cart) = session.get::<Cart>(session_keys::CART).await? else {
        return Ok(Cart::new());
    };

    if cart.is_stale(Utc::now(), Duration::days(DEFAULT_CART_TTL_DAYS)) {
        tracing::debug!(items = cart.items.len(), "Discarding stale cart");
        session.remove::<Cart>(session_keys::CART).await?;
        return Ok(Cart::new());
    }

    Ok(cart)
}

/// Persist the cart.
///
/// # Errors
///
/// Returns an error if the session cannot be written.
pub async fn save(session: &Session, cart: &Cart) -> Result<(), CartStoreError> {
    session.insert(session_keys::CART, cart).await?;
    Ok(())
}

/// Number of units in the cart, for the header badge. Never fails.
pub async fn item_count(session: &Session) -> u32 {
    session
        .get::<Cart>(session_keys::CART)
        .await
        .ok()
        .flatten()
        .map_or(0, |cart| cart.item_count())
}

/// Add `quantity` of `product`, merging with an existing line.
///
/// Returns the resulting line quantity.
///
/// # Errors
///
/// Returns `CartError::OutOfStock` for a product with no stock.
pub async fn add_product(
    session: &Session,
    product: &Product,
    quantity: u32,
) -> Result<u32, CartStoreError> {
    let mut cart = load(session).await?;
    let quantity = cart.add(product.to_cart_item(quantity))?;
    save(session, &cart).await?;
    Ok(quantity)
}

/// Set a line's quantity; zero removes it.
///
/// # Errors
///
/// Returns `CartError::ItemNotFound` if the product is not in the cart.
pub async fn set_quantity(
    session: &Session,
    product_id: &ProductId,
    quantity: u32,
) -> Result<u32, CartStoreError> {
    let mut cart = load(session).await?;
    let quantity = cart.set_quantity(product_id, quantity)?;
    save(session, &cart).await?;
    Ok(quantity)
}

/// Remove a line.
///
/// # Errors
///
/// Returns `CartError::ItemNotFound` if the product is not in the cart.
pub async fn remove(session: &Session, product_id: &ProductId) -> Result<(), CartStoreError> {
    let mut cart = load(session).await?;
    cart.remove(product_id)?;
    save(session, &cart).await
}

/// Empty the cart.
///
/// # Errors
///
/// Returns an error if the session cannot be written.
pub async fn clear(session: &Session) -> Result<(), CartStoreError> {
    save(session, &Cart::new()).await
}
