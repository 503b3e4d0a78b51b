//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                              - Home page
//! GET  /health                        - Liveness check
//! GET  /health/ready                  - Backend API readiness
//!
//! # Catalogue
//! GET  /products                      - Product listing (filters, sort, pages)
//! GET  /products/{id}                 - Product detail with reviews
//! POST /products/{id}/reviews         - Add a review (auth)
//! GET  /categories                    - Category list
//! GET  /categories/{slug}             - Category listing
//! GET  /search?q=                     - Search
//!
//! # Cart (rate limited)
//! GET  /cart                          - Cart page with fee quote
//! POST /cart/add                      - Add a product
//! POST /cart/update                   - Change a line's quantity
//! POST /cart/remove                   - Remove a line
//! POST /cart/clear                    - Empty the cart
//!
//! # Auth
//! GET  /auth/login                    - Phone / OTP entry
//! POST /auth/otp                      - Send OTP (rate limited)
//! POST /auth/verify                   - Verify OTP (rate limited)
//! POST /auth/logout                   - Logout
//!
//! # Checkout (requires auth)
//! GET  /checkout                      - Order summary and address form
//! POST /checkout                      - Place the order
//! POST /checkout/payment/callback     - Payment gateway callback
//!
//! # Account (requires auth)
//! GET  /account                       - Profile
//! POST /account/profile               - Update profile
//! GET  /account/orders                - Order history
//! GET  /account/orders/{id}           - Order detail
//! POST /account/orders/{id}/cancel    - Cancel an order
//! GET  /account/orders/{id}/invoice   - Printable invoice
//! ```

pub mod account;
pub mod auth;
pub mod cart;
pub mod categories;
pub mod checkout;
pub mod home;
pub mod orders;
pub mod products;
pub mod search;

use axum::{
    Router,
    routing::{get, post},
};

use crate::middleware::{cart_rate_limiter, otp_rate_limiter};
use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page))
        .route("/otp", post(auth::send_otp).layer(otp_rate_limiter()))
        .route("/verify", post(auth::verify_otp).layer(otp_rate_limiter()))
        .route("/logout", post(auth::logout))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
        .route("/{id}/reviews", post(products::add_review))
}

/// Create the category routes router.
pub fn category_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(categories::index))
        .route("/{slug}", get(categories::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    let mutations = Router::new()
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
        .layer(cart_rate_limiter());

    Router::new().route("/", get(cart::show)).merge(mutations)
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(checkout::show).post(checkout::place))
        .route("/payment/callback", post(checkout::payment_callback))
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(account::index))
        .route("/profile", post(account::update_profile))
        .route("/orders", get(orders::index))
        .route("/orders/{id}", get(orders::show))
        .route("/orders/{id}/cancel", post(orders::cancel))
        .route("/orders/{id}/invoice", get(orders::invoice))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .nest("/products", product_routes())
        .nest("/categories", category_routes())
        .route("/search", get(search::search))
        .nest("/cart", cart_routes())
        .nest("/checkout", checkout_routes())
        .nest("/account", account_routes())
        .nest("/auth", auth_routes())
}
