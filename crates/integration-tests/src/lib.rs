//! Integration test harness for the Shree Aura storefront.
//!
//! Each test starts two servers on ephemeral ports:
//!
//! - a fake backend answering the `/api/...` routes the storefront calls,
//!   with canned catalogue data, an order log and switches for revoking the
//!   token or failing the payment gateway
//! - the storefront router itself, with the in-memory session store
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p shreeaura-integration-tests
//! ```

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
};
use secrecy::SecretString;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tower_sessions::MemoryStore;

use shreeaura_core::FeeSchedule;
use shreeaura_storefront::config::{ApiConfig, PaymentConfig, StoreInfo, StorefrontConfig};
use shreeaura_storefront::middleware::create_session_layer;
use shreeaura_storefront::state::AppState;

/// Phone number the fake backend accepts.
pub const TEST_PHONE: &str = "9876543210";

/// OTP the fake backend accepts.
pub const TEST_OTP: &str = "123456";

/// Unsigned JWT with `{"sub":"u1"}` as payload and no expiry.
pub const TEST_TOKEN: &str = "eyJhbGciOiJIUzI1NiJ9.eyJzdWIiOiJ1MSJ9.sig";

/// Product id the fake catalogue serves, priced at 250 with 8 in stock.
pub const TEST_PRODUCT_ID: &str = "p1";

/// Id the fake backend gives every placed order.
pub const TEST_ORDER_ID: &str = "65f0c9a1b2c3d4e5f6a7b8c9";

/// Gateway order id returned by `POST /api/payments/create-order`.
pub const TEST_GATEWAY_ORDER_ID: &str = "order_GW123";

/// Signature the fake backend accepts as valid.
pub const VALID_SIGNATURE: &str = "valid-signature";

/// Requests recorded by the fake backend, plus its switches.
#[derive(Debug, Default)]
pub struct BackendLog {
    /// Bodies of `POST /api/orders`.
    pub orders: Vec<Value>,
    /// Phones `POST /api/auth/send-otp` was called with.
    pub otp_requests: Vec<String>,
    /// Order ids `POST /api/orders/{id}/cancel` was called with.
    pub cancelled: Vec<String>,
    /// Bodies of `POST /api/payments/verify`.
    pub payment_verifications: Vec<Value>,
    /// Order status override; `pending` when unset.
    pub order_status: Option<&'static str>,
    /// Payment status override; `pending` when unset.
    pub payment_status: Option<&'static str>,
    /// Reject every bearer token with 401.
    pub revoke_tokens: bool,
    /// Fail `POST /api/payments/create-order` with 502.
    pub fail_payment_setup: bool,
}

impl BackendLog {
    fn stored_order(&self, body: &Value) -> Value {
        json!({
            "_id": TEST_ORDER_ID,
            "items": body["items"],
            "shippingAddress": body["shippingAddress"],
            "subtotal": body["subtotal"],
            "shippingFee": body["shippingFee"],
            "handlingFee": body["handlingFee"],
            "total": body["total"],
            "status": self.order_status.unwrap_or("pending"),
            "paymentStatus": self.payment_status.unwrap_or("pending"),
            "paymentMethod": body["paymentMethod"],
            "createdAt": "2026-10-18T09:30:00Z"
        })
    }

    fn last_order(&self, id: &str) -> Option<Value> {
        (id == TEST_ORDER_ID)
            .then(|| self.orders.last().map(|body| self.stored_order(body)))
            .flatten()
    }
}

type SharedLog = Arc<Mutex<BackendLog>>;

fn product() -> Value {
    json!({
        "_id": TEST_PRODUCT_ID,
        "name": "Cold Pressed Groundnut Oil",
        "slug": "cold-pressed-groundnut-oil",
        "brand": "Shree Aura",
        "category": { "_id": "c1", "name": "Oils", "slug": "oils" },
        "images": [],
        "price": 250,
        "mrp": 300,
        "unit": "1 L",
        "stock": 8,
        "rating": 4.5,
        "numReviews": 2
    })
}

fn user() -> Value {
    json!({ "_id": "u1", "name": "Meera Iyer", "phone": TEST_PHONE })
}

fn authorised(log: &SharedLog, headers: &HeaderMap) -> bool {
    let revoked = log.lock().map(|log| log.revoke_tokens).unwrap_or(true);
    !revoked
        && headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v == format!("Bearer {TEST_TOKEN}"))
}

async fn list_products() -> Json<Value> {
    Json(json!({ "products": [product()], "total": 1, "page": 1, "pages": 1 }))
}

async fn get_product(Path(id): Path<String>) -> Result<Json<Value>, StatusCode> {
    if id == TEST_PRODUCT_ID || id == "cold-pressed-groundnut-oil" {
        Ok(Json(json!({ "product": product() })))
    } else {
        Err(StatusCode::NOT_FOUND)
    }
}

async fn send_otp(State(log): State<SharedLog>, Json(body): Json<Value>) -> Json<Value> {
    let phone = body["phone"].as_str().unwrap_or_default().to_owned();
    if let Ok(mut log) = log.lock() {
        log.otp_requests.push(phone);
    }
    Json(json!({ "message": "OTP sent" }))
}

async fn verify_otp(Json(body): Json<Value>) -> Result<Json<Value>, StatusCode> {
    if body["otp"] == TEST_OTP && body["phone"] == TEST_PHONE {
        Ok(Json(json!({ "token": TEST_TOKEN, "user": user() })))
    } else {
        Err(StatusCode::UNAUTHORIZED)
    }
}

async fn me(State(log): State<SharedLog>, headers: HeaderMap) -> Result<Json<Value>, StatusCode> {
    if authorised(&log, &headers) {
        Ok(Json(json!({ "user": user() })))
    } else {
        Err(StatusCode::UNAUTHORIZED)
    }
}

async fn update_me(
    State(log): State<SharedLog>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<Json<Value>, StatusCode> {
    if !authorised(&log, &headers) {
        return Err(StatusCode::UNAUTHORIZED);
    }
    let mut updated = user();
    updated["name"] = body["name"].clone();
    updated["address"] = body["address"].clone();
    Ok(Json(json!({ "user": updated })))
}

async fn place_order(
    State(log): State<SharedLog>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Value>), StatusCode> {
    if !authorised(&log, &headers) {
        return Err(StatusCode::UNAUTHORIZED);
    }
    let mut log = log.lock().map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    let order = log.stored_order(&body);
    log.orders.push(body);
    Ok((StatusCode::CREATED, Json(json!({ "order": order }))))
}

async fn my_orders(State(log): State<SharedLog>, headers: HeaderMap) -> Result<Json<Value>, StatusCode> {
    if !authorised(&log, &headers) {
        return Err(StatusCode::UNAUTHORIZED);
    }
    let orders: Vec<Value> = log
        .lock()
        .map(|log| log.orders.iter().map(|body| log.stored_order(body)).collect())
        .unwrap_or_default();
    Ok(Json(json!({ "orders": orders })))
}

async fn get_order(
    State(log): State<SharedLog>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Value>, StatusCode> {
    if !authorised(&log, &headers) {
        return Err(StatusCode::UNAUTHORIZED);
    }
    log.lock()
        .ok()
        .and_then(|log| log.last_order(&id))
        .map(|order| Json(json!({ "order": order })))
        .ok_or(StatusCode::NOT_FOUND)
}

async fn cancel_order(
    State(log): State<SharedLog>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Value>, StatusCode> {
    if !authorised(&log, &headers) {
        return Err(StatusCode::UNAUTHORIZED);
    }
    let mut log = log.lock().map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    if log.last_order(&id).is_none() {
        return Err(StatusCode::NOT_FOUND);
    }
    log.cancelled.push(id.clone());
    log.order_status = Some("cancelled");
    let order = log.last_order(&id);
    Ok(Json(json!({ "order": order })))
}

async fn create_payment_order(
    State(log): State<SharedLog>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<Json<Value>, StatusCode> {
    if !authorised(&log, &headers) {
        return Err(StatusCode::UNAUTHORIZED);
    }
    let log = log.lock().map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    if log.fail_payment_setup {
        return Err(StatusCode::BAD_GATEWAY);
    }
    let order_id = body["orderId"].as_str().unwrap_or_default();
    let rupees = log
        .last_order(order_id)
        .and_then(|order| order["total"].as_f64())
        .ok_or(StatusCode::NOT_FOUND)?;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let paise = (rupees * 100.0).round() as u64;
    Ok(Json(json!({
        "id": TEST_GATEWAY_ORDER_ID,
        "amount": paise,
        "currency": "INR"
    })))
}

async fn verify_payment(
    State(log): State<SharedLog>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<Json<Value>, StatusCode> {
    if !authorised(&log, &headers) {
        return Err(StatusCode::UNAUTHORIZED);
    }
    let success = body["signature"] == VALID_SIGNATURE;
    let mut log = log.lock().map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    log.payment_verifications.push(body);
    if success {
        log.payment_status = Some("paid");
        log.order_status = Some("confirmed");
    }
    Ok(Json(json!({
        "success": success,
        "message": if success { "Payment verified" } else { "Invalid signature" }
    })))
}

fn fake_backend(log: SharedLog) -> Router {
    Router::new()
        .route("/api/health", get(|| async { Json(json!({ "status": "ok" })) }))
        .route(
            "/api/categories",
            get(|| async {
                Json(json!({ "categories": [{ "_id": "c1", "name": "Oils", "slug": "oils" }] }))
            }),
        )
        .route("/api/products", get(list_products))
        .route("/api/products/search", get(list_products))
        .route("/api/products/{id}", get(get_product))
        .route(
            "/api/products/{id}/reviews",
            get(|| async { Json(json!({ "reviews": [] })) }),
        )
        .route("/api/auth/send-otp", post(send_otp))
        .route("/api/auth/verify-otp", post(verify_otp))
        .route("/api/users/me", get(me).put(update_me))
        .route("/api/orders", post(place_order))
        .route("/api/orders/my", get(my_orders))
        .route("/api/orders/{id}", get(get_order))
        .route("/api/orders/{id}/cancel", post(cancel_order))
        .route("/api/payments/create-order", post(create_payment_order))
        .route("/api/payments/verify", post(verify_payment))
        .with_state(log)
}

async fn spawn(app: Router) -> SocketAddr {
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("listener address");
    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .expect("test server");
    });
    addr
}

fn test_config(api_url: String, payment: PaymentConfig) -> StorefrontConfig {
    StorefrontConfig {
        database_url: SecretString::from("postgres://unused".to_string()),
        host: Ipv4Addr::LOCALHOST.into(),
        port: 0,
        base_url: "http://localhost:3000".to_string(),
        api: ApiConfig {
            base_url: api_url,
            timeout: Duration::from_secs(5),
            cache_ttl: Duration::from_secs(60),
        },
        payment,
        fees: FeeSchedule::default(),
        store: StoreInfo::default(),
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 0.0,
        sentry_traces_sample_rate: 0.0,
    }
}

/// A running storefront wired to a fake backend.
pub struct TestContext {
    /// Cookie-keeping client that does not follow redirects.
    pub client: reqwest::Client,
    pub storefront_url: String,
    pub backend: Arc<Mutex<BackendLog>>,
}

impl TestContext {
    /// Start the fake backend and the storefront, cash on delivery only.
    ///
    /// # Panics
    ///
    /// Panics if either server cannot be started.
    pub async fn new() -> Self {
        Self::start(PaymentConfig::default()).await
    }

    /// Start with online payment configured.
    ///
    /// # Panics
    ///
    /// Panics if either server cannot be started.
    pub async fn with_online_payment() -> Self {
        Self::start(PaymentConfig {
            key_id: Some("rzp_test_key".to_string()),
        })
        .await
    }

    async fn start(payment: PaymentConfig) -> Self {
        let backend = SharedLog::default();
        let api_addr = spawn(fake_backend(Arc::clone(&backend))).await;

        let config = test_config(format!("http://{api_addr}"), payment);
        let session_layer = create_session_layer(MemoryStore::default(), &config);
        let state = AppState::new(config).expect("app state");
        let storefront = shreeaura_storefront::router(state).layer(session_layer);
        let storefront_addr = spawn(storefront).await;

        let client = reqwest::Client::builder()
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .expect("test client");

        Self {
            client,
            storefront_url: format!("http://{storefront_addr}"),
            backend,
        }
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.storefront_url)
    }

    /// Log in through the OTP pages.
    ///
    /// # Panics
    ///
    /// Panics if a request fails.
    pub async fn login(&self) {
        self.client
            .post(self.url("/auth/otp"))
            .form(&[("phone", TEST_PHONE)])
            .send()
            .await
            .expect("send otp");
        self.client
            .post(self.url("/auth/verify"))
            .form(&[("otp", TEST_OTP)])
            .send()
            .await
            .expect("verify otp");
    }

    /// Submit the checkout form with the given payment method.
    ///
    /// # Panics
    ///
    /// Panics if the request fails.
    pub async fn checkout(&self, payment_method: &str) -> reqwest::Response {
        let mut form = address_form();
        form.push(("payment_method", payment_method));
        self.client
            .post(self.url("/checkout"))
            .form(&form)
            .send()
            .await
            .expect("place order")
    }

    /// Fetch a page and return its body.
    ///
    /// # Panics
    ///
    /// Panics if the request fails.
    pub async fn page(&self, path: &str) -> String {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("get page")
            .text()
            .await
            .expect("page body")
    }

    /// Add `quantity` of the test product to the cart.
    ///
    /// # Panics
    ///
    /// Panics if the request fails.
    pub async fn add_to_cart(&self, quantity: u32) -> reqwest::Response {
        self.client
            .post(self.url("/cart/add"))
            .form(&[
                ("product_id", TEST_PRODUCT_ID.to_string()),
                ("quantity", quantity.to_string()),
            ])
            .send()
            .await
            .expect("add to cart")
    }
}

/// A valid delivery address, without the payment method.
#[must_use]
pub fn address_form() -> Vec<(&'static str, &'static str)> {
    vec![
        ("full_name", "Meera Iyer"),
        ("phone", TEST_PHONE),
        ("line1", "12 MG Road"),
        ("city", "Pune"),
        ("state", "Maharashtra"),
        ("pincode", "411001"),
    ]
}

/// `Location` header of a redirect response.
#[must_use]
pub fn location(response: &reqwest::Response) -> Option<String> {
    response
        .headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
}
