//! `ApiClient` implementation.

use std::sync::Arc;

use moka::future::Cache;
use reqwest::{RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument};
use url::Url;

use shreeaura_core::{OrderId, ProductId};

use super::ApiError;
use super::cache::{CacheKey, CacheValue};
use super::types::{
    AccessToken, ApiMessage, AuthResponse, Category, CreatePaymentRequest, NewReview, OrderResponse,
    PaymentOrder, PaymentVerification, PaymentVerificationResult, PlaceOrderRequest, Product,
    ProductPage, ProductQuery, ProfileUpdate, Review, SendOtpRequest, User, VerifyOtpRequest,
};
use crate::config::ApiConfig;

/// Products shown on the home page.
const FEATURED_LIMIT: u32 = 12;

/// Client for the Shree Aura REST API.
///
/// Cheap to clone; clones share the HTTP connection pool and the catalogue
/// cache.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    cache: Cache<CacheKey, CacheValue>,
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the HTTP client cannot
    /// be built.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(config.cache_ttl)
            .build();

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("shreeaura-storefront/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: Url::parse(&config.base_url)?,
                cache,
            }),
        })
    }

    /// Base URL requests are made against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    // =========================================================================
    // Plumbing
    // =========================================================================

    /// Build `<base>/api/<segments...>`, percent-encoding each segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .push("api")
            .extend(segments);
        Ok(url)
    }

    fn get(&self, url: Url) -> RequestBuilder {
        self.inner.client.get(url)
    }

    fn post<B: Serialize + ?Sized>(&self, url: Url, body: &B) -> RequestBuilder {
        self.inner.client.post(url).json(body)
    }

    /// Send a request and return the body of a successful response.
    async fn send_raw(&self, request: RequestBuilder) -> Result<String, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        let path = response.url().path().to_string();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ApiError::RateLimited(retry_after));
        }

        let body = response.text().await?;

        if status.is_success() {
            return Ok(body);
        }

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(ApiError::Unauthorized),
            StatusCode::NOT_FOUND => Err(ApiError::NotFound(path)),
            _ => {
                tracing::warn!(
                    status = %status,
                    path = %path,
                    body = %truncate(&body),
                    "API returned non-success status"
                );
                Err(ApiError::Status {
                    status: status.as_u16(),
                    message: error_message(&body),
                })
            }
        }
    }

    /// Send a request and parse the JSON body, unwrapping `{ "<key>": ... }`
    /// when the backend wraps the payload.
    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        envelope: Option<&str>,
    ) -> Result<T, ApiError> {
        let body = self.send_raw(request).await?;

        let value: Value = match serde_json::from_str(&body) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!(error = %e, body = %truncate(&body), "Failed to parse API response");
                return Err(ApiError::Parse(e));
            }
        };

        serde_json::from_value(unwrap_envelope(value, envelope)).map_err(|e| {
            tracing::error!(error = %e, body = %truncate(&body), "Unexpected API response shape");
            ApiError::Parse(e)
        })
    }

    // =========================================================================
    // Health
    // =========================================================================

    /// Check that the backend is reachable.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is unreachable or unhealthy.
    #[instrument(skip(self))]
    pub async fn health(&self) -> Result<(), ApiError> {
        let url = self.endpoint(&["health"])?;
        self.send_raw(self.get(url)).await.map(|_| ())
    }

    // =========================================================================
    // Catalogue (cached)
    // =========================================================================

    /// All product categories.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn categories(&self) -> Result<Vec<Category>, ApiError> {
        let key = CacheKey::Categories;
        if let Some(CacheValue::Categories(categories)) = self.inner.cache.get(&key).await {
            debug!("Cache hit for categories");
            return Ok(categories);
        }

        let url = self.endpoint(&["categories"])?;
        let categories: Vec<Category> = self.send(self.get(url), Some("categories")).await?;

        self.inner
            .cache
            .insert(key, CacheValue::Categories(categories.clone()))
            .await;

        Ok(categories)
    }

    /// One page of the product listing.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn products(&self, query: &ProductQuery) -> Result<ProductPage, ApiError> {
        let key = CacheKey::Products(query.clone());
        if let Some(CacheValue::Products(page)) = self.inner.cache.get(&key).await {
            debug!("Cache hit for product listing");
            return Ok(page);
        }

        let mut url = self.endpoint(&["products"])?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("page", &query.page.to_string())
                .append_pair("limit", &query.limit.to_string());
            if let Some(category) = &query.category {
                pairs.append_pair("category", category);
            }
            if let Some(sort) = &query.sort {
                pairs.append_pair("sort", sort);
            }
            if query.featured {
                pairs.append_pair("featured", "true");
            }
        }

        let page = parse_product_page(self.send(self.get(url), None).await?)?;

        self.inner
            .cache
            .insert(key, CacheValue::Products(page.clone()))
            .await;

        Ok(page)
    }

    /// Featured products for the home page.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn featured_products(&self) -> Result<Vec<Product>, ApiError> {
        let query = ProductQuery {
            limit: FEATURED_LIMIT,
            featured: true,
            ..ProductQuery::default()
        };
        Ok(self.products(&query).await?.products)
    }

    /// Full-text product search. Blank queries return nothing without a
    /// request.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn search_products(&self, query: &str) -> Result<Vec<Product>, ApiError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let key = CacheKey::Search(query.to_lowercase());
        if let Some(CacheValue::Products(page)) = self.inner.cache.get(&key).await {
            debug!("Cache hit for search");
            return Ok(page.products);
        }

        let mut url = self.endpoint(&["products", "search"])?;
        url.query_pairs_mut().append_pair("q", query);

        let page = parse_product_page(self.send(self.get(url), None).await?)?;

        self.inner
            .cache
            .insert(key, CacheValue::Products(page.clone()))
            .await;

        Ok(page.products)
    }

    /// A single product by id or slug.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] if the product does not exist.
    #[instrument(skip(self))]
    pub async fn product(&self, id_or_slug: &str) -> Result<Product, ApiError> {
        let key = CacheKey::Product(id_or_slug.to_string());
        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let url = self.endpoint(&["products", id_or_slug])?;
        let product: Product = self.send(self.get(url), Some("product")).await?;

        // Cached under the id as well, so a review can find every alias.
        let value = CacheValue::Product(Box::new(product.clone()));
        let mut keys = vec![key, CacheKey::Product(product.id.to_string())];
        if let Some(slug) = &product.slug {
            keys.push(CacheKey::Product(slug.clone()));
        }
        keys.dedup();
        for key in keys {
            self.inner.cache.insert(key, value.clone()).await;
        }

        Ok(product)
    }

    /// Reviews for a product, newest first as returned by the backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn reviews(&self, product_id: &ProductId) -> Result<Vec<Review>, ApiError> {
        let url = self.endpoint(&["products", product_id.as_str(), "reviews"])?;
        self.send(self.get(url), Some("reviews")).await
    }

    /// Post a review. The cached product is dropped, under both its id and
    /// slug, so the new rating shows.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token, comment))]
    pub async fn add_review(
        &self,
        token: &AccessToken,
        product_id: &ProductId,
        rating: u8,
        comment: &str,
    ) -> Result<(), ApiError> {
        let url = self.endpoint(&["products", product_id.as_str(), "reviews"])?;
        let request = self
            .post(url, &NewReview { rating, comment })
            .bearer_auth(token.expose());
        self.send_raw(request).await?;

        let id_key = CacheKey::Product(product_id.to_string());
        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&id_key).await {
            if let Some(slug) = product.slug {
                self.inner.cache.invalidate(&CacheKey::Product(slug)).await;
            }
        }
        self.inner.cache.invalidate(&id_key).await;
        Ok(())
    }

    // =========================================================================
    // Auth
    // =========================================================================

    /// Ask the backend to text a one-time password to `phone`.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, phone))]
    pub async fn send_otp(&self, phone: &str) -> Result<(), ApiError> {
        let url = self.endpoint(&["auth", "send-otp"])?;
        self.send_raw(self.post(url, &SendOtpRequest { phone }))
            .await
            .map(|_| ())
    }

    /// Exchange a one-time password for a bearer token.
    ///
    /// # Errors
    ///
    /// Returns an error if the OTP is rejected or the request fails.
    #[instrument(skip(self, phone, otp))]
    pub async fn verify_otp(&self, phone: &str, otp: &str) -> Result<AuthResponse, ApiError> {
        let url = self.endpoint(&["auth", "verify-otp"])?;
        self.send(self.post(url, &VerifyOtpRequest { phone, otp }), None)
            .await
    }

    // =========================================================================
    // Customer
    // =========================================================================

    /// The logged-in customer's profile.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unauthorized`] if the token is rejected.
    #[instrument(skip(self, token))]
    pub async fn me(&self, token: &AccessToken) -> Result<User, ApiError> {
        let url = self.endpoint(&["users", "me"])?;
        self.send(self.get(url).bearer_auth(token.expose()), Some("user"))
            .await
    }

    /// Update the logged-in customer's profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token, update))]
    pub async fn update_profile(
        &self,
        token: &AccessToken,
        update: &ProfileUpdate,
    ) -> Result<User, ApiError> {
        let url = self.endpoint(&["users", "me"])?;
        let request = self
            .inner
            .client
            .put(url)
            .json(update)
            .bearer_auth(token.expose());
        self.send(request, Some("user")).await
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// Place an order.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the order.
    #[instrument(skip(self, token, order), fields(items = order.items.len()))]
    pub async fn place_order(
        &self,
        token: &AccessToken,
        order: &PlaceOrderRequest,
    ) -> Result<OrderResponse, ApiError> {
        let url = self.endpoint(&["orders"])?;
        self.send(self.post(url, order).bearer_auth(token.expose()), Some("order"))
            .await
    }

    /// The customer's order history.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn my_orders(
        &self,
        token: &AccessToken,
    ) -> Result<Vec<OrderResponse>, ApiError> {
        let url = self.endpoint(&["orders", "my"])?;
        self.send(self.get(url).bearer_auth(token.expose()), Some("orders"))
            .await
    }

    /// A single order.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] if the order does not exist or belongs
    /// to someone else.
    #[instrument(skip(self, token))]
    pub async fn order(
        &self,
        token: &AccessToken,
        id: &OrderId,
    ) -> Result<OrderResponse, ApiError> {
        let url = self.endpoint(&["orders", id.as_str()])?;
        self.send(self.get(url).bearer_auth(token.expose()), Some("order"))
            .await
    }

    /// Cancel an order.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend refuses the cancellation.
    #[instrument(skip(self, token))]
    pub async fn cancel_order(
        &self,
        token: &AccessToken,
        id: &OrderId,
    ) -> Result<OrderResponse, ApiError> {
        let url = self.endpoint(&["orders", id.as_str(), "cancel"])?;
        let request = self.inner.client.post(url).bearer_auth(token.expose());
        self.send(request, Some("order")).await
    }

    // =========================================================================
    // Payments
    // =========================================================================

    /// Create a payment gateway order for an online-paid order.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn create_payment_order(
        &self,
        token: &AccessToken,
        order_id: &OrderId,
    ) -> Result<PaymentOrder, ApiError> {
        let url = self.endpoint(&["payments", "create-order"])?;
        let request = self
            .post(url, &CreatePaymentRequest { order_id })
            .bearer_auth(token.expose());
        self.send(request, None).await
    }

    /// Relay the gateway callback to the backend for signature verification.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token, verification), fields(order_id = %verification.order_id))]
    pub async fn verify_payment(
        &self,
        token: &AccessToken,
        verification: &PaymentVerification,
    ) -> Result<PaymentVerificationResult, ApiError> {
        let url = self.endpoint(&["payments", "verify"])?;
        self.send(
            self.post(url, verification).bearer_auth(token.expose()),
            None,
        )
        .await
    }
}

/// If `value` is an object holding `key`, return that field; otherwise the
/// value itself.
fn unwrap_envelope(value: Value, key: Option<&str>) -> Value {
    match (value, key) {
        (Value::Object(mut map), Some(key)) if map.contains_key(key) => {
            map.remove(key).unwrap_or(Value::Null)
        }
        (value, _) => value,
    }
}

/// Listing endpoints return either a paginated object or a bare array.
fn parse_product_page(value: Value) -> Result<ProductPage, ApiError> {
    if value.is_array() {
        let products: Vec<Product> = serde_json::from_value(value)?;
        let total = u32::try_from(products.len()).unwrap_or(u32::MAX);
        return Ok(ProductPage {
            products,
            total,
            page: 1,
            pages: 1,
        });
    }
    Ok(serde_json::from_value(value)?)
}

/// Pull `message` (or `error`) out of an error body, falling back to the
/// truncated body text.
fn error_message(body: &str) -> String {
    serde_json::from_str::<ApiMessage>(body)
        .ok()
        .and_then(|m| m.message.or(m.error))
        .unwrap_or_else(|| truncate(body))
}

fn truncate(body: &str) -> String {
    body.chars().take(500).collect()
}
