//! Authentication extractors.
//!
//! The logged-in customer lives in the session. A customer whose token has
//! expired, or whose token the backend rejects, is treated as logged out and
//! removed from the session.

use axum::{
    extract::{FromRequestParts, OriginalUri, Request},
    http::{HeaderMap, Method, StatusCode, Uri, header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use tower_sessions::Session;

use crate::flash::{self, Toast};
use crate::models::{CurrentCustomer, session_keys};

/// Extractor that requires a logged-in customer.
///
/// Page requests without one are redirected to the login page with a `next`
/// parameter; `/api/` requests get `401`.
///
/// # Example
///
/// ```rust,ignore
/// async fn orders(RequireAuth(customer): RequireAuth) -> impl IntoResponse {
///     format!("Hello, {}!", customer.display_name())
/// }
/// ```
pub struct RequireAuth(pub CurrentCustomer);

/// Error returned when authentication is required but the customer is not logged in.
pub enum AuthRejection {
    /// Redirect to login page (for HTML requests).
    RedirectToLogin(String),
    /// Unauthorized response (for API requests).
    Unauthorized,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin(location) => Redirect::to(&location).into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
        }
    }
}

/// Login URL that returns to `path` afterwards.
#[must_use]
pub fn login_url(path: &str) -> String {
    let next: String = url::form_urlencoded::byte_serialize(path.as_bytes()).collect();
    format!("/auth/login?next={next}")
}

/// Only same-site absolute paths are accepted as post-login targets.
#[must_use]
pub fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => {
            path
        }
        _ => "/account",
    }
}

/// The request URI as the client sent it.
///
/// Nested routers see their prefix stripped from `parts.uri`.
fn original_uri(parts: &Parts) -> &Uri {
    parts
        .extensions
        .get::<OriginalUri>()
        .map_or(&parts.uri, |original| &original.0)
}

fn path_and_query(uri: &Uri) -> &str {
    uri.path_and_query().map_or("/", |pq| pq.as_str())
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(AuthRejection::Unauthorized)?;

        let uri = original_uri(parts);
        match current_customer(session).await {
            Some(customer) => Ok(Self(customer)),
            None if uri.path().starts_with("/api/") => Err(AuthRejection::Unauthorized),
            None => Err(AuthRejection::RedirectToLogin(login_url(path_and_query(uri)))),
        }
    }
}

/// Extractor that optionally gets the current customer.
///
/// Unlike `RequireAuth`, this does not reject the request if the customer is not logged in.
pub struct OptionalAuth(pub Option<CurrentCustomer>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let customer = match parts.extensions.get::<Session>() {
            Some(session) => current_customer(session).await,
            None => None,
        };

        Ok(Self(customer))
    }
}

/// Path the layout links back to after login.
#[must_use]
pub fn current_path(parts: &Parts) -> String {
    original_uri(parts).path().to_owned()
}

/// Response marker: the backend rejected the customer's token.
///
/// Set by `AppError` and consumed by [`session_expiry_middleware`].
#[derive(Debug, Clone, Copy)]
pub struct SessionExpired;

/// Log the customer out when the backend rejects their token.
///
/// Clears the customer, queues a toast and sends page requests to the login
/// page. `/api/` responses keep their `401`.
pub async fn session_expiry_middleware(request: Request, next: Next) -> Response {
    let session = request.extensions().get::<Session>().cloned();
    let is_api = request.uri().path().starts_with("/api/");
    let return_to = return_path(request.method(), request.uri(), request.headers());

    let response = next.run(request).await;
    if response.extensions().get::<SessionExpired>().is_none() {
        return response;
    }

    if let Some(session) = session {
        if let Err(e) = clear_current_customer(&session).await {
            tracing::warn!("Failed to clear rejected customer: {e}");
        }
        flash::push(&session, Toast::info("Your session expired. Please log in again.")).await;
    }
    tracing::info!(path = %return_to, "Backend rejected customer token, logged out");

    if is_api {
        return response;
    }
    Redirect::to(&login_url(&return_to)).into_response()
}

/// Where to return after logging in again: the page itself for reads, the
/// page the form was posted from otherwise.
fn return_path(method: &Method, uri: &Uri, headers: &HeaderMap) -> String {
    if method == Method::GET || method == Method::HEAD {
        return path_and_query(uri).to_owned();
    }

    headers
        .get(header::REFERER)
        .and_then(|v| v.to_str().ok())
        .and_then(|referer| url::Url::parse(referer).ok())
        .map(|url| match url.query() {
            Some(query) => format!("{}?{query}", url.path()),
            None => url.path().to_owned(),
        })
        .filter(|path| safe_next(Some(path)) == path.as_str())
        .unwrap_or_else(|| "/".to_string())
}

/// Read the customer from the session, dropping an expired one.
async fn current_customer(session: &Session) -> Option<CurrentCustomer> {
    let customer = session
        .get::<CurrentCustomer>(session_keys::CURRENT_CUSTOMER)
        .await
        .ok()
        .flatten()?;

    if customer.is_expired(Utc::now()) {
        tracing::debug!(user_id = %customer.user_id, "Customer token expired");
        if let Err(e) = clear_current_customer(session).await {
            tracing::warn!("Failed to clear expired customer: {e}");
        }
        return None;
    }

    Some(customer)
}

/// Helper to set the current customer in the session.
///
/// The session id is cycled to prevent fixation.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_customer(
    session: &Session,
    customer: &CurrentCustomer,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session
        .insert(session_keys::CURRENT_CUSTOMER, customer)
        .await
}

/// Helper to clear the current customer from the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_customer(
    session: &Session,
) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentCustomer>(session_keys::CURRENT_CUSTOMER)
        .await?;
    Ok(())
}
