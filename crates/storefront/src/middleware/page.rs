//! Layout context shared by every full page.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use crate::cart_store;
use crate::flash::{self, Toast};
use crate::middleware::{OptionalAuth, current_path};
use crate::models::CurrentCustomer;
use crate::state::AppState;

/// Data the base layout needs: header badge, greeting and pending toasts.
///
/// Extracting a `PageContext` drains the toast queue, so only extract it in
/// handlers that render a full page.
#[derive(Debug, Clone, Default)]
pub struct PageContext {
    pub store_name: String,
    pub support_phone: Option<String>,
    pub customer_name: Option<String>,
    pub cart_count: u32,
    pub toasts: Vec<Toast>,
    pub path: String,
}

impl PageContext {
    #[must_use]
    pub const fn is_logged_in(&self) -> bool {
        self.customer_name.is_some()
    }

    /// Build the context for `path`, draining the session's toasts.
    ///
    /// Form handlers that only sometimes render a page call this on that
    /// branch, so toasts survive their redirects.
    pub async fn build(
        state: &AppState,
        session: Option<&Session>,
        customer: Option<&CurrentCustomer>,
        path: impl Into<String>,
    ) -> Self {
        let store = &state.config().store;

        let mut context = Self {
            store_name: store.name.clone(),
            support_phone: store.support_phone.clone(),
            customer_name: customer.map(CurrentCustomer::display_name),
            path: path.into(),
            ..Self::default()
        };

        if let Some(session) = session {
            context.cart_count = cart_store::item_count(session).await;
            context.toasts = flash::take(session).await;
        }

        context
    }
}

impl FromRequestParts<AppState> for PageContext {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Ok(OptionalAuth(customer)) = OptionalAuth::from_request_parts(parts, state).await;
        let session = parts.extensions.get::<Session>();

        Ok(Self::build(state, session, customer.as_ref(), current_path(parts)).await)
    }
}
