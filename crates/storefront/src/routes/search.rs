//! Search route handler.

use axum::{
    extract::{Query, State},
    response::IntoResponse,
};
use tracing::instrument;

use crate::middleware::PageContext;
use crate::routes::products::{ListingQuery, ListingView, ProductsIndexTemplate};
use crate::state::AppState;

/// Full search page: backend text search, then the usual listing filters.
#[instrument(skip(state, page))]
pub async fn search(
    State(state): State<AppState>,
    page: PageContext,
    Query(query): Query<ListingQuery>,
) -> impl IntoResponse {
    let q = query.q.as_deref().map(str::trim).unwrap_or_default().to_string();

    let products = state.api().search_products(&q).await.unwrap_or_else(|e| {
        tracing::error!("Search failed: {e}");
        Vec::new()
    });

    let title = if q.is_empty() {
        "Search".to_string()
    } else {
        format!("Results for \u{201c}{q}\u{201d}")
    };

    ProductsIndexTemplate {
        page,
        listing: ListingView::build(title, "/search", products, query, None),
        search_query: Some(q),
    }
}
