//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tracing::instrument;

use crate::api::Category;
use crate::filters;
use crate::middleware::PageContext;
use crate::routes::products::ProductCardView;
use crate::state::AppState;

/// Category tile data for templates.
#[derive(Debug, Clone)]
pub struct CategoryView {
    pub name: String,
    pub href: String,
    pub image: Option<String>,
}

impl From<&Category> for CategoryView {
    fn from(category: &Category) -> Self {
        Self {
            name: category.name.clone(),
            href: format!("/categories/{}", category.path_segment()),
            image: category.image.clone(),
        }
    }
}

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub page: PageContext,
    pub categories: Vec<CategoryView>,
    pub featured_products: Vec<ProductCardView>,
    /// Spend needed for free delivery, shown in the banner.
    pub free_shipping_threshold: String,
}

/// Display the home page.
///
/// Backend failures degrade to empty sections rather than an error page.
#[instrument(skip(state, page))]
pub async fn home(State(state): State<AppState>, page: PageContext) -> impl IntoResponse {
    let categories = state.api().categories().await.map_or_else(
        |e| {
            tracing::error!("Failed to fetch categories: {e}");
            Vec::new()
        },
        |categories| categories.iter().map(CategoryView::from).collect(),
    );

    let featured_products = state.api().featured_products().await.map_or_else(
        |e| {
            tracing::error!("Failed to fetch featured products: {e}");
            Vec::new()
        },
        |products| products.iter().map(ProductCardView::from).collect(),
    );

    HomeTemplate {
        page,
        categories,
        featured_products,
        free_shipping_threshold: state.config().fees.free_shipping_threshold.display(),
    }
}
