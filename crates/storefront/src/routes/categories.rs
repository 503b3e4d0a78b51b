//! Category route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};
use tracing::instrument;

use crate::api::{Category, ProductQuery};
use crate::error::AppError;
use crate::filters;
use crate::middleware::PageContext;
use crate::routes::home::CategoryView;
use crate::routes::products::{LISTING_FETCH_LIMIT, ListingQuery, ListingView, ProductsIndexTemplate};
use crate::state::AppState;

/// Category list template.
#[derive(Template, WebTemplate)]
#[template(path = "categories/index.html")]
pub struct CategoriesIndexTemplate {
    pub page: PageContext,
    pub categories: Vec<CategoryView>,
}

/// Display all categories.
#[instrument(skip(state, page))]
pub async fn index(
    State(state): State<AppState>,
    page: PageContext,
) -> Result<impl IntoResponse, AppError> {
    let categories = state.api().categories().await?;

    Ok(CategoriesIndexTemplate {
        page,
        categories: categories.iter().map(CategoryView::from).collect(),
    })
}

/// Find a category by slug (case-insensitive) or id.
fn find_category<'a>(categories: &'a [Category], slug_or_id: &str) -> Option<&'a Category> {
    categories.iter().find(|c| {
        c.id.as_str() == slug_or_id
            || c.slug
                .as_deref()
                .is_some_and(|slug| slug.eq_ignore_ascii_case(slug_or_id))
    })
}

/// Display one category's products with the listing filters.
#[instrument(skip(state, page))]
pub async fn show(
    State(state): State<AppState>,
    page: PageContext,
    Path(slug): Path<String>,
    Query(query): Query<ListingQuery>,
) -> Result<Response, AppError> {
    let categories = state.api().categories().await?;
    let category = find_category(&categories, &slug)
        .ok_or_else(|| AppError::NotFound(format!("category {slug}")))?;

    let fetch = ProductQuery {
        limit: LISTING_FETCH_LIMIT,
        category: Some(category.id.to_string()),
        ..ProductQuery::default()
    };
    let products = state.api().products(&fetch).await?.products;

    let base_path = format!("/categories/{}", category.path_segment());
    Ok(ProductsIndexTemplate {
        page,
        listing: ListingView::build(
            category.name.clone(),
            base_path,
            products,
            query,
            Some(category.id.to_string()),
        ),
        search_query: None,
    }
    .into_response())
}

#[cfg(test)]
mod tests {
    use shreeaura_core::CategoryId;

    use super::*;

    fn category(id: &str, slug: Option<&str>) -> Category {
        Category {
            id: CategoryId::new(id),
            name: id.to_uppercase(),
            slug: slug.map(str::to_owned),
            image: None,
        }
    }

    #[test]
    fn test_find_category_by_slug_or_id() {
        let categories = vec![
            category("c1", Some("hair-care")),
            category("c2", None),
        ];
        assert_eq!(
            find_category(&categories, "Hair-Care").map(|c| c.id.as_str()),
            Some("c1")
        );
        assert_eq!(find_category(&categories, "c2").map(|c| c.id.as_str()), Some("c2"));
        assert!(find_category(&categories, "snacks").is_none());
    }
}
