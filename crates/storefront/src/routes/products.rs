//! Product route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use shreeaura_core::ProductId;

use crate::api::{ApiError, Product, ProductQuery, Review};
use crate::catalog::{self, ProductFilter, ProductSort};
use crate::error::AppError;
use crate::filters;
use crate::flash::{self, Toast};
use crate::middleware::{OptionalAuth, PageContext, RequireAuth};
use crate::state::AppState;

/// Products per listing page.
pub const PRODUCTS_PER_PAGE: usize = 24;

/// How many products are fetched from the backend before filtering.
pub const LISTING_FETCH_LIMIT: u32 = 200;

/// Related products shown on the detail page.
const RELATED_LIMIT: usize = 4;

/// Longest review comment accepted.
const MAX_REVIEW_LENGTH: usize = 1000;

// =============================================================================
// Views
// =============================================================================

/// Product card data for templates.
#[derive(Debug, Clone)]
pub struct ProductCardView {
    pub id: String,
    pub href: String,
    pub name: String,
    pub brand: Option<String>,
    pub image: Option<String>,
    pub price: String,
    pub mrp: Option<String>,
    pub discount_percent: Option<u32>,
    pub unit: Option<String>,
    pub in_stock: bool,
    pub rating: Option<f32>,
    pub review_count: u32,
}

impl From<&Product> for ProductCardView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.to_string(),
            href: format!("/products/{}", product.id),
            name: product.name.clone(),
            brand: product.brand.clone(),
            image: product.primary_image().map(str::to_owned),
            price: product.selling_price().display(),
            mrp: product.mrp_price().map(|p| p.display()),
            discount_percent: product.discount_percent(),
            unit: product.unit.clone(),
            in_stock: product.in_stock(),
            rating: product.rating,
            review_count: product.review_count,
        }
    }
}

/// Product detail data for templates.
#[derive(Debug, Clone)]
pub struct ProductDetailView {
    pub card: ProductCardView,
    pub description: String,
    pub images: Vec<String>,
    pub category_name: Option<String>,
    /// Quantity choices for the add-to-cart form.
    pub quantity_options: Vec<u32>,
    pub low_stock: Option<u32>,
}

impl From<&Product> for ProductDetailView {
    fn from(product: &Product) -> Self {
        let limit = product.stock.min(shreeaura_core::cart::MAX_LINE_QUANTITY);
        Self {
            card: ProductCardView::from(product),
            description: product.description.clone(),
            images: product.images.clone(),
            category_name: product
                .category
                .as_ref()
                .and_then(|c| c.name())
                .map(str::to_owned),
            quantity_options: (1..=limit).collect(),
            low_stock: (product.stock > 0 && product.stock <= 5).then_some(product.stock),
        }
    }
}

/// Review data for templates.
#[derive(Debug, Clone)]
pub struct ReviewView {
    pub author: String,
    pub rating: u8,
    pub comment: String,
    pub date: Option<String>,
}

impl From<&Review> for ReviewView {
    fn from(review: &Review) -> Self {
        Self {
            author: review
                .user_name
                .clone()
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| "Verified buyer".to_string()),
            rating: review.rating,
            comment: review.comment.clone(),
            date: review
                .created_at
                .map(|d| d.format("%d %b %Y").to_string()),
        }
    }
}

/// A sort dropdown option.
#[derive(Debug, Clone)]
pub struct SortOption {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

// =============================================================================
// Listing (shared by products, categories and search)
// =============================================================================

/// Listing query parameters: sidebar filters, sort and page.
///
/// Numeric fields arrive as strings because blank form inputs are sent as
/// empty values.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ListingQuery {
    pub q: Option<String>,
    pub page: Option<usize>,
    pub sort: Option<String>,
    pub brand: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub in_stock: Option<String>,
    pub rating: Option<String>,
}

fn non_blank(value: Option<&String>) -> Option<&str> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty())
}

impl ListingQuery {
    /// Build the filter; unparseable numbers are ignored.
    #[must_use]
    pub fn filter(&self, category: Option<String>) -> ProductFilter {
        ProductFilter {
            category,
            brand: non_blank(self.brand.as_ref()).map(str::to_owned),
            min_price: non_blank(self.min_price.as_ref()).and_then(|v| v.parse::<Decimal>().ok()),
            max_price: non_blank(self.max_price.as_ref()).and_then(|v| v.parse::<Decimal>().ok()),
            in_stock_only: non_blank(self.in_stock.as_ref()).is_some_and(|v| v != "0" && v != "false"),
            min_rating: non_blank(self.rating.as_ref()).and_then(|v| v.parse::<f32>().ok()),
        }
    }

    #[must_use]
    pub fn sort(&self) -> ProductSort {
        self.sort.as_deref().map_or_else(ProductSort::default, ProductSort::parse)
    }

    /// Query string for another page of the same listing.
    #[must_use]
    pub fn page_query(&self, page: usize) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        let fields = [
            ("q", &self.q),
            ("sort", &self.sort),
            ("brand", &self.brand),
            ("min_price", &self.min_price),
            ("max_price", &self.max_price),
            ("in_stock", &self.in_stock),
            ("rating", &self.rating),
        ];
        for (name, value) in fields {
            if let Some(value) = non_blank(value.as_ref()) {
                serializer.append_pair(name, value);
            }
        }
        serializer.append_pair("page", &page.to_string());
        serializer.finish()
    }
}

/// Current filter values for re-filling the sidebar form.
#[derive(Debug, Clone, Default)]
pub struct FilterFormView {
    pub q: String,
    pub brand: String,
    pub min_price: String,
    pub max_price: String,
    pub in_stock: bool,
    pub rating: String,
}

impl From<&ListingQuery> for FilterFormView {
    fn from(query: &ListingQuery) -> Self {
        let text = |value: Option<&String>| non_blank(value).unwrap_or_default().to_owned();
        Self {
            q: text(query.q.as_ref()),
            brand: text(query.brand.as_ref()),
            min_price: text(query.min_price.as_ref()),
            max_price: text(query.max_price.as_ref()),
            in_stock: query.filter(None).in_stock_only,
            rating: text(query.rating.as_ref()),
        }
    }
}

/// Listing data for templates.
pub struct ListingView {
    pub title: String,
    pub base_path: String,
    pub products: Vec<ProductCardView>,
    pub page: usize,
    pub total_pages: usize,
    pub total_items: usize,
    pub previous_href: Option<String>,
    pub next_href: Option<String>,
    pub brands: Vec<String>,
    pub sort_options: Vec<SortOption>,
    pub form: FilterFormView,
    pub filters_active: bool,
}

impl ListingView {
    /// Filter, sort and paginate `products` for display.
    #[must_use]
    pub fn build(
        title: impl Into<String>,
        base_path: impl Into<String>,
        products: Vec<Product>,
        query: ListingQuery,
        category: Option<String>,
    ) -> Self {
        let base_path = base_path.into();
        let filters_active = query.filter(None).is_active();
        let filter = query.filter(category);
        let sort = query.sort();
        let brands = catalog::brands(&products);

        let page = catalog::paginate(
            catalog::apply(products, &filter, sort),
            query.page.unwrap_or(1),
            PRODUCTS_PER_PAGE,
        );

        let href = |n: usize| format!("{base_path}?{}", query.page_query(n));
        let previous_href = page.has_previous().then(|| href(page.page - 1));
        let next_href = page.has_next().then(|| href(page.page + 1));

        Self {
            title: title.into(),
            products: page.items.iter().map(ProductCardView::from).collect(),
            page: page.page,
            total_pages: page.total_pages,
            total_items: page.total_items,
            previous_href,
            next_href,
            brands,
            sort_options: ProductSort::ALL
                .iter()
                .map(|s| SortOption {
                    value: s.as_str(),
                    label: s.label(),
                    selected: *s == sort,
                })
                .collect(),
            filters_active,
            form: FilterFormView::from(&query),
            base_path,
        }
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub page: PageContext,
    pub listing: ListingView,
    /// Shown above the grid on the search page.
    pub search_query: Option<String>,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub page: PageContext,
    pub product: ProductDetailView,
    pub reviews: Vec<ReviewView>,
    pub related_products: Vec<ProductCardView>,
    pub can_review: bool,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display product listing page.
#[instrument(skip(state, page))]
pub async fn index(
    State(state): State<AppState>,
    page: PageContext,
    Query(query): Query<ListingQuery>,
) -> Response {
    let fetch = ProductQuery {
        limit: LISTING_FETCH_LIMIT,
        ..ProductQuery::default()
    };
    let products = state.api().products(&fetch).await.map_or_else(
        |e| {
            tracing::error!("Failed to fetch products: {e}");
            Vec::new()
        },
        |page| page.products,
    );

    ProductsIndexTemplate {
        page,
        listing: ListingView::build("All products", "/products", products, query, None),
        search_query: None,
    }
    .into_response()
}

/// Display product detail page.
#[instrument(skip(state, page, customer))]
pub async fn show(
    State(state): State<AppState>,
    page: PageContext,
    OptionalAuth(customer): OptionalAuth,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let product = match state.api().product(&id).await {
        Ok(product) => product,
        Err(ApiError::NotFound(_)) => return Err(AppError::NotFound(format!("product {id}"))),
        Err(e) => return Err(e.into()),
    };

    let reviews = state.api().reviews(&product.id).await.unwrap_or_else(|e| {
        tracing::warn!("Failed to fetch reviews: {e}");
        Vec::new()
    });

    let related_products = related(&state, &product).await;

    Ok(ProductShowTemplate {
        page,
        product: ProductDetailView::from(&product),
        reviews: reviews.iter().map(ReviewView::from).collect(),
        related_products,
        can_review: customer.is_some(),
    }
    .into_response())
}

/// Other products from the same category.
async fn related(state: &AppState, product: &Product) -> Vec<ProductCardView> {
    let Some(category) = &product.category else {
        return Vec::new();
    };
    let category_id = match category {
        crate::api::CategoryRef::Populated(c) => c.id.to_string(),
        crate::api::CategoryRef::Id(id) => id.to_string(),
    };
    let query = ProductQuery {
        category: Some(category_id),
        ..ProductQuery::default()
    };

    match state.api().products(&query).await {
        Ok(page) => page
            .products
            .iter()
            .filter(|p| p.id != product.id)
            .take(RELATED_LIMIT)
            .map(ProductCardView::from)
            .collect(),
        Err(e) => {
            tracing::warn!("Failed to fetch related products: {e}");
            Vec::new()
        }
    }
}

/// Review form data.
#[derive(Debug, Deserialize)]
pub struct ReviewForm {
    pub rating: u8,
    #[serde(default)]
    pub comment: String,
}

/// Validate a review before it is sent.
///
/// # Errors
///
/// Returns a shopper-facing message for an out-of-range rating or a missing
/// or overlong comment.
pub fn validate_review(form: &ReviewForm) -> Result<(u8, &str), &'static str> {
    if !(1..=5).contains(&form.rating) {
        return Err("Please choose a rating from 1 to 5 stars.");
    }
    let comment = form.comment.trim();
    if comment.is_empty() {
        return Err("Please write a few words about the product.");
    }
    if comment.chars().count() > MAX_REVIEW_LENGTH {
        return Err("Reviews can be at most 1000 characters.");
    }
    Ok((form.rating, comment))
}

/// Submit a review.
#[instrument(skip(state, session, customer, form))]
pub async fn add_review(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(customer): RequireAuth,
    Path(id): Path<String>,
    Form(form): Form<ReviewForm>,
) -> Response {
    let back = format!("/products/{id}#reviews");

    let (rating, comment) = match validate_review(&form) {
        Ok(valid) => valid,
        Err(message) => {
            flash::push(&session, Toast::error(message)).await;
            return Redirect::to(&back).into_response();
        }
    };

    let product_id = ProductId::new(id);
    match state
        .api()
        .add_review(&customer.token, &product_id, rating, comment)
        .await
    {
        Ok(()) => flash::push(&session, Toast::success("Thanks for your review!")).await,
        Err(e) if e.is_unauthorized() => return AppError::from(e).into_response(),
        Err(e) => {
            tracing::warn!("Failed to add review: {e}");
            flash::push(&session, Toast::error(e.user_message())).await;
        }
    }

    Redirect::to(&back).into_response()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn query(query_string: &str) -> ListingQuery {
        let uri: axum::http::Uri = format!("/products?{query_string}").parse().unwrap();
        Query::<ListingQuery>::try_from_uri(&uri).unwrap().0
    }

    #[test]
    fn test_blank_filters_ignored() {
        let q = query("brand=&min_price=+&max_price=abc");
        assert!(!q.filter(None).is_active());
    }

    #[test]
    fn test_filter_parsing() {
        let q = query("brand=Khadi&min_price=100&in_stock=1&rating=4&sort=price-descending");
        let filter = q.filter(Some("hair-care".to_string()));
        assert_eq!(filter.brand.as_deref(), Some("Khadi"));
        assert_eq!(filter.min_price, Some(Decimal::from(100)));
        assert!(filter.in_stock_only);
        assert_eq!(filter.min_rating, Some(4.0));
        assert_eq!(filter.category.as_deref(), Some("hair-care"));
        assert_eq!(q.sort(), ProductSort::PriceHighLow);
    }

    #[test]
    fn test_page_query_keeps_filters() {
        let q = query("q=rose+water&brand=Khadi&page=1");
        assert_eq!(q.page_query(2), "q=rose+water&brand=Khadi&page=2");
    }

    #[test]
    fn test_validate_review() {
        let form = |rating, comment: &str| ReviewForm {
            rating,
            comment: comment.to_string(),
        };
        assert!(validate_review(&form(5, "Lovely fragrance")).is_ok());
        assert!(validate_review(&form(0, "x")).is_err());
        assert!(validate_review(&form(6, "x")).is_err());
        assert!(validate_review(&form(4, "   ")).is_err());
        assert!(validate_review(&form(4, &"a".repeat(1001))).is_err());
    }
}
