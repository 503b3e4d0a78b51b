//! Client-side filtering, sorting and pagination of product lists.
//!
//! The backend only filters by category; everything in the sidebar (brand,
//! price band, stock, rating) is applied here to the fetched page.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use rust_decimal::Decimal;

use crate::api::Product;

/// Sidebar filters. Each set field narrows the result; unset fields match
/// everything.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ProductFilter {
    /// Category slug or id.
    pub category: Option<String>,
    pub brand: Option<String>,
    /// Inclusive lower bound on selling price.
    pub min_price: Option<Decimal>,
    /// Inclusive upper bound on selling price.
    pub max_price: Option<Decimal>,
    pub in_stock_only: bool,
    pub min_rating: Option<f32>,
}

impl ProductFilter {
    /// Whether `product` passes every set predicate.
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        self.matches_category(product)
            && self.matches_brand(product)
            && self.matches_price(product)
            && (!self.in_stock_only || product.in_stock())
            && self
                .min_rating
                .is_none_or(|min| product.rating.is_some_and(|rating| rating >= min))
    }

    /// Whether any filter is set.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self != &Self::default()
    }

    fn matches_category(&self, product: &Product) -> bool {
        let Some(category) = self.category.as_deref() else {
            return true;
        };
        product
            .category
            .as_ref()
            .is_some_and(|c| c.matches(category))
    }

    fn matches_brand(&self, product: &Product) -> bool {
        let Some(brand) = self.brand.as_deref() else {
            return true;
        };
        product
            .brand
            .as_deref()
            .is_some_and(|b| b.trim().eq_ignore_ascii_case(brand.trim()))
    }

    fn matches_price(&self, product: &Product) -> bool {
        self.min_price.is_none_or(|min| product.price >= min)
            && self.max_price.is_none_or(|max| product.price <= max)
    }
}

/// Listing sort order.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ProductSort {
    /// Backend order.
    #[default]
    Relevance,
    PriceLowHigh,
    PriceHighLow,
    Newest,
    Rating,
    Discount,
}

impl ProductSort {
    /// Every option, in the order shown in the sort dropdown.
    pub const ALL: [Self; 6] = [
        Self::Relevance,
        Self::PriceLowHigh,
        Self::PriceHighLow,
        Self::Newest,
        Self::Rating,
        Self::Discount,
    ];

    /// Parse from URL parameter value. Unknown values fall back to
    /// [`ProductSort::Relevance`].
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s {
            "price-ascending" | "price_asc" => Self::PriceLowHigh,
            "price-descending" | "price_desc" => Self::PriceHighLow,
            "newest" => Self::Newest,
            "rating" => Self::Rating,
            "discount" => Self::Discount,
            _ => Self::Relevance,
        }
    }

    /// Convert to URL parameter value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Relevance => "relevance",
            Self::PriceLowHigh => "price-ascending",
            Self::PriceHighLow => "price-descending",
            Self::Newest => "newest",
            Self::Rating => "rating",
            Self::Discount => "discount",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Relevance => "Relevance",
            Self::PriceLowHigh => "Price: Low to High",
            Self::PriceHighLow => "Price: High to Low",
            Self::Newest => "Newest",
            Self::Rating => "Top rated",
            Self::Discount => "Biggest discount",
        }
    }

    fn compare(self, a: &Product, b: &Product) -> Ordering {
        match self {
            Self::Relevance => Ordering::Equal,
            Self::PriceLowHigh => a.price.cmp(&b.price),
            Self::PriceHighLow => b.price.cmp(&a.price),
            // Undated products sort last.
            Self::Newest => b.created_at.cmp(&a.created_at),
            Self::Rating => b
                .rating
                .unwrap_or(0.0)
                .total_cmp(&a.rating.unwrap_or(0.0)),
            Self::Discount => b
                .discount_percent()
                .unwrap_or(0)
                .cmp(&a.discount_percent().unwrap_or(0)),
        }
    }
}

/// Filter then sort. The sort is stable, so ties keep backend order.
#[must_use]
pub fn apply(products: Vec<Product>, filter: &ProductFilter, sort: ProductSort) -> Vec<Product> {
    let mut products: Vec<Product> = products
        .into_iter()
        .filter(|product| filter.matches(product))
        .collect();
    if sort != ProductSort::Relevance {
        products.sort_by(|a, b| sort.compare(a, b));
    }
    products
}

/// Distinct brand names, sorted, for the brand filter.
#[must_use]
pub fn brands(products: &[Product]) -> Vec<String> {
    products
        .iter()
        .filter_map(|p| p.brand.as_deref())
        .map(str::trim)
        .filter(|b| !b.is_empty())
        .map(str::to_owned)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// One page of a larger list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based, clamped to `1..=total_pages`.
    pub page: usize,
    /// At least 1, even for an empty list.
    pub total_pages: usize,
    pub total_items: usize,
}

impl<T> Page<T> {
    #[must_use]
    pub const fn has_previous(&self) -> bool {
        self.page > 1
    }

    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

/// Slice `items` into pages of `per_page`. Out-of-range pages clamp to the
/// nearest valid page.
#[must_use]
pub fn paginate<T>(items: Vec<T>, page: usize, per_page: usize) -> Page<T> {
    let per_page = per_page.max(1);
    let total_items = items.len();
    let total_pages = total_items.div_ceil(per_page).max(1);
    let page = page.clamp(1, total_pages);

    let items = items
        .into_iter()
        .skip((page - 1) * per_page)
        .take(per_page)
        .collect();

    Page {
        items,
        page,
        total_pages,
        total_items,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn product(id: &str, price: i64, brand: &str, stock: u32, rating: Option<f32>) -> Product {
        serde_json::from_value(json!({
            "_id": id,
            "name": format!("Product {id}"),
            "brand": brand,
            "category": { "_id": "c1", "name": "Hair Care", "slug": "hair-care" },
            "price": price,
            "stock": stock,
            "rating": rating,
        }))
        .unwrap()
    }

    fn catalogue() -> Vec<Product> {
        vec![
            product("a", 250, "Aura Naturals", 5, Some(4.5)),
            product("b", 120, "Vedika", 0, Some(3.9)),
            product("c", 480, "aura naturals ", 2, None),
            product("d", 120, "Khadi", 9, Some(4.8)),
        ]
    }

    fn ids(products: &[Product]) -> Vec<&str> {
        products.iter().map(|p| p.id.as_str()).collect()
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let filter = ProductFilter::default();
        assert!(!filter.is_active());
        assert_eq!(apply(catalogue(), &filter, ProductSort::Relevance).len(), 4);
    }

    #[test]
    fn test_filters_compose_as_conjunction() {
        let filter = ProductFilter {
            brand: Some("Aura Naturals".to_string()),
            max_price: Some(Decimal::from(300)),
            ..ProductFilter::default()
        };
        assert_eq!(ids(&apply(catalogue(), &filter, ProductSort::Relevance)), ["a"]);

        let filter = ProductFilter {
            in_stock_only: true,
            min_rating: Some(4.0),
            ..ProductFilter::default()
        };
        assert_eq!(ids(&apply(catalogue(), &filter, ProductSort::Relevance)), ["a", "d"]);
    }

    #[test]
    fn test_category_filter() {
        let filter = ProductFilter {
            category: Some("hair-care".to_string()),
            ..ProductFilter::default()
        };
        assert_eq!(apply(catalogue(), &filter, ProductSort::Relevance).len(), 4);

        let filter = ProductFilter {
            category: Some("skin-care".to_string()),
            ..ProductFilter::default()
        };
        assert!(apply(catalogue(), &filter, ProductSort::Relevance).is_empty());
    }

    #[test]
    fn test_price_sort_is_stable() {
        let sorted = apply(catalogue(), &ProductFilter::default(), ProductSort::PriceLowHigh);
        assert_eq!(ids(&sorted), ["b", "d", "a", "c"]);

        let sorted = apply(catalogue(), &ProductFilter::default(), ProductSort::PriceHighLow);
        assert_eq!(ids(&sorted), ["c", "a", "b", "d"]);
    }

    #[test]
    fn test_rating_sort_puts_unrated_last() {
        let sorted = apply(catalogue(), &ProductFilter::default(), ProductSort::Rating);
        assert_eq!(ids(&sorted), ["d", "a", "b", "c"]);
    }

    #[test]
    fn test_sort_round_trip() {
        for sort in ProductSort::ALL {
            assert_eq!(ProductSort::parse(sort.as_str()), sort);
        }
        assert_eq!(ProductSort::parse("bogus"), ProductSort::Relevance);
    }

    #[test]
    fn test_brands_are_distinct_and_sorted() {
        assert_eq!(
            brands(&catalogue()),
            ["Aura Naturals", "Khadi", "Vedika", "aura naturals"]
        );
    }

    #[test]
    fn test_paginate() {
        let page = paginate((1..=25).collect::<Vec<_>>(), 3, 10);
        assert_eq!(page.items, (21..=25).collect::<Vec<_>>());
        assert_eq!(page.total_pages, 3);
        assert!(page.has_previous());
        assert!(!page.has_next());
    }

    #[test]
    fn test_paginate_clamps() {
        let page = paginate((1..=5).collect::<Vec<_>>(), 9, 2);
        assert_eq!(page.page, 3);
        assert_eq!(page.items, [5]);

        let empty = paginate(Vec::<u8>::new(), 0, 10);
        assert_eq!(empty.page, 1);
        assert_eq!(empty.total_pages, 1);
        assert!(empty.items.is_empty());
    }
}
