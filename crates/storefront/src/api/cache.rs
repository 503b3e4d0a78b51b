//! Cache types for catalogue responses.

use crate::api::types::{Category, Product, ProductPage, ProductQuery};

/// Cache key for catalogue lookups.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Categories,
    Product(String),
    Products(ProductQuery),
    Search(String),
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Categories(Vec<Category>),
    Product(Box<Product>),
    Products(ProductPage),
}
