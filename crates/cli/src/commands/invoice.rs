//! Write an order invoice to a file.
//!
//! # Environment Variables
//!
//! - `SHREEAURA_API_TOKEN` - Customer bearer token that owns the order
//! - `STORE_NAME` / `STORE_ADDRESS` / `STORE_GSTIN` / `STORE_SUPPORT_PHONE` -
//!   Invoice header details

use std::path::Path;

use chrono::Utc;

use shreeaura_core::OrderId;
use shreeaura_storefront::api::{AccessToken, ApiClient, ApiError};
use shreeaura_storefront::config::{ApiConfig, ConfigError, StoreInfo};
use shreeaura_storefront::invoice::Invoice;

/// Errors from the invoice command.
#[derive(Debug, thiserror::Error)]
pub enum InvoiceError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Template error: {0}")]
    Render(#[from] askama::Error),

    #[error("Could not write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Fetch `order_id` and write its invoice HTML to `out`.
///
/// # Errors
///
/// Returns an error if the token is missing, the order cannot be fetched, or
/// the file cannot be written.
pub async fn write(order_id: &str, out: &Path) -> Result<(), InvoiceError> {
    dotenvy::dotenv().ok();

    let token = std::env::var("SHREEAURA_API_TOKEN")
        .map(AccessToken::new)
        .map_err(|_| InvoiceError::MissingEnvVar("SHREEAURA_API_TOKEN"))?;

    let api = ApiClient::new(&ApiConfig::from_env()?)?;
    let order = api.order(&token, &OrderId::new(order_id)).await?;

    let invoice = Invoice::from_order(&order, &StoreInfo::from_env(), Utc::now());
    let html = invoice.render_html()?;

    tokio::fs::write(out, html)
        .await
        .map_err(|source| InvoiceError::Write {
            path: out.display().to_string(),
            source,
        })?;

    tracing::info!(invoice = %invoice.number, path = %out.display(), "Invoice written");
    Ok(())
}
