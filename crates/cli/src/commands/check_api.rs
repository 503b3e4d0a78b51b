//! Backend API smoke check.
//!
//! Calls `/api/health` and `/api/categories` on `SHREEAURA_API_URL` and
//! reports what came back.

use shreeaura_storefront::api::{ApiClient, ApiError, ProductQuery};
use shreeaura_storefront::config::{ApiConfig, ConfigError};

/// Errors from the check-api command.
#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Run the check.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or any call fails.
#[allow(clippy::print_stdout)]
pub async fn run() -> Result<(), CheckError> {
    dotenvy::dotenv().ok();

    let config = ApiConfig::from_env()?;
    let api = ApiClient::new(&config)?;
    tracing::info!(url = %api.base_url(), "Checking backend API");

    api.health().await?;
    tracing::info!("Health endpoint OK");

    let categories = api.categories().await?;
    let products = api.products(&ProductQuery::default()).await?;

    println!("API:        {}", api.base_url());
    println!("Categories: {}", categories.len());
    println!("Products:   {} (page 1 of {})", products.total, products.pages);

    Ok(())
}
