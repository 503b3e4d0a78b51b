//! Shree Aura CLI - Session store migration and operator tools.
//!
//! # Usage
//!
//! ```bash
//! # Create the session table
//! sa-cli migrate
//!
//! # Check the backend API is reachable
//! sa-cli check-api
//!
//! # Write an invoice for an order (token in SHREEAURA_API_TOKEN)
//! sa-cli invoice --order 65f0c9a1b2c3d4e5f6a7b8c9 --out invoice.html
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "sa-cli")]
#[command(author, version, about = "Shree Aura CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the session store table
    Migrate,
    /// Call the backend health and catalogue endpoints
    CheckApi,
    /// Render an order's invoice to an HTML file
    Invoice {
        /// Order id
        #[arg(short, long)]
        order: String,

        /// Output file
        #[arg(long, default_value = "invoice.html")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::sessions().await?,
        Commands::CheckApi => commands::check_api::run().await?,
        Commands::Invoice { order, out } => commands::invoice::write(&order, &out).await?,
    }
    Ok(())
}
