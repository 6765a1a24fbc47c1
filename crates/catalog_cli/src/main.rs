//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `catalog_core` linkage without a web host.
//! - Optionally open a configured store and report how many products it holds.

use catalog_core::{init_logging_from, CatalogContext, ProductRepository, StoreConfig};
use clap::Parser;
use log::info;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "catalog_cli", about = "Catalog store smoke probe", version)]
struct Cli {
    /// JSON store config; falls back to `CATALOG_CONNECTION_STRING` when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Only print ping/version, do not open a store.
    #[arg(long)]
    offline: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    println!("catalog_core ping={}", catalog_core::ping());
    println!("catalog_core version={}", catalog_core::core_version());

    if cli.offline {
        return ExitCode::SUCCESS;
    }

    match check_store(cli.config) {
        Ok(count) => {
            println!("catalog_store products={count}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("catalog_store error={err}");
            ExitCode::FAILURE
        }
    }
}

fn check_store(config_path: Option<PathBuf>) -> Result<u64, String> {
    let config = match config_path {
        Some(path) => StoreConfig::from_file(path),
        None => StoreConfig::from_env(),
    }
    .map_err(|err| err.to_string())?;

    if let Some(settings) = &config.log {
        init_logging_from(settings)?;
    }

    let context = CatalogContext::connect(&config).map_err(|err| err.to_string())?;
    let count = context
        .products()
        .count_products()
        .map_err(|err| err.to_string())?;

    info!("event=cli_check module=cli status=ok products={count}");
    Ok(count)
}
