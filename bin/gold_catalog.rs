//! # Gold Catalog Service
//!
//! Serves the jewelry catalog API with live gold-based pricing.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --bin gold_catalog -- --port 8000
//! ```
//!
//! Credentials are read from `.env` / the environment (`METAL_PRICE_API_KEY`,
//! `GOLDAPI_KEY`, `METALS_API_KEY`). Press Ctrl+C to stop gracefully.

use anyhow::Result;
use clap::Parser;
use gold_catalog::{settings::Settings, webserver};
use std::sync::Arc;

#[derive(Debug, Parser)]
#[command(name = "gold_catalog", version, about = "Jewelry catalog API with gold-based pricing")]
struct Args {
    /// Config file (defaults to ./Config.toml when present)
    #[arg(short, long)]
    config: Option<String>,
    /// Bind host, overrides config and HOST
    #[arg(long)]
    host: Option<String>,
    /// Bind port, overrides config and PORT
    #[arg(short, long)]
    port: Option<u16>,
    /// Product JSON file, overrides config and PRODUCTS_PATH
    #[arg(long)]
    products: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    let args = Args::parse();

    let mut settings = Settings::load(args.config.as_deref())?;
    if let Some(host) = args.host {
        settings.server.host = host;
    }
    if let Some(port) = args.port {
        settings.server.port = port;
    }
    if let Some(products) = args.products {
        settings.catalog.products_path = products;
    }

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(settings.log_filter()),
    )
    .init();
    for ignored in &settings.ignored_overrides {
        log::warn!("Ignoring environment override {}", ignored);
    }

    init_metrics(&settings)?;

    let state = Arc::new(webserver::AppState::from_settings(Arc::new(settings))?);
    webserver::start_server(state).await
}

#[cfg(feature = "observability")]
fn init_metrics(settings: &Settings) -> Result<()> {
    if !settings.metrics.enabled {
        return Ok(());
    }
    let addr: std::net::SocketAddr = ([0, 0, 0, 0], settings.metrics.port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;
    gold_catalog::metrics::describe_metrics();
    log::info!("Prometheus metrics exposed on {}", addr);
    Ok(())
}

#[cfg(not(feature = "observability"))]
fn init_metrics(settings: &Settings) -> Result<()> {
    if settings.metrics.enabled {
        log::warn!(
            "metrics.enabled is set but the binary was built without the `observability` feature"
        );
    }
    Ok(())
}
