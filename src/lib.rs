//! # Gold Catalog
//!
//! Read-only jewelry catalog API. Product prices are computed on every request from
//! a live gold price per gram, the product's weight and its popularity score.
//!
//! ## Overview
//!
//! - **Gold price acquisition**: an ordered list of external sources, each under a
//!   short deadline, with one overall deadline collapsing to a static fallback price
//! - **Pricing**: `(popularity * 100 + 1) * weight * gold_price`, plus popularity
//!   conversions to a percentage and a 5-point scale
//! - **Catalog**: products loaded once from JSON, priced and filtered per request
//! - **HTTP**: axum endpoints under `/api`, CORS, optional static front-end
//!
//! ## Architecture
//!
//! ### Price Feed Layer
//! `GoldPriceSource` implementations (MetalpriceAPI, GoldAPI, Metals-API, free) are
//! walked by `PriceFeed`. Failures are logged and never surface to callers.
//!
//! ### Presentation Layer
//! Handlers call the feed once per request and price each product against that quote.

// Gold Price Feed
/// Trait for gold price providers
pub mod price_source;
/// Provider implementations
pub mod sources;
/// Ordered multi-source acquisition with deadlines and fallback
pub mod price_feeds;

// Pricing & Catalog
/// Price formula and popularity conversions
pub mod pricing;
/// Product model, loading and filtering
pub mod catalog;

// Infrastructure
/// HTTP routes and server lifecycle
pub mod webserver;
/// Metrics and observability
pub mod metrics;

// Settings & Configuration
/// Configuration management
pub mod settings;

// Re-exports for convenience
pub use catalog::Catalog;
pub use price_feeds::{GoldQuote, PriceFeed};
pub use price_source::{GoldPriceSource, PriceOrigin};
pub use settings::Settings;
