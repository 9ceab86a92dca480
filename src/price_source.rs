//! # Gold Price Source Trait
//!
//! Core abstraction for integrating external gold price providers. Each provider
//! implements `GoldPriceSource`; the `PriceFeed` walks an ordered list of them and
//! takes the first usable answer.
//!
//! ## Adding a New Provider
//!
//! 1. Implement `GoldPriceSource` in `sources/`
//! 2. Add a `PriceOrigin` variant
//! 3. Register it in `PriceFeed::from_settings` at the right priority
//!
//! ## Example
//!
//! ```rust,no_run
//! use async_trait::async_trait;
//! use gold_catalog::price_source::{GoldPriceSource, PriceOrigin, SourceError};
//! use std::time::Duration;
//!
//! struct FixedSource;
//!
//! #[async_trait]
//! impl GoldPriceSource for FixedSource {
//!     fn name(&self) -> &'static str {
//!         "fixed"
//!     }
//!
//!     fn origin(&self) -> PriceOrigin {
//!         PriceOrigin::Free
//!     }
//!
//!     fn timeout(&self) -> Duration {
//!         Duration::from_millis(100)
//!     }
//!
//!     async fn fetch_price(&self) -> Result<f64, SourceError> {
//!         Ok(64.0)
//!     }
//! }
//! ```

use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Grams in one troy ounce.
pub const TROY_OUNCE_GRAMS: f64 = 31.1035;

/// Where a served gold price came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceOrigin {
    MetalPriceApi,
    GoldApi,
    MetalsApi,
    Free,
    /// Static constant, used when no source answered in time
    Fallback,
}

impl PriceOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            PriceOrigin::MetalPriceApi => "metal_price_api",
            PriceOrigin::GoldApi => "gold_api",
            PriceOrigin::MetalsApi => "metals_api",
            PriceOrigin::Free => "free",
            PriceOrigin::Fallback => "fallback",
        }
    }
}

impl fmt::Display for PriceOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a single source produced no price. Never leaves the `PriceFeed`.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("HTTP error: {0}")]
    Status(reqwest::StatusCode),
    #[error("provider rejected the request: {0}")]
    Rejected(String),
    #[error("response is missing `{0}`")]
    MissingField(&'static str),
    #[error("unusable exchange rate: {0}")]
    InvalidRate(f64),
}

/// One external gold price provider.
///
/// Implementations report price per gram in USD. They do not enforce their own
/// deadline; the caller wraps `fetch_price` in `timeout()`.
#[async_trait]
pub trait GoldPriceSource: Send + Sync {
    fn name(&self) -> &'static str;

    fn origin(&self) -> PriceOrigin;

    /// Per-attempt deadline.
    fn timeout(&self) -> Duration;

    async fn fetch_price(&self) -> Result<f64, SourceError>;
}

/// Converts an XAU exchange rate (troy ounces per USD) into USD per gram.
pub fn rate_to_price_per_gram(rate: f64) -> Result<f64, SourceError> {
    if !rate.is_finite() || rate <= 0.0 {
        return Err(SourceError::InvalidRate(rate));
    }
    Ok((1.0 / rate) / TROY_OUNCE_GRAMS)
}
