use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use crate::price_source::{GoldPriceSource, PriceOrigin, SourceError, TROY_OUNCE_GRAMS};

/// No-credential source, tried when nothing else is configured or everything else failed.
///
/// Without an endpoint it answers a constant. With one, it reads `{"price": <usd per troy ounce>}`.
#[derive(Clone)]
pub struct FreeSource {
    mode: FreeMode,
    timeout: Duration,
}

#[derive(Clone)]
enum FreeMode {
    Constant(f64),
    Endpoint { client: reqwest::Client, url: String },
}

#[derive(Debug, Deserialize)]
struct FreePriceResponse {
    #[serde(default)]
    price: Option<f64>,
}

impl FreeSource {
    pub fn constant(price_per_gram: f64) -> Self {
        Self {
            mode: FreeMode::Constant(price_per_gram),
            timeout: Duration::from_secs(2),
        }
    }

    pub fn endpoint(client: reqwest::Client, url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            mode: FreeMode::Endpoint {
                client,
                url: url.into(),
            },
            timeout,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn is_constant(&self) -> bool {
        matches!(self.mode, FreeMode::Constant(_))
    }
}

#[async_trait]
impl GoldPriceSource for FreeSource {
    fn name(&self) -> &'static str {
        "free"
    }

    fn origin(&self) -> PriceOrigin {
        PriceOrigin::Free
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn fetch_price(&self) -> Result<f64, SourceError> {
        let (client, url) = match &self.mode {
            FreeMode::Constant(price) => return Ok(*price),
            FreeMode::Endpoint { client, url } => (client, url),
        };

        let response = client.get(url).timeout(self.timeout).send().await?;
        if !response.status().is_success() {
            return Err(SourceError::Status(response.status()));
        }

        let body: FreePriceResponse = response.json().await?;
        let per_ounce = body.price.ok_or(SourceError::MissingField("price"))?;
        Ok(per_ounce / TROY_OUNCE_GRAMS)
    }
}
