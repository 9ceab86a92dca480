use async_trait::async_trait;
use log::debug;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use crate::price_source::{rate_to_price_per_gram, GoldPriceSource, PriceOrigin, SourceError};

/// MetalpriceAPI (`base=XAU&symbols=USD`), credential sent as `access_key` query param.
#[derive(Clone)]
pub struct MetalPriceApiSource {
    client: reqwest::Client,
    url: String,
    api_key: String,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct MetalPriceApiResponse {
    #[serde(default)]
    rates: Option<HashMap<String, f64>>,
}

impl MetalPriceApiSource {
    pub fn new(
        client: reqwest::Client,
        url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            url: url.into(),
            api_key: api_key.into(),
            timeout,
        }
    }
}

#[async_trait]
impl GoldPriceSource for MetalPriceApiSource {
    fn name(&self) -> &'static str {
        "MetalpriceAPI"
    }

    fn origin(&self) -> PriceOrigin {
        PriceOrigin::MetalPriceApi
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn fetch_price(&self) -> Result<f64, SourceError> {
        let response = self
            .client
            .get(&self.url)
            .query(&[
                ("access_key", self.api_key.as_str()),
                ("base", "XAU"),
                ("symbols", "USD"),
            ])
            .timeout(self.timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SourceError::Status(response.status()));
        }

        let body: MetalPriceApiResponse = response.json().await?;
        // rates.USD arrives inverted (troy ounces per USD)
        let rate = body
            .rates
            .and_then(|r| r.get("USD").copied())
            .ok_or(SourceError::MissingField("rates.USD"))?;
        debug!("MetalpriceAPI rate USD={}", rate);

        rate_to_price_per_gram(rate)
    }
}
