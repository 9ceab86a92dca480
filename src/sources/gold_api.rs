use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use crate::price_source::{GoldPriceSource, PriceOrigin, SourceError};

/// GoldAPI.io, credential sent as `x-access-token` header. Quotes 24k price per gram directly.
#[derive(Clone)]
pub struct GoldApiSource {
    client: reqwest::Client,
    url: String,
    api_key: String,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct GoldApiResponse {
    #[serde(default)]
    price_gram_24k: Option<f64>,
}

impl GoldApiSource {
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
impl GoldPriceSource for GoldApiSource {
    fn name(&self) -> &'static str {
        "GoldAPI"
    }

    fn origin(&self) -> PriceOrigin {
        PriceOrigin::GoldApi
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn fetch_price(&self) -> Result<f64, SourceError> {
        let response = self
            .client
            .get(&self.url)
            .header("x-access-token", &self.api_key)
            .timeout(self.timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SourceError::Status(response.status()));
        }

        let body: GoldApiResponse = response.json().await?;
        body.price_gram_24k
            .ok_or(SourceError::MissingField("price_gram_24k"))
    }
}
