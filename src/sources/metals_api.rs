use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use crate::price_source::{rate_to_price_per_gram, GoldPriceSource, PriceOrigin, SourceError};

/// Metals-API (`base=USD&symbols=XAU`). `rates.XAU` is troy ounces per USD.
#[derive(Clone)]
pub struct MetalsApiSource {
    client: reqwest::Client,
    url: String,
    api_key: String,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct MetalsApiResponse {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    rates: Option<HashMap<String, f64>>,
    #[serde(default)]
    error: Option<MetalsApiError>,
}

#[derive(Debug, Deserialize)]
struct MetalsApiError {
    #[serde(default)]
    code: Option<i64>,
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    info: Option<String>,
}

impl MetalsApiError {
    fn describe(&self) -> String {
        let detail = self
            .info
            .as_deref()
            .or(self.kind.as_deref())
            .unwrap_or("no details");
        match self.code {
            Some(code) => format!("{} ({})", detail, code),
            None => detail.to_string(),
        }
    }
}

impl MetalsApiSource {
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
impl GoldPriceSource for MetalsApiSource {
    fn name(&self) -> &'static str {
        "Metals-API"
    }

    fn origin(&self) -> PriceOrigin {
        PriceOrigin::MetalsApi
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
                ("base", "USD"),
                ("symbols", "XAU"),
            ])
            .timeout(self.timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SourceError::Status(response.status()));
        }

        let body: MetalsApiResponse = response.json().await?;
        // Errors come back as 200 with success=false
        if body.success == Some(false) {
            let reason = body
                .error
                .as_ref()
                .map(MetalsApiError::describe)
                .unwrap_or_else(|| "success=false".to_string());
            return Err(SourceError::Rejected(reason));
        }
        let rate = body
            .rates
            .and_then(|r| r.get("XAU").copied())
            .ok_or(SourceError::MissingField("rates.XAU"))?;

        rate_to_price_per_gram(rate)
    }
}
