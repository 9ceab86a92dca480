// src/price_feeds.rs

use log::{debug, info, warn};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::metrics;
use crate::price_source::{GoldPriceSource, PriceOrigin};
use crate::settings::PriceSources;
use crate::sources::{FreeSource, GoldApiSource, MetalPriceApiSource, MetalsApiSource};

/// Price per gram served when no source answers in time.
pub const FALLBACK_PRICE_PER_GRAM: f64 = 65.0;
/// Bound on a whole acquisition, all sources included.
pub const DEFAULT_OVERALL_TIMEOUT: Duration = Duration::from_millis(5000);

/// One acquired gold price and where it came from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GoldQuote {
    pub price_per_gram: f64,
    pub origin: PriceOrigin,
}

/// Gold price acquisition with ordered fallback.
///
/// Walks an ordered list of sources and returns the first usable price. Each
/// attempt runs under its source's own deadline, and the whole walk runs under
/// `overall_timeout`. The last source's own deadline is reserved out of that
/// budget, so slow sources ahead of it cannot starve it. Errors never reach the
/// caller: an exhausted list or an expired deadline yields the fallback price.
///
/// Nothing is cached; every call hits the sources again.
///
/// ## Usage
///
/// ```rust,no_run
/// # async fn demo() -> anyhow::Result<()> {
/// use gold_catalog::{price_feeds::PriceFeed, settings::Settings};
///
/// let settings = Settings::new()?;
/// let feed = PriceFeed::from_settings(&settings.price_sources)?;
/// let price = feed.fetch_current_price().await;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct PriceFeed {
    sources: Vec<Arc<dyn GoldPriceSource>>,
    fallback_price: f64,
    overall_timeout: Duration,
}

impl PriceFeed {
    pub fn new(sources: Vec<Arc<dyn GoldPriceSource>>) -> Self {
        Self {
            sources,
            fallback_price: FALLBACK_PRICE_PER_GRAM,
            overall_timeout: DEFAULT_OVERALL_TIMEOUT,
        }
    }

    /// Negative or non-finite prices are replaced by `FALLBACK_PRICE_PER_GRAM`.
    pub fn with_fallback_price(mut self, price_per_gram: f64) -> Self {
        self.fallback_price = usable_fallback_price(price_per_gram);
        self
    }

    pub fn with_overall_timeout(mut self, timeout: Duration) -> Self {
        self.overall_timeout = timeout;
        self
    }

    /// Builds the source order from configured credentials.
    ///
    /// Keyed sources come first (MetalpriceAPI, GoldAPI, Metals-API), each only if
    /// its credential is set. The free source always closes the list, so with no
    /// credentials it is the only one tried.
    pub fn from_settings(cfg: &PriceSources) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_millis(cfg.source_timeout_ms))
            .build()?;
        let source_timeout = Duration::from_millis(cfg.source_timeout_ms);

        let mut sources: Vec<Arc<dyn GoldPriceSource>> = Vec::new();

        if !cfg.metal_price_api_key.trim().is_empty() {
            sources.push(Arc::new(MetalPriceApiSource::new(
                client.clone(),
                cfg.metal_price_api_url.clone(),
                cfg.metal_price_api_key.trim(),
                source_timeout,
            )));
        }
        if !cfg.goldapi_key.trim().is_empty() {
            sources.push(Arc::new(GoldApiSource::new(
                client.clone(),
                cfg.goldapi_url.clone(),
                cfg.goldapi_key.trim(),
                source_timeout,
            )));
        }
        if !cfg.metals_api_key.trim().is_empty() {
            sources.push(Arc::new(MetalsApiSource::new(
                client.clone(),
                cfg.metals_api_url.clone(),
                cfg.metals_api_key.trim(),
                source_timeout,
            )));
        }

        let free_timeout = Duration::from_millis(cfg.free_source_timeout_ms);
        let free = match cfg.free_source_url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => FreeSource::endpoint(client, url, free_timeout),
            _ => FreeSource::constant(cfg.free_source_price).with_timeout(free_timeout),
        };
        sources.push(Arc::new(free));

        let feed = Self::new(sources)
            .with_fallback_price(cfg.fallback_price)
            .with_overall_timeout(Duration::from_millis(cfg.overall_timeout_ms));
        info!(
            "Gold price feed configured: [{}] (overall timeout {}ms, fallback ${:.2}/g)",
            feed.source_names().join(" -> "),
            cfg.overall_timeout_ms,
            feed.fallback_price
        );
        Ok(feed)
    }

    pub fn source_names(&self) -> Vec<&'static str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    pub fn fallback_price(&self) -> f64 {
        self.fallback_price
    }

    /// Current gold price per gram in USD. Never fails.
    pub async fn fetch_current_price(&self) -> f64 {
        self.fetch_quote().await.price_per_gram
    }

    /// Like `fetch_current_price`, also reporting which source answered.
    pub async fn fetch_quote(&self) -> GoldQuote {
        let start = Instant::now();

        let walk = self.try_sources(start);
        let quote = match tokio::time::timeout(self.overall_timeout, walk).await {
            Ok(Some(quote)) => {
                info!(
                    "Gold price fetched successfully: ${:.2}/gram from {} in {:?}",
                    quote.price_per_gram,
                    quote.origin,
                    start.elapsed()
                );
                quote
            }
            Ok(None) => {
                warn!(
                    "All gold price sources failed, using fallback price ${:.2}/gram",
                    self.fallback_price
                );
                metrics::increment_fallback("exhausted");
                self.fallback_quote()
            }
            Err(_) => {
                warn!(
                    "Gold price fetch exceeded {:?}, using fallback price ${:.2}/gram",
                    self.overall_timeout, self.fallback_price
                );
                metrics::increment_fallback("deadline");
                self.fallback_quote()
            }
        };

        metrics::record_fetch_duration(start.elapsed());
        metrics::set_gold_price(quote.price_per_gram);
        quote
    }

    fn fallback_quote(&self) -> GoldQuote {
        GoldQuote {
            price_per_gram: self.fallback_price,
            origin: PriceOrigin::Fallback,
        }
    }

    /// The last source is the last resort, so its own timeout is held back from
    /// the overall budget: the sources ahead of it share what remains.
    async fn try_sources(&self, start: Instant) -> Option<GoldQuote> {
        let (last, leading) = self.sources.split_last()?;
        let leading_budget = self.overall_timeout.saturating_sub(last.timeout());

        for source in leading {
            let remaining = leading_budget.saturating_sub(start.elapsed());
            if remaining.is_zero() {
                warn!("Skipping {}: time left is reserved for {}", source.name(), last.name());
                metrics::record_source_attempt(source.name(), "skipped");
                continue;
            }
            if let Some(price) = attempt(source.as_ref(), remaining).await {
                return Some(GoldQuote {
                    price_per_gram: price,
                    origin: source.origin(),
                });
            }
        }

        let remaining = self.overall_timeout.saturating_sub(start.elapsed());
        attempt(last.as_ref(), remaining)
            .await
            .map(|price| GoldQuote {
                price_per_gram: price,
                origin: last.origin(),
            })
    }
}

/// Configured fallback, or the built-in one when that is negative or not a number.
fn usable_fallback_price(configured: f64) -> f64 {
    if configured.is_finite() && configured >= 0.0 {
        configured
    } else {
        warn!(
            "Ignoring fallback_price {}: using ${:.2}/gram",
            configured, FALLBACK_PRICE_PER_GRAM
        );
        FALLBACK_PRICE_PER_GRAM
    }
}

/// Runs one source under its own deadline, capped at `budget`. Any failure is
/// logged and becomes `None`.
pub async fn attempt(source: &dyn GoldPriceSource, budget: Duration) -> Option<f64> {
    let deadline = source.timeout().min(budget);
    match tokio::time::timeout(deadline, source.fetch_price()).await {
        Ok(Ok(price)) if price.is_finite() && price > 0.0 => {
            debug!("{} returned ${:.4}/gram", source.name(), price);
            metrics::record_source_attempt(source.name(), "ok");
            Some(price)
        }
        Ok(Ok(price)) => {
            warn!("{} returned unusable price {}", source.name(), price);
            metrics::record_source_attempt(source.name(), "invalid");
            None
        }
        Ok(Err(e)) => {
            warn!("{} error: {}", source.name(), e);
            metrics::record_source_attempt(source.name(), "error");
            None
        }
        Err(_) => {
            warn!("{} timed out after {:?}", source.name(), deadline);
            metrics::record_source_attempt(source.name(), "timeout");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::price_source::SourceError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    enum Behaviour {
        Price(f64),
        Delayed(Duration, f64),
        Fail,
        Hang,
    }

    struct FakeSource {
        name: &'static str,
        origin: PriceOrigin,
        behaviour: Behaviour,
        timeout: Duration,
        calls: AtomicUsize,
    }

    impl FakeSource {
        fn new(name: &'static str, origin: PriceOrigin, behaviour: Behaviour) -> Arc<Self> {
            Self::with_timeout(name, origin, behaviour, Duration::from_millis(50))
        }

        fn with_timeout(
            name: &'static str,
            origin: PriceOrigin,
            behaviour: Behaviour,
            timeout: Duration,
        ) -> Arc<Self> {
            Arc::new(Self {
                name,
                origin,
                behaviour,
                timeout,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl GoldPriceSource for FakeSource {
        fn name(&self) -> &'static str {
            self.name
        }

        fn origin(&self) -> PriceOrigin {
            self.origin
        }

        fn timeout(&self) -> Duration {
            self.timeout
        }

        async fn fetch_price(&self) -> Result<f64, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.behaviour {
                Behaviour::Price(p) => Ok(p),
                Behaviour::Delayed(delay, p) => {
                    tokio::time::sleep(delay).await;
                    Ok(p)
                }
                Behaviour::Fail => Err(SourceError::MissingField("rates.USD")),
                Behaviour::Hang => {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    Ok(1.0)
                }
            }
        }
    }

    #[tokio::test]
    async fn first_successful_source_wins() {
        let metal = FakeSource::new("metal", PriceOrigin::MetalPriceApi, Behaviour::Fail);
        let gold = FakeSource::new("gold", PriceOrigin::GoldApi, Behaviour::Price(70.2));
        let free = FakeSource::new("free", PriceOrigin::Free, Behaviour::Price(65.0));
        let sources: Vec<Arc<dyn GoldPriceSource>> =
            vec![metal.clone(), gold.clone(), free.clone()];
        let feed = PriceFeed::new(sources);

        let quote = feed.fetch_quote().await;
        assert_eq!(quote.price_per_gram, 70.2);
        assert_eq!(quote.origin, PriceOrigin::GoldApi);
        assert_eq!(metal.calls(), 1);
        assert_eq!(gold.calls(), 1);
        assert_eq!(free.calls(), 0, "sources after the winner must not run");
    }

    #[tokio::test]
    async fn hanging_source_is_skipped_after_its_deadline() {
        let slow = FakeSource::new("slow", PriceOrigin::MetalPriceApi, Behaviour::Hang);
        let free = FakeSource::new("free", PriceOrigin::Free, Behaviour::Price(66.5));
        let sources: Vec<Arc<dyn GoldPriceSource>> = vec![slow, free];
        let feed = PriceFeed::new(sources).with_overall_timeout(Duration::from_secs(2));

        let start = Instant::now();
        let quote = feed.fetch_quote().await;
        assert_eq!(quote.price_per_gram, 66.5);
        assert_eq!(quote.origin, PriceOrigin::Free);
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn all_failing_returns_fallback() {
        let sources: Vec<Arc<dyn GoldPriceSource>> = vec![
            FakeSource::new("metal", PriceOrigin::MetalPriceApi, Behaviour::Fail),
            FakeSource::new("gold", PriceOrigin::GoldApi, Behaviour::Fail),
            FakeSource::new("free", PriceOrigin::Free, Behaviour::Fail),
        ];
        let feed = PriceFeed::new(sources);

        let quote = feed.fetch_quote().await;
        assert_eq!(quote.price_per_gram, 65.0);
        assert_eq!(quote.origin, PriceOrigin::Fallback);
    }

    #[tokio::test]
    async fn overall_deadline_cuts_the_walk_short() {
        let mut slow = Vec::<Arc<dyn GoldPriceSource>>::new();
        for _ in 0..10 {
            slow.push(FakeSource::new("slow", PriceOrigin::GoldApi, Behaviour::Hang));
        }
        let feed = PriceFeed::new(slow).with_overall_timeout(Duration::from_millis(120));

        let start = Instant::now();
        let price = feed.fetch_current_price().await;
        assert_eq!(price, FALLBACK_PRICE_PER_GRAM);
        // 10 x 50ms per-source deadlines would take 500ms without the overall bound
        assert!(start.elapsed() < Duration::from_millis(400), "elapsed={:?}", start.elapsed());
    }

    #[tokio::test]
    async fn non_positive_and_nan_prices_are_not_usable() {
        let sources: Vec<Arc<dyn GoldPriceSource>> = vec![
            FakeSource::new("zero", PriceOrigin::MetalPriceApi, Behaviour::Price(0.0)),
            FakeSource::new("nan", PriceOrigin::GoldApi, Behaviour::Price(f64::NAN)),
            FakeSource::new("free", PriceOrigin::Free, Behaviour::Price(64.0)),
        ];
        let feed = PriceFeed::new(sources);
        assert_eq!(feed.fetch_current_price().await, 64.0);
    }

    #[tokio::test]
    async fn empty_source_list_returns_configured_fallback() {
        let feed = PriceFeed::new(Vec::new()).with_fallback_price(61.25);
        let quote = feed.fetch_quote().await;
        assert_eq!(quote.price_per_gram, 61.25);
        assert_eq!(quote.origin, PriceOrigin::Fallback);
    }

    #[test]
    fn no_credentials_means_only_the_free_source() {
        let feed = PriceFeed::from_settings(&PriceSources::default()).unwrap();
        assert_eq!(feed.source_names(), vec!["free"]);
    }

    #[test]
    fn keyed_sources_precede_the_free_source() {
        let cfg = PriceSources {
            metal_price_api_key: "m".into(),
            goldapi_key: "g".into(),
            metals_api_key: "x".into(),
            ..PriceSources::default()
        };
        let feed = PriceFeed::from_settings(&cfg).unwrap();
        assert_eq!(
            feed.source_names(),
            vec!["MetalpriceAPI", "GoldAPI", "Metals-API", "free"]
        );
    }

    #[tokio::test]
    async fn default_settings_serve_the_constant_free_price() {
        let feed = PriceFeed::from_settings(&PriceSources::default()).unwrap();
        let quote = feed.fetch_quote().await;
        assert_eq!(quote.price_per_gram, 65.0);
        assert_eq!(quote.origin, PriceOrigin::Free);
    }

    #[tokio::test]
    async fn last_resort_keeps_its_full_timeout_behind_slow_sources() {
        let keyed: Vec<Arc<FakeSource>> = ["metal", "gold", "metals"]
            .into_iter()
            .map(|name| {
                FakeSource::with_timeout(
                    name,
                    PriceOrigin::GoldApi,
                    Behaviour::Hang,
                    Duration::from_millis(150),
                )
            })
            .collect();
        let free = FakeSource::with_timeout(
            "free",
            PriceOrigin::Free,
            Behaviour::Delayed(Duration::from_millis(100), 63.0),
            Duration::from_millis(200),
        );
        let mut sources: Vec<Arc<dyn GoldPriceSource>> = Vec::new();
        for source in &keyed {
            sources.push(source.clone());
        }
        sources.push(free.clone());
        // 3 x 150ms would leave the free source 50ms of a 500ms budget
        let feed = PriceFeed::new(sources).with_overall_timeout(Duration::from_millis(500));

        let quote = feed.fetch_quote().await;
        assert_eq!(quote.origin, PriceOrigin::Free);
        assert_eq!(quote.price_per_gram, 63.0);
        assert_eq!(keyed[0].calls(), 1);
        assert_eq!(keyed[1].calls(), 1);
        assert_eq!(keyed[2].calls(), 0, "no budget left ahead of the free source");
        assert_eq!(free.calls(), 1);
    }

    #[tokio::test]
    async fn negative_or_nan_fallback_from_config_is_replaced() {
        for bad in [-5.0, f64::NAN, f64::INFINITY] {
            let cfg = PriceSources {
                free_source_price: 0.0,
                fallback_price: bad,
                ..PriceSources::default()
            };
            let feed = PriceFeed::from_settings(&cfg).unwrap();
            assert_eq!(feed.fallback_price(), FALLBACK_PRICE_PER_GRAM);

            let quote = feed.fetch_quote().await;
            assert_eq!(quote.origin, PriceOrigin::Fallback);
            assert_eq!(quote.price_per_gram, FALLBACK_PRICE_PER_GRAM);
        }
    }

    #[test]
    fn valid_configured_fallback_is_kept() {
        let cfg = PriceSources {
            fallback_price: 58.4,
            ..PriceSources::default()
        };
        assert_eq!(PriceFeed::from_settings(&cfg).unwrap().fallback_price(), 58.4);
    }
}
