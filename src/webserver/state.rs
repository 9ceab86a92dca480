use std::sync::Arc;

use crate::catalog::Catalog;
use crate::price_feeds::PriceFeed;
use crate::settings::Settings;

/// Shared, immutable per-process state. Nothing here changes after startup.
pub struct AppState {
    pub settings: Arc<Settings>,
    pub feed: PriceFeed,
    pub catalog: Catalog,
}

impl AppState {
    pub fn new(settings: Arc<Settings>, feed: PriceFeed, catalog: Catalog) -> Self {
        Self {
            settings,
            feed,
            catalog,
        }
    }

    /// Wires the feed and catalog from settings. Catalog load errors are logged, not returned.
    pub fn from_settings(settings: Arc<Settings>) -> anyhow::Result<Self> {
        let feed = PriceFeed::from_settings(&settings.price_sources)?;
        let catalog = Catalog::load_or_empty(&settings.catalog.products_path);
        Ok(Self::new(settings, feed, catalog))
    }
}
