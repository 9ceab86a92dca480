// Gold Price Sources Module
// One file per external provider, all behind the GoldPriceSource trait

pub mod free;
pub mod gold_api;
pub mod metal_price_api;
pub mod metals_api;

// Re-export the trait and the concrete sources
pub use crate::price_source::GoldPriceSource;
pub use free::FreeSource;
pub use gold_api::GoldApiSource;
pub use metal_price_api::MetalPriceApiSource;
pub use metals_api::MetalsApiSource;
