// src/metrics.rs

#[cfg(feature = "observability")]
pub use metrics::{
    counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram, Unit,
};

// NOTE: When observability feature is disabled, provide stub implementations
#[cfg(not(feature = "observability"))]
pub enum Unit {
    Count,
    Milliseconds,
}

#[cfg(not(feature = "observability"))]
#[macro_export]
macro_rules! counter {
    ($name:expr, $value:expr $(, $label:expr => $label_value:expr)* $(,)?) => {};
}

#[cfg(not(feature = "observability"))]
#[macro_export]
macro_rules! gauge {
    ($name:expr, $value:expr $(, $label:expr => $label_value:expr)* $(,)?) => {};
}

#[cfg(not(feature = "observability"))]
#[macro_export]
macro_rules! histogram {
    ($name:expr, $value:expr $(, $label:expr => $label_value:expr)* $(,)?) => {};
}

#[cfg(not(feature = "observability"))]
#[macro_export]
macro_rules! describe_counter {
    ($name:expr, $unit:expr, $desc:expr) => {};
    ($name:expr, $desc:expr) => {};
}

#[cfg(not(feature = "observability"))]
#[macro_export]
macro_rules! describe_gauge {
    ($name:expr, $desc:expr) => {};
}

#[cfg(not(feature = "observability"))]
#[macro_export]
macro_rules! describe_histogram {
    ($name:expr, $unit:expr, $desc:expr) => {};
    ($name:expr, $desc:expr) => {};
}

#[cfg(not(feature = "observability"))]
use crate::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};

/// Registers metric descriptions. Call once at startup.
pub fn describe_metrics() {
    describe_counter!(
        "gold_source_attempts_total",
        Unit::Count,
        "Gold price source attempts by source and outcome (ok/error/timeout/invalid/skipped)."
    );
    describe_counter!(
        "gold_price_fallback_total",
        Unit::Count,
        "Requests served the static fallback price, labeled by reason (exhausted, deadline)."
    );
    describe_histogram!(
        "gold_price_fetch_ms",
        Unit::Milliseconds,
        "Wall time of a full gold price acquisition in milliseconds."
    );
    describe_gauge!(
        "gold_price_per_gram_usd",
        "Last gold price per gram served, in USD."
    );
}

// --- Helper functions to update metrics ---

pub fn record_source_attempt(source: &'static str, outcome: &'static str) {
    counter!("gold_source_attempts_total", 1, "source" => source, "outcome" => outcome);
}

pub fn increment_fallback(reason: &'static str) {
    counter!("gold_price_fallback_total", 1, "reason" => reason);
}

pub fn record_fetch_duration(duration: std::time::Duration) {
    histogram!("gold_price_fetch_ms", duration.as_secs_f64() * 1000.0);
}

pub fn set_gold_price(price_per_gram: f64) {
    gauge!("gold_price_per_gram_usd", price_per_gram);
}
