use config::{Config, ConfigError, File};
use serde::Deserialize;
use std::env;

fn default_false() -> bool {
    false
}

// === Application ===
#[derive(Debug, Deserialize, Clone)]
pub struct App {
    #[serde(default = "default_api_title")]
    pub title: String,
    #[serde(default = "default_api_version")]
    pub version: String,
    /// Raises the default log level to `info`
    #[serde(default = "default_false")]
    pub debug: bool,
}

fn default_api_title() -> String {
    "Product Listing API".to_string()
}
fn default_api_version() -> String {
    "1.0.0".to_string()
}

impl Default for App {
    fn default() -> Self {
        Self {
            title: default_api_title(),
            version: default_api_version(),
            debug: default_false(),
        }
    }
}

// === HTTP server ===
#[derive(Debug, Deserialize, Clone)]
pub struct Server {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Comma separated origin list, or "*" for any origin
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: String,
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8000
}
fn default_allowed_origins() -> String {
    "*".to_string()
}
fn default_static_dir() -> String {
    "frontend".to_string()
}

impl Default for Server {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            allowed_origins: default_allowed_origins(),
            static_dir: default_static_dir(),
        }
    }
}

impl Server {
    /// `None` means any origin is allowed.
    pub fn allowed_origins_list(&self) -> Option<Vec<String>> {
        let trimmed = self.allowed_origins.trim();
        if trimmed.is_empty() || trimmed == "*" {
            return None;
        }
        Some(
            trimmed
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        )
    }
}

// === Gold price sources ===
#[derive(Debug, Deserialize, Clone)]
pub struct PriceSources {
    #[serde(default)]
    pub metal_price_api_key: String,
    #[serde(default)]
    pub goldapi_key: String,
    #[serde(default)]
    pub metals_api_key: String,
    #[serde(default = "default_metal_price_api_url")]
    pub metal_price_api_url: String,
    #[serde(default = "default_goldapi_url")]
    pub goldapi_url: String,
    #[serde(default = "default_metals_api_url")]
    pub metals_api_url: String,
    /// Keyless endpoint answering `{"price": <usd per troy ounce>}`. Unset keeps the constant stub.
    #[serde(default)]
    pub free_source_url: Option<String>,
    #[serde(default = "default_fallback_price")]
    pub free_source_price: f64,
    #[serde(default = "default_fallback_price")]
    pub fallback_price: f64,
    #[serde(default = "default_overall_timeout_ms")]
    pub overall_timeout_ms: u64,
    #[serde(default = "default_source_timeout_ms")]
    pub source_timeout_ms: u64,
    #[serde(default = "default_free_source_timeout_ms")]
    pub free_source_timeout_ms: u64,
}

fn default_metal_price_api_url() -> String {
    "https://api.metalpriceapi.com/v1/latest".to_string()
}
fn default_goldapi_url() -> String {
    "https://www.goldapi.io/api/XAU/USD".to_string()
}
fn default_metals_api_url() -> String {
    "https://metals-api.com/api/latest".to_string()
}
fn default_fallback_price() -> f64 {
    65.0 // USD per gram
}
fn default_overall_timeout_ms() -> u64 {
    5000
}
fn default_source_timeout_ms() -> u64 {
    1500
}
fn default_free_source_timeout_ms() -> u64 {
    2000
}

impl Default for PriceSources {
    fn default() -> Self {
        Self {
            metal_price_api_key: String::new(),
            goldapi_key: String::new(),
            metals_api_key: String::new(),
            metal_price_api_url: default_metal_price_api_url(),
            goldapi_url: default_goldapi_url(),
            metals_api_url: default_metals_api_url(),
            free_source_url: None,
            free_source_price: default_fallback_price(),
            fallback_price: default_fallback_price(),
            overall_timeout_ms: default_overall_timeout_ms(),
            source_timeout_ms: default_source_timeout_ms(),
            free_source_timeout_ms: default_free_source_timeout_ms(),
        }
    }
}

impl PriceSources {
    pub fn has_any_credential(&self) -> bool {
        [
            &self.metal_price_api_key,
            &self.goldapi_key,
            &self.metals_api_key,
        ]
        .iter()
        .any(|k| !k.trim().is_empty())
    }
}

// === Catalog ===
#[derive(Debug, Deserialize, Clone)]
pub struct Catalog {
    #[serde(default = "default_products_path")]
    pub products_path: String,
}

fn default_products_path() -> String {
    "data/products.json".to_string()
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            products_path: default_products_path(),
        }
    }
}

// === Logging ===
#[derive(Debug, Deserialize, Clone)]
pub struct LogSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// === Metrics ===
#[derive(Debug, Deserialize, Clone)]
pub struct Metrics {
    #[serde(default = "default_false")]
    pub enabled: bool,
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

fn default_metrics_port() -> u16 {
    9000
}

impl Default for Metrics {
    fn default() -> Self {
        Self {
            enabled: default_false(),
            port: default_metrics_port(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Settings {
    #[serde(default)]
    pub app: App,
    #[serde(default)]
    pub server: Server,
    #[serde(default)]
    pub price_sources: PriceSources,
    #[serde(default)]
    pub catalog: Catalog,
    #[serde(default)]
    pub log: LogSettings,
    #[serde(default)]
    pub metrics: Metrics,
    /// Environment overrides that could not be applied. Logged once logging is up.
    #[serde(skip)]
    pub ignored_overrides: Vec<String>,
}

impl Settings {
    /// Loads `Config.toml` (optional) from the working directory, then applies
    /// environment overrides.
    pub fn new() -> Result<Self, ConfigError> {
        Self::load(None)
    }

    /// Same as `new`, but reads the given file instead. An explicit path must exist.
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let source = match path {
            Some(p) => File::with_name(p).required(true),
            None => File::with_name("Config").required(false),
        };
        let s = Config::builder().add_source(source).build()?;

        let mut settings: Self = s.try_deserialize()?;
        settings.ignored_overrides = settings.apply_overrides(|key| env::var(key).ok());
        Ok(settings)
    }

    /// Applies `KEY=value` overrides. Keys match the variable names of a `.env` file.
    ///
    /// Returns a description of each override that was rejected and left the value as is.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Vec<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string());
        let mut ignored = Vec::new();

        if let Some(v) = get("METAL_PRICE_API_KEY") {
            self.price_sources.metal_price_api_key = v;
        }
        if let Some(v) = get("GOLDAPI_KEY") {
            self.price_sources.goldapi_key = v;
        }
        if let Some(v) = get("METALS_API_KEY") {
            self.price_sources.metals_api_key = v;
        }
        if let Some(v) = get("FREE_GOLD_PRICE_URL").filter(|v| !v.is_empty()) {
            self.price_sources.free_source_url = Some(v);
        }
        if let Some(v) = get("DEBUG") {
            if let Some(flag) = parse_bool(&v) {
                self.app.debug = flag;
            } else {
                ignored.push(format!("DEBUG={:?}: not a boolean", v));
            }
        }
        if let Some(v) = get("API_TITLE").filter(|v| !v.is_empty()) {
            self.app.title = v;
        }
        if let Some(v) = get("API_VERSION").filter(|v| !v.is_empty()) {
            self.app.version = v;
        }
        if let Some(v) = get("ALLOWED_ORIGINS").filter(|v| !v.is_empty()) {
            self.server.allowed_origins = v;
        }
        if let Some(v) = get("HOST").filter(|v| !v.is_empty()) {
            self.server.host = v;
        }
        if let Some(v) = get("PORT") {
            match v.parse::<u16>() {
                Ok(port) => self.server.port = port,
                Err(e) => ignored.push(format!("PORT={:?}: {}", v, e)),
            }
        }
        if let Some(v) = get("STATIC_DIR").filter(|v| !v.is_empty()) {
            self.server.static_dir = v;
        }
        if let Some(v) = get("PRODUCTS_PATH").filter(|v| !v.is_empty()) {
            self.catalog.products_path = v;
        }
        ignored
    }

    /// Effective log filter when `RUST_LOG` is not set.
    pub fn log_filter(&self) -> &str {
        if self.app.debug {
            "info"
        } else {
            &self.log.level
        }
    }
}

fn parse_bool(input: &str) -> Option<bool> {
    match input.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_service_contract() {
        let s = Settings::default();
        assert_eq!(s.price_sources.fallback_price, 65.0);
        assert_eq!(s.price_sources.overall_timeout_ms, 5000);
        assert_eq!(s.price_sources.source_timeout_ms, 1500);
        assert_eq!(s.server.port, 8000);
        assert_eq!(s.catalog.products_path, "data/products.json");
        assert!(!s.price_sources.has_any_credential());
        assert!(s.server.allowed_origins_list().is_none());
    }

    #[test]
    fn env_overrides_credentials_and_server() {
        let mut s = Settings::default();
        let ignored = s.apply_overrides(lookup_from(&[
            ("GOLDAPI_KEY", " goldapi-123 "),
            ("PORT", "9100"),
            ("HOST", "127.0.0.1"),
            ("DEBUG", "true"),
            ("ALLOWED_ORIGINS", "http://a.test, http://b.test"),
        ]));

        assert!(ignored.is_empty());
        assert_eq!(s.price_sources.goldapi_key, "goldapi-123");
        assert!(s.price_sources.has_any_credential());
        assert_eq!(s.server.port, 9100);
        assert_eq!(s.server.host, "127.0.0.1");
        assert!(s.app.debug);
        assert_eq!(s.log_filter(), "info");
        assert_eq!(
            s.server.allowed_origins_list(),
            Some(vec!["http://a.test".to_string(), "http://b.test".to_string()])
        );
    }

    #[test]
    fn invalid_overrides_are_reported_and_left_unapplied() {
        let mut s = Settings::default();
        let ignored =
            s.apply_overrides(lookup_from(&[("PORT", "not-a-port"), ("DEBUG", "maybe")]));
        assert_eq!(s.server.port, 8000);
        assert!(!s.app.debug);
        assert_eq!(ignored.len(), 2);
        assert!(ignored.iter().any(|m| m.starts_with("PORT=\"not-a-port\"")));
        assert!(ignored.iter().any(|m| m.starts_with("DEBUG=\"maybe\"")));
    }

    #[test]
    fn blank_credentials_do_not_count_as_configured() {
        let mut s = Settings::default();
        s.apply_overrides(lookup_from(&[("METAL_PRICE_API_KEY", "   ")]));
        assert!(!s.price_sources.has_any_credential());
    }
}
