use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::pricing;

/// Image URL per metal tone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductImages {
    pub yellow: String,
    pub rose: String,
    pub white: String,
}

/// A catalog entry as stored on disk.
///
/// `popularity_score` stays in [0,1]; the percentage and 5-point forms are derived
/// on the way out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: u32,
    pub name: String,
    #[serde(rename = "popularityScore")]
    pub popularity_score: f64,
    /// Grams
    pub weight: f64,
    pub images: ProductImages,
}

impl Product {
    /// Decodes one catalog entry and checks its invariants.
    fn from_entry(entry: serde_json::Value) -> Result<Self, CatalogError> {
        let product: Product = serde_json::from_value(entry)?;
        product.validate()?;
        Ok(product)
    }

    fn validate(&self) -> Result<(), CatalogError> {
        if !(0.0..=1.0).contains(&self.popularity_score) {
            return Err(CatalogError::InvalidProduct {
                id: self.id,
                reason: format!("popularityScore {} outside [0,1]", self.popularity_score),
            });
        }
        if !self.weight.is_finite() || self.weight < 0.0 {
            return Err(CatalogError::InvalidProduct {
                id: self.id,
                reason: format!("weight {} is not a non-negative number", self.weight),
            });
        }
        Ok(())
    }
}

/// A product priced against a gold quote, as served to the front-end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductResponse {
    pub id: u32,
    pub name: String,
    #[serde(rename = "popularityScore")]
    pub popularity_score: f64,
    pub weight: f64,
    pub images: ProductImages,
    pub price: f64,
    pub popularity_out_of_5: f64,
    pub popularity_percentage: f64,
}

impl ProductResponse {
    pub fn priced(product: &Product, gold_price_per_gram: f64) -> Self {
        let raw_price =
            pricing::price(product.popularity_score, product.weight, gold_price_per_gram);
        Self {
            id: product.id,
            name: product.name.clone(),
            popularity_score: product.popularity_score,
            weight: product.weight,
            images: product.images.clone(),
            price: pricing::round_to(raw_price, 2),
            popularity_out_of_5: pricing::to_five_point_scale(product.popularity_score),
            popularity_percentage: pricing::to_percentage(product.popularity_score),
        }
    }
}

/// Optional listing bounds, all inclusive. Popularity bounds are percentages (0-100).
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct ProductFilter {
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub min_popularity: Option<f64>,
    pub max_popularity: Option<f64>,
}

impl ProductFilter {
    /// `price` is the unrounded computed price, `popularity_percentage` the rounded one.
    pub fn accepts(&self, price: f64, popularity_percentage: f64) -> bool {
        if self.min_price.is_some_and(|min| price < min) {
            return false;
        }
        if self.max_price.is_some_and(|max| price > max) {
            return false;
        }
        if self.min_popularity.is_some_and(|min| popularity_percentage < min) {
            return false;
        }
        if self.max_popularity.is_some_and(|max| popularity_percentage > max) {
            return false;
        }
        true
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid product JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("product {id} rejected: {reason}")]
    InvalidProduct { id: u32, reason: String },
}

/// Read-only product list, loaded once at startup.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    products: Vec<Product>,
}

impl Catalog {
    pub fn new(products: Vec<Product>) -> Self {
        Self { products }
    }

    /// Parses a JSON array of products. Only a malformed array fails; entries that
    /// do not decode or break the invariants are skipped.
    pub fn from_json(raw: &str) -> Result<Self, CatalogError> {
        let entries: Vec<serde_json::Value> = serde_json::from_str(raw)?;
        let total = entries.len();
        let products: Vec<Product> = entries
            .into_iter()
            .enumerate()
            .filter_map(|(index, entry)| match Product::from_entry(entry) {
                Ok(product) => Some(product),
                Err(e) => {
                    warn!("Skipping catalog entry #{}: {}", index, e);
                    None
                }
            })
            .collect();
        if products.len() < total {
            warn!("Loaded {} of {} products", products.len(), total);
        }
        Ok(Self { products })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&raw)
    }

    /// Startup variant of `load`: failures are logged and produce an empty catalog.
    pub fn load_or_empty(path: impl AsRef<Path>) -> Self {
        match Self::load(path) {
            Ok(catalog) => {
                info!("Product data loaded successfully ({} products)", catalog.len());
                catalog
            }
            Err(e) => {
                error!("Failed to load product data: {}", e);
                Self::default()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn get(&self, id: u32) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    /// Prices every product against one gold quote and applies `filter`, keeping file order.
    pub fn priced(&self, gold_price_per_gram: f64, filter: &ProductFilter) -> Vec<ProductResponse> {
        self.products
            .iter()
            .filter(|p| {
                let raw = pricing::price(p.popularity_score, p.weight, gold_price_per_gram);
                filter.accepts(raw, pricing::to_percentage(p.popularity_score))
            })
            .map(|p| ProductResponse::priced(p, gold_price_per_gram))
            .collect()
    }
}
