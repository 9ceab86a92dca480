use axum::{
    extract::{rejection::PathRejection, rejection::QueryRejection, Path, Query, State},
    response::Json,
    routing::get,
    Router,
};
use log::info;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::catalog::{ProductFilter, ProductResponse};
use crate::price_source::PriceOrigin;
use crate::webserver::{error::ApiError, state::AppState};

// ==================== Response Types ====================

#[derive(Debug, Serialize)]
pub struct GoldPriceResponse {
    pub gold_price_per_gram_usd: f64,
    pub last_updated: &'static str,
    pub source: PriceOrigin,
}

// ==================== Router ====================

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .nest("/api", api_routes())
        .with_state(state)
}

fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/test", get(cors_test))
        .route("/products", get(list_products))
        .route("/products/:id", get(get_product))
        .route("/gold-price", get(gold_price))
}

// ==================== Handlers ====================

async fn root(State(state): State<Arc<AppState>>) -> Json<Value> {
    info!("Root endpoint called");
    let app = &state.settings.app;
    let base = format!("http://localhost:{}", state.settings.server.port);
    Json(json!({
        "title": app.title,
        "version": app.version,
        "status": "running",
        "cors": "enabled",
        "data_format": {
            "popularity_score": "0-1 range (0.85 = 85%)",
            "weight": "grams (decimal)",
            "images": "object with yellow, rose, white keys"
        },
        "endpoints": {
            "frontend": format!("{}/static/index.html", base),
            "products": format!("{}/api/products", base),
            "gold_price": format!("{}/api/gold-price", base)
        }
    }))
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

async fn cors_test() -> Json<Value> {
    Json(json!({ "cors": "working", "message": "CORS is configured correctly" }))
}

async fn list_products(
    State(state): State<Arc<AppState>>,
    filter: Result<Query<ProductFilter>, QueryRejection>,
) -> Result<Json<Vec<ProductResponse>>, ApiError> {
    let Query(filter) = filter.map_err(|e| ApiError::Validation(e.body_text()))?;
    info!("Products endpoint called");

    let gold_price = state.feed.fetch_current_price().await;
    info!("Current gold price: ${:.2}/gram", gold_price);

    let products = state.catalog.priced(gold_price, &filter);
    info!("Returning {} products", products.len());
    Ok(Json(products))
}

async fn get_product(
    State(state): State<Arc<AppState>>,
    id: Result<Path<u32>, PathRejection>,
) -> Result<Json<ProductResponse>, ApiError> {
    let Path(id) = id.map_err(|e| ApiError::Validation(e.body_text()))?;
    let product = state.catalog.get(id).ok_or(ApiError::NotFound("Product"))?;

    let gold_price = state.feed.fetch_current_price().await;
    Ok(Json(ProductResponse::priced(product, gold_price)))
}

async fn gold_price(State(state): State<Arc<AppState>>) -> Json<GoldPriceResponse> {
    let quote = state.feed.fetch_quote().await;
    Json(GoldPriceResponse {
        gold_price_per_gram_usd: quote.price_per_gram,
        last_updated: "real-time",
        source: quote.origin,
    })
}
