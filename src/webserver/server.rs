/// Axum webserver lifecycle: router assembly, bind, graceful shutdown
use anyhow::{Context, Result};
use axum::http::HeaderValue;
use axum::Router;
use log::{info, warn};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

use crate::settings::Server;
use crate::webserver::{routes, state::AppState};

/// Serves until Ctrl+C.
pub async fn start_server(state: Arc<AppState>) -> Result<()> {
    let server = &state.settings.server;
    let addr: SocketAddr = format!("{}:{}", server.host, server.port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", server.host, server.port))?;

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("Starting {} v{}", state.settings.app.title, state.settings.app.version);
    info!("Debug mode: {}", state.settings.app.debug);
    info!("Listening on http://{}", addr);

    let app = build_app(Arc::clone(&state));

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Webserver stopped gracefully");
    Ok(())
}

/// Router with CORS and, when the directory exists, `/static` file serving.
pub fn build_app(state: Arc<AppState>) -> Router {
    let server = state.settings.server.clone();
    let mut app = routes::create_router(state);

    if Path::new(&server.static_dir).is_dir() {
        info!("Serving static files from {} at /static", server.static_dir);
        app = app.nest_service("/static", ServeDir::new(&server.static_dir));
    } else {
        warn!("Static directory {} not found, /static disabled", server.static_dir);
    }

    app.layer(cors_layer(&server))
}

fn cors_layer(server: &Server) -> CorsLayer {
    match server.allowed_origins_list() {
        None => {
            info!("CORS enabled for all origins");
            CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
        }
        Some(origins) => {
            let parsed: Vec<HeaderValue> = origins
                .iter()
                .filter_map(|o| match o.parse::<HeaderValue>() {
                    Ok(v) => Some(v),
                    Err(e) => {
                        warn!("Ignoring invalid CORS origin {:?}: {}", o, e);
                        None
                    }
                })
                .collect();
            info!("CORS enabled for {} origin(s)", parsed.len());
            CorsLayer::new().allow_origin(parsed).allow_methods(Any).allow_headers(Any)
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Received shutdown signal, stopping webserver...");
}
