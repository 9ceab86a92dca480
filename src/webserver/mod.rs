//! HTTP surface: read-only catalog and gold price endpoints, plus static front-end files.

pub mod error;
pub mod routes;
pub mod server;
pub mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use server::{build_app, start_server};
pub use state::AppState;
