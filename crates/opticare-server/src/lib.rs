//! HTTP API for the OptiCare core.
//!
//! All routes live under `/api`. Responses are JSON except the CSV report
//! download; failures are `{ "error": "<message>" }`.

pub mod config;
pub mod error;
pub mod routes;

pub use config::{ConfigError, ServerConfig};
pub use error::{ApiError, ApiResult};

use axum::Router;
use opticare_core::OptiCare;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub core: OptiCare,
    pub ping_message: String,
}

impl AppState {
    pub fn new(core: OptiCare, ping_message: impl Into<String>) -> Self {
        Self {
            core,
            ping_message: ping_message.into(),
        }
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .nest("/api", routes::routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

