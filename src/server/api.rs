//! API route definitions

use std::sync::Arc;
use axum::{
    http::Uri,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::{error::ServerError, handlers, state::AppState};

async fn handle_404(uri: Uri) -> ServerError {
    ServerError::NotFound(format!(
        "{}. POST /predict to price a vehicle or GET /health to check status.",
        uri.path()
    ))
}

/// Create the main application router
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/predict", post(handlers::predict))
        .route("/manufacturers", get(handlers::list_manufacturers))
        .route("/models/:manufacturer", get(handlers::list_models))
        .route("/health", get(handlers::health_check))
        .fallback(handle_404)
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
