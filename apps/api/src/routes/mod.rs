pub mod health;

use axum::{
    http::Uri,
    routing::{get, post},
    Router,
};

use crate::batch::handlers;
use crate::errors::AppError;
use crate::state::AppState;

async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("no route for {uri}"))
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route(
            "/api/v1/instructions/:subject",
            get(handlers::handle_get_instructions),
        )
        .route("/api/v1/top-pages/layout", post(handlers::handle_layout))
        .route("/api/v1/top-pages/preview", post(handlers::handle_preview))
        .route("/api/v1/top-pages/batch", post(handlers::handle_batch))
        .fallback(not_found)
        .with_state(state)
}
