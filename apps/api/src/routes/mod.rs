pub mod health;
pub mod ui;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::analysis::handlers as analysis;
use crate::errors::AppError;
use crate::state::AppState;
use crate::upload::handlers as upload;

/// Room for multipart boundaries and part headers on top of the file itself.
pub(crate) const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

async fn not_found() -> AppError {
    AppError::NotFound("No such route".to_string())
}

pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.config.max_upload_bytes + MULTIPART_OVERHEAD_BYTES;

    Router::new()
        .route("/", get(ui::index_handler))
        .route("/health", get(health::health_handler))
        .route(
            "/api/v1/upload",
            post(upload::handle_upload).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/api/v1/analyze", post(analysis::handle_analyze))
        .fallback(not_found)
        .with_state(state)
}
