pub mod health;

use axum::{extract::DefaultBodyLimit, routing::get, Router};

use crate::analysis::handlers::{self, MAX_UPLOAD_BYTES};
use crate::state::AppState;

/// Headroom for the text fields and multipart framing around the file.
const FORM_OVERHEAD_BYTES: usize = 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Resume Analysis API
        .route(
            "/api/v1/resumes",
            get(handlers::handle_list_resumes).post(handlers::handle_analyze),
        )
        .route("/api/v1/resumes/:id", get(handlers::handle_get_resume))
        .route(
            "/api/v1/resumes/:id/file",
            get(handlers::handle_get_resume_file),
        )
        .route(
            "/api/v1/resumes/:id/image",
            get(handlers::handle_get_resume_image),
        )
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES + FORM_OVERHEAD_BYTES))
        .with_state(state)
}
