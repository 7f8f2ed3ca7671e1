pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::pipeline::handlers;
use crate::state::AppState;
use crate::support::handlers::handle_calculate;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Document generation
        .route(
            "/api/v1/documents/generate",
            post(handlers::handle_generate),
        )
        .route("/api/v1/documents", get(handlers::handle_list_documents))
        .route("/api/v1/documents/:id", get(handlers::handle_get_document))
        .route("/api/v1/templates", get(handlers::handle_list_templates))
        .route("/api/v1/usage", get(handlers::handle_usage))
        // Guideline calculator
        .route("/api/v1/support/calculate", post(handle_calculate))
        .with_state(state)
}
