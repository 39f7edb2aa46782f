pub mod rest;
pub mod state;

use axum::{
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;

pub use rest::ApiDoc;
pub use state::AppState;

/// Builds the language-assessment API router. CORS, tracing and Swagger UI are
/// layered on by the binary.
pub fn router(app_state: Arc<AppState>) -> Router {
    let assessment_routes = Router::new()
        .route("/get-language-code", post(rest::get_language_code_handler))
        .route("/get-passage", post(rest::get_passage_handler))
        .route("/get-new-passage", post(rest::get_new_passage_handler))
        .route("/generate-passage", post(rest::generate_passage_handler))
        .route("/passages", get(rest::list_passages_handler))
        .route(
            "/passages/{code}",
            get(rest::passage_status_handler).delete(rest::clear_language_handler),
        )
        .route("/session", delete(rest::clear_session_handler))
        .route("/cache-stats", get(rest::cache_stats_handler))
        .route("/languages", get(rest::supported_languages_handler));

    Router::new()
        .route("/health", get(rest::health_handler))
        .nest("/language-assessment", assessment_routes)
        .with_state(app_state)
}
