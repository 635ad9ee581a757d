pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::session::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Session
        .route("/api/v1/session", get(handlers::handle_get_session))
        .route("/api/v1/session/back", post(handlers::handle_back))
        .route("/api/v1/reviews/load", post(handlers::handle_load))
        // Drafts
        .route("/api/v1/drafts/generate", post(handlers::handle_generate))
        .route("/api/v1/drafts/manual", post(handlers::handle_manual))
        .route(
            "/api/v1/drafts/regenerate",
            post(handlers::handle_regenerate_all),
        )
        .route(
            "/api/v1/drafts/:id/regenerate",
            post(handlers::handle_regenerate),
        )
        .route("/api/v1/drafts/export", get(handlers::handle_export))
        .with_state(state)
}
