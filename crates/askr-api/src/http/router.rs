//! Axum router configuration with middleware.
//!
//! All routes are under `/api/`, plus `/health`.
//! Middleware: CORS, tracing.

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        // Chat streaming
        .route("/chat", post(handlers::chat::chat))
        // Chat history
        .route("/chats", get(handlers::chats::list_chats))
        .route("/chats/new", post(handlers::chats::new_chat))
        .route(
            "/chats/{id}",
            get(handlers::chats::get_chat).delete(handlers::chats::delete_chat),
        )
        // Models
        .route("/models", get(handlers::models::list_models));

    Router::new()
        .nest("/api", api_routes)
        .route("/health", get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint (no auth required).
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
