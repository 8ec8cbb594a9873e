use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers;
use super::AppState;

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health))
        // OAuth flow
        .route("/auth/aitu/login", get(handlers::auth::login))
        .route("/auth/aitu/callback", get(handlers::auth::callback))
        .route("/auth/aitu/logout", post(handlers::auth::logout))
        // Webhooks
        .route(
            "/webhooks/aitu/passport",
            post(handlers::webhooks::passport),
        )
        .route("/webhooks/aitu/apps", post(handlers::webhooks::apps))
        .route("/webhooks/aitu/general", post(handlers::webhooks::general))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
