//! API Routes
//!
//! Configures the Axum router for the caching proxy.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{health_handler, message_handler, proxy_handler, stats_handler, AppState};

/// Creates the main router.
///
/// # Endpoints
/// - `POST /__worker/message` - Post a control message to the worker
/// - `GET /__worker/stats` - Get cache statistics
/// - `GET /health` - Health check endpoint
/// - fallback - Proxied through the worker's fetch handler
///
/// # Middleware
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/__worker/message", post(message_handler))
        .route("/__worker/stats", get(stats_handler))
        .fallback(proxy_handler)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
