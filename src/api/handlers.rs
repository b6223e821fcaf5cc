//! API Handlers
//!
//! The proxy fallback that turns browser requests into fetch events, plus
//! the worker's control and status endpoints.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tracing::debug;

use crate::cache::{FetchRequest, FetchResponse};
use crate::error::{CacheError, Result};
use crate::models::{ControlMessage, HealthResponse, StatsResponse};
use crate::worker::{FetchOutcome, ServiceWorker};

/// Largest request body the proxy will buffer.
pub const MAX_BODY_SIZE: usize = 10 * 1024 * 1024;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub worker: Arc<ServiceWorker>,
}

impl AppState {
    pub fn new(worker: ServiceWorker) -> Self {
        Self {
            worker: Arc::new(worker),
        }
    }
}

/// Fallback handler: every request not addressed to the worker itself.
///
/// Bypassed requests are fetched directly; a network failure on that path
/// is reported as 502.
pub async fn proxy_handler(State(state): State<AppState>, request: Request) -> Result<Response> {
    let request = to_fetch_request(&state, request).await?;

    let response = match state.worker.handle_fetch(&request).await? {
        FetchOutcome::Respond(response) => response,
        FetchOutcome::Bypass => state.worker.fetch_direct(&request).await?,
    };

    Ok(into_http_response(response))
}

/// Handler for POST /__worker/message
///
/// Always answers 202 with no body; unknown messages are ignored.
pub async fn message_handler(
    State(state): State<AppState>,
    Json(payload): Json<serde_json::Value>,
) -> StatusCode {
    match ControlMessage::parse(&payload) {
        Some(message) => state.worker.post_message(message).await,
        None => debug!(%payload, "ignoring unknown control message"),
    }
    StatusCode::ACCEPTED
}

/// Handler for GET /__worker/stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let worker_state = state.worker.state().await;
    let stats = state.worker.stats();
    let stats = stats.read().await;

    Json(StatsResponse::new(worker_state, &stats))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

/// Builds the fetch event for a proxied request.
///
/// Only the path and query of the request target are taken; scheme and
/// host always come from the configured origin, so a target such as
/// `//other.host/x` stays on the origin.
async fn to_fetch_request(state: &AppState, request: Request) -> Result<FetchRequest> {
    let (parts, body) = request.into_parts();

    let mut url = state.worker.origin().clone();
    url.set_path(parts.uri.path());
    url.set_query(parts.uri.query());

    let body = to_bytes(body, MAX_BODY_SIZE)
        .await
        .map_err(|e| CacheError::InvalidRequest(format!("unreadable body: {}", e)))?;

    Ok(FetchRequest {
        method: parts.method,
        url,
        headers: parts.headers,
        body,
    })
}

fn into_http_response(response: FetchResponse) -> Response {
    let mut headers = response.headers;
    for name in [
        header::CONTENT_LENGTH,
        header::TRANSFER_ENCODING,
        header::CONNECTION,
    ] {
        headers.remove(name);
    }

    (response.status, headers, Body::from(response.body)).into_response()
}
