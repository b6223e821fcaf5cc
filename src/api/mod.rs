//! API Module
//!
//! HTTP surface of the caching proxy.
//!
//! # Endpoints
//! - `POST /__worker/message` - Post a control message to the worker
//! - `GET /__worker/stats` - Get cache statistics
//! - `GET /health` - Health check endpoint
//! - anything else - Forwarded to the origin through the worker

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
