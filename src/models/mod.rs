//! Control messages and JSON bodies
//!
//! Defines the messages pages post to the worker and the bodies the
//! worker's own endpoints return.

pub mod messages;
pub mod responses;

// Re-export commonly used types
pub use messages::ControlMessage;
pub use responses::{ErrorResponse, HealthResponse, StatsResponse};
