//! Background Tasks Module
//!
//! Contains background tasks that run independently of request handling.
//!
//! # Tasks
//! - Janitor: Removes cache entries older than the TTL every hour

mod janitor;

pub use janitor::{spawn_janitor_task, sweep_expired, MAX_ENTRY_AGE, SWEEP_INTERVAL};
