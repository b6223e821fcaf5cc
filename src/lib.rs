//! Offline Cache - a caching proxy for an offline-capable web app
//!
//! Classifies every request, serves static assets cache-first and API
//! calls network-first, pre-warms static assets at install and sweeps
//! stale entries in the background.

pub mod api;
pub mod cache;
pub mod classifier;
pub mod config;
pub mod error;
pub mod fetch;
pub mod lifecycle;
pub mod manifest;
pub mod models;
pub mod strategy;
pub mod tasks;
pub mod worker;

pub use api::AppState;
pub use config::Config;
pub use tasks::spawn_janitor_task;
pub use worker::{FetchOutcome, ServiceWorker};
