//! Control messages posted from a page to the worker
//!
//! No acknowledgment is ever sent back.

use serde::{Deserialize, Serialize};

/// A lifecycle command, tagged by its `type` field.
///
/// ```json
/// { "type": "SKIP_WAITING" }
/// { "type": "CLEAR_CACHE" }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlMessage {
    /// Supersede the running worker without waiting for pages to close
    SkipWaiting,
    /// Delete every cache partition
    ClearCache,
}

impl ControlMessage {
    /// Parses a posted payload. Anything unrecognised yields `None`.
    pub fn parse(payload: &serde_json::Value) -> Option<Self> {
        serde_json::from_value(payload.clone()).ok()
    }
}
