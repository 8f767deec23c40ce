//! On-disk cassette layout.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A recorded session of port interactions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cassette {
    /// Human-readable session name.
    pub name: String,
    /// When the session was recorded.
    pub recorded_at: DateTime<Utc>,
    /// Commit of the code that recorded it.
    pub commit: String,
    /// Interactions in call order.
    pub interactions: Vec<Interaction>,
}

/// One call through a port.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    /// Call order within the cassette.
    pub seq: u64,
    /// Port name, e.g. `image_generator`.
    pub port: String,
    /// Method name, e.g. `generate`.
    pub method: String,
    /// Serialized call input.
    pub input: serde_json::Value,
    /// Serialized result, `{"Ok": ...}` or `{"Err": "..."}`.
    pub output: serde_json::Value,
}
