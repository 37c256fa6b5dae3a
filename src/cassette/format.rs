//! Cassette data structures for recording and replaying tool interactions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Port name used for command runner interactions.
pub const RUNNER_PORT: &str = "runner";
/// Port name used for filesystem interactions.
pub const FS_PORT: &str = "fs";

/// A single recorded interaction with an external port.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Interaction {
    /// Sequence number (assigned automatically by the recorder).
    pub seq: u64,
    /// Port name (`runner` or `fs`).
    pub port: String,
    /// Method name invoked on the port.
    pub method: String,
    /// Input data sent to the port.
    ///
    /// Runner calls carry `{"command": "<command line>"}`, filesystem probes
    /// carry `{"path": "<path>"}`.
    pub input: serde_json::Value,
    /// Output data returned from the port.
    ///
    /// Runner calls use `{"ok": "<stdout>"}` or `{"err": "<message>"}`;
    /// filesystem probes store a bare boolean.
    pub output: serde_json::Value,
}

impl Interaction {
    /// The lookup key for this interaction: the command line or the path.
    #[must_use]
    pub fn key(&self) -> Option<&str> {
        self.input
            .get("command")
            .or_else(|| self.input.get("path"))
            .and_then(serde_json::Value::as_str)
    }
}

/// A cassette containing recorded interactions from one invocation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Cassette {
    /// Human-readable name for this cassette.
    pub name: String,
    /// When this cassette was recorded.
    pub recorded_at: DateTime<Utc>,
    /// Git commit hash at recording time.
    pub commit: String,
    /// Ordered list of interactions.
    pub interactions: Vec<Interaction>,
}

impl Cassette {
    /// Loads a cassette from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &std::path::Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read cassette file {}: {e}", path.display()))?;
        serde_yaml::from_str(&content)
            .map_err(|e| format!("Failed to parse cassette file {}: {e}", path.display()))
    }
}
