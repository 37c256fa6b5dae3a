//! Recording adapters that capture interactions to cassettes.

pub mod filesystem;
pub mod runner;

pub use filesystem::RecordingFileSystem;
pub use runner::RecordingCommandRunner;

use std::sync::{Arc, Mutex};

use crate::cassette::recorder::CassetteRecorder;
use crate::ports::runner::RunError;

/// Record a runner result using the `ok`/`err` JSON convention.
///
/// - `Ok(stdout)` is stored as `{"ok": stdout}`
/// - `Err(e)` is stored as `{"err": e.to_string()}`, plus `"output"` when the
///   failing process left diagnostics behind
pub(crate) fn record_result(
    recorder: &Arc<Mutex<CassetteRecorder>>,
    method: &str,
    command_line: &str,
    result: &Result<String, RunError>,
) {
    let output = match result {
        Ok(stdout) => serde_json::json!({ "ok": stdout }),
        Err(e) => {
            let diagnostics = e.diagnostics();
            if diagnostics.is_empty() {
                serde_json::json!({ "err": e.to_string() })
            } else {
                serde_json::json!({ "err": e.to_string(), "output": diagnostics })
            }
        }
    };
    record_interaction(
        recorder,
        crate::cassette::format::RUNNER_PORT,
        method,
        serde_json::json!({ "command": command_line }),
        output,
    );
}

/// Record an interaction, skipping it if the recorder lock is poisoned.
pub(crate) fn record_interaction(
    recorder: &Arc<Mutex<CassetteRecorder>>,
    port: &str,
    method: &str,
    input: serde_json::Value,
    output: serde_json::Value,
) {
    if let Ok(mut guard) = recorder.lock() {
        guard.record(port, method, input, output);
    }
}
