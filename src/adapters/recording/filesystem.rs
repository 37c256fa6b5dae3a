//! Recording adapter for the `FileSystem` port.

use std::path::Path;
use std::sync::{Arc, Mutex};

use super::record_interaction;
use crate::cassette::format::FS_PORT;
use crate::cassette::recorder::CassetteRecorder;
use crate::ports::filesystem::FileSystem;

/// Records marker-file probes while delegating to an inner implementation.
pub struct RecordingFileSystem {
    inner: Box<dyn FileSystem>,
    recorder: Arc<Mutex<CassetteRecorder>>,
}

impl RecordingFileSystem {
    /// Creates a new recording filesystem wrapping the given implementation.
    pub fn new(inner: Box<dyn FileSystem>, recorder: Arc<Mutex<CassetteRecorder>>) -> Self {
        Self { inner, recorder }
    }
}

impl FileSystem for RecordingFileSystem {
    fn exists(&self, path: &Path) -> bool {
        let exists = self.inner.exists(path);
        record_interaction(
            &self.recorder,
            FS_PORT,
            "exists",
            serde_json::json!({ "path": path.display().to_string() }),
            serde_json::json!(exists),
        );
        exists
    }
}
