//! Filesystem port for marker-file probes.

use std::path::Path;

/// Answers existence questions about the project directory.
///
/// Tracker detection (`.beads/`) and build-tool detection (`go.mod`,
/// `package.json`, ...) go through this trait so prompt assembly stays
/// hermetic under test.
pub trait FileSystem: Send + Sync {
    /// Returns `true` if the path exists on the filesystem.
    fn exists(&self, path: &Path) -> bool;
}
