//! Live filesystem adapter using `std::fs`.

use std::path::Path;

use crate::ports::filesystem::FileSystem;

/// Live filesystem adapter backed by the real disk.
pub struct LiveFileSystem;

impl FileSystem for LiveFileSystem {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_marker_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join(".beads")).unwrap();
        std::fs::write(dir.path().join("go.mod"), "module x\n").unwrap();

        let fs = LiveFileSystem;
        assert!(fs.exists(&dir.path().join(".beads")));
        assert!(fs.exists(&dir.path().join("go.mod")));
        assert!(!fs.exists(&dir.path().join("package.json")));
    }
}
