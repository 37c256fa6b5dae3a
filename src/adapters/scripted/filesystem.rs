//! Scripted filesystem probe backed by a set of existing paths.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::cassette::format::{Cassette, FS_PORT};
use crate::ports::filesystem::FileSystem;

/// Reports only the paths it was given as existing.
#[derive(Debug, Default)]
pub struct ScriptedFileSystem {
    existing: HashSet<PathBuf>,
}

impl ScriptedFileSystem {
    /// Creates a filesystem in which nothing exists.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `path` as existing.
    #[must_use]
    pub fn with(mut self, path: impl Into<PathBuf>) -> Self {
        self.existing.insert(path.into());
        self
    }

    /// Builds a filesystem from the `fs` interactions of a cassette.
    #[must_use]
    pub fn from_cassette(cassette: &Cassette) -> Self {
        let existing = cassette
            .interactions
            .iter()
            .filter(|i| i.port == FS_PORT && i.output.as_bool() == Some(true))
            .filter_map(|i| i.key().map(PathBuf::from))
            .collect();
        Self { existing }
    }
}

impl FileSystem for ScriptedFileSystem {
    fn exists(&self, path: &Path) -> bool {
        self.existing.contains(path)
    }
}
