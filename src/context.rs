//! Service context bundling all port trait objects.

use std::path::Path;
use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use crate::adapters::live::{LiveCommandRunner, LiveFileSystem};
use crate::adapters::recording::{RecordingCommandRunner, RecordingFileSystem};
use crate::adapters::scripted::{ScriptedCommandRunner, ScriptedFileSystem};
use crate::cassette::format::Cassette;
use crate::cassette::recorder::CassetteRecorder;
use crate::ports::filesystem::FileSystem;
use crate::ports::runner::CommandRunner;

/// Bundles all port trait objects into a single context.
///
/// Each field provides access to one external boundary. Constructors
/// wire up different adapter implementations (live, scripted, recording).
pub struct ServiceContext {
    /// Runner for git, bd, bv, gh and build tools.
    pub runner: Box<dyn CommandRunner>,
    /// Filesystem for marker-file probes.
    pub fs: Box<dyn FileSystem>,
    /// Optional cassette recorder; written to disk on drop.
    recorder: Option<Arc<Mutex<CassetteRecorder>>>,
}

impl ServiceContext {
    /// Creates a live context with real adapters.
    #[must_use]
    pub fn live() -> Self {
        Self { runner: Box::new(LiveCommandRunner), fs: Box::new(LiveFileSystem), recorder: None }
    }

    /// Creates a context from arbitrary adapters.
    #[must_use]
    pub fn new(runner: Box<dyn CommandRunner>, fs: Box<dyn FileSystem>) -> Self {
        Self { runner, fs, recorder: None }
    }

    /// Creates a context answering from in-memory tables.
    #[must_use]
    pub fn scripted(runner: ScriptedCommandRunner, fs: ScriptedFileSystem) -> Self {
        Self::new(Box::new(runner), Box::new(fs))
    }

    /// Creates a recording context that writes a cassette file on drop.
    ///
    /// Uses live adapters for actual work. The cassette is stamped with the
    /// `HEAD` commit of `dir` when it can be resolved. This is the
    /// developer-only mechanism for capturing cassettes via `VIBES_RECORD`.
    #[must_use]
    pub fn recording(path: &Path, dir: &Path) -> Self {
        let commit = LiveCommandRunner
            .run(dir, "git", &["rev-parse", "HEAD"])
            .unwrap_or_else(|_| "unknown".to_string());
        let name = dir
            .file_name()
            .map_or_else(|| "vibes-session".to_string(), |n| n.to_string_lossy().into_owned());
        let recorder = Arc::new(Mutex::new(CassetteRecorder::new(path, name, commit)));
        debug!(path = %path.display(), "recording cassette");

        Self {
            runner: Box::new(RecordingCommandRunner::new(
                Box::new(LiveCommandRunner),
                Arc::clone(&recorder),
            )),
            fs: Box::new(RecordingFileSystem::new(Box::new(LiveFileSystem), Arc::clone(&recorder))),
            recorder: Some(recorder),
        }
    }

    /// Creates a replaying context from a cassette file.
    ///
    /// Commands and probes are answered by content, so the order in which
    /// an assembler issues them does not matter.
    ///
    /// # Errors
    ///
    /// Returns an error if the cassette file cannot be read or parsed.
    pub fn replaying(path: &Path) -> Result<Self, String> {
        let cassette = Cassette::load(path)?;
        debug!(
            path = %path.display(),
            interactions = cassette.interactions.len(),
            "replaying cassette"
        );
        Ok(Self::scripted(
            ScriptedCommandRunner::from_cassette(&cassette),
            ScriptedFileSystem::from_cassette(&cassette),
        ))
    }
}

impl Drop for ServiceContext {
    fn drop(&mut self) {
        let Some(recorder) = self.recorder.take() else { return };
        let written = match recorder.lock() {
            Ok(guard) => guard.write(),
            Err(_) => return,
        };
        if let Err(e) = written {
            warn!(error = %e, "failed to write cassette");
        }
    }
}
