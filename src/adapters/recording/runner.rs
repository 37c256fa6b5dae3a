//! Recording adapter for the `CommandRunner` port.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::record_result;
use crate::cassette::recorder::CassetteRecorder;
use crate::ports::runner::{command_line, CommandRunner, RunError};

/// Records command results while delegating to an inner runner.
pub struct RecordingCommandRunner {
    inner: Box<dyn CommandRunner>,
    recorder: Arc<Mutex<CassetteRecorder>>,
}

impl RecordingCommandRunner {
    /// Creates a new recording runner wrapping the given implementation.
    pub fn new(inner: Box<dyn CommandRunner>, recorder: Arc<Mutex<CassetteRecorder>>) -> Self {
        Self { inner, recorder }
    }
}

impl CommandRunner for RecordingCommandRunner {
    fn run(&self, dir: &Path, command: &str, args: &[&str]) -> Result<String, RunError> {
        let result = self.inner.run(dir, command, args);
        record_result(&self.recorder, "run", &command_line(command, args), &result);
        result
    }

    fn run_with_timeout(
        &self,
        dir: &Path,
        timeout: Duration,
        command: &str,
        args: &[&str],
    ) -> Result<String, RunError> {
        let result = self.inner.run_with_timeout(dir, timeout, command, args);
        record_result(&self.recorder, "run_with_timeout", &command_line(command, args), &result);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::scripted::ScriptedCommandRunner;
    use crate::cassette::format::Cassette;

    #[test]
    fn records_successes_and_failures() {
        let dir = tempfile::tempdir().unwrap();
        let cassette_path = dir.path().join("runner.cassette.yaml");
        let recorder = Arc::new(Mutex::new(CassetteRecorder::new(&cassette_path, "test", "abc")));

        let inner = ScriptedCommandRunner::new().with("git stash list", "");
        let runner = RecordingCommandRunner::new(Box::new(inner), Arc::clone(&recorder));
        let work = Path::new("/work");
        assert!(runner.run(work, "git", &["stash", "list"]).is_ok());
        assert!(runner.run_with_timeout(work, Duration::from_secs(5), "bd", &["ready"]).is_err());

        recorder.lock().unwrap().write().unwrap();
        let cassette = Cassette::load(&cassette_path).unwrap();
        assert_eq!(cassette.interactions.len(), 2);
        assert_eq!(cassette.interactions[0].key(), Some("git stash list"));
        assert_eq!(cassette.interactions[1].method, "run_with_timeout");
        assert!(cassette.interactions[1].output.get("err").is_some());

        // Replaying the recording answers the same way.
        let replayed = ScriptedCommandRunner::from_cassette(&cassette);
        assert_eq!(replayed.run(work, "git", &["stash", "list"]).unwrap(), "");
        assert!(replayed.run(work, "bd", &["ready"]).is_err());
    }
}
