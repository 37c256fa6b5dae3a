//! Lookup-table command runner for tests and cassette replay.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use tracing::trace;

use crate::cassette::format::{Cassette, RUNNER_PORT};
use crate::ports::runner::{command_line, CommandRunner, RunError};

/// A scripted answer to one command line.
#[derive(Debug, Clone)]
enum Response {
    Ok(String),
    Fail { message: String, output: String },
}

/// Answers commands from a table keyed by the rendered command line.
///
/// Lookups are by content rather than order, so the same query may be issued
/// any number of times. Unknown commands fail with [`RunError::Scripted`].
#[derive(Debug, Default)]
pub struct ScriptedCommandRunner {
    responses: HashMap<String, Response>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedCommandRunner {
    /// Creates an empty runner; every command fails until scripted.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts `command_line` to succeed with `stdout`.
    #[must_use]
    pub fn with(mut self, command_line: &str, stdout: &str) -> Self {
        self.responses.insert(command_line.to_string(), Response::Ok(stdout.to_string()));
        self
    }

    /// Scripts `command_line` to fail without output.
    #[must_use]
    pub fn failing(self, command_line: &str) -> Self {
        self.failing_with(command_line, "")
    }

    /// Scripts `command_line` to exit unsuccessfully after printing `output`.
    #[must_use]
    pub fn failing_with(mut self, command_line: &str, output: &str) -> Self {
        let message = format!("{command_line} failed");
        self.responses
            .insert(command_line.to_string(), Response::Fail { message, output: output.to_string() });
        self
    }

    /// Builds a runner from the `runner` interactions of a cassette.
    ///
    /// Later interactions for the same command line override earlier ones.
    #[must_use]
    pub fn from_cassette(cassette: &Cassette) -> Self {
        let mut runner = Self::new();
        for interaction in cassette.interactions.iter().filter(|i| i.port == RUNNER_PORT) {
            let Some(key) = interaction.key() else { continue };
            let field = |name: &str| {
                interaction.output.get(name).and_then(serde_json::Value::as_str).map(str::to_string)
            };
            let response = match field("ok") {
                Some(stdout) => Response::Ok(stdout),
                None => Response::Fail {
                    message: field("err").unwrap_or_else(|| "recorded failure".to_string()),
                    output: field("output").unwrap_or_default(),
                },
            };
            runner.responses.insert(key.to_string(), response);
        }
        runner
    }

    /// Every command line that was requested, in call order.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    fn answer(&self, command: &str, args: &[&str]) -> Result<String, RunError> {
        let line = command_line(command, args);
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(line.clone());
        }
        match self.responses.get(&line) {
            Some(Response::Ok(stdout)) => Ok(stdout.clone()),
            Some(Response::Fail { message, output }) if output.is_empty() => {
                Err(RunError::Scripted(message.clone()))
            }
            Some(Response::Fail { output, .. }) => Err(RunError::Exit {
                command: line,
                code: Some(1),
                stdout: output.clone(),
                stderr: String::new(),
            }),
            None => {
                trace!(command = %line, "no scripted response");
                Err(RunError::Scripted(format!("no scripted response for `{line}`")))
            }
        }
    }
}

impl CommandRunner for ScriptedCommandRunner {
    fn run(&self, _dir: &Path, command: &str, args: &[&str]) -> Result<String, RunError> {
        self.answer(command, args)
    }

    fn run_with_timeout(
        &self,
        _dir: &Path,
        _timeout: Duration,
        command: &str,
        args: &[&str],
    ) -> Result<String, RunError> {
        self.answer(command, args)
    }
}
