//! Build-tool detection from marker files in the project root.

use std::path::Path;
use std::time::Duration;

use tracing::trace;

use crate::context::ServiceContext;
use crate::ports::filesystem::FileSystem;

const BUILD_TIMEOUT: Duration = Duration::from_secs(30);
const FILE_CHECK_TIMEOUT: Duration = Duration::from_secs(10);

/// Shown in place of a test command when no runner is recognised.
pub const NO_TEST_RUNNER: &str = "# No test runner detected - verify manually or add tests";

/// The command that proves the project still works, chosen by marker file.
pub fn detect_test_command(fs: &dyn FileSystem, dir: &Path) -> &'static str {
    let has = |name: &str| fs.exists(&dir.join(name));
    if has("go.mod") {
        "go test ./... && go build ./..."
    } else if has("package.json") {
        if has("yarn.lock") {
            "yarn test"
        } else if has("pnpm-lock.yaml") {
            "pnpm test"
        } else {
            "npm test"
        }
    } else if has("pyproject.toml") || has("setup.py") {
        "pytest"
    } else if has("Cargo.toml") {
        "cargo test && cargo build"
    } else if has("Makefile") {
        "make test"
    } else {
        NO_TEST_RUNNER
    }
}

/// Runs the static checks the project supports and collects what they report.
///
/// Only probes that fail and leave output behind contribute. Sections are
/// joined by a blank line; the result is empty when nothing was found.
pub fn detect_errors(ctx: &ServiceContext, dir: &Path) -> String {
    let has = |name: &str| ctx.fs.exists(&dir.join(name));
    let mut found = Vec::new();
    let mut probe = |label: String, timeout: Duration, command: &str, args: &[&str]| {
        if let Err(e) = ctx.runner.run_with_timeout(dir, timeout, command, args) {
            let output = e.diagnostics();
            if output.is_empty() {
                trace!(command, error = %e, "probe failed without output");
            } else {
                found.push(format!("{label}\n{output}"));
            }
        }
    };

    if has("go.mod") {
        probe("Go build errors:".into(), BUILD_TIMEOUT, "go", &["build", "./..."]);
        probe("Go vet issues:".into(), BUILD_TIMEOUT, "go", &["vet", "./..."]);
    }
    if has("package.json") && has("tsconfig.json") {
        probe("TypeScript errors:".into(), BUILD_TIMEOUT, "npx", &["tsc", "--noEmit"]);
    }
    if has("pyproject.toml") || has("setup.py") {
        let changed = ctx
            .runner
            .run(dir, "git", &["diff", "--name-only", "--diff-filter=M", "*.py"])
            .unwrap_or_default();
        for file in changed.lines().map(str::trim).filter(|f| !f.is_empty()) {
            probe(
                format!("Python syntax error in {file}:"),
                FILE_CHECK_TIMEOUT,
                "python",
                &["-m", "py_compile", file],
            );
        }
    }
    if has("Cargo.toml") {
        probe(
            "Cargo check errors:".into(),
            BUILD_TIMEOUT,
            "cargo",
            &["check", "--quiet", "--message-format", "short"],
        );
    }

    found.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::scripted::{ScriptedCommandRunner, ScriptedFileSystem};
    use crate::ports::runner::{CommandRunner, RunError};

    fn dir() -> &'static Path {
        Path::new("/work/demo")
    }

    fn fs_with(files: &[&str]) -> ScriptedFileSystem {
        files.iter().fold(ScriptedFileSystem::new(), |fs, f| fs.with(dir().join(f)))
    }

    #[test]
    fn test_command_by_marker() {
        assert_eq!(detect_test_command(&fs_with(&["go.mod"]), dir()), "go test ./... && go build ./...");
        assert_eq!(detect_test_command(&fs_with(&["package.json", "yarn.lock"]), dir()), "yarn test");
        assert_eq!(detect_test_command(&fs_with(&["package.json", "pnpm-lock.yaml"]), dir()), "pnpm test");
        assert_eq!(detect_test_command(&fs_with(&["package.json"]), dir()), "npm test");
        assert_eq!(detect_test_command(&fs_with(&["setup.py"]), dir()), "pytest");
        assert_eq!(detect_test_command(&fs_with(&["Cargo.toml"]), dir()), "cargo test && cargo build");
        assert_eq!(detect_test_command(&fs_with(&["Makefile"]), dir()), "make test");
        assert_eq!(detect_test_command(&fs_with(&[]), dir()), NO_TEST_RUNNER);
    }

    #[test]
    fn go_marker_wins_over_makefile() {
        assert_eq!(
            detect_test_command(&fs_with(&["Makefile", "go.mod"]), dir()),
            "go test ./... && go build ./..."
        );
    }

    /// Fails every command with fixed compiler output.
    struct Broken;

    impl CommandRunner for Broken {
        fn run(&self, _dir: &Path, command: &str, args: &[&str]) -> Result<String, RunError> {
            if args.first() == Some(&"diff") {
                return Ok("app.py\nlib/util.py".into());
            }
            Err(RunError::Exit {
                command: command.into(),
                code: Some(1),
                stdout: String::new(),
                stderr: format!("{command}: error"),
            })
        }

        fn run_with_timeout(
            &self,
            dir: &Path,
            _timeout: Duration,
            command: &str,
            args: &[&str],
        ) -> Result<String, RunError> {
            self.run(dir, command, args)
        }
    }

    #[test]
    fn collects_failing_probe_output() {
        let ctx = ServiceContext::new(Box::new(Broken), Box::new(fs_with(&["go.mod", "setup.py"])));
        let errors = detect_errors(&ctx, dir());
        assert_eq!(
            errors,
            "Go build errors:\ngo: error\n\nGo vet issues:\ngo: error\n\n\
             Python syntax error in app.py:\npython: error\n\n\
             Python syntax error in lib/util.py:\npython: error"
        );
    }

    #[test]
    fn silent_failures_contribute_nothing() {
        let runner = ScriptedCommandRunner::new().failing("cargo check --quiet --message-format short");
        let ctx = ServiceContext::scripted(runner, fs_with(&["Cargo.toml"]));
        assert_eq!(detect_errors(&ctx, dir()), "");
    }

    #[test]
    fn typescript_needs_tsconfig() {
        let ctx = ServiceContext::new(Box::new(Broken), Box::new(fs_with(&["package.json"])));
        assert_eq!(detect_errors(&ctx, dir()), "");
        let ctx = ServiceContext::new(
            Box::new(Broken),
            Box::new(fs_with(&["package.json", "tsconfig.json"])),
        );
        assert_eq!(detect_errors(&ctx, dir()), "TypeScript errors:\nnpx: error");
    }
}
