//! Live command runner using `std::process::Command`.

use std::env;
use std::ffi::OsStr;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Output, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};
use wait_timeout::ChildExt;

use crate::ports::runner::{command_line, CommandRunner, RunError};

/// Extra time a pipe gets after the deadline to flush what is already buffered.
const PIPE_GRACE: Duration = Duration::from_millis(100);

/// Live runner that spawns real processes.
pub struct LiveCommandRunner;

impl CommandRunner for LiveCommandRunner {
    fn run(&self, dir: &Path, command: &str, args: &[&str]) -> Result<String, RunError> {
        debug!(command = %command_line(command, args), dir = %dir.display(), "running command");
        let output = Command::new(command)
            .args(args)
            .current_dir(dir)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| RunError::Spawn { command: command.to_string(), source })?;
        finish(command, &output)
    }

    fn run_with_timeout(
        &self,
        dir: &Path,
        timeout: Duration,
        command: &str,
        args: &[&str],
    ) -> Result<String, RunError> {
        let Some(path) = find_executable(command) else {
            debug!(command, "not found on PATH");
            return Err(RunError::NotFound { command: command.to_string() });
        };
        debug!(
            command = %command_line(command, args),
            dir = %dir.display(),
            timeout_secs = timeout.as_secs(),
            "running command with timeout"
        );

        let deadline = Instant::now() + timeout;
        let mut child = Command::new(path)
            .args(args)
            .current_dir(dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| RunError::Spawn { command: command.to_string(), source })?;

        let stdout = drain(&mut child, Stream::Stdout);
        let stderr = drain(&mut child, Stream::Stderr);

        let spawn_err = |source| RunError::Spawn { command: command.to_string(), source };
        let status = match child.wait_timeout(timeout).map_err(spawn_err)? {
            Some(status) => status,
            None => {
                warn!(command, timeout_secs = timeout.as_secs(), "command timed out, killing");
                // The child may have exited between the timeout and the kill.
                let _ = child.kill();
                let _ = child.wait();
                return Err(RunError::TimedOut { command: command.to_string(), timeout });
            }
        };

        let output = Output {
            status,
            stdout: collect(stdout, deadline),
            stderr: collect(stderr, deadline),
        };
        finish(command, &output)
    }
}

enum Stream {
    Stdout,
    Stderr,
}

/// A pipe being read on its own thread.
///
/// Bytes land in `buf` as they arrive; `done` disconnects once the pipe
/// reaches EOF.
struct Drain {
    buf: Arc<Mutex<Vec<u8>>>,
    done: mpsc::Receiver<()>,
}

/// Reads a child pipe on its own thread so a chatty process cannot block on a
/// full pipe while we wait for it.
fn drain(child: &mut Child, stream: Stream) -> Option<Drain> {
    let mut reader: Box<dyn Read + Send> = match stream {
        Stream::Stdout => Box::new(child.stdout.take()?),
        Stream::Stderr => Box::new(child.stderr.take()?),
    };
    let buf = Arc::new(Mutex::new(Vec::new()));
    let (tx, done) = mpsc::channel::<()>();
    let sink = Arc::clone(&buf);
    thread::spawn(move || {
        let _tx = tx;
        let mut chunk = [0_u8; 8192];
        loop {
            match reader.read(&mut chunk) {
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
                Ok(0) | Err(_) => break,
                Ok(n) => match sink.lock() {
                    Ok(mut buf) => buf.extend_from_slice(&chunk[..n]),
                    Err(_) => break,
                },
            }
        }
    });
    Some(Drain { buf, done })
}

/// Whatever the pipe produced, waiting for EOF no later than `deadline`.
///
/// A background grandchild can inherit the pipe and hold it open after the
/// child has exited; the read is then cut off at the deadline.
fn collect(drain: Option<Drain>, deadline: Instant) -> Vec<u8> {
    let Some(drain) = drain else { return Vec::new() };
    let remaining = deadline.saturating_duration_since(Instant::now()).max(PIPE_GRACE);
    if let Err(RecvTimeoutError::Timeout) = drain.done.recv_timeout(remaining) {
        debug!("pipe still open at deadline, keeping partial output");
    }
    drain.buf.lock().map(|buf| buf.clone()).unwrap_or_default()
}

fn finish(command: &str, output: &Output) -> Result<String, RunError> {
    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
    debug!(command, exit_code = ?output.status.code(), "command finished");
    if output.status.success() {
        Ok(stdout)
    } else {
        Err(RunError::Exit {
            command: command.to_string(),
            code: output.status.code(),
            stdout,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

/// Resolves `name` against `PATH`, returning the first executable file found.
///
/// Names containing a path separator are checked as given.
#[must_use]
pub fn find_executable(name: &str) -> Option<PathBuf> {
    if name.contains(std::path::MAIN_SEPARATOR) {
        let path = PathBuf::from(name);
        return is_executable(&path).then_some(path);
    }
    find_in_path(name, &env::var_os("PATH")?)
}

fn find_in_path(name: &str, paths: &OsStr) -> Option<PathBuf> {
    env::split_paths(paths).map(|dir| dir.join(name)).find(|full| is_executable(full))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    std::fs::metadata(path)
        .is_ok_and(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
