//! Git signal extraction.
//!
//! Every query here is best-effort: a failing `git` invocation yields an
//! empty string, zero counts or `None`, never an error.

use std::path::Path;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use tracing::trace;

use crate::ports::runner::CommandRunner;

const FETCH_TIMEOUT: Duration = Duration::from_secs(5);

static TRACKING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]").expect("valid tracking regex"));
static AHEAD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"ahead (\d+)").expect("valid ahead regex"));
static BEHIND: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"behind (\d+)").expect("valid behind regex"));

fn git(runner: &dyn CommandRunner, dir: &Path, args: &[&str]) -> Option<String> {
    runner.run(dir, "git", args).ok()
}

/// The checked-out branch name, or empty when it cannot be determined.
pub fn current_branch(runner: &dyn CommandRunner, dir: &Path) -> String {
    git(runner, dir, &["rev-parse", "--abbrev-ref", "HEAD"]).unwrap_or_default()
}

/// Working-tree file counts derived from `git status --porcelain`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    /// Files with index changes.
    pub staged: usize,
    /// Files with worktree changes.
    pub modified: usize,
    /// Untracked files.
    pub untracked: usize,
}

impl StatusCounts {
    /// True when no file is staged, modified or untracked.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.staged == 0 && self.modified == 0 && self.untracked == 0
    }

    /// `"N staged, N modified, N untracked"` with zero parts omitted.
    #[must_use]
    pub fn summary(&self) -> String {
        [(self.staged, "staged"), (self.modified, "modified"), (self.untracked, "untracked")]
            .into_iter()
            .filter(|(n, _)| *n > 0)
            .map(|(n, label)| format!("{n} {label}"))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Counts porcelain status lines.
///
/// Column 0 `?` is untracked. Otherwise a non-blank column 0 is staged and a
/// non-blank column 1 is modified; one line can count as both.
///
/// Runner output is trimmed, so a leading ` M path` arrives as `M path`.
/// Column 2 of a porcelain line is always blank; when it is not, the line is
/// read as if its leading space were still there.
#[must_use]
pub fn parse_status_counts(porcelain: &str) -> StatusCounts {
    let mut counts = StatusCounts::default();
    for line in porcelain.lines() {
        let (index, worktree) = match line.as_bytes() {
            [worktree, b' ', path, ..] if *path != b' ' => (b' ', *worktree),
            [index, worktree, ..] => (*index, *worktree),
            _ => continue,
        };
        if index == b'?' {
            counts.untracked += 1;
            continue;
        }
        if index != b' ' {
            counts.staged += 1;
        }
        if worktree != b' ' && worktree != b'?' {
            counts.modified += 1;
        }
    }
    counts
}

/// Status counts, or `None` when `git status` itself failed.
pub fn try_status_counts(runner: &dyn CommandRunner, dir: &Path) -> Option<StatusCounts> {
    git(runner, dir, &["status", "--porcelain"]).map(|out| parse_status_counts(&out))
}

/// Status counts, zero when unknown.
pub fn status_counts(runner: &dyn CommandRunner, dir: &Path) -> StatusCounts {
    try_status_counts(runner, dir).unwrap_or_default()
}

/// The five most recent commits, one-line format.
pub fn recent_commits(runner: &dyn CommandRunner, dir: &Path) -> String {
    git(runner, dir, &["log", "-5", "--oneline"]).unwrap_or_default()
}

/// Commits on the current branch that are not on `main` (or `master`).
///
/// On the trunk itself, or when neither range yields anything, falls back to
/// the recent listing.
pub fn branch_commits(runner: &dyn CommandRunner, dir: &Path, branch: &str) -> String {
    if branch.is_empty() || branch == "main" || branch == "master" {
        return recent_commits(runner, dir);
    }
    let mut commits = git(runner, dir, &["log", "--oneline", "main..HEAD"]).unwrap_or_default();
    if commits.is_empty() {
        trace!("no commits against main, trying master");
        match git(runner, dir, &["log", "--oneline", "master..HEAD"]) {
            Some(out) => commits = out,
            None => return String::new(),
        }
    }
    if commits.is_empty() {
        trace!("branch range empty, using recent commits");
        return recent_commits(runner, dir);
    }
    commits
}

/// Subject and relative age of the last commit, e.g. `fix parser (2 hours ago)`.
pub fn recent_commit(runner: &dyn CommandRunner, dir: &Path) -> String {
    git(runner, dir, &["log", "-1", "--format=%s (%ar)"]).unwrap_or_default()
}

/// Number of stash entries.
pub fn stash_count(runner: &dyn CommandRunner, dir: &Path) -> usize {
    git(runner, dir, &["stash", "list"]).map_or(0, |out| count_lines(&out))
}

/// Tracking state relative to the upstream branch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteStatus {
    /// Commits not yet pushed.
    pub ahead: usize,
    /// Commits not yet pulled.
    pub behind: usize,
    /// Raw bracket text, e.g. `ahead 1, behind 2`.
    pub info: String,
}

/// Parses the first line of `git status -sb`.
#[must_use]
pub fn parse_remote_status(output: &str) -> RemoteStatus {
    let first = output.lines().next().unwrap_or_default();
    let Some(caps) = TRACKING.captures(first) else {
        return RemoteStatus::default();
    };
    let info = caps[1].to_string();
    let number = |re: &Regex| {
        re.captures(&info).and_then(|c| c[1].parse().ok()).unwrap_or_default()
    };
    RemoteStatus { ahead: number(&AHEAD), behind: number(&BEHIND), info }
}

/// Ahead/behind counts, optionally refreshing from the remote first.
///
/// The fetch is bounded and its failure is ignored.
pub fn remote_status(runner: &dyn CommandRunner, dir: &Path, fetch: bool) -> RemoteStatus {
    if fetch {
        if let Err(e) = runner.run_with_timeout(dir, FETCH_TIMEOUT, "git", &["fetch", "--quiet"]) {
            trace!(error = %e, "fetch skipped");
        }
    }
    git(runner, dir, &["status", "-sb"]).map(|out| parse_remote_status(&out)).unwrap_or_default()
}

/// `main` if it exists, else `master` if it exists, else `main`.
pub fn base_branch(runner: &dyn CommandRunner, dir: &Path) -> String {
    ["main", "master"]
        .into_iter()
        .find(|name| git(runner, dir, &["rev-parse", "--verify", name]).is_some())
        .unwrap_or("main")
        .to_string()
}

/// The summary line of `git diff --stat <base>...HEAD`.
pub fn diff_summary(runner: &dyn CommandRunner, dir: &Path, base: &str) -> String {
    let range = format!("{base}...HEAD");
    git(runner, dir, &["diff", "--stat", &range])
        .and_then(|out| out.lines().rev().map(str::trim).find(|l| !l.is_empty()).map(str::to_string))
        .unwrap_or_default()
}

/// `git diff --name-status <base>...HEAD`.
pub fn files_changed(runner: &dyn CommandRunner, dir: &Path, base: &str) -> String {
    let range = format!("{base}...HEAD");
    git(runner, dir, &["diff", "--name-status", &range]).unwrap_or_default()
}

/// Number of lines in `text` after trimming, zero when empty.
#[must_use]
pub fn count_lines(text: &str) -> usize {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        0
    } else {
        trimmed.lines().count()
    }
}
