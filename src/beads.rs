//! Task identity resolution against the beads tracker.
//!
//! The tracker is driven through the `bd` and `bv` binaries. A repository
//! counts as tracked when it has a `.beads/` directory.

use std::path::Path;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use tracing::trace;

use crate::context::ServiceContext;
use crate::ports::filesystem::FileSystem;

const QUERY_TIMEOUT: Duration = Duration::from_secs(5);
const RECOMMEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Task id prefixes, in the order branch names are searched for them.
const PREFIXES: [&str; 3] = ["bd", "BEAD", "bead"];

static BRANCH_IDS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    PREFIXES
        .iter()
        .map(|p| Regex::new(&format!(r"({p}-\d+)")).expect("valid branch id regex"))
        .collect()
});

static LIST_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^((?:bd|BEAD|bead)-\d+)\s+(.+?)(?:\s+\[.+\])?$").expect("valid list regex")
});

static LIST_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^((?:bd|BEAD|bead)-\d+)").expect("valid list id regex"));

/// Best current guess at the task being worked on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskInfo {
    /// Tracker id such as `bd-42`; empty when unknown.
    pub id: String,
    /// Task title as reported by the tracker.
    pub title: String,
    /// Tracker status, e.g. `in_progress`.
    pub status: String,
    /// Branch the task was resolved against.
    pub branch: String,
    /// Basename of the working directory.
    pub project_name: String,
}

impl TaskInfo {
    /// The agent-mail thread used for reviews of this task.
    #[must_use]
    pub fn review_thread(&self) -> String {
        format!("{}-review", self.id)
    }
}

/// True when `dir` has a `.beads/` directory.
pub fn is_initialized(fs: &dyn FileSystem, dir: &Path) -> bool {
    fs.exists(&dir.join(".beads"))
}

/// Finds a task id embedded in a branch name.
///
/// Prefixes are tried in a fixed order (`bd`, `BEAD`, `bead`) and the first
/// prefix with a match wins, wherever it appears in the name.
#[must_use]
pub fn extract_id_from_branch(branch: &str) -> Option<String> {
    BRANCH_IDS.iter().find_map(|re| re.captures(branch).map(|c| c[1].to_string()))
}

/// Parses one line of `bd list` output into `(id, title)`.
///
/// A trailing `[...]` annotation is dropped from the title. A line holding
/// only an id yields an empty title.
#[must_use]
pub fn parse_list_line(line: &str) -> Option<(String, String)> {
    let line = line.trim();
    if let Some(caps) = LIST_LINE.captures(line) {
        return Some((caps[1].to_string(), caps[2].trim().to_string()));
    }
    LIST_ID.captures(line).map(|caps| (caps[1].to_string(), String::new()))
}

/// Value of the first `<label>:` line in `bd show` output.
///
/// Only lines starting at column 0 count, so an indented `Title:` inside a
/// description body is ignored.
#[must_use]
pub fn show_field(output: &str, label: &str) -> Option<String> {
    let prefix = format!("{label}:");
    output
        .lines()
        .find_map(|line| line.strip_prefix(&prefix).map(|v| v.trim().to_string()))
}

/// Reconciles tracker and branch signals into a single [`TaskInfo`].
///
/// An in-progress task reported by the tracker wins over an id embedded in
/// the branch name. Failures at every step are silent.
pub fn detect_current_task(ctx: &ServiceContext, dir: &Path, branch: &str) -> TaskInfo {
    let mut task = TaskInfo {
        branch: branch.to_string(),
        project_name: project_name(dir),
        ..TaskInfo::default()
    };
    let tracked = is_initialized(ctx.fs.as_ref(), dir);

    if tracked {
        let listing = ctx
            .runner
            .run_with_timeout(dir, QUERY_TIMEOUT, "bd", &["list", "--status", "in_progress"])
            .unwrap_or_default();
        if let Some((id, title)) = listing.lines().find_map(parse_list_line) {
            task.id = id;
            task.title = title;
            task.status = "in_progress".to_string();
            return task;
        }
        trace!("no in-progress task, falling back to branch name");
    }

    let Some(id) = extract_id_from_branch(branch) else {
        return task;
    };
    if tracked {
        if let Ok(details) = ctx.runner.run_with_timeout(dir, QUERY_TIMEOUT, "bd", &["show", &id]) {
            task.title = show_field(&details, "Title").unwrap_or_default();
            task.status = show_field(&details, "Status").unwrap_or_default();
        }
    }
    task.id = id;
    task
}

/// Basename of `dir`, empty for paths like `/`.
#[must_use]
pub fn project_name(dir: &Path) -> String {
    dir.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default()
}

/// What the tracker suggests working on next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recommendation {
    /// No `.beads/` directory.
    NotInitialized,
    /// Output of `bv --robot-triage`.
    Triage(String),
    /// Output of `bd ready`.
    Ready(String),
    /// Tracker present but nothing ready.
    NoReadyWork,
}

/// Asks `bv` for a triage, then `bd` for ready work.
pub fn recommendation(ctx: &ServiceContext, dir: &Path) -> Recommendation {
    if !is_initialized(ctx.fs.as_ref(), dir) {
        return Recommendation::NotInitialized;
    }
    let query = |command: &str, args: &[&str]| {
        ctx.runner
            .run_with_timeout(dir, RECOMMEND_TIMEOUT, command, args)
            .ok()
            .filter(|out| !out.trim().is_empty())
    };
    if let Some(triage) = query("bv", &["--robot-triage"]) {
        return Recommendation::Triage(triage);
    }
    trace!("no triage output, trying bd ready");
    query("bd", &["ready"]).map_or(Recommendation::NoReadyWork, Recommendation::Ready)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::scripted::{ScriptedCommandRunner, ScriptedFileSystem};

    fn dir() -> &'static Path {
        Path::new("/work/demo")
    }

    fn tracked(runner: ScriptedCommandRunner) -> ServiceContext {
        ServiceContext::scripted(runner, ScriptedFileSystem::new().with("/work/demo/.beads"))
    }

    #[test]
    fn extracts_ids_for_every_casing() {
        assert_eq!(extract_id_from_branch("feature/bd-42-login").as_deref(), Some("bd-42"));
        assert_eq!(extract_id_from_branch("BEAD-7-fix").as_deref(), Some("BEAD-7"));
        assert_eq!(extract_id_from_branch("wip/bead-300").as_deref(), Some("bead-300"));
        assert_eq!(extract_id_from_branch("main"), None);
        assert_eq!(extract_id_from_branch("bd-x"), None);
    }

    #[test]
    fn earlier_prefix_wins() {
        assert_eq!(extract_id_from_branch("bead-1-then-bd-2").as_deref(), Some("bd-2"));
    }

    #[test]
    fn extraction_is_idempotent() {
        for branch in ["feature/bd-42-login", "BEAD-7", "x/bead-9/y"] {
            let id = extract_id_from_branch(branch).unwrap();
            assert_eq!(extract_id_from_branch(&id).as_deref(), Some(id.as_str()));
        }
    }

    #[test]
    fn parses_list_lines() {
        assert_eq!(
            parse_list_line("bd-77  Fix header  [in_progress]"),
            Some(("bd-77".into(), "Fix header".into()))
        );
        assert_eq!(
            parse_list_line("  bd-3 Add login flow"),
            Some(("bd-3".into(), "Add login flow".into()))
        );
        assert_eq!(parse_list_line("bd-5"), Some(("bd-5".into(), String::new())));
        assert_eq!(parse_list_line("No issues found"), None);
    }

    #[test]
    fn reads_show_fields() {
        let output = "bd-42: Login\nTitle: Login page\nStatus: open\nPriority: 1";
        assert_eq!(show_field(output, "Title").as_deref(), Some("Login page"));
        assert_eq!(show_field(output, "Status").as_deref(), Some("open"));
        assert_eq!(show_field(output, "Owner"), None);
    }

    #[test]
    fn show_fields_ignore_indented_lines() {
        let output = "bd-42: Login\nDescription:\n  Title: quoted from the ticket\nTitle: Login page";
        assert_eq!(show_field(output, "Title").as_deref(), Some("Login page"));
        assert_eq!(show_field("  Status: open", "Status"), None);
    }

    #[test]
    fn tracker_in_progress_wins_over_branch() {
        let ctx = tracked(
            ScriptedCommandRunner::new()
                .with("bd list --status in_progress", "bd-77  Fix header  [in_progress]"),
        );
        let task = detect_current_task(&ctx, dir(), "feature/bd-42-login");
        assert_eq!(task.id, "bd-77");
        assert_eq!(task.title, "Fix header");
        assert_eq!(task.status, "in_progress");
        assert_eq!(task.branch, "feature/bd-42-login");
        assert_eq!(task.project_name, "demo");
    }

    #[test]
    fn branch_id_is_enriched_by_show() {
        let ctx = tracked(
            ScriptedCommandRunner::new()
                .with("bd list --status in_progress", "")
                .with("bd show bd-42", "Title: Login page\nStatus: open"),
        );
        let task = detect_current_task(&ctx, dir(), "feature/bd-42-login");
        assert_eq!(task.id, "bd-42");
        assert_eq!(task.title, "Login page");
        assert_eq!(task.status, "open");
    }

    #[test]
    fn untracked_repo_uses_bare_branch_id() {
        let runner = ScriptedCommandRunner::new();
        let ctx = ServiceContext::scripted(runner, ScriptedFileSystem::new());
        let task = detect_current_task(&ctx, dir(), "BEAD-9-thing");
        assert_eq!(task.id, "BEAD-9");
        assert!(task.title.is_empty());
        assert_eq!(task.review_thread(), "BEAD-9-review");
    }

    #[test]
    fn no_signal_leaves_task_empty() {
        let ctx = tracked(ScriptedCommandRunner::new());
        let task = detect_current_task(&ctx, dir(), "main");
        assert!(task.id.is_empty());
        assert_eq!(task.branch, "main");
    }

    #[test]
    fn recommendation_prefers_triage() {
        let ctx = tracked(
            ScriptedCommandRunner::new()
                .with("bv --robot-triage", "{\"top\": \"bd-1\"}")
                .with("bd ready", "bd-2 other"),
        );
        assert_eq!(recommendation(&ctx, dir()), Recommendation::Triage("{\"top\": \"bd-1\"}".into()));
    }

    #[test]
    fn recommendation_falls_back_to_ready_then_nothing() {
        let ctx = tracked(ScriptedCommandRunner::new().with("bv --robot-triage", "").with("bd ready", "bd-2 other"));
        assert_eq!(recommendation(&ctx, dir()), Recommendation::Ready("bd-2 other".into()));

        let ctx = tracked(ScriptedCommandRunner::new());
        assert_eq!(recommendation(&ctx, dir()), Recommendation::NoReadyWork);

        let ctx = ServiceContext::scripted(ScriptedCommandRunner::new(), ScriptedFileSystem::new());
        assert_eq!(recommendation(&ctx, dir()), Recommendation::NotInitialized);
    }
}
