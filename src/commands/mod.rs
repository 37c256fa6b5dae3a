//! Command dispatch and the shared pieces of every prompt.

pub mod done;
pub mod feedback;
pub mod next;
pub mod pr;
pub mod pr_fix;
pub mod ralph;
pub mod resume;
pub mod stuck;

use std::env;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::beads::TaskInfo;
use crate::cli::{Cli, Command};
use crate::context::ServiceContext;

/// Dispatch a parsed command line and print the resulting prompt.
///
/// When `VIBES_REPLAY` names a cassette, every command and marker-file probe
/// is answered from it. When `VIBES_RECORD` names a file, a cassette of the
/// live run is written there.
///
/// # Errors
///
/// Returns an error string if the working directory cannot be resolved or a
/// replay cassette cannot be loaded.
pub fn dispatch(cli: &Cli) -> Result<(), String> {
    let dir = resolve_dir(cli.dir.as_deref())?;
    let ctx = context_from_env(&dir)?;
    let prompt = render(&cli.command, &ctx, &dir);
    print!("{prompt}");
    Ok(())
}

/// Build the prompt for `command` without printing it.
#[must_use]
pub fn render(command: &Command, ctx: &ServiceContext, dir: &Path) -> String {
    match command {
        Command::Next(args) => next::render(ctx, dir, args.verbose),
        Command::Done(args) => done::render(ctx, dir, args.verbose),
        Command::Resume { prompt, no_fetch } => {
            resume::render(ctx, dir, &resume::Options { verbose: prompt.verbose, fetch: !no_fetch })
        }
        Command::Pr(args) => pr::render(ctx, dir, args.verbose),
        Command::PrFix(args) => pr_fix::render(ctx, dir, args.verbose),
        Command::Feedback(args) => feedback::render(ctx, dir, args.verbose),
        Command::Stuck { prompt, description } => {
            stuck::render(ctx, dir, prompt.verbose, &description.join(" "))
        }
        Command::Ralph { prompt, goal, autopilot, max_iterations } => {
            let mode = match (goal.as_ref(), *autopilot) {
                (Some(goal), _) => ralph::RalphMode::Goal(goal.clone()),
                (None, true) => ralph::RalphMode::Autopilot,
                (None, false) => ralph::RalphMode::SingleTask,
            };
            let options = ralph::Options {
                mode,
                max_iterations: (*max_iterations).filter(|n| *n > 0),
                verbose: prompt.verbose,
            };
            ralph::render(ctx, dir, &options)
        }
    }
}

/// The directory to inspect: `--dir` if given, else the process working
/// directory. Either way the result is absolute so its basename is the
/// project name.
fn resolve_dir(dir: Option<&Path>) -> Result<PathBuf, String> {
    match dir {
        Some(dir) => dir
            .canonicalize()
            .map_err(|e| format!("resolving directory {}: {e}", dir.display())),
        None => env::current_dir().map_err(|e| format!("getting current directory: {e}")),
    }
}

fn context_from_env(dir: &Path) -> Result<ServiceContext, String> {
    if let Some(path) = env::var_os("VIBES_REPLAY") {
        debug!("replaying from VIBES_REPLAY");
        return ServiceContext::replaying(Path::new(&path));
    }
    if let Some(path) = env::var_os("VIBES_RECORD") {
        return Ok(ServiceContext::recording(Path::new(&path), dir));
    }
    Ok(ServiceContext::live())
}

/// Placeholder used in protocols when no task is known.
pub(crate) const TASK_PLACEHOLDER: &str = "<task-id>";
/// Placeholder used in protocols when no project name is known.
pub(crate) const PROJECT_PLACEHOLDER: &str = "project-name";

/// `id "title"`, or just `id` when the title is unknown.
pub(crate) fn task_label(task: &TaskInfo) -> String {
    if task.title.is_empty() {
        task.id.clone()
    } else {
        format!("{} \"{}\"", task.id, task.title)
    }
}

/// Like [`task_label`], with ` [status]` appended when both title and
/// status are known.
pub(crate) fn task_label_with_status(task: &TaskInfo) -> String {
    if task.title.is_empty() || task.status.is_empty() {
        task_label(task)
    } else {
        format!("{} [{}]", task_label(task), task.status)
    }
}

pub(crate) fn task_id_or_placeholder(task: &TaskInfo) -> &str {
    if task.id.is_empty() {
        TASK_PLACEHOLDER
    } else {
        &task.id
    }
}

pub(crate) fn project_key(task: &TaskInfo) -> &str {
    if task.project_name.is_empty() {
        PROJECT_PLACEHOLDER
    } else {
        &task.project_name
    }
}

/// Appends `## heading` and `body` in a fenced block, skipping empty bodies.
pub(crate) fn push_fenced(out: &mut String, heading: &str, lang: &str, body: &str) {
    if body.is_empty() {
        return;
    }
    let _ = writeln!(out, "## {heading}");
    let _ = writeln!(out, "```{lang}");
    let _ = writeln!(out, "{body}");
    out.push_str("```\n\n");
}

/// Keeps the first `max_lines` lines and notes how many were dropped.
pub(crate) fn truncate_lines(text: &str, max_lines: usize) -> String {
    let lines: Vec<&str> = text.split('\n').collect();
    if lines.len() <= max_lines {
        return text.to_string();
    }
    format!("{}\n... ({} more lines)", lines[..max_lines].join("\n"), lines.len() - max_lines)
}


#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: &str, title: &str, status: &str) -> TaskInfo {
        TaskInfo { id: id.into(), title: title.into(), status: status.into(), ..TaskInfo::default() }
    }

    #[test]
    fn task_labels() {
        assert_eq!(task_label(&task("bd-1", "", "open")), "bd-1");
        assert_eq!(task_label(&task("bd-1", "Login", "")), "bd-1 \"Login\"");
        assert_eq!(task_label_with_status(&task("bd-1", "Login", "open")), "bd-1 \"Login\" [open]");
        assert_eq!(task_label_with_status(&task("bd-1", "", "open")), "bd-1");
        assert_eq!(task_id_or_placeholder(&TaskInfo::default()), "<task-id>");
        assert_eq!(project_key(&TaskInfo::default()), "project-name");
    }

    #[test]
    fn truncation_reports_dropped_lines() {
        assert_eq!(truncate_lines("a\nb\nc", 3), "a\nb\nc");
        assert_eq!(truncate_lines("a\nb\nc\nd\ne", 2), "a\nb\n... (3 more lines)");
    }

    #[test]
    fn fenced_sections_skip_empty_bodies() {
        let mut out = String::new();
        push_fenced(&mut out, "Commits", "", "");
        assert!(out.is_empty());
        push_fenced(&mut out, "Commits", "", "abc one");
        assert_eq!(out, "## Commits\n```\nabc one\n```\n\n");
    }

    #[test]
    fn resolve_dir_rejects_missing_paths() {
        assert!(resolve_dir(Some(Path::new("/definitely/not/here"))).is_err());
        let tmp = tempfile::tempdir().unwrap();
        let resolved = resolve_dir(Some(tmp.path())).unwrap();
        assert!(resolved.is_absolute());
    }
}
