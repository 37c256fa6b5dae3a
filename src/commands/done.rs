//! `vibes done`: close out the current task.

use std::fmt::Write as _;
use std::path::Path;

use super::{project_key, push_fenced, task_id_or_placeholder, task_label};
use crate::beads::{self, TaskInfo};
use crate::context::ServiceContext;
use crate::git;

/// Build the `done` prompt.
pub fn render(ctx: &ServiceContext, dir: &Path, verbose: bool) -> String {
    let runner = ctx.runner.as_ref();
    let mut out = String::new();
    let _ = writeln!(out, "# Complete Current Work in {}\n", beads::project_name(dir));

    let branch = git::current_branch(runner, dir);
    let task = beads::detect_current_task(ctx, dir, &branch);

    out.push_str("## Work Summary\n");
    if !branch.is_empty() {
        let _ = writeln!(out, "- **Branch**: {branch}");
    }
    if !task.id.is_empty() {
        let _ = writeln!(out, "- **Task**: {}", task_label(&task));
    }
    let commits = git::branch_commits(runner, dir, &branch);
    if !commits.is_empty() {
        let _ = writeln!(out, "- **Commits on branch**: {} commits", git::count_lines(&commits));
    }
    if let Some(counts) = git::try_status_counts(runner, dir) {
        let tree = if counts.is_clean() { "Clean".to_string() } else { counts.summary() };
        let _ = writeln!(out, "- **Working tree**: {tree}");
    }
    out.push('\n');

    push_fenced(&mut out, "Recent Commits", "", &commits);

    out.push_str("## Completion Protocol\n");
    out.push_str(&protocol(&task, verbose));
    out
}

fn protocol(task: &TaskInfo, verbose: bool) -> String {
    let id = task_id_or_placeholder(task);
    if verbose {
        let project = project_key(task);
        return format!(
            r#"1. **Verify work is complete**
   - All tests pass
   - Code is committed (or commit now)
   - Changes are ready for review

2. **Release file reservations** (if using MCP Agent Mail):
   ```
   release_file_paths(
       project_key="{project}",
       agent_name="YourAgentIdentity"
   )
   ```

3. **Mark task complete**:
   ```bash
   bd update {id} --status closed
   ```

4. **Check for unblocked tasks**:
   ```bash
   bd ready
   ```

5. **Continue to next task** (optional):
   ```bash
   claude "$(vibes next)"
   ```

Please complete the current work following this protocol.
"#
        );
    }
    format!(
        r#"1. Verify: Tests pass, code committed
2. Release file reservations (if applicable)
3. Complete: `bd update {id} --status closed`
4. Check unblocked: `bd ready`
5. Continue: `claude "$(vibes next)"`

Please complete the current work following this protocol.
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::scripted::{ScriptedCommandRunner, ScriptedFileSystem};
    use crate::commands::testing::{ctx, dir, tracked_fs};

    #[test]
    fn clean_main_without_tracker_uses_placeholder() {
        let runner = ScriptedCommandRunner::new()
            .with("git rev-parse --abbrev-ref HEAD", "main")
            .with("git status --porcelain", "")
            .with("git log -5 --oneline", "abc1234 initial commit");
        let out = render(&ctx(runner, ScriptedFileSystem::new()), dir(), false);
        assert!(out.contains("- **Working tree**: Clean\n"));
        assert!(out.contains("`bd update <task-id> --status closed`"));
        assert!(!out.contains("- **Task**:"));
        assert!(out.contains("- **Commits on branch**: 1 commits\n"));
        assert!(out.contains("## Recent Commits\n```\nabc1234 initial commit\n```\n"));
    }

    #[test]
    fn feature_branch_with_tracked_task() {
        let runner = ScriptedCommandRunner::new()
            .with("git rev-parse --abbrev-ref HEAD", "feature/bd-42-login")
            .with("git status --porcelain", "M  src/login.rs")
            .with("git log --oneline main..HEAD", "def5678 add login\nabc1234 scaffold")
            .with("bd list --status in_progress", "")
            .with("bd show bd-42", "Title: Login page\nStatus: in_progress");
        let out = render(&ctx(runner, tracked_fs()), dir(), true);
        assert!(out.contains("- **Task**: bd-42 \"Login page\"\n"));
        assert!(out.contains("- **Commits on branch**: 2 commits\n"));
        assert!(out.contains("- **Working tree**: 1 staged\n"));
        assert!(out.contains("project_key=\"demo\""));
        assert!(out.contains("bd update bd-42 --status closed"));
    }

    #[test]
    fn unknown_status_omits_working_tree() {
        let runner = ScriptedCommandRunner::new().with("git rev-parse --abbrev-ref HEAD", "main");
        let out = render(&ctx(runner, ScriptedFileSystem::new()), dir(), false);
        assert!(!out.contains("Working tree"));
        assert!(!out.contains("## Recent Commits"));
    }
}
