//! `vibes next`: pick up the highest-priority ready task.

use std::fmt::Write as _;
use std::path::Path;

use crate::beads::{self, Recommendation};
use crate::context::ServiceContext;
use crate::git;

const NOT_INITIALIZED: &str =
    "No beads task graph found. Run `bd init` to initialize, or use `vibes` to set up the project.";
const NO_READY_WORK: &str =
    "Beads initialized but no ready tasks found. Create tasks with `bd create \"Task name\" -p 1`";

/// Build the `next` prompt.
pub fn render(ctx: &ServiceContext, dir: &Path, verbose: bool) -> String {
    let runner = ctx.runner.as_ref();
    let mut out = String::new();
    let _ = writeln!(out, "# Next Task for {}\n", beads::project_name(dir));

    let mut context = String::new();
    let branch = git::current_branch(runner, dir);
    if !branch.is_empty() {
        let _ = writeln!(context, "- **Branch**: {branch}");
    }
    let counts = git::status_counts(runner, dir);
    if counts.is_clean() {
        context.push_str("- **Status**: Clean working tree\n");
    } else {
        let _ = writeln!(context, "- **Status**: {}", counts.summary());
    }
    let recent = git::recent_commit(runner, dir);
    if !recent.is_empty() {
        let _ = writeln!(context, "- **Recent**: \"{recent}\"");
    }
    let _ = writeln!(out, "## Project Context\n{context}");

    out.push_str("## Recommended Task\n");
    match beads::recommendation(ctx, dir) {
        Recommendation::Triage(text) | Recommendation::Ready(text) => {
            let _ = writeln!(out, "{text}\n");
        }
        Recommendation::NoReadyWork => {
            let _ = writeln!(out, "{NO_READY_WORK}\n");
        }
        Recommendation::NotInitialized => {
            let _ = writeln!(out, "{NOT_INITIALIZED}\n");
        }
    }

    out.push_str("## Protocol\n");
    out.push_str(protocol(verbose));
    out
}

fn protocol(verbose: bool) -> &'static str {
    if verbose {
        return r#"1. **Claim the work**:
   ```bash
   bd update bd-XXXX --status in_progress
   bd show bd-XXXX
   ```

2. **Reserve files** via MCP Agent Mail:
   ```
   file_reservation_paths(
       project_key="project-name",
       agent_name="YourAgentIdentity",
       patterns=["src/path/**"],
       ttl_seconds=3600,
       exclusive=true
   )
   ```

3. **Announce start** in the bead's thread

4. **Execute** the implementation

5. **Complete**:
   ```bash
   bd update bd-XXXX --status closed
   ```

Begin working on the highest priority task now.
"#;
    }
    "1. Claim: `bd update <id> --status in_progress`
2. Reserve files via MCP Agent Mail (if available)
3. Execute the implementation
4. Complete: `bd update <id> --status closed`

Begin working on the highest priority task now.
"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::scripted::{ScriptedCommandRunner, ScriptedFileSystem};
    use crate::commands::testing::{ctx, dir, tracked_fs};

    fn repo() -> ScriptedCommandRunner {
        ScriptedCommandRunner::new()
            .with("git rev-parse --abbrev-ref HEAD", "main")
            .with("git status --porcelain", "")
            .with("git log -1 --format=%s (%ar)", "add parser (2 hours ago)")
    }

    #[test]
    fn renders_context_and_triage() {
        let runner = repo().with("bv --robot-triage", "bd-3 Build parser [P1]");
        let out = render(&ctx(runner, tracked_fs()), dir(), false);
        assert!(out.starts_with("# Next Task for demo\n\n## Project Context\n"));
        assert!(out.contains("- **Branch**: main\n"));
        assert!(out.contains("- **Status**: Clean working tree\n"));
        assert!(out.contains("- **Recent**: \"add parser (2 hours ago)\"\n"));
        assert!(out.contains("## Recommended Task\nbd-3 Build parser [P1]\n\n## Protocol\n"));
        assert!(out.ends_with("Begin working on the highest priority task now.\n"));
    }

    #[test]
    fn reports_dirty_tree() {
        let runner = repo().with("git status --porcelain", " M a.rs\n?? b.rs");
        let out = render(&ctx(runner, ScriptedFileSystem::new()), dir(), false);
        assert!(out.contains("- **Status**: 1 modified, 1 untracked\n"));
    }

    #[test]
    fn untracked_project_suggests_init() {
        let out = render(&ctx(repo(), ScriptedFileSystem::new()), dir(), false);
        assert!(out.contains(NOT_INITIALIZED));
    }

    #[test]
    fn tracked_project_without_work() {
        let out = render(&ctx(repo(), tracked_fs()), dir(), false);
        assert!(out.contains("Beads initialized but no ready tasks found."));
    }

    #[test]
    fn verbose_changes_only_protocol() {
        let runner = || repo().with("bd ready", "bd-9 Something");
        let terse = render(&ctx(runner(), tracked_fs()), dir(), false);
        let verbose = render(&ctx(runner(), tracked_fs()), dir(), true);
        let head = |s: &str| s.split("## Protocol").next().unwrap_or_default().to_string();
        assert_eq!(head(&terse), head(&verbose));
        assert!(verbose.contains("file_reservation_paths("));
        assert!(!terse.contains("file_reservation_paths("));
    }

    #[test]
    fn failed_status_reads_as_clean() {
        let runner = ScriptedCommandRunner::new().with("git rev-parse --abbrev-ref HEAD", "main");
        let out = render(&ctx(runner, ScriptedFileSystem::new()), dir(), false);
        assert!(out.contains("## Project Context\n- **Branch**: main\n- **Status**: Clean working tree\n"));
        assert!(!out.contains("- **Recent**"));
        assert!(out.contains("## Recommended Task"));
    }
}
