//! `vibes feedback`: act on review comments left in the task's thread.

use std::fmt::Write as _;
use std::path::Path;

use super::{project_key, push_fenced, task_id_or_placeholder, task_label};
use crate::beads::{self, TaskInfo};
use crate::context::ServiceContext;
use crate::git;

/// Build the `feedback` prompt.
pub fn render(ctx: &ServiceContext, dir: &Path, verbose: bool) -> String {
    let runner = ctx.runner.as_ref();
    let mut out = String::new();
    let _ = writeln!(out, "# Act on Review Feedback in {}\n", beads::project_name(dir));

    let branch = git::current_branch(runner, dir);
    let base = git::base_branch(runner, dir);
    let task = beads::detect_current_task(ctx, dir, &branch);

    out.push_str("## Current Context\n");
    if !branch.is_empty() {
        let _ = writeln!(out, "- **Branch**: {branch}");
    }
    if !task.id.is_empty() {
        let _ = writeln!(out, "- **Task**: {}", task_label(&task));
        let _ = writeln!(out, "- **Review Thread**: {}", task.review_thread());
    }
    let counts = git::status_counts(runner, dir);
    let tree = if counts.is_clean() { "Clean".to_string() } else { counts.summary() };
    let _ = writeln!(out, "- **Working tree**: {tree}");
    out.push('\n');

    push_fenced(&mut out, "Recent Commits", "", &git::branch_commits(runner, dir, &branch));

    let stat = git::diff_summary(runner, dir, &base);
    if !stat.is_empty() {
        let _ = writeln!(out, "## Changes Summary\n- **Base**: {base}\n- **Stats**: {stat}\n");
    }

    out.push_str("## Check Review Feedback\n");
    out.push_str(&inbox_hint(&task, verbose));
    out.push('\n');

    out.push_str("## Protocol\n");
    out.push_str(&protocol(&task, verbose));
    out
}

fn inbox_hint(task: &TaskInfo, verbose: bool) -> String {
    let thread = format!("{}-review", task_id_or_placeholder(task));
    if !verbose {
        return format!(
            "- Check inbox: `resource://inbox/YourAgentIdentity`
- Get thread: `get_thread_messages(project_key, \"{thread}\")`
"
        );
    }
    let project = project_key(task);
    format!(
        r#"Check your inbox for review feedback:

```
# Check inbox for messages
resource://inbox/YourAgentIdentity

# Get messages from the review thread
get_thread_messages(
    project_key="{project}",
    thread_id="{thread}"
)
```

Look for feedback categories:
- **Blocking**: Must fix before merge
- **Suggestion**: Should consider, discuss if disagree
- **Question**: Respond with clarification
- **Nitpick**: Optional style/preference
"#
    )
}

fn protocol(task: &TaskInfo, verbose: bool) -> String {
    let id = task_id_or_placeholder(task);
    if !verbose {
        return format!(
            r#"1. Retrieve feedback from {id}-review thread
2. Triage: blocking > suggestions > questions > nitpicks
3. Re-reserve files if needed
4. Fix blocking issues first
5. Commit: `git commit -m "fix: address review feedback"`
6. Post resolution summary to thread
7. Request re-review if significant changes
8. When approved: `claude "$(vibes pr)"`

Address the review feedback now.
"#
        );
    }
    let project = project_key(task);
    format!(
        r#"1. **Retrieve review feedback** from the thread

2. **Triage feedback** by category:
   | Category | Action | Priority |
   |----------|--------|----------|
   | Blocking | Must fix before merge | Critical |
   | Suggestion | Consider, discuss if disagree | High |
   | Question | Respond with clarification | Medium |
   | Nitpick | Optional style fix | Low |

3. **Re-reserve files** if needed:
   ```
   file_reservation_paths(
       project_key="{project}",
       agent_name="YourAgentIdentity",
       patterns=["<your-file-patterns>"],
       ttl_seconds=3600,
       exclusive=true
   )
   ```

4. **Address blocking issues first**, then suggestions

5. **Respond to questions** in the review thread

6. **Commit fixes** with descriptive messages:
   ```bash
   git commit -m "fix: address review feedback

   - Fixed <blocking issue>
   - Improved <suggestion>

   Bead: {id}"
   ```

7. **Post resolution summary** to the review thread:
   ```
   send_message(
       project_key="{project}",
       from_agent="YourAgentIdentity",
       thread_id="{id}-review",
       subject="Review Feedback Addressed",
       body="All items addressed. Ready for re-review."
   )
   ```

8. **Request re-review** if changes were significant

9. **When approved**, continue to PR:
   ```bash
   claude "$(vibes pr)"
   ```

Address the review feedback now.
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::scripted::{ScriptedCommandRunner, ScriptedFileSystem};
    use crate::commands::testing::{ctx, dir, tracked_fs};

    #[test]
    fn names_review_thread_and_changes() {
        let runner = ScriptedCommandRunner::new()
            .with("git rev-parse --abbrev-ref HEAD", "feature/bd-42-login")
            .with("git rev-parse --verify main", "abc")
            .with("git status --porcelain", "")
            .with("git log --oneline main..HEAD", "def5678 add login")
            .with("git diff --stat main...HEAD", " 3 files changed, 40 insertions(+)")
            .with("bd list --status in_progress", "bd-42  Login page  [in_progress]");
        let out = render(&ctx(runner, tracked_fs()), dir(), false);
        assert!(out.starts_with("# Act on Review Feedback in demo\n\n## Current Context\n"));
        assert!(out.contains("- **Review Thread**: bd-42-review\n"));
        assert!(out.contains("- **Working tree**: Clean\n"));
        assert!(out.contains("## Changes Summary\n- **Base**: main\n- **Stats**: 3 files changed, 40 insertions(+)\n"));
        assert!(out.contains("get_thread_messages(project_key, \"bd-42-review\")"));
        assert!(out.contains("2. Triage: blocking > suggestions > questions > nitpicks\n"));
        assert!(out.ends_with("Address the review feedback now.\n"));
    }

    #[test]
    fn placeholders_without_task() {
        let runner = ScriptedCommandRunner::new().with("git rev-parse --abbrev-ref HEAD", "main");
        let out = render(&ctx(runner, ScriptedFileSystem::new()), dir(), true);
        assert!(!out.contains("Review Thread"));
        assert!(out.contains("- **Branch**: main\n- **Working tree**: Clean\n"));
        assert!(out.contains("thread_id=\"<task-id>-review\""));
        assert!(out.contains("project_key=\"demo\""));
        assert!(out.contains("- **Blocking**: Must fix before merge"));
        assert!(!out.contains("## Changes Summary"));
    }
}
