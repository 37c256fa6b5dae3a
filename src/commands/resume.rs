//! `vibes resume`: pick the current task back up after a break.

use std::fmt::Write as _;
use std::path::Path;

use super::{project_key, push_fenced, task_id_or_placeholder, task_label_with_status};
use crate::beads::{self, TaskInfo};
use crate::context::ServiceContext;
use crate::git;

/// Options for the `resume` prompt.
#[derive(Debug, Clone, Copy)]
pub struct Options {
    /// Spell out every protocol step.
    pub verbose: bool,
    /// Refresh remote refs before computing ahead/behind.
    pub fetch: bool,
}

/// Build the `resume` prompt.
pub fn render(ctx: &ServiceContext, dir: &Path, options: &Options) -> String {
    let runner = ctx.runner.as_ref();
    let mut out = String::new();
    let _ = writeln!(out, "# Resume Work in {}\n", beads::project_name(dir));

    let branch = git::current_branch(runner, dir);
    let task = beads::detect_current_task(ctx, dir, &branch);

    out.push_str("## Current Work\n");
    if !branch.is_empty() {
        let _ = writeln!(out, "- **Branch**: {branch}");
    }
    if !task.id.is_empty() {
        let _ = writeln!(out, "- **Task**: {}", task_label_with_status(&task));
    }
    out.push('\n');

    out.push_str("## Work in Progress\n");
    let uncommitted = git::status_counts(runner, dir).summary();
    if uncommitted.is_empty() {
        out.push_str("- **Uncommitted changes**: None (working tree clean)\n");
    } else {
        let _ = writeln!(out, "- **Uncommitted changes**: {uncommitted}");
    }
    let commits = git::branch_commits(runner, dir, &branch);
    if !commits.is_empty() {
        let _ = writeln!(out, "- **Commits on branch**: {}", git::count_lines(&commits));
    }
    out.push('\n');

    push_fenced(&mut out, "Recent Commits", "", &commits);

    let pending = pending_items(ctx, dir, &task, options.fetch);
    if !pending.is_empty() {
        out.push_str("## Pending Attention\n");
        for item in &pending {
            let _ = writeln!(out, "- {item}");
        }
        out.push('\n');
    }

    out.push_str("## Protocol\n");
    out.push_str(&protocol(&task, options.verbose));
    out
}

/// Stash, remote and review reminders, in that order.
fn pending_items(ctx: &ServiceContext, dir: &Path, task: &TaskInfo, fetch: bool) -> Vec<String> {
    let runner = ctx.runner.as_ref();
    let mut items = Vec::new();

    let stashed = git::stash_count(runner, dir);
    if stashed > 0 {
        items.push(format!("⚠️ {stashed} stashed change(s) - consider applying or dropping"));
    }

    let remote = git::remote_status(runner, dir, fetch);
    if remote.behind > 0 {
        items.push(format!("⚠️ Branch is {} - consider pulling", remote.info));
    } else if remote.ahead > 0 {
        items.push(format!("📤 Branch is {} - remember to push", remote.info));
    }

    if !task.id.is_empty() {
        items.push(format!("💬 Check inbox for messages in {} thread", task.review_thread()));
    }
    items
}

fn protocol(task: &TaskInfo, verbose: bool) -> String {
    if !verbose {
        return r#"1. Check inbox for pending messages or review feedback
2. Verify file reservations are still valid
3. Pull if behind remote: `git pull`
4. Continue implementation from current state
5. When complete: `claude "$(vibes done)"`

Continue working on the current task.
"#
        .to_string();
    }
    let id = task_id_or_placeholder(task);
    let project = project_key(task);
    format!(
        r#"1. **Check for updates**
   - Review any pending messages in your inbox
   - Check if file reservations are still valid
   - Pull latest changes if behind remote

2. **Verify current state**:
   ```bash
   git status
   bd show {id}
   ```

3. **Re-reserve files if needed** (via MCP Agent Mail):
   ```
   file_reservation_paths(
       project_key="{project}",
       agent_name="YourAgentIdentity",
       patterns=["src/path/**"],
       ttl_seconds=3600,
       exclusive=true
   )
   ```

4. **Continue implementation** from current state

5. **When complete**:
   ```bash
   claude "$(vibes done)"
   ```

Continue working on the current task.
"#
    )
}
