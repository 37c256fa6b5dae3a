//! `vibes stuck`: hand the current mess to someone who can debug it.

use std::fmt::Write as _;
use std::path::Path;

use super::{push_fenced, task_label_with_status, truncate_lines};
use crate::beads;
use crate::context::ServiceContext;
use crate::git;
use crate::project;

const MAX_DIFF_LINES: usize = 100;
const MAX_ERROR_LINES: usize = 50;

/// Build the `stuck` prompt. `description` may be empty.
pub fn render(ctx: &ServiceContext, dir: &Path, verbose: bool, description: &str) -> String {
    let runner = ctx.runner.as_ref();
    let mut out = String::new();
    let _ = writeln!(out, "# Help Debugging in {}\n", beads::project_name(dir));

    let branch = git::current_branch(runner, dir);
    let task = beads::detect_current_task(ctx, dir, &branch);

    out.push_str("## Current Context\n");
    if !branch.is_empty() {
        let _ = writeln!(out, "- **Branch**: {branch}");
    }
    if !task.id.is_empty() {
        let _ = writeln!(out, "- **Task**: {}", task_label_with_status(&task));
    }
    let counts = git::status_counts(runner, dir);
    let tree = if counts.is_clean() { "Clean".to_string() } else { counts.summary() };
    let _ = writeln!(out, "- **Working tree**: {tree}");
    out.push('\n');

    let diff = recent_changes(ctx, dir);
    if !diff.is_empty() {
        push_fenced(&mut out, "Recent Changes", "diff", &truncate_lines(&diff, MAX_DIFF_LINES));
    }

    push_fenced(&mut out, "Recent Commits", "", &git::branch_commits(runner, dir, &branch));

    let errors = project::detect_errors(ctx, dir);
    if !errors.is_empty() {
        push_fenced(&mut out, "Detected Errors", "", &truncate_lines(&errors, MAX_ERROR_LINES));
    }

    let description = description.trim();
    if !description.is_empty() {
        let _ = writeln!(out, "## Problem\n{description}\n");
    }

    out.push_str("## Debugging Protocol\n");
    out.push_str(protocol(verbose));
    out
}

/// Staged stat, unstaged stat and the full diff against `HEAD`.
fn recent_changes(ctx: &ServiceContext, dir: &Path) -> String {
    let run_git = |args: &[&str]| ctx.runner.run(dir, "git", args).unwrap_or_default();
    let staged = run_git(&["diff", "--cached", "--stat"]);
    let unstaged = run_git(&["diff", "--stat"]);
    let full = run_git(&["diff", "HEAD"]);

    let mut parts = Vec::new();
    if !staged.is_empty() {
        parts.push(format!("Staged:\n{staged}"));
    }
    if !unstaged.is_empty() {
        parts.push(format!("Unstaged:\n{unstaged}"));
    }
    if !full.is_empty() {
        parts.push(full);
    }
    parts.join("\n\n")
}

fn protocol(verbose: bool) -> &'static str {
    if verbose {
        return "1. **Analyze the situation**
   - Review the recent changes shown above
   - Examine any detected errors
   - Understand what was being attempted

2. **Diagnose the root cause**
   - Identify where the problem originates
   - Check for common issues:
     - Typos or syntax errors
     - Missing imports or dependencies
     - Logic errors in conditionals
     - Incorrect function signatures
     - Race conditions or timing issues

3. **Investigate further if needed**
   - Read relevant source files
   - Check test files for expected behavior
   - Look at similar working code for patterns

4. **Propose a fix**
   - Explain what's wrong
   - Show the specific code change needed
   - Explain why the fix works

5. **Verify the fix**
   - Run relevant tests
   - Check for any new issues introduced

6. **If still stuck**
   - Ask clarifying questions
   - Suggest alternative approaches
   - Recommend additional debugging steps

Please help diagnose and fix the issue.
";
    }
    "1. Analyze the recent changes and any detected errors
2. Diagnose the root cause of the problem
3. Investigate relevant files if needed
4. Propose a specific fix with explanation
5. Verify the fix works (run tests if applicable)

Please help diagnose and fix the issue.
"
}
