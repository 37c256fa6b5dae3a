//! `vibes pr`: open a pull request, or check on the one that exists.

use std::fmt::Write as _;
use std::path::Path;

use super::{push_fenced, task_label};
use crate::beads::{self, TaskInfo};
use crate::context::ServiceContext;
use crate::git;
use crate::pr::{self, PrInfo};

/// Build the `pr` prompt.
pub fn render(ctx: &ServiceContext, dir: &Path, verbose: bool) -> String {
    let runner = ctx.runner.as_ref();
    let project = beads::project_name(dir);
    let mut out = String::new();

    let branch = git::current_branch(runner, dir);
    let base = git::base_branch(runner, dir);

    if branch == base || branch == "main" || branch == "master" {
        let _ = writeln!(out, "# Create Pull Request for {project}\n");
        out.push_str("## Branch Info\n");
        let _ = writeln!(out, "- **Current**: {branch}");
        let _ = writeln!(out, "- **Base**: {base}");
        out.push_str("\n⚠️ You are on the base branch. Create a feature branch first:\n");
        out.push_str("```bash\ngit checkout -b feature/your-feature-name\n```\n");
        return out;
    }

    let task = beads::detect_current_task(ctx, dir, &branch);
    let existing = pr::existing_pr_for_branch(runner, dir, &branch);

    match &existing {
        Some(pr) => {
            let _ = writeln!(out, "# Pull Request #{} for {project}\n", pr.number);
            out.push_str("## Existing PR\n");
            let _ = writeln!(out, "- **PR**: #{} {}", pr.number, pr.title);
            let _ = writeln!(out, "- **Status**: {}", pr.state);
            let _ = writeln!(out, "- **URL**: {}\n", pr.url);
        }
        None => {
            let _ = writeln!(out, "# Create Pull Request for {project}\n");
        }
    }

    out.push_str("## Branch Info\n");
    if !branch.is_empty() {
        let _ = writeln!(out, "- **Current**: {branch}");
    }
    let _ = writeln!(out, "- **Base**: {base}");
    let commits = git::branch_commits(runner, dir, &branch);
    if !commits.is_empty() {
        let _ = writeln!(out, "- **Commits**: {} ahead of {base}", git::count_lines(&commits));
    }
    let stat = git::diff_summary(runner, dir, &base);
    if !stat.is_empty() {
        let _ = writeln!(out, "- **Changes**: {stat}");
    }
    let uncommitted = git::status_counts(runner, dir).summary();
    if !uncommitted.is_empty() {
        let _ = writeln!(out, "- **Working tree**: {uncommitted} (uncommitted)");
    }
    out.push('\n');

    if !task.id.is_empty() {
        let _ = writeln!(out, "## Task Context\n- **Bead**: {}\n", task_label(&task));
    }

    push_fenced(&mut out, "Commits", "", &commits);
    push_fenced(&mut out, "Files Changed", "", &git::files_changed(runner, dir, &base));

    out.push_str("## Protocol\n");
    match &existing {
        Some(pr) => out.push_str(&existing_protocol(pr, verbose)),
        None => out.push_str(&create_protocol(&task, &base, verbose)),
    }
    out
}

fn create_protocol(task: &TaskInfo, base: &str, verbose: bool) -> String {
    let reference = if task.id.is_empty() {
        String::new()
    } else {
        format!("\n   - Reference: {}", task_label(task))
    };
    if verbose {
        return format!(
            r#"1. **Review changes** for any issues:
   - Security vulnerabilities
   - Performance problems
   - Missing error handling
   - Code style consistency

2. **Check for uncommitted work**:
   ```bash
   git status
   git diff
   ```

3. **Create PR title and description**:
   - Title: concise summary (50 chars max)
   - Description: what changed and why{reference}

4. **Create the pull request**:
   ```bash
   gh pr create --base {base} --title "Your PR title" --body "$(cat <<'EOF'
## Summary
<bullet points of changes>

## Test plan
<how to verify the changes>
EOF
)"
   ```

5. **Verify PR was created**:
   ```bash
   gh pr view --web
   ```

Please review the changes and create the pull request.
"#
        );
    }
    format!(
        "1. Review changes for issues (security, performance, style)
2. Check for uncommitted work: `git status`
3. Create PR with descriptive title and summary{reference}
4. Run: `gh pr create --base {base}`

Please review the changes and create the pull request.
"
    )
}

fn existing_protocol(pr: &PrInfo, verbose: bool) -> String {
    let n = pr.number;
    if verbose {
        return format!(
            r#"A pull request already exists for this branch.

1. **Review the PR status**:
   ```bash
   gh pr view {n}
   gh pr checks {n}
   ```

2. **Check for review feedback**:
   ```bash
   gh pr view {n} --comments
   ```

3. **If changes are needed**, commit and push:
   ```bash
   git add -A && git commit -m "address review feedback"
   git push
   ```

4. **View the PR in browser**:
   ```bash
   gh pr view {n} --web
   ```

5. **When ready to merge**:
   ```bash
   gh pr merge {n}
   ```

The PR is ready for review or updates.
"#
        );
    }
    format!(
        "A pull request already exists for this branch.

1. View PR: `gh pr view {n}`
2. Check status: `gh pr checks {n}`
3. Push updates: `git push` (if changes made)
4. Open in browser: `gh pr view {n} --web`

The PR is ready for review or updates.
"
    )
}
