//! `vibes pr-fix`: get the open pull request green and mergeable.

use std::fmt::Write as _;
use std::path::Path;

use super::task_label;
use crate::beads;
use crate::context::ServiceContext;
use crate::git;
use crate::pr::{self, CheckSummary, PrInfo, ReviewComment, ReviewInfo};

/// Build the `pr-fix` prompt.
pub fn render(ctx: &ServiceContext, dir: &Path, verbose: bool) -> String {
    let runner = ctx.runner.as_ref();
    let project = beads::project_name(dir);
    let mut out = String::new();

    let branch = git::current_branch(runner, dir);
    if branch.is_empty() {
        let _ = writeln!(out, "# Fix PR Issues for {project}\n");
        out.push_str("⚠️ Could not determine current branch.\n");
        return out;
    }

    let Some(pr) = pr::current_pr(runner, dir) else {
        let _ = writeln!(out, "# Fix PR Issues for {project}\n");
        out.push_str("## No PR Found\n");
        let _ = writeln!(out, "No pull request found for branch `{branch}`.\n");
        out.push_str("Create one first:\n```bash\nclaude \"$(vibes pr)\"\n```\n");
        return out;
    };

    let task = beads::detect_current_task(ctx, dir, &branch);

    let _ = writeln!(out, "# Fix PR #{} Issues\n", pr.number);
    out.push_str("## PR Status\n");
    let _ = writeln!(out, "- **PR**: #{} {}", pr.number, pr.title);
    let _ = writeln!(out, "- **URL**: {}", pr.url);
    let _ = writeln!(out, "- **State**: {}", pr.state);
    let _ = writeln!(out, "- **Branch**: {} → {}", pr.head_ref, pr.base_ref);
    let _ = writeln!(out, "- **Mergeable**: {}", pr::mergeable_label(&pr.mergeable));
    if !task.id.is_empty() {
        let _ = writeln!(out, "- **Task**: {}", task_label(&task));
    }
    out.push('\n');

    let checks = pr::checks(runner, dir, pr.number);
    let summary = pr::categorize_checks(&checks);
    out.push_str("## CI Checks\n");
    if checks.is_empty() {
        out.push_str("No CI checks configured.\n");
    } else {
        write_checks(&mut out, &summary);
    }
    out.push('\n');

    let reviews = pr::reviews(runner, dir, pr.number);
    let comments = pr::review_comments(runner, dir, pr.number);
    out.push_str("## Reviews\n");
    if reviews.is_empty() && comments.is_empty() {
        out.push_str("No reviews yet.\n");
    } else {
        write_reviews(&mut out, &reviews, &comments);
    }
    out.push('\n');

    let issues = pr::determine_issues(&pr, &summary, &reviews, &comments);
    out.push_str("## Issues to Address\n");
    if issues.is_empty() {
        out.push_str("✅ **No blocking issues found!**\n\n");
        out.push_str("The PR looks ready to merge. You can:\n");
        let _ = writeln!(out, "```bash\ngh pr merge {}\n```", pr.number);
    } else {
        for (i, issue) in issues.iter().enumerate() {
            let _ = writeln!(out, "{}. {issue}", i + 1);
        }
    }
    out.push('\n');

    out.push_str("## Protocol\n");
    if issues.is_empty() {
        out.push_str(&merge_protocol(&pr, verbose));
    } else {
        out.push_str(&fix_protocol(&pr, verbose));
    }
    out
}

fn write_checks(out: &mut String, summary: &CheckSummary) {
    let _ = writeln!(out, "- ✅ Passing: {}", summary.passing.len());
    let _ = writeln!(out, "- ❌ Failing: {}", summary.failing.len());
    let _ = writeln!(out, "- ⏳ Pending: {}\n", summary.pending.len());

    if !summary.failing.is_empty() {
        out.push_str("### Failing Checks\n```\n");
        for check in &summary.failing {
            let _ = writeln!(out, "❌ {}", check.name);
            if !check.details_url.is_empty() {
                let _ = writeln!(out, "   {}", check.details_url);
            }
        }
        out.push_str("```\n");
    }
    if !summary.pending.is_empty() {
        out.push_str("### Pending Checks\n```\n");
        for check in &summary.pending {
            let _ = writeln!(out, "⏳ {}", check.name);
        }
        out.push_str("```\n");
    }
}

fn write_reviews(out: &mut String, reviews: &[ReviewInfo], comments: &[ReviewComment]) {
    for review in reviews {
        let _ = writeln!(
            out,
            "- {} **{}**: {}",
            pr::review_icon(&review.state),
            review.author,
            review.state
        );
    }
    if comments.is_empty() {
        return;
    }
    out.push_str("\n### Review Comments\n");
    for comment in comments {
        let _ = writeln!(out, "\n**@{}** on `{}`:", comment.author, comment.location());
        for line in comment.body.split('\n') {
            let _ = writeln!(out, "> {line}");
        }
    }
}

fn merge_protocol(pr: &PrInfo, verbose: bool) -> String {
    let n = pr.number;
    if verbose {
        let head = &pr.head_ref;
        return format!(
            "The PR is ready to merge!

1. **Final review** - Skim through changes one more time
2. **Merge the PR**:
   ```bash
   gh pr merge {n} --squash
   ```
3. **Clean up** local branch:
   ```bash
   git checkout main && git pull && git branch -d {head}
   ```

Proceed with merging when ready.
"
        );
    }
    format!(
        "The PR is ready to merge!

1. Final review of changes
2. Merge: `gh pr merge {n} --squash`
3. Clean up: `git checkout main && git pull`

Proceed with merging when ready.
"
    )
}

fn fix_protocol(pr: &PrInfo, verbose: bool) -> String {
    let n = pr.number;
    let base = &pr.base_ref;
    if verbose {
        return format!(
            r#"1. **Investigate failures**:
   ```bash
   gh pr checks {n}
   gh pr view {n} --comments
   ```

2. **For merge conflicts**:
   ```bash
   git fetch origin {base}
   git rebase origin/{base}
   # Resolve conflicts in each file
   git add <resolved-files>
   git rebase --continue
   git push --force-with-lease
   ```

3. **For CI failures**:
   - Check the logs at the details URL
   - Fix the failing tests or linting issues
   - Commit and push the fixes

4. **For review comments**:
   - Address each comment
   - Reply to comments explaining changes
   - Request re-review if needed

5. **Push fixes and verify**:
   ```bash
   git push
   gh pr checks {n} --watch
   ```

6. **When all checks pass**, run:
   ```bash
   claude "$(vibes pr-fix)"
   ```

Address the issues listed above.
"#
        );
    }
    format!(
        r#"1. Investigate: `gh pr checks {n}` and `gh pr view {n} --comments`
2. For conflicts: `git rebase origin/{base}`, resolve, then `git push --force-with-lease`
3. For CI failures: check logs, fix issues, push
4. For review comments: address and reply
5. Push fixes: `git push`
6. Re-check: `claude "$(vibes pr-fix)"`

Address the issues listed above.
"#
    )
}
