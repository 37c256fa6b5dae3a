//! `vibes ralph`: a self-checking work loop that runs until the objective is
//! met and verified.

use std::fmt::Write as _;
use std::path::Path;

use crate::beads::{self, Recommendation};
use crate::context::ServiceContext;
use crate::git;
use crate::project;

/// What the loop works toward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RalphMode {
    /// The next task the tracker recommends.
    SingleTask,
    /// A free-form goal.
    Goal(String),
    /// Every task in the graph, in priority order.
    Autopilot,
}

/// Options for the `ralph` prompt.
#[derive(Debug, Clone)]
pub struct Options {
    /// Objective selection.
    pub mode: RalphMode,
    /// Suggested iteration limit; `None` means unlimited.
    pub max_iterations: Option<u32>,
    /// Spell out every protocol step.
    pub verbose: bool,
}

/// Build the `ralph` prompt.
pub fn render(ctx: &ServiceContext, dir: &Path, options: &Options) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# Ralph Loop: {}\n", beads::project_name(dir));

    let mode = match &options.mode {
        RalphMode::SingleTask => "Single Task".to_string(),
        RalphMode::Goal(goal) => format!("Goal: \"{goal}\""),
        RalphMode::Autopilot => "Autopilot".to_string(),
    };
    let _ = writeln!(out, "## Mode: {mode}");
    if let Some(limit) = options.max_iterations {
        let _ = writeln!(out, "- Max iterations: {limit} [suggested limit]");
    }
    out.push('\n');

    let _ = writeln!(out, "## Project Context\n{}", project_context(ctx, dir));

    out.push_str("## Current Objective\n");
    let objective = match &options.mode {
        RalphMode::SingleTask => single_task(ctx, dir),
        RalphMode::Goal(goal) => goal_objective(goal),
        RalphMode::Autopilot => autopilot(ctx, dir),
    };
    let _ = writeln!(out, "{objective}");

    let test_command = project::detect_test_command(ctx.fs.as_ref(), dir);
    let _ = writeln!(
        out,
        "## Completion Requirements (CRITICAL)\n{}",
        completion_requirements(test_command, options.verbose)
    );
    let _ = writeln!(out, "## Checkpoint Commits\n{}", checkpoint(options.verbose));
    out.push_str("## Iteration Protocol\n");
    out.push_str(iteration_protocol(options.verbose));
    out
}

/// Makes text safe to paste inside a double-quoted shell argument.
#[must_use]
pub fn sanitize_for_shell(text: &str) -> String {
    text.chars()
        .filter(|c| *c != '$')
        .map(|c| match c {
            '(' => '[',
            ')' => ']',
            '`' => '\'',
            other => other,
        })
        .collect()
}

fn project_context(ctx: &ServiceContext, dir: &Path) -> String {
    let runner = ctx.runner.as_ref();
    let mut out = String::new();
    let branch = git::current_branch(runner, dir);
    if !branch.is_empty() {
        let _ = writeln!(out, "- Branch: {branch}");
    }
    let status = git::status_counts(runner, dir).summary();
    if status.is_empty() {
        out.push_str("- Status: Clean working tree\n");
    } else {
        let _ = writeln!(out, "- Status: {status}");
    }
    let recent = git::recent_commit(runner, dir);
    if !recent.is_empty() {
        let _ = writeln!(out, "- Recent: {}", sanitize_for_shell(&recent));
    }
    out
}

fn single_task(ctx: &ServiceContext, dir: &Path) -> String {
    match beads::recommendation(ctx, dir) {
        Recommendation::NotInitialized => "No beads task graph found. Work on immediate project \
             needs or run `bd init` to initialize Beads.\n"
            .to_string(),
        Recommendation::Triage(text) => {
            format!("{text}\n\nFocus on completing the highest priority task above.\n")
        }
        Recommendation::Ready(text) => {
            format!("{text}\n\nSelect and complete the most appropriate task from above.\n")
        }
        Recommendation::NoReadyWork => "Beads initialized but no ready tasks found. Work on \
             immediate project needs or create tasks with `bd create \"Task name\" -p 1`.\n"
            .to_string(),
    }
}

fn goal_objective(goal: &str) -> String {
    format!(
        "Goal: {goal}

Work iteratively toward this goal. Each iteration should make concrete progress.
Break down the goal into logical steps and execute them one at a time.
"
    )
}

fn autopilot(ctx: &ServiceContext, dir: &Path) -> String {
    let mut out = String::new();
    let overview = match beads::recommendation(ctx, dir) {
        Recommendation::NotInitialized => {
            return "No beads task graph found. Run 'bd init' to initialize Beads for autopilot \
                    mode.\n"
                .to_string();
        }
        Recommendation::Triage(text) => Some(("Task Overview", text)),
        Recommendation::Ready(text) => Some(("Ready Tasks", text)),
        Recommendation::NoReadyWork => None,
    };
    out.push_str("Work through the entire task graph autonomously.\n\n");
    if let Some((heading, text)) = overview {
        let _ = writeln!(out, "### {heading}\n{text}\n");
    }
    out.push_str(
        "Process tasks in priority order. After completing each task:
1. Mark it closed: `bd update <id> --status closed`
2. Check for newly unblocked tasks
3. Continue with the next highest priority task
",
    );
    out
}

fn completion_requirements(test_command: &str, verbose: bool) -> String {
    let mut out = format!(
        "Both conditions must be met for completion:

1. Verification signals must pass:
   {test_command}

2. Explicit completion promise:
   When the objective is fully complete, output: <promise>COMPLETE</promise>
"
    );
    if verbose {
        out.push_str(
            "
Completion Criteria Details:
- Tests must pass [exit code 0]
- Build must succeed [if applicable]
- The <promise>COMPLETE</promise> tag signals you are confident the work is done
- Do NOT output the promise tag until tests/build pass
- Do NOT output the promise tag if there is more work to do
",
        );
    }
    out
}

fn checkpoint(verbose: bool) -> String {
    let mut out = String::from(
        "After each successful iteration [tests pass], create a checkpoint commit:
   git add -A && git commit -m \"ralph: iteration N - [brief summary]\"
",
    );
    if verbose {
        out.push_str(
            "
Commit Guidelines:
- Replace N with the iteration number [1, 2, 3, ...]
- Keep summary brief [under 50 chars]
- Examples:
  - ralph: iteration 1 - add user model
  - ralph: iteration 2 - implement auth endpoint
  - ralph: iteration 3 - fix validation bug
- Only commit when tests pass
- Each commit should represent a stable, working state
",
        );
    }
    out
}

fn iteration_protocol(verbose: bool) -> &'static str {
    if verbose {
        return "Each iteration follows this cycle:

1. ASSESS current state
   - Review previous iteration results
   - Check test status
   - Identify what needs to be done next

2. EXECUTE one increment
   - Make focused, incremental changes
   - Keep changes small and testable
   - Do not try to do too much at once

3. VERIFY the changes
   - Run tests/build commands
   - Check for errors or regressions
   - Fix any issues before proceeding

4. CHECKPOINT [if tests pass]
   - Commit changes with iteration summary
   - This creates a stable restore point

5. EVALUATE completion
   - Is the objective fully achieved?
   - If yes: output <promise>COMPLETE</promise>
   - If no: continue to next iteration

Important: Do not skip steps. Each iteration must verify before checkpointing.
";
    }
    "1. ASSESS - Review current state and what is needed next
2. EXECUTE - Make one focused, incremental change
3. VERIFY - Run tests/build to confirm changes work
4. CHECKPOINT - Commit if tests pass
5. EVALUATE - Output <promise>COMPLETE</promise> when done, else continue

Begin working now.
"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::scripted::{ScriptedCommandRunner, ScriptedFileSystem};
    use crate::commands::testing::{ctx, dir, tracked_fs};

    fn options(mode: RalphMode) -> Options {
        Options { mode, max_iterations: None, verbose: false }
    }

    fn repo() -> ScriptedCommandRunner {
        ScriptedCommandRunner::new()
            .with("git rev-parse --abbrev-ref HEAD", "main")
            .with("git status --porcelain", "")
            .with("git log -1 --format=%s (%ar)", "use `$HOME` (again) (3 days ago)")
    }

    #[test]
    fn sanitizes_shell_metacharacters() {
        assert_eq!(sanitize_for_shell("fix (x) `y` $z"), "fix [x] 'y' z");
        assert_eq!(sanitize_for_shell("plain"), "plain");
    }

    #[test]
    fn single_task_with_triage() {
        let runner = repo().with("bv --robot-triage", "bd-1 top pick");
        let fs = tracked_fs().with(dir().join("Cargo.toml"));
        let out = render(&ctx(runner, fs), dir(), &options(RalphMode::SingleTask));
        assert!(out.starts_with("# Ralph Loop: demo\n\n## Mode: Single Task\n\n## Project Context\n"));
        assert!(out.contains("- Recent: use 'HOME' [again] [3 days ago]\n"));
        assert!(out.contains(
            "## Current Objective\nbd-1 top pick\n\nFocus on completing the highest priority task above.\n"
        ));
        assert!(out.contains("   cargo test && cargo build\n"));
        assert!(out.contains("<promise>COMPLETE</promise>"));
        assert!(out.contains("git add -A && git commit -m \"ralph: iteration N - [brief summary]\""));
        assert!(out.ends_with("Begin working now.\n"));
    }

    #[test]
    fn goal_mode_with_iteration_limit() {
        let opts = Options {
            mode: RalphMode::Goal("ship login".into()),
            max_iterations: Some(8),
            verbose: true,
        };
        let out = render(&ctx(repo(), ScriptedFileSystem::new()), dir(), &opts);
        assert!(out.contains("## Mode: Goal: \"ship login\"\n- Max iterations: 8 [suggested limit]\n"));
        assert!(out.contains("## Current Objective\nGoal: ship login\n\nWork iteratively"));
        assert!(out.contains("# No test runner detected - verify manually or add tests"));
        assert!(out.contains("Commit Guidelines:"));
        assert!(out.contains("Important: Do not skip steps."));
    }

    #[test]
    fn autopilot_lists_ready_tasks() {
        let runner = repo().with("bd ready", "bd-4 next\nbd-5 after");
        let out = render(&ctx(runner, tracked_fs()), dir(), &options(RalphMode::Autopilot));
        assert!(out.contains("## Mode: Autopilot\n"));
        assert!(out.contains(
            "Work through the entire task graph autonomously.\n\n### Ready Tasks\nbd-4 next\nbd-5 after\n\n\
             Process tasks in priority order."
        ));
    }

    #[test]
    fn autopilot_without_tracker() {
        let out = render(&ctx(repo(), ScriptedFileSystem::new()), dir(), &options(RalphMode::Autopilot));
        assert!(out.contains("Run 'bd init' to initialize Beads for autopilot mode."));
        assert!(!out.contains("Process tasks in priority order."));
    }

    #[test]
    fn single_task_fallbacks() {
        let out = render(&ctx(repo(), ScriptedFileSystem::new()), dir(), &options(RalphMode::SingleTask));
        assert!(out.contains("No beads task graph found. Work on immediate project needs"));
        let out = render(&ctx(repo(), tracked_fs()), dir(), &options(RalphMode::SingleTask));
        assert!(out.contains("Beads initialized but no ready tasks found. Work on immediate project needs"));
        let runner = repo().with("bd ready", "bd-7 thing");
        let out = render(&ctx(runner, tracked_fs()), dir(), &options(RalphMode::SingleTask));
        assert!(out.contains("bd-7 thing\n\nSelect and complete the most appropriate task from above.\n"));
    }
}
