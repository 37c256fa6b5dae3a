//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Top-level CLI parser for `vibes`.
#[derive(Debug, Parser)]
#[command(
    name = "vibes",
    version,
    about = "Context-aware prompts for git + beads agent workflows",
    after_help = "Pipe the output into an agent, e.g. claude \"$(vibes next)\""
)]
pub struct Cli {
    /// Project directory to inspect (defaults to the current directory).
    #[arg(long, global = true, value_name = "PATH")]
    pub dir: Option<PathBuf>,

    /// The command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Flags shared by every prompt.
#[derive(Debug, Clone, Copy, Default, Args)]
pub struct PromptArgs {
    /// Spell out every protocol step.
    #[arg(short, long)]
    pub verbose: bool,
}

/// Supported top-level subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Pick up the next ready task.
    Next(PromptArgs),
    /// Wrap up the current task.
    Done(PromptArgs),
    /// Continue work after a break.
    Resume {
        #[command(flatten)]
        prompt: PromptArgs,
        /// Skip `git fetch` before checking ahead/behind.
        #[arg(long)]
        no_fetch: bool,
    },
    /// Create or inspect the pull request for this branch.
    Pr(PromptArgs),
    /// Fix failing checks, conflicts and review comments on the open PR.
    #[command(name = "pr-fix")]
    PrFix(PromptArgs),
    /// Act on review feedback for the current task.
    Feedback(PromptArgs),
    /// Get help debugging the current state.
    Stuck {
        #[command(flatten)]
        prompt: PromptArgs,
        /// What is going wrong.
        description: Vec<String>,
    },
    /// Run an iterative work loop.
    Ralph {
        #[command(flatten)]
        prompt: PromptArgs,
        /// Work toward a stated goal instead of the next task.
        #[arg(long, conflicts_with = "autopilot")]
        goal: Option<String>,
        /// Work through the whole task graph.
        #[arg(long)]
        autopilot: bool,
        /// Suggested iteration limit.
        #[arg(long, value_name = "N")]
        max_iterations: Option<u32>,
    },
}

#[cfg(test)]
mod tests {
    use super::{Cli, Command};
    use clap::Parser;

    #[test]
    fn parses_next_subcommand() {
        let cli = Cli::parse_from(["vibes", "next"]);
        assert!(matches!(cli.command, Command::Next(args) if !args.verbose));
        assert!(cli.dir.is_none());
    }

    #[test]
    fn dir_is_global() {
        let cli = Cli::parse_from(["vibes", "done", "--dir", "/tmp/project", "-v"]);
        assert_eq!(cli.dir.as_deref(), Some(std::path::Path::new("/tmp/project")));
        assert!(matches!(cli.command, Command::Done(args) if args.verbose));
    }

    #[test]
    fn parses_pr_fix_and_resume() {
        let cli = Cli::parse_from(["vibes", "pr-fix"]);
        assert!(matches!(cli.command, Command::PrFix(_)));
        let cli = Cli::parse_from(["vibes", "resume", "--no-fetch"]);
        assert!(matches!(cli.command, Command::Resume { no_fetch: true, .. }));
    }

    #[test]
    fn stuck_collects_description_words() {
        let cli = Cli::parse_from(["vibes", "stuck", "tests", "hang", "on", "CI"]);
        let Command::Stuck { description, .. } = cli.command else { panic!("expected stuck") };
        assert_eq!(description.join(" "), "tests hang on CI");
    }

    #[test]
    fn ralph_goal_conflicts_with_autopilot() {
        assert!(Cli::try_parse_from(["vibes", "ralph", "--goal", "x", "--autopilot"]).is_err());
        let cli = Cli::parse_from(["vibes", "ralph", "--autopilot", "--max-iterations", "5"]);
        assert!(matches!(
            cli.command,
            Command::Ralph { autopilot: true, max_iterations: Some(5), goal: None, .. }
        ));
    }
}
