//! Core library entry for the `vibes` CLI.
//!
//! Every subcommand gathers state from git, the beads tracker and GitHub,
//! then prints a Markdown prompt for a coding agent.

/// Production and scripted implementations of the ports.
pub mod adapters;
/// Task resolution against `bd` and `bv`.
pub mod beads;
/// Recorded interactions for deterministic replay.
pub mod cassette;
pub mod cli;
pub mod commands;
/// Bundle of ports handed to every command.
pub mod context;
/// Read-only git queries.
pub mod git;
pub mod logging;
/// Boundaries to the outside world.
pub mod ports;
/// Pull request state through `gh`.
pub mod pr;
/// Project markers, test commands and build probes.
pub mod project;

use clap::error::ErrorKind;
use clap::Parser;

/// Run the CLI with the provided arguments.
///
/// `--help` and `--version` print to stdout and succeed.
///
/// # Errors
///
/// Returns an error string when argument parsing fails or the working
/// directory cannot be resolved.
pub fn run<I, T>(args: I) -> Result<(), String>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = match cli::Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = err.print();
            return Ok(());
        }
        Err(err) => return Err(err.to_string()),
    };
    commands::dispatch(&cli)
}
