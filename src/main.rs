//! Binary entrypoint for the `vibes` CLI.

use std::process::ExitCode;

fn main() -> ExitCode {
    vibes::logging::init();
    // VIBES_RECORD / VIBES_REPLAY are handled in commands::dispatch.
    match vibes::run(std::env::args()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}
