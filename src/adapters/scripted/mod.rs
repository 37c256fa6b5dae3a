//! Scripted adapters answering from in-memory tables.
//!
//! Used by unit tests directly and by `VIBES_REPLAY` through cassettes.

pub mod filesystem;
pub mod runner;

pub use filesystem::ScriptedFileSystem;
pub use runner::ScriptedCommandRunner;
