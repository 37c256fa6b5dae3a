//! Port traits defining external boundaries.
//!
//! Each trait represents a boundary between prompt assembly and the outside
//! world (processes, the filesystem). Implementations live in `src/adapters/`.

pub mod filesystem;
pub mod runner;

pub use filesystem::FileSystem;
pub use runner::{command_line, CommandRunner, RunError};
