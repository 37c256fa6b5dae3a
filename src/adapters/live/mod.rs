//! Live adapters for real external interactions.

pub mod filesystem;
pub mod runner;

pub use filesystem::LiveFileSystem;
pub use runner::LiveCommandRunner;
