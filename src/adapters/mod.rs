//! Adapter implementations for port traits.
//!
//! - `live` talks to real processes and the real filesystem.
//! - `scripted` answers from in-memory tables (tests and cassette replay).
//! - `recording` wraps another adapter and captures every interaction.

pub mod live;
pub mod recording;
pub mod scripted;
