//! Cassette format for recording and replaying tool interactions.
//!
//! A cassette captures every command and marker-file probe of one invocation
//! so the same prompt can be regenerated later without git, beads or gh.

pub mod format;
pub mod recorder;
