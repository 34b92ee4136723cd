//! Shared helpers for unit tests across modules.
mod common;
mod recording_sink;

pub use common::*;
pub use recording_sink::*;
