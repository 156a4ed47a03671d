//! codereplay - replays a recorded coding session event by event
//!
//! Modules:
//! - models: event log, per-file character grids, project namespace
//! - kernel: playback cursor, new-code markers, annotations, store

pub mod kernel;
pub mod models;

pub use kernel::{PlaybackConfig, PlaybackCursor, PlaybackError, StepOutcome};
pub use models::{Event, EventKind, Session};
