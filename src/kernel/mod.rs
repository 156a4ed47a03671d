//! Headless playback core (cursor/action/effect).

pub mod action;
pub mod annotations;
pub mod config;
pub mod effect;
pub mod new_code;
pub mod playback;
pub mod store;

pub use action::Action;
pub use annotations::{AnnotationEntry, AnnotationIndex};
pub use config::{load_config, ConfigError, PlaybackConfig};
pub use effect::Effect;
pub use new_code::{DiffMarkerGenerator, FileMarker, MarkerRange};
pub use playback::{Direction, PlaybackCursor, PlaybackError, StepOutcome};
pub use store::{DispatchResult, Store};
