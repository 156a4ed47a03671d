//! Data model layer: events, per-file grids and the project namespace.

pub mod event;
pub mod file_tree;
pub mod ids;
pub mod log;
pub mod project;
pub mod symbol;
pub mod text_grid;

pub use event::{AnnotationPlacement, Event, EventKind, Relevance};
pub use file_tree::{
    DirEntry, FileEntry, FileTree, FileTreeError, NodeKey, NodeKind, TreeRow, TreeSnapshot,
};
pub use ids::{AnnotationId, DirId, EventId, FileId, GroupId};
pub use log::{decode_events, parse_events, EventRecord, LogError, Session};
pub use project::{ApplyError, ProjectState};
pub use symbol::{Symbol, CRLF_TOKEN, NEWLINE_TOKEN};
pub use text_grid::{Attribution, GridError, TextGrid};
