use super::ids::{AnnotationId, DirId, EventId, FileId, GroupId};
use super::symbol::Symbol;
use compact_str::CompactString;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Relevance {
    #[default]
    Normal,
    /// Project scaffolding; applied silently at startup and never stepped over.
    NeverRelevant,
}

/// Kind-specific payload of an event.
///
/// Every variant carries enough of the prior state to run its inverse.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EventKind {
    Insert {
        file: FileId,
        row: usize,
        col: usize,
        symbol: Symbol,
    },
    Delete {
        file: FileId,
        row: usize,
        col: usize,
        symbol: Symbol,
    },
    CreateFile {
        file: FileId,
        parent: DirId,
        path: CompactString,
    },
    DeleteFile {
        file: FileId,
        path: CompactString,
    },
    RenameFile {
        file: FileId,
        old_path: CompactString,
        new_path: CompactString,
    },
    MoveFile {
        file: FileId,
        old_parent: DirId,
        new_parent: DirId,
        old_path: CompactString,
        new_path: CompactString,
    },
    CreateDir {
        dir: DirId,
        parent: Option<DirId>,
        path: CompactString,
    },
    DeleteDir {
        dir: DirId,
        path: CompactString,
    },
    RenameDir {
        dir: DirId,
        old_path: CompactString,
        new_path: CompactString,
    },
    MoveDir {
        dir: DirId,
        old_parent: DirId,
        new_parent: DirId,
        old_path: CompactString,
        new_path: CompactString,
    },
}

impl EventKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Insert { .. } => "INSERT",
            Self::Delete { .. } => "DELETE",
            Self::CreateFile { .. } => "CREATE_FILE",
            Self::DeleteFile { .. } => "DELETE_FILE",
            Self::RenameFile { .. } => "RENAME_FILE",
            Self::MoveFile { .. } => "MOVE_FILE",
            Self::CreateDir { .. } => "CREATE_DIR",
            Self::DeleteDir { .. } => "DELETE_DIR",
            Self::RenameDir { .. } => "RENAME_DIR",
            Self::MoveDir { .. } => "MOVE_DIR",
        }
    }

    pub fn file_id(&self) -> Option<&FileId> {
        match self {
            Self::Insert { file, .. }
            | Self::Delete { file, .. }
            | Self::CreateFile { file, .. }
            | Self::DeleteFile { file, .. }
            | Self::RenameFile { file, .. }
            | Self::MoveFile { file, .. } => Some(file),
            _ => None,
        }
    }
}

/// One immutable entry of the event log.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Event {
    pub id: EventId,
    pub sequence: u64,
    pub group: Option<GroupId>,
    pub relevance: Relevance,
    pub kind: EventKind,
}

impl Event {
    pub fn new(id: impl Into<EventId>, sequence: u64, kind: EventKind) -> Self {
        Self {
            id: id.into(),
            sequence,
            group: None,
            relevance: Relevance::Normal,
            kind,
        }
    }

    pub fn with_group(mut self, group: impl Into<GroupId>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn never_relevant(mut self) -> Self {
        self.relevance = Relevance::NeverRelevant;
        self
    }

    pub fn is_never_relevant(&self) -> bool {
        self.relevance == Relevance::NeverRelevant
    }
}

/// Where a comment is pinned: the event it belongs to and its place among
/// the other comments on that event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnnotationPlacement {
    pub id: AnnotationId,
    pub event: EventId,
    pub position: usize,
}

impl AnnotationPlacement {
    pub fn new(id: impl Into<AnnotationId>, event: impl Into<EventId>, position: usize) -> Self {
        Self {
            id: id.into(),
            event: event.into(),
            position,
        }
    }
}
