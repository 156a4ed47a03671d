use crate::models::{AnnotationId, FileId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Stop automatic playback; the cursor landed on an annotated event.
    Pause,
    RefreshTree,
    RefreshFile(FileId),
    AnnotationNotFound(AnnotationId),
}
