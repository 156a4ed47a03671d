use crate::models::AnnotationId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    StepForward(usize),
    StepBackward(usize),
    /// Make the event at this index the last applied one.
    StepTo(usize),
    StepToAnnotation(AnnotationId),
    NextAnnotation,
    PreviousAnnotation,
    ClearNewCode,
}
