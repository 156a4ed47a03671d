//! Playback cursor over the event log.
//!
//! The cursor counts applied events: `position() == k` means events
//! `0..k` have been applied and `current_index()` is `k - 1`. Stepping past
//! either end clamps; the outcome reports how far the cursor really moved.
//!
//! Single writer: every mutating call takes `&mut self` and runs to
//! completion before returning. There is no internal locking, so a caller
//! driving automatic playback from a timer must stop the timer before
//! issuing manual navigation.

use super::annotations::{AnnotationEntry, AnnotationIndex};
use super::config::PlaybackConfig;
use super::new_code::{DiffMarkerGenerator, MarkerRange};
use crate::models::{
    AnnotationId, AnnotationPlacement, ApplyError, Event, EventId, EventKind, FileId, GroupId,
    LogError, ProjectState, Session, TreeSnapshot,
};
use std::fmt;
use std::path::Path;

#[derive(Debug)]
pub enum PlaybackError {
    /// The event at `index` could not be applied; the cursor stopped before it.
    Integrity { index: usize, source: ApplyError },
    Log(LogError),
}

impl fmt::Display for PlaybackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaybackError::Integrity { index, source } => {
                write!(f, "event #{index} does not apply: {source}")
            }
            PlaybackError::Log(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for PlaybackError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PlaybackError::Integrity { source, .. } => Some(source),
            PlaybackError::Log(err) => Some(err),
        }
    }
}

impl From<LogError> for PlaybackError {
    fn from(err: LogError) -> Self {
        PlaybackError::Log(err)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepOutcome {
    pub moved: usize,
    pub direction: Direction,
    /// The landed-on event carries annotations.
    pub pause: bool,
    pub file_system_changed: bool,
}

impl StepOutcome {
    fn stay(direction: Direction) -> Self {
        Self {
            moved: 0,
            direction,
            pause: false,
            file_system_changed: false,
        }
    }
}

pub struct PlaybackCursor {
    events: Vec<Event>,
    project: ProjectState,
    annotations: AnnotationIndex,
    applied: usize,
    first_relevant: usize,
    new_code: Option<DiffMarkerGenerator>,
    track_new_code: bool,
    active_file: Option<FileId>,
    active_group: Option<GroupId>,
    active_annotation: Option<AnnotationId>,
}

impl PlaybackCursor {
    pub fn new(
        events: Vec<Event>,
        placements: &[AnnotationPlacement],
        config: &PlaybackConfig,
    ) -> Result<Self, PlaybackError> {
        let mut project = ProjectState::new().with_verify_deletes(config.verify_deletes);
        if config.track_attribution {
            project = project.with_attribution();
        }
        let annotations = AnnotationIndex::build(placements, &events);

        let mut cursor = Self {
            events,
            project,
            annotations,
            applied: 0,
            first_relevant: 0,
            new_code: None,
            track_new_code: config.track_new_code,
            active_file: None,
            active_group: None,
            active_annotation: None,
        };

        if config.skip_never_relevant {
            let skip = cursor
                .events
                .iter()
                .take_while(|event| event.is_never_relevant())
                .count();
            for index in 0..skip {
                cursor.apply_forward_at(index)?;
            }
            cursor.first_relevant = skip;
            cursor.project.clear_fs_changed();
            if skip > 0 {
                tracing::info!(skipped = skip, "applied never-relevant events at startup");
            }
        }
        Ok(cursor)
    }

    pub fn from_session(session: Session, config: &PlaybackConfig) -> Result<Self, PlaybackError> {
        Self::new(session.events, &session.annotations, config)
    }

    pub fn load(path: &Path, config: &PlaybackConfig) -> Result<Self, PlaybackError> {
        let session = Session::load(path)?;
        Self::from_session(session, config)
    }

    // ==================== stepping ====================

    pub fn step_forward(&mut self, n: usize) -> Result<StepOutcome, PlaybackError> {
        let from = self.applied;
        let to = from.saturating_add(n).min(self.events.len());
        if to == from {
            return Ok(StepOutcome::stay(Direction::Forward));
        }

        self.project.clear_fs_changed();
        self.new_code = self.track_new_code.then(DiffMarkerGenerator::new);
        let result: Result<(), PlaybackError> = (from..to).try_for_each(|index| {
            self.apply_forward_at(index)?;
            self.record_new_code(index);
            Ok(())
        });
        tracing::debug!(from, to = self.applied, moved = self.applied - from, "step forward");
        result?;

        Ok(self.land(Direction::Forward, to - from))
    }

    pub fn step_backward(&mut self, n: usize) -> Result<StepOutcome, PlaybackError> {
        let from = self.applied;
        let to = from.saturating_sub(n).max(self.first_relevant);
        if to >= from {
            return Ok(StepOutcome::stay(Direction::Backward));
        }

        self.project.clear_fs_changed();
        self.new_code = None;
        let result: Result<(), PlaybackError> = (to..from)
            .rev()
            .try_for_each(|index| self.apply_backward_at(index));
        tracing::debug!(from, to = self.applied, moved = from - self.applied, "step backward");
        result?;

        Ok(self.land(Direction::Backward, from - to))
    }

    /// Moves so that the event at `index` is the last one applied.
    pub fn step_to(&mut self, index: usize) -> Result<StepOutcome, PlaybackError> {
        let target = index.saturating_add(1);
        if target >= self.applied {
            self.step_forward(target - self.applied)
        } else {
            self.step_backward(self.applied - target)
        }
    }

    /// `None` when no annotation has that id.
    pub fn step_to_annotation(
        &mut self,
        id: &AnnotationId,
    ) -> Result<Option<StepOutcome>, PlaybackError> {
        let Some(entry) = self.annotations.get(id) else {
            return Ok(None);
        };
        let event_index = entry.event_index;
        let outcome = self.step_to(event_index)?;
        self.active_annotation = Some(id.clone());
        Ok(Some(outcome))
    }

    /// Goes to the annotation after the active one. With none active, the
    /// first one pinned to the current event or later is next; only the
    /// startup position can sit on a pinned event with nothing active.
    /// `None` at the end of the order.
    pub fn next_annotation(&mut self) -> Result<Option<StepOutcome>, PlaybackError> {
        let next = match self.active_position() {
            Some(position) => self.annotations.at(position + 1),
            None => match self.current_sequence() {
                Some(sequence) => self.annotations.first_from(sequence),
                None => self.annotations.at(0),
            },
        };
        match next.map(|entry| entry.id.clone()) {
            Some(id) => self.step_to_annotation(&id),
            None => Ok(None),
        }
    }

    pub fn previous_annotation(&mut self) -> Result<Option<StepOutcome>, PlaybackError> {
        let previous = match self.active_position() {
            Some(position) => position
                .checked_sub(1)
                .and_then(|p| self.annotations.at(p)),
            None => match self.current_sequence() {
                Some(sequence) => self.annotations.previous_before(sequence),
                None => None,
            },
        };
        match previous.map(|entry| entry.id.clone()) {
            Some(id) => self.step_to_annotation(&id),
            None => Ok(None),
        }
    }

    /// Drops the new-code markers, e.g. once the viewer has paused.
    pub fn clear_new_code(&mut self) {
        self.new_code = None;
    }

    // ==================== queries ====================

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn project(&self) -> &ProjectState {
        &self.project
    }

    pub fn annotations(&self) -> &AnnotationIndex {
        &self.annotations
    }

    pub fn position(&self) -> usize {
        self.applied
    }

    /// Index of the last applied event.
    pub fn current_index(&self) -> Option<usize> {
        self.applied.checked_sub(1)
    }

    pub fn current_event(&self) -> Option<&Event> {
        self.current_index().and_then(|i| self.events.get(i))
    }

    pub fn first_relevant_index(&self) -> usize {
        self.first_relevant
    }

    pub fn is_at_start(&self) -> bool {
        self.applied <= self.first_relevant
    }

    pub fn is_at_end(&self) -> bool {
        self.applied >= self.events.len()
    }

    pub fn current_file_text(&self, file: &FileId) -> Option<String> {
        self.project.file_text(file)
    }

    pub fn current_line_count(&self, file: &FileId) -> Option<usize> {
        self.project.line_count(file)
    }

    pub fn current_tree(&self) -> TreeSnapshot {
        self.project.snapshot()
    }

    pub fn active_file_id(&self) -> Option<&FileId> {
        self.active_file.as_ref()
    }

    pub fn active_contributor_group_id(&self) -> Option<&GroupId> {
        self.active_group.as_ref()
    }

    pub fn active_annotation(&self) -> Option<&AnnotationId> {
        self.active_annotation.as_ref()
    }

    /// The active annotation and its siblings on the same event.
    pub fn active_annotation_group(&self) -> &[AnnotationEntry] {
        match &self.active_annotation {
            Some(id) => self.annotations.group_of(id),
            None => &[],
        }
    }

    pub fn diff_ranges(&self, file: &FileId) -> Vec<MarkerRange> {
        self.new_code
            .as_ref()
            .map(|gen| gen.ranges_for(file))
            .unwrap_or_default()
    }

    pub fn insert_lines(&self, file: &FileId) -> Vec<usize> {
        self.new_code
            .as_ref()
            .map(|gen| gen.insert_lines(file))
            .unwrap_or_default()
    }

    pub fn delete_lines(&self, file: &FileId) -> Vec<usize> {
        self.new_code
            .as_ref()
            .map(|gen| gen.delete_lines(file))
            .unwrap_or_default()
    }

    pub fn touched_file_ids(&self) -> Vec<FileId> {
        self.new_code
            .as_ref()
            .map(DiffMarkerGenerator::touched_file_ids)
            .unwrap_or_default()
    }

    /// The event that inserted the symbol at `row:col`, when attribution is on.
    pub fn attribution(&self, file: &FileId, row: usize, col: usize) -> Option<&EventId> {
        self.project.attribution_at(file, row, col)
    }

    // ==================== internals ====================

    fn apply_forward_at(&mut self, index: usize) -> Result<(), PlaybackError> {
        let event = &self.events[index];
        self.project.apply_forward(event).map_err(|source| {
            tracing::warn!(
                index,
                event = %event.id,
                kind = event.kind.name(),
                error = %source,
                "event does not apply forward"
            );
            PlaybackError::Integrity { index, source }
        })?;
        self.applied = index + 1;
        Ok(())
    }

    fn apply_backward_at(&mut self, index: usize) -> Result<(), PlaybackError> {
        let event = &self.events[index];
        self.project.apply_backward(event).map_err(|source| {
            tracing::warn!(
                index,
                event = %event.id,
                kind = event.kind.name(),
                error = %source,
                "event does not apply backward"
            );
            PlaybackError::Integrity { index, source }
        })?;
        self.applied = index;
        Ok(())
    }

    fn record_new_code(&mut self, index: usize) {
        let Some(gen) = self.new_code.as_mut() else {
            return;
        };
        match &self.events[index].kind {
            EventKind::Insert {
                file,
                row,
                col,
                symbol,
            } => gen.record_insert(file, *row, *col, symbol),
            EventKind::Delete {
                file,
                row,
                col,
                symbol,
            } => gen.record_delete(file, *row, *col, symbol),
            EventKind::CreateFile { file, .. }
            | EventKind::RenameFile { file, .. }
            | EventKind::MoveFile { file, .. } => {
                gen.touch(file);
            }
            EventKind::DeleteFile { .. }
            | EventKind::CreateDir { .. }
            | EventKind::DeleteDir { .. }
            | EventKind::RenameDir { .. }
            | EventKind::MoveDir { .. } => {}
        }
    }

    fn land(&mut self, direction: Direction, moved: usize) -> StepOutcome {
        let landed = self.current_index();
        if let Some(event) = landed.and_then(|i| self.events.get(i)) {
            if let Some(file) = event.kind.file_id() {
                self.active_file = Some(file.clone());
            }
            if let Some(group) = &event.group {
                self.active_group = Some(group.clone());
            }
        }
        if let Some(file) = &self.active_file {
            if self.project.grid(file).is_none() {
                self.active_file = None;
            }
        }

        let pinned: &[AnnotationEntry] = match landed {
            Some(i) => self.annotations.at_event(i),
            None => &[],
        };
        self.active_annotation = pinned.first().map(|entry| entry.id.clone());

        StepOutcome {
            moved,
            direction,
            pause: !pinned.is_empty(),
            file_system_changed: self.project.fs_changed(),
        }
    }

    fn active_position(&self) -> Option<usize> {
        self.active_annotation
            .as_ref()
            .and_then(|id| self.annotations.position_of(id))
    }

    fn current_sequence(&self) -> Option<u64> {
        self.current_event().map(|event| event.sequence)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/kernel/playback.rs"]
mod tests;
