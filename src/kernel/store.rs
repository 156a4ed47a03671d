use super::playback::{PlaybackCursor, PlaybackError, StepOutcome};
use super::{Action, Effect};

pub struct DispatchResult {
    pub effects: Vec<Effect>,
    pub state_changed: bool,
}

impl DispatchResult {
    fn unchanged() -> Self {
        Self {
            effects: Vec::new(),
            state_changed: false,
        }
    }
}

pub struct Store {
    cursor: PlaybackCursor,
}

impl Store {
    pub fn new(cursor: PlaybackCursor) -> Self {
        Self { cursor }
    }

    pub fn cursor(&self) -> &PlaybackCursor {
        &self.cursor
    }

    pub fn dispatch(&mut self, action: Action) -> Result<DispatchResult, PlaybackError> {
        let active_before = self.cursor.active_annotation().cloned();

        let outcome = match action {
            Action::StepForward(n) => Some(self.cursor.step_forward(n)?),
            Action::StepBackward(n) => Some(self.cursor.step_backward(n)?),
            Action::StepTo(index) => Some(self.cursor.step_to(index)?),
            Action::StepToAnnotation(id) => match self.cursor.step_to_annotation(&id)? {
                Some(outcome) => Some(outcome),
                None => {
                    return Ok(DispatchResult {
                        effects: vec![Effect::AnnotationNotFound(id)],
                        state_changed: false,
                    });
                }
            },
            Action::NextAnnotation => self.cursor.next_annotation()?,
            Action::PreviousAnnotation => self.cursor.previous_annotation()?,
            Action::ClearNewCode => {
                let had_markers = !self.cursor.touched_file_ids().is_empty();
                self.cursor.clear_new_code();
                if !had_markers {
                    return Ok(DispatchResult::unchanged());
                }
                return Ok(DispatchResult {
                    effects: self.refresh_active_file(),
                    state_changed: true,
                });
            }
        };

        let Some(outcome) = outcome else {
            return Ok(DispatchResult::unchanged());
        };
        let annotation_changed = self.cursor.active_annotation() != active_before.as_ref();
        Ok(DispatchResult {
            effects: self.effects_for(&outcome),
            state_changed: outcome.moved > 0 || annotation_changed,
        })
    }

    fn effects_for(&self, outcome: &StepOutcome) -> Vec<Effect> {
        let mut effects = Vec::new();
        if outcome.pause {
            effects.push(Effect::Pause);
        }
        if outcome.moved == 0 {
            return effects;
        }
        if outcome.file_system_changed {
            effects.push(Effect::RefreshTree);
        }
        effects.extend(self.refresh_active_file());
        effects
    }

    fn refresh_active_file(&self) -> Vec<Effect> {
        self.cursor
            .active_file_id()
            .map(|file| Effect::RefreshFile(file.clone()))
            .into_iter()
            .collect()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/kernel/store.rs"]
mod tests;
