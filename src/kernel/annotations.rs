//! Comments pinned to events, in playback order.

use crate::models::{AnnotationId, AnnotationPlacement, Event, EventId};
use rustc_hash::FxHashMap;
use std::ops::Range;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationEntry {
    pub id: AnnotationId,
    pub event_index: usize,
    pub sequence: u64,
    pub position: usize,
}

/// Entries sorted by (event sequence, position within the event's group).
#[derive(Debug, Clone, Default)]
pub struct AnnotationIndex {
    entries: Vec<AnnotationEntry>,
    by_id: FxHashMap<AnnotationId, usize>,
    by_event: FxHashMap<usize, Range<usize>>,
}

impl AnnotationIndex {
    /// Placements naming an event that is not in `events` are dropped with a
    /// warning, as are repeated annotation ids.
    pub fn build(placements: &[AnnotationPlacement], events: &[Event]) -> Self {
        let event_index: FxHashMap<&EventId, usize> = events
            .iter()
            .enumerate()
            .map(|(i, event)| (&event.id, i))
            .collect();

        let mut entries = Vec::with_capacity(placements.len());
        for placement in placements {
            let Some(&index) = event_index.get(&placement.event) else {
                tracing::warn!(
                    annotation = %placement.id,
                    event = %placement.event,
                    "annotation pinned to unknown event, dropped"
                );
                continue;
            };
            entries.push(AnnotationEntry {
                id: placement.id.clone(),
                event_index: index,
                sequence: events[index].sequence,
                position: placement.position,
            });
        }
        entries.sort_by(|a, b| {
            a.sequence
                .cmp(&b.sequence)
                .then(a.position.cmp(&b.position))
                .then_with(|| a.id.cmp(&b.id))
        });

        let mut by_id = FxHashMap::default();
        entries.retain(|entry| {
            if by_id.contains_key(&entry.id) {
                tracing::warn!(annotation = %entry.id, "duplicate annotation id, dropped");
                return false;
            }
            by_id.insert(entry.id.clone(), 0);
            true
        });

        let mut by_event: FxHashMap<usize, Range<usize>> = FxHashMap::default();
        for (i, entry) in entries.iter().enumerate() {
            by_id.insert(entry.id.clone(), i);
            by_event
                .entry(entry.event_index)
                .and_modify(|range| range.end = i + 1)
                .or_insert(i..i + 1);
        }

        Self {
            entries,
            by_id,
            by_event,
        }
    }

    pub fn entries(&self) -> &[AnnotationEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &AnnotationId) -> Option<&AnnotationEntry> {
        self.position_of(id).map(|i| &self.entries[i])
    }

    /// Place of `id` in the total order.
    pub fn position_of(&self, id: &AnnotationId) -> Option<usize> {
        self.by_id.get(id).copied()
    }

    pub fn at(&self, position: usize) -> Option<&AnnotationEntry> {
        self.entries.get(position)
    }

    /// Annotations pinned to the event at `index`, first one first.
    pub fn at_event(&self, index: usize) -> &[AnnotationEntry] {
        match self.by_event.get(&index) {
            Some(range) => &self.entries[range.clone()],
            None => &[],
        }
    }

    /// `id` and its siblings on the same event.
    pub fn group_of(&self, id: &AnnotationId) -> &[AnnotationEntry] {
        match self.get(id) {
            Some(entry) => self.at_event(entry.event_index),
            None => &[],
        }
    }

    /// First annotation pinned at or after `sequence`.
    pub fn first_from(&self, sequence: u64) -> Option<&AnnotationEntry> {
        let i = self.entries.partition_point(|e| e.sequence < sequence);
        self.entries.get(i)
    }

    pub fn next_after(&self, sequence: u64) -> Option<&AnnotationEntry> {
        let i = self.entries.partition_point(|e| e.sequence <= sequence);
        self.entries.get(i)
    }

    pub fn previous_before(&self, sequence: u64) -> Option<&AnnotationEntry> {
        let i = self.entries.partition_point(|e| e.sequence < sequence);
        i.checked_sub(1).and_then(|i| self.entries.get(i))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/kernel/annotations.rs"]
mod tests;
