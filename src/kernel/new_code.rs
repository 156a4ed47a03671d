//! New-code markers for the current forward run.
//!
//! Each touched file keeps sparse shadow rows aligned with its grid. A `None`
//! cell stands for text that existed before the run; `Some` is a symbol the
//! run inserted. Shadow rows only extend as far as the edits reached.

use crate::models::{FileId, Symbol};
use rustc_hash::FxHashMap;
use serde::Serialize;

/// A highlighted span on one row. `end_col` is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerRange {
    pub start_row: usize,
    pub start_col: usize,
    pub end_row: usize,
    pub end_col: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct ShadowRow {
    cells: Vec<Option<Symbol>>,
    inserted: bool,
    deleted: bool,
}

impl ShadowRow {
    fn pad_to(&mut self, len: usize) {
        if self.cells.len() < len {
            self.cells.resize(len, None);
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileMarker {
    rows: Vec<ShadowRow>,
}

impl FileMarker {
    fn row_mut(&mut self, row: usize) -> &mut ShadowRow {
        if self.rows.len() <= row {
            self.rows.resize_with(row + 1, ShadowRow::default);
        }
        &mut self.rows[row]
    }

    pub fn record_insert(&mut self, row: usize, col: usize, symbol: &Symbol) {
        let shadow = self.row_mut(row);
        shadow.pad_to(col);
        shadow.inserted = true;
        if symbol.is_line_break() {
            let tail = shadow.cells.split_off(col);
            self.rows.insert(
                row + 1,
                ShadowRow {
                    cells: tail,
                    inserted: true,
                    deleted: false,
                },
            );
        } else {
            shadow.cells.insert(col, Some(symbol.clone()));
        }
    }

    pub fn record_delete(&mut self, row: usize, col: usize, symbol: &Symbol) {
        if symbol.is_line_break() {
            let next = (row + 1 < self.rows.len()).then(|| self.rows.remove(row + 1));
            let shadow = self.row_mut(row);
            // the break sits at the end of the row, so the row is exactly `col` long
            shadow.pad_to(col);
            shadow.cells.truncate(col);
            shadow.deleted = true;
            if let Some(next) = next {
                shadow.cells.extend(next.cells);
                shadow.inserted |= next.inserted;
                shadow.deleted |= next.deleted;
            }
        } else {
            let shadow = self.row_mut(row);
            shadow.pad_to(col + 1);
            shadow.cells.remove(col);
            shadow.deleted = true;
        }
    }

    /// Maximal runs of inserted cells, row by row.
    pub fn ranges(&self) -> Vec<MarkerRange> {
        let mut ranges = Vec::new();
        for (row, shadow) in self.rows.iter().enumerate() {
            let mut start: Option<usize> = None;
            for (col, cell) in shadow.cells.iter().enumerate() {
                match (cell.is_some(), start) {
                    (true, None) => start = Some(col),
                    (false, Some(s)) => {
                        ranges.push(MarkerRange {
                            start_row: row,
                            start_col: s,
                            end_row: row,
                            end_col: col,
                        });
                        start = None;
                    }
                    _ => {}
                }
            }
            if let Some(s) = start {
                ranges.push(MarkerRange {
                    start_row: row,
                    start_col: s,
                    end_row: row,
                    end_col: shadow.cells.len(),
                });
            }
        }
        ranges
    }

    pub fn insert_lines(&self) -> Vec<usize> {
        self.flagged(|row| row.inserted)
    }

    pub fn delete_lines(&self) -> Vec<usize> {
        self.flagged(|row| row.deleted)
    }

    fn flagged(&self, f: impl Fn(&ShadowRow) -> bool) -> Vec<usize> {
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, row)| f(row))
            .map(|(i, _)| i)
            .collect()
    }
}

/// Owned by the playback cursor for the span of one forward step call.
#[derive(Debug, Clone, Default)]
pub struct DiffMarkerGenerator {
    files: FxHashMap<FileId, FileMarker>,
}

impl DiffMarkerGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flags a file as changed without claiming any text.
    pub fn touch(&mut self, file: &FileId) -> &mut FileMarker {
        self.files.entry(file.clone()).or_default()
    }

    pub fn record_insert(&mut self, file: &FileId, row: usize, col: usize, symbol: &Symbol) {
        self.touch(file).record_insert(row, col, symbol);
    }

    pub fn record_delete(&mut self, file: &FileId, row: usize, col: usize, symbol: &Symbol) {
        self.touch(file).record_delete(row, col, symbol);
    }

    pub fn ranges_for(&self, file: &FileId) -> Vec<MarkerRange> {
        self.files.get(file).map(FileMarker::ranges).unwrap_or_default()
    }

    pub fn insert_lines(&self, file: &FileId) -> Vec<usize> {
        self.files
            .get(file)
            .map(FileMarker::insert_lines)
            .unwrap_or_default()
    }

    pub fn delete_lines(&self, file: &FileId) -> Vec<usize> {
        self.files
            .get(file)
            .map(FileMarker::delete_lines)
            .unwrap_or_default()
    }

    pub fn touched_file_ids(&self) -> Vec<FileId> {
        let mut ids: Vec<FileId> = self.files.keys().cloned().collect();
        ids.sort();
        ids
    }
}

#[cfg(test)]
#[path = "../../tests/unit/kernel/new_code.rs"]
mod tests;
