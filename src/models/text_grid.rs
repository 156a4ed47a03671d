//! Per-file character grid.
//!
//! A file is an ordered list of rows, each an ordered list of single
//! symbols. Line breaks are not cells: inserting one splits a row, deleting
//! one joins a row with its successor. `insert` and `delete` at the same
//! position are exact inverses, which is what lets playback walk backwards
//! without replaying from the start.

use super::ids::EventId;
use super::symbol::Symbol;
use compact_str::CompactString;
use std::fmt;
use unicode_segmentation::UnicodeSegmentation;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    PositionOutOfBounds { row: usize, col: usize },
    NoLineBreak { row: usize, col: usize },
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GridError::PositionOutOfBounds { row, col } => {
                write!(f, "position {row}:{col} is outside the grid")
            }
            GridError::NoLineBreak { row, col } => {
                write!(f, "no line break at {row}:{col}")
            }
        }
    }
}

impl std::error::Error for GridError {}

/// Rows of cells with the split/join rules shared by the grid and its
/// companions.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Rows<T> {
    rows: Vec<Vec<T>>,
}

impl<T> Rows<T> {
    fn new() -> Self {
        Self {
            rows: vec![Vec::new()],
        }
    }

    fn row_mut(&mut self, row: usize, col: usize) -> Result<&mut Vec<T>, GridError> {
        self.rows
            .get_mut(row)
            .ok_or(GridError::PositionOutOfBounds { row, col })
    }

    fn insert_cell(&mut self, row: usize, col: usize, cell: T) -> Result<(), GridError> {
        let cells = self.row_mut(row, col)?;
        if col > cells.len() {
            return Err(GridError::PositionOutOfBounds { row, col });
        }
        cells.insert(col, cell);
        Ok(())
    }

    fn remove_cell(&mut self, row: usize, col: usize) -> Result<T, GridError> {
        let cells = self.row_mut(row, col)?;
        if col >= cells.len() {
            return Err(GridError::PositionOutOfBounds { row, col });
        }
        Ok(cells.remove(col))
    }

    fn split(&mut self, row: usize, col: usize) -> Result<(), GridError> {
        let cells = self.row_mut(row, col)?;
        if col > cells.len() {
            return Err(GridError::PositionOutOfBounds { row, col });
        }
        let tail = cells.split_off(col);
        self.rows.insert(row + 1, tail);
        Ok(())
    }

    /// Joins `row + 1` onto `row`. The break must sit exactly at the end of `row`.
    fn join(&mut self, row: usize, col: usize) -> Result<(), GridError> {
        let len = self
            .rows
            .get(row)
            .map(Vec::len)
            .ok_or(GridError::PositionOutOfBounds { row, col })?;
        if col != len || row + 1 >= self.rows.len() {
            return Err(GridError::NoLineBreak { row, col });
        }
        let tail = self.rows.remove(row + 1);
        self.rows[row].extend(tail);
        Ok(())
    }

    fn is_break_at(&self, row: usize, col: usize) -> bool {
        row + 1 < self.rows.len() && self.rows.get(row).is_some_and(|r| r.len() == col)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextGrid {
    rows: Rows<CompactString>,
}

impl TextGrid {
    pub fn new() -> Self {
        Self { rows: Rows::new() }
    }

    pub fn from_text(text: &str) -> Self {
        let mut grid = Self::new();
        grid.rows.rows = text
            .split('\n')
            .map(|line| {
                let line = line.strip_suffix('\r').unwrap_or(line);
                line.graphemes(true).map(CompactString::new).collect()
            })
            .collect();
        grid
    }

    pub fn insert(&mut self, row: usize, col: usize, symbol: &Symbol) -> Result<(), GridError> {
        match symbol {
            Symbol::LineBreak => self.rows.split(row, col),
            Symbol::Char(c) => self.rows.insert_cell(row, col, c.clone()),
        }
    }

    /// Removes the symbol at `row:col` and returns it.
    ///
    /// A position one past the last cell of a row that has a successor holds
    /// the line break between them.
    pub fn delete(&mut self, row: usize, col: usize) -> Result<Symbol, GridError> {
        if self.rows.is_break_at(row, col) {
            self.rows.join(row, col)?;
            return Ok(Symbol::LineBreak);
        }
        self.rows.remove_cell(row, col).map(Symbol::Char)
    }

    pub fn symbol_at(&self, row: usize, col: usize) -> Option<Symbol> {
        if self.rows.is_break_at(row, col) {
            return Some(Symbol::LineBreak);
        }
        self.rows
            .rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(|c| Symbol::Char(c.clone()))
    }

    pub fn line_count(&self) -> usize {
        self.rows.rows.len()
    }

    pub fn row_len(&self, row: usize) -> Option<usize> {
        self.rows.rows.get(row).map(Vec::len)
    }

    pub fn line(&self, row: usize) -> Option<String> {
        self.rows
            .rows
            .get(row)
            .map(|cells| cells.iter().map(CompactString::as_str).collect())
    }

    pub fn text(&self) -> String {
        let mut out = String::new();
        for (i, cells) in self.rows.rows.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            for c in cells {
                out.push_str(c);
            }
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        self.rows.rows.len() == 1 && self.rows.rows[0].is_empty()
    }
}

impl Default for TextGrid {
    fn default() -> Self {
        Self::new()
    }
}

/// Which event produced each cell of a grid.
///
/// Indexed exactly like the grid it shadows and only maintained when
/// attribution is switched on, so the grid itself stays free of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribution {
    rows: Rows<EventId>,
}

impl Attribution {
    pub fn new() -> Self {
        Self { rows: Rows::new() }
    }

    pub fn insert(
        &mut self,
        row: usize,
        col: usize,
        symbol: &Symbol,
        event: &EventId,
    ) -> Result<(), GridError> {
        match symbol {
            Symbol::LineBreak => self.rows.split(row, col),
            Symbol::Char(_) => self.rows.insert_cell(row, col, event.clone()),
        }
    }

    pub fn delete(&mut self, row: usize, col: usize) -> Result<Option<EventId>, GridError> {
        if self.rows.is_break_at(row, col) {
            self.rows.join(row, col)?;
            return Ok(None);
        }
        self.rows.remove_cell(row, col).map(Some)
    }

    pub fn at(&self, row: usize, col: usize) -> Option<&EventId> {
        self.rows.rows.get(row).and_then(|r| r.get(col))
    }
}

impl Default for Attribution {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/models/text_grid.rs"]
mod tests;
