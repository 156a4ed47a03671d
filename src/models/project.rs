//! The replayed project: namespace plus one grid per file.
//!
//! `apply_forward` and `apply_backward` dispatch on the closed set of event
//! kinds; no undo log is kept, the event payload is the inverse's input.

use super::event::{Event, EventKind};
use super::file_tree::{FileTree, FileTreeError, TreeSnapshot};
use super::ids::{EventId, FileId};
use super::symbol::Symbol;
use super::text_grid::{Attribution, GridError, TextGrid};
use rustc_hash::FxHashMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyError {
    Tree(FileTreeError),
    Grid { file: FileId, source: GridError },
    MissingGrid(FileId),
    SymbolMismatch {
        file: FileId,
        row: usize,
        col: usize,
        expected: Symbol,
        found: Option<Symbol>,
    },
}

impl fmt::Display for ApplyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApplyError::Tree(err) => write!(f, "{err}"),
            ApplyError::Grid { file, source } => write!(f, "file {file}: {source}"),
            ApplyError::MissingGrid(file) => write!(f, "no text for file {file}"),
            ApplyError::SymbolMismatch {
                file,
                row,
                col,
                expected,
                found,
            } => match found {
                Some(found) => write!(
                    f,
                    "file {file} at {row}:{col}: expected {expected:?}, found {found:?}"
                ),
                None => write!(f, "file {file} at {row}:{col}: expected {expected:?}, found nothing"),
            },
        }
    }
}

impl std::error::Error for ApplyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ApplyError::Tree(err) => Some(err),
            ApplyError::Grid { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<FileTreeError> for ApplyError {
    fn from(err: FileTreeError) -> Self {
        ApplyError::Tree(err)
    }
}

#[derive(Default)]
struct AttributionTable {
    grids: FxHashMap<FileId, Attribution>,
    // delete event -> insert event whose symbol it removed
    removed: FxHashMap<EventId, EventId>,
}

pub struct ProjectState {
    tree: FileTree,
    grids: FxHashMap<FileId, TextGrid>,
    attribution: Option<AttributionTable>,
    verify_deletes: bool,
    fs_changed: bool,
}

impl ProjectState {
    pub fn new() -> Self {
        Self {
            tree: FileTree::new(),
            grids: FxHashMap::default(),
            attribution: None,
            verify_deletes: true,
            fs_changed: false,
        }
    }

    /// Keeps a per-cell record of the event that inserted each symbol.
    /// Must be switched on before any event is applied.
    pub fn with_attribution(mut self) -> Self {
        self.attribution = Some(AttributionTable::default());
        self
    }

    pub fn with_verify_deletes(mut self, verify: bool) -> Self {
        self.verify_deletes = verify;
        self
    }

    // ==================== queries ====================

    pub fn tree(&self) -> &FileTree {
        &self.tree
    }

    pub fn grid(&self, file: &FileId) -> Option<&TextGrid> {
        self.grids.get(file)
    }

    pub fn file_text(&self, file: &FileId) -> Option<String> {
        self.grids.get(file).map(TextGrid::text)
    }

    pub fn line_count(&self, file: &FileId) -> Option<usize> {
        self.grids.get(file).map(TextGrid::line_count)
    }

    pub fn snapshot(&self) -> TreeSnapshot {
        self.tree.snapshot()
    }

    pub fn attribution_at(&self, file: &FileId, row: usize, col: usize) -> Option<&EventId> {
        self.attribution.as_ref()?.grids.get(file)?.at(row, col)
    }

    /// Whether the namespace changed since the flag was last cleared.
    pub fn fs_changed(&self) -> bool {
        self.fs_changed
    }

    pub fn clear_fs_changed(&mut self) {
        self.fs_changed = false;
    }

    // ==================== forward ====================

    pub fn apply_forward(&mut self, event: &Event) -> Result<(), ApplyError> {
        match &event.kind {
            EventKind::Insert {
                file,
                row,
                col,
                symbol,
            } => self.insert_symbol(file, *row, *col, symbol, Some(&event.id)),
            EventKind::Delete {
                file,
                row,
                col,
                symbol,
            } => {
                let removed_by = self.delete_symbol(file, *row, *col, symbol)?;
                if let (Some(table), Some(insert_id)) = (self.attribution.as_mut(), removed_by) {
                    table.removed.insert(event.id.clone(), insert_id);
                }
                Ok(())
            }
            EventKind::CreateFile { file, parent, path } => {
                self.tree.create_file(file, parent, path)?;
                self.grids.insert(file.clone(), TextGrid::new());
                if let Some(table) = self.attribution.as_mut() {
                    table.grids.insert(file.clone(), Attribution::new());
                }
                self.fs_changed = true;
                Ok(())
            }
            EventKind::DeleteFile { file, .. } => {
                self.tree.delete_file(file)?;
                self.fs_changed = true;
                Ok(())
            }
            EventKind::RenameFile {
                file,
                old_path,
                new_path,
            } => {
                self.tree.rename_file(file, old_path, new_path)?;
                self.fs_changed = true;
                Ok(())
            }
            EventKind::MoveFile {
                file,
                old_parent,
                new_parent,
                old_path,
                new_path,
            } => {
                self.tree
                    .move_file(file, old_parent, new_parent, old_path, new_path)?;
                self.fs_changed = true;
                Ok(())
            }
            EventKind::CreateDir { dir, parent, path } => {
                self.tree.create_dir(dir, parent.as_ref(), path)?;
                self.fs_changed = true;
                Ok(())
            }
            EventKind::DeleteDir { dir, .. } => {
                self.tree.delete_dir(dir)?;
                self.fs_changed = true;
                Ok(())
            }
            EventKind::RenameDir {
                dir,
                old_path,
                new_path,
            } => {
                self.tree.rename_dir(dir, old_path, new_path)?;
                self.fs_changed = true;
                Ok(())
            }
            EventKind::MoveDir {
                dir,
                old_parent,
                new_parent,
                old_path,
                new_path,
            } => {
                self.tree
                    .move_dir(dir, old_parent, new_parent, old_path, new_path)?;
                self.fs_changed = true;
                Ok(())
            }
        }
    }

    // ==================== backward ====================

    pub fn apply_backward(&mut self, event: &Event) -> Result<(), ApplyError> {
        match &event.kind {
            EventKind::Insert {
                file,
                row,
                col,
                symbol,
            } => {
                self.delete_symbol(file, *row, *col, symbol)?;
                Ok(())
            }
            EventKind::Delete {
                file,
                row,
                col,
                symbol,
            } => {
                let inserted_by = self
                    .attribution
                    .as_mut()
                    .and_then(|table| table.removed.remove(&event.id));
                self.insert_symbol(file, *row, *col, symbol, inserted_by.as_ref())
            }
            EventKind::CreateFile { file, .. } => {
                self.tree.create_file_backward(file)?;
                self.grids.remove(file);
                if let Some(table) = self.attribution.as_mut() {
                    table.grids.remove(file);
                }
                self.fs_changed = true;
                Ok(())
            }
            EventKind::DeleteFile { file, .. } => {
                self.tree.delete_file_backward(file)?;
                self.fs_changed = true;
                Ok(())
            }
            EventKind::RenameFile {
                file,
                old_path,
                new_path,
            } => {
                self.tree.rename_file_backward(file, old_path, new_path)?;
                self.fs_changed = true;
                Ok(())
            }
            EventKind::MoveFile {
                file,
                old_parent,
                new_parent,
                old_path,
                new_path,
            } => {
                self.tree
                    .move_file_backward(file, old_parent, new_parent, old_path, new_path)?;
                self.fs_changed = true;
                Ok(())
            }
            EventKind::CreateDir { dir, .. } => {
                self.tree.create_dir_backward(dir)?;
                self.fs_changed = true;
                Ok(())
            }
            EventKind::DeleteDir { dir, .. } => {
                self.tree.delete_dir_backward(dir)?;
                self.fs_changed = true;
                Ok(())
            }
            EventKind::RenameDir {
                dir,
                old_path,
                new_path,
            } => {
                self.tree.rename_dir_backward(dir, old_path, new_path)?;
                self.fs_changed = true;
                Ok(())
            }
            EventKind::MoveDir {
                dir,
                old_parent,
                new_parent,
                old_path,
                new_path,
            } => {
                self.tree
                    .move_dir_backward(dir, old_parent, new_parent, old_path, new_path)?;
                self.fs_changed = true;
                Ok(())
            }
        }
    }

    // ==================== text ====================

    fn insert_symbol(
        &mut self,
        file: &FileId,
        row: usize,
        col: usize,
        symbol: &Symbol,
        inserted_by: Option<&EventId>,
    ) -> Result<(), ApplyError> {
        let grid = self
            .grids
            .get_mut(file)
            .ok_or_else(|| ApplyError::MissingGrid(file.clone()))?;
        grid.insert(row, col, symbol)
            .map_err(|source| ApplyError::Grid {
                file: file.clone(),
                source,
            })?;

        if let Some(attribution) = self
            .attribution
            .as_mut()
            .and_then(|table| table.grids.get_mut(file))
        {
            let placeholder = EventId::from("");
            let by = inserted_by.unwrap_or(&placeholder);
            attribution
                .insert(row, col, symbol, by)
                .map_err(|source| ApplyError::Grid {
                    file: file.clone(),
                    source,
                })?;
        }
        Ok(())
    }

    /// Removes `symbol` from `row:col`; returns the event that had inserted it
    /// when attribution is on.
    fn delete_symbol(
        &mut self,
        file: &FileId,
        row: usize,
        col: usize,
        symbol: &Symbol,
    ) -> Result<Option<EventId>, ApplyError> {
        let grid = self
            .grids
            .get_mut(file)
            .ok_or_else(|| ApplyError::MissingGrid(file.clone()))?;

        if self.verify_deletes {
            let found = grid.symbol_at(row, col);
            if found.as_ref() != Some(symbol) {
                return Err(ApplyError::SymbolMismatch {
                    file: file.clone(),
                    row,
                    col,
                    expected: symbol.clone(),
                    found,
                });
            }
        }

        grid.delete(row, col).map_err(|source| ApplyError::Grid {
            file: file.clone(),
            source,
        })?;

        match self
            .attribution
            .as_mut()
            .and_then(|table| table.grids.get_mut(file))
        {
            Some(attribution) => attribution
                .delete(row, col)
                .map_err(|source| ApplyError::Grid {
                    file: file.clone(),
                    source,
                }),
            None => Ok(None),
        }
    }
}

impl Default for ProjectState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/models/project.rs"]
mod tests;
