//! Directory/file namespace of a replayed project.
//!
//! Every forward operation has a `*_backward` twin that undoes it exactly,
//! given the same arguments. Deletes are soft: the node leaves its parent's
//! child map but keeps its record, so the inverse can put it back.
//!
//! Child order is name order, not creation order: restoring membership also
//! restores position, and a rename moves the node within its listing.

use super::ids::{DirId, FileId};
use compact_str::CompactString;
use rustc_hash::FxHashMap;
use slotmap::{new_key_type, SlotMap};
use std::collections::BTreeMap;
use std::fmt;

new_key_type! { pub struct NodeKey; }

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    File(FileId),
    Dir(DirId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileTreeError {
    UnknownFile(FileId),
    UnknownDirectory(DirId),
    DuplicateFile(FileId),
    DuplicateDirectory(DirId),
    NameExists {
        parent: Option<DirId>,
        name: CompactString,
    },
    MoveIntoDescendant(DirId),
    PathMismatch {
        expected: CompactString,
        found: CompactString,
    },
}

impl fmt::Display for FileTreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileTreeError::UnknownFile(id) => write!(f, "unknown file {id}"),
            FileTreeError::UnknownDirectory(id) => write!(f, "unknown directory {id}"),
            FileTreeError::DuplicateFile(id) => write!(f, "file {id} already exists"),
            FileTreeError::DuplicateDirectory(id) => write!(f, "directory {id} already exists"),
            FileTreeError::NameExists { parent, name } => match parent {
                Some(parent) => write!(f, "name {name:?} already exists in {parent}"),
                None => write!(f, "top-level name {name:?} already exists"),
            },
            FileTreeError::MoveIntoDescendant(id) => {
                write!(f, "cannot move directory {id} into its own subtree")
            }
            FileTreeError::PathMismatch { expected, found } => {
                write!(f, "expected path {expected:?}, found {found:?}")
            }
        }
    }
}

impl std::error::Error for FileTreeError {}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    name: CompactString,
    path: CompactString,
    parent: Option<NodeKey>,
    deleted: bool,
    children: Option<BTreeMap<CompactString, NodeKey>>,
}

impl Node {
    fn new_file(file: FileId, path: CompactString, parent: NodeKey) -> Self {
        Self {
            kind: NodeKind::File(file),
            name: name_of(&path),
            path,
            parent: Some(parent),
            deleted: false,
            children: None,
        }
    }

    fn new_dir(dir: DirId, path: CompactString, parent: Option<NodeKey>) -> Self {
        Self {
            kind: NodeKind::Dir(dir),
            name: name_of(&path),
            path,
            parent,
            deleted: false,
            children: Some(BTreeMap::new()),
        }
    }
}

/// Last component of a path; directory paths may carry a trailing `/`.
fn name_of(path: &str) -> CompactString {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(i) => CompactString::new(&trimmed[i + 1..]),
        None if trimmed.is_empty() => CompactString::new(path),
        None => CompactString::new(trimmed),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub id: FileId,
    pub path: CompactString,
    pub parent: Option<DirId>,
    pub deleted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub id: DirId,
    pub path: CompactString,
    pub parent: Option<DirId>,
    pub deleted: bool,
    pub child_dirs: Vec<DirId>,
    pub child_files: Vec<FileId>,
}

/// Every node ever created, sorted by path then id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeSnapshot {
    pub files: Vec<FileEntry>,
    pub directories: Vec<DirEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeRow {
    pub kind: NodeKind,
    pub depth: u16,
    pub name: CompactString,
}

#[derive(Default)]
pub struct FileTree {
    arena: SlotMap<NodeKey, Node>,
    top: BTreeMap<CompactString, NodeKey>,
    files: FxHashMap<FileId, NodeKey>,
    dirs: FxHashMap<DirId, NodeKey>,
}

impl FileTree {
    pub fn new() -> Self {
        Self::default()
    }

    fn file_key(&self, file: &FileId) -> Result<NodeKey, FileTreeError> {
        self.files
            .get(file)
            .copied()
            .ok_or_else(|| FileTreeError::UnknownFile(file.clone()))
    }

    fn dir_key(&self, dir: &DirId) -> Result<NodeKey, FileTreeError> {
        self.dirs
            .get(dir)
            .copied()
            .ok_or_else(|| FileTreeError::UnknownDirectory(dir.clone()))
    }

    fn dir_id_of(&self, key: NodeKey) -> Option<DirId> {
        match self.arena.get(key).map(|n| &n.kind) {
            Some(NodeKind::Dir(id)) => Some(id.clone()),
            _ => None,
        }
    }

    fn siblings_mut(
        &mut self,
        parent: Option<NodeKey>,
    ) -> Option<&mut BTreeMap<CompactString, NodeKey>> {
        match parent {
            Some(p) => self.arena.get_mut(p).and_then(|n| n.children.as_mut()),
            None => Some(&mut self.top),
        }
    }

    fn attach(&mut self, key: NodeKey) -> Result<(), FileTreeError> {
        let (parent, name) = match self.arena.get(key) {
            Some(node) => (node.parent, node.name.clone()),
            None => return Ok(()),
        };
        let parent_id = parent.and_then(|p| self.dir_id_of(p));
        let Some(siblings) = self.siblings_mut(parent) else {
            return Ok(());
        };
        if siblings.contains_key(&name) {
            return Err(FileTreeError::NameExists {
                parent: parent_id,
                name,
            });
        }
        siblings.insert(name, key);
        Ok(())
    }

    fn detach(&mut self, key: NodeKey) {
        let Some((parent, name)) = self.arena.get(key).map(|n| (n.parent, n.name.clone())) else {
            return;
        };
        if let Some(siblings) = self.siblings_mut(parent) {
            if siblings.get(&name) == Some(&key) {
                siblings.remove(&name);
            }
        }
    }

    fn expect_path(&self, key: NodeKey, expected: &str) -> Result<(), FileTreeError> {
        let found = self.arena.get(key).map(|n| n.path.as_str()).unwrap_or("");
        if found != expected {
            return Err(FileTreeError::PathMismatch {
                expected: CompactString::new(expected),
                found: CompactString::new(found),
            });
        }
        Ok(())
    }

    /// Detaches, relabels and reattaches a node under `new_parent`.
    fn relocate(
        &mut self,
        key: NodeKey,
        new_parent: Option<NodeKey>,
        new_path: &str,
    ) -> Result<(), FileTreeError> {
        let (old_parent, old_path) = match self.arena.get(key) {
            Some(node) => (node.parent, node.path.clone()),
            None => return Ok(()),
        };
        let deleted = self.arena.get(key).is_some_and(|n| n.deleted);

        if !deleted {
            self.detach(key);
        }
        if let Some(node) = self.arena.get_mut(key) {
            node.parent = new_parent;
            node.path = CompactString::new(new_path);
            node.name = name_of(new_path);
        }
        if !deleted {
            if let Err(err) = self.attach(key) {
                // put it back where it was
                if let Some(node) = self.arena.get_mut(key) {
                    node.parent = old_parent;
                    node.name = name_of(&old_path);
                    node.path = old_path;
                }
                let restored = self.attach(key);
                debug_assert!(restored.is_ok(), "vacated slot was taken during relocate");
                return Err(err);
            }
        }
        Ok(())
    }

    /// Rewrites the stored path prefix of every descendant of `key`,
    /// soft-deleted ones included.
    fn rebase_subtree(&mut self, key: NodeKey, old_prefix: &str, new_prefix: &str) {
        let descendants: Vec<NodeKey> = self
            .arena
            .keys()
            .filter(|&k| k != key && self.is_ancestor(key, k))
            .collect();

        for k in descendants {
            if let Some(node) = self.arena.get_mut(k) {
                if let Some(rest) = node.path.strip_prefix(old_prefix) {
                    let mut path = CompactString::new(new_prefix);
                    path.push_str(rest);
                    node.path = path;
                }
            }
        }
    }

    fn is_ancestor(&self, ancestor: NodeKey, mut descendant: NodeKey) -> bool {
        if ancestor == descendant {
            return true;
        }
        while let Some(node) = self.arena.get(descendant) {
            match node.parent {
                Some(parent) if parent == ancestor => return true,
                Some(parent) => descendant = parent,
                None => break,
            }
        }
        false
    }

    fn effectively_deleted(&self, mut key: NodeKey) -> bool {
        while let Some(node) = self.arena.get(key) {
            if node.deleted {
                return true;
            }
            match node.parent {
                Some(parent) => key = parent,
                None => break,
            }
        }
        false
    }

    // ==================== files ====================

    pub fn create_file(
        &mut self,
        file: &FileId,
        parent: &DirId,
        path: &str,
    ) -> Result<(), FileTreeError> {
        if self.files.contains_key(file) {
            return Err(FileTreeError::DuplicateFile(file.clone()));
        }
        let parent_key = self.dir_key(parent)?;
        let key = self.arena.insert(Node::new_file(
            file.clone(),
            CompactString::new(path),
            parent_key,
        ));
        if let Err(err) = self.attach(key) {
            self.arena.remove(key);
            return Err(err);
        }
        self.files.insert(file.clone(), key);
        Ok(())
    }

    pub fn create_file_backward(&mut self, file: &FileId) -> Result<(), FileTreeError> {
        let key = self.file_key(file)?;
        if !self.arena.get(key).is_some_and(|n| n.deleted) {
            self.detach(key);
        }
        self.arena.remove(key);
        self.files.remove(file);
        Ok(())
    }

    pub fn delete_file(&mut self, file: &FileId) -> Result<(), FileTreeError> {
        let key = self.file_key(file)?;
        self.soft_delete(key);
        Ok(())
    }

    pub fn delete_file_backward(&mut self, file: &FileId) -> Result<(), FileTreeError> {
        let key = self.file_key(file)?;
        self.restore(key)
    }

    pub fn rename_file(
        &mut self,
        file: &FileId,
        old_path: &str,
        new_path: &str,
    ) -> Result<(), FileTreeError> {
        let key = self.file_key(file)?;
        self.expect_path(key, old_path)?;
        let parent = self.arena.get(key).and_then(|n| n.parent);
        self.relocate(key, parent, new_path)
    }

    pub fn rename_file_backward(
        &mut self,
        file: &FileId,
        old_path: &str,
        new_path: &str,
    ) -> Result<(), FileTreeError> {
        self.rename_file(file, new_path, old_path)
    }

    pub fn move_file(
        &mut self,
        file: &FileId,
        old_parent: &DirId,
        new_parent: &DirId,
        old_path: &str,
        new_path: &str,
    ) -> Result<(), FileTreeError> {
        let key = self.file_key(file)?;
        self.dir_key(old_parent)?;
        let new_parent_key = self.dir_key(new_parent)?;
        self.expect_path(key, old_path)?;
        self.relocate(key, Some(new_parent_key), new_path)
    }

    pub fn move_file_backward(
        &mut self,
        file: &FileId,
        old_parent: &DirId,
        new_parent: &DirId,
        old_path: &str,
        new_path: &str,
    ) -> Result<(), FileTreeError> {
        self.move_file(file, new_parent, old_parent, new_path, old_path)
    }

    // ==================== directories ====================

    pub fn create_dir(
        &mut self,
        dir: &DirId,
        parent: Option<&DirId>,
        path: &str,
    ) -> Result<(), FileTreeError> {
        if self.dirs.contains_key(dir) {
            return Err(FileTreeError::DuplicateDirectory(dir.clone()));
        }
        let parent_key = parent.map(|p| self.dir_key(p)).transpose()?;
        let key = self.arena.insert(Node::new_dir(
            dir.clone(),
            CompactString::new(path),
            parent_key,
        ));
        if let Err(err) = self.attach(key) {
            self.arena.remove(key);
            return Err(err);
        }
        self.dirs.insert(dir.clone(), key);
        Ok(())
    }

    pub fn create_dir_backward(&mut self, dir: &DirId) -> Result<(), FileTreeError> {
        let key = self.dir_key(dir)?;
        if !self.arena.get(key).is_some_and(|n| n.deleted) {
            self.detach(key);
        }
        self.arena.remove(key);
        self.dirs.remove(dir);
        Ok(())
    }

    pub fn delete_dir(&mut self, dir: &DirId) -> Result<(), FileTreeError> {
        let key = self.dir_key(dir)?;
        self.soft_delete(key);
        Ok(())
    }

    pub fn delete_dir_backward(&mut self, dir: &DirId) -> Result<(), FileTreeError> {
        let key = self.dir_key(dir)?;
        self.restore(key)
    }

    pub fn rename_dir(
        &mut self,
        dir: &DirId,
        old_path: &str,
        new_path: &str,
    ) -> Result<(), FileTreeError> {
        let key = self.dir_key(dir)?;
        self.expect_path(key, old_path)?;
        let parent = self.arena.get(key).and_then(|n| n.parent);
        self.relocate(key, parent, new_path)?;
        self.rebase_subtree(key, old_path, new_path);
        Ok(())
    }

    pub fn rename_dir_backward(
        &mut self,
        dir: &DirId,
        old_path: &str,
        new_path: &str,
    ) -> Result<(), FileTreeError> {
        self.rename_dir(dir, new_path, old_path)
    }

    pub fn move_dir(
        &mut self,
        dir: &DirId,
        old_parent: &DirId,
        new_parent: &DirId,
        old_path: &str,
        new_path: &str,
    ) -> Result<(), FileTreeError> {
        let key = self.dir_key(dir)?;
        self.dir_key(old_parent)?;
        let new_parent_key = self.dir_key(new_parent)?;
        if self.is_ancestor(key, new_parent_key) {
            return Err(FileTreeError::MoveIntoDescendant(dir.clone()));
        }
        self.expect_path(key, old_path)?;
        self.relocate(key, Some(new_parent_key), new_path)?;
        self.rebase_subtree(key, old_path, new_path);
        Ok(())
    }

    pub fn move_dir_backward(
        &mut self,
        dir: &DirId,
        old_parent: &DirId,
        new_parent: &DirId,
        old_path: &str,
        new_path: &str,
    ) -> Result<(), FileTreeError> {
        self.move_dir(dir, new_parent, old_parent, new_path, old_path)
    }

    fn soft_delete(&mut self, key: NodeKey) {
        if self.arena.get(key).is_some_and(|n| n.deleted) {
            return;
        }
        self.detach(key);
        if let Some(node) = self.arena.get_mut(key) {
            node.deleted = true;
        }
    }

    fn restore(&mut self, key: NodeKey) -> Result<(), FileTreeError> {
        if !self.arena.get(key).is_some_and(|n| n.deleted) {
            return Ok(());
        }
        self.attach(key)?;
        if let Some(node) = self.arena.get_mut(key) {
            node.deleted = false;
        }
        Ok(())
    }

    // ==================== queries ====================

    pub fn contains_file(&self, file: &FileId) -> bool {
        self.files.contains_key(file)
    }

    pub fn file_path(&self, file: &FileId) -> Option<&str> {
        let key = self.files.get(file)?;
        self.arena.get(*key).map(|n| n.path.as_str())
    }

    pub fn dir_path(&self, dir: &DirId) -> Option<&str> {
        let key = self.dirs.get(dir)?;
        self.arena.get(*key).map(|n| n.path.as_str())
    }

    pub fn file_parent(&self, file: &FileId) -> Option<DirId> {
        let key = self.files.get(file)?;
        self.arena
            .get(*key)
            .and_then(|n| n.parent)
            .and_then(|p| self.dir_id_of(p))
    }

    /// Deleted itself or nested under a deleted directory.
    pub fn is_file_deleted(&self, file: &FileId) -> bool {
        self.files
            .get(file)
            .map_or(true, |key| self.effectively_deleted(*key))
    }

    pub fn is_dir_deleted(&self, dir: &DirId) -> bool {
        self.dirs
            .get(dir)
            .map_or(true, |key| self.effectively_deleted(*key))
    }

    /// Live children of a directory in name order.
    pub fn children(&self, dir: &DirId) -> Option<Vec<NodeKind>> {
        let key = self.dirs.get(dir)?;
        let children = self.arena.get(*key)?.children.as_ref()?;
        Some(
            children
                .values()
                .filter_map(|k| self.arena.get(*k).map(|n| n.kind.clone()))
                .collect(),
        )
    }

    pub fn snapshot(&self) -> TreeSnapshot {
        let mut files: Vec<FileEntry> = self
            .files
            .iter()
            .filter_map(|(id, key)| {
                let node = self.arena.get(*key)?;
                Some(FileEntry {
                    id: id.clone(),
                    path: node.path.clone(),
                    parent: node.parent.and_then(|p| self.dir_id_of(p)),
                    deleted: self.effectively_deleted(*key),
                })
            })
            .collect();
        files.sort_by(|a, b| a.path.cmp(&b.path).then_with(|| a.id.cmp(&b.id)));

        let mut directories: Vec<DirEntry> = self
            .dirs
            .iter()
            .filter_map(|(id, key)| {
                let node = self.arena.get(*key)?;
                let mut child_dirs = Vec::new();
                let mut child_files = Vec::new();
                for child in node.children.iter().flat_map(|c| c.values()) {
                    match self.arena.get(*child).map(|n| &n.kind) {
                        Some(NodeKind::Dir(d)) => child_dirs.push(d.clone()),
                        Some(NodeKind::File(f)) => child_files.push(f.clone()),
                        None => {}
                    }
                }
                Some(DirEntry {
                    id: id.clone(),
                    path: node.path.clone(),
                    parent: node.parent.and_then(|p| self.dir_id_of(p)),
                    deleted: self.effectively_deleted(*key),
                    child_dirs,
                    child_files,
                })
            })
            .collect();
        directories.sort_by(|a, b| a.path.cmp(&b.path).then_with(|| a.id.cmp(&b.id)));

        TreeSnapshot { files, directories }
    }

    /// Visible nodes in depth-first order, directories before files.
    pub fn visible_rows(&self) -> Vec<TreeRow> {
        let mut result = Vec::new();
        let mut stack: Vec<(NodeKey, u16)> = Vec::new();
        push_children(&self.arena, &self.top, 0, &mut stack);

        while let Some((key, depth)) = stack.pop() {
            let Some(node) = self.arena.get(key) else {
                continue;
            };
            result.push(TreeRow {
                kind: node.kind.clone(),
                depth,
                name: node.name.clone(),
            });
            if let Some(children) = &node.children {
                push_children(&self.arena, children, depth + 1, &mut stack);
            }
        }

        result
    }
}

fn push_children(
    arena: &SlotMap<NodeKey, Node>,
    children: &BTreeMap<CompactString, NodeKey>,
    depth: u16,
    stack: &mut Vec<(NodeKey, u16)>,
) {
    let mut dirs = Vec::new();
    let mut files = Vec::new();
    for &key in children.values() {
        match arena.get(key).map(|n| &n.kind) {
            Some(NodeKind::Dir(_)) => dirs.push(key),
            Some(NodeKind::File(_)) => files.push(key),
            None => {}
        }
    }
    for key in files.into_iter().rev() {
        stack.push((key, depth));
    }
    for key in dirs.into_iter().rev() {
        stack.push((key, depth));
    }
}

#[cfg(test)]
#[path = "../../tests/unit/models/file_tree.rs"]
mod tests;
