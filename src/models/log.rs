//! Decoding of recorded sessions.
//!
//! Records are read loosely (every payload field optional) and then checked
//! per kind, so a bad record names the field it is missing.

use super::event::{AnnotationPlacement, Event, EventKind, Relevance};
use super::ids::{DirId, EventId, FileId, GroupId};
use super::symbol::Symbol;
use compact_str::CompactString;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

pub const NEVER_RELEVANT: &str = "never relevant";

#[derive(Debug)]
pub enum LogError {
    Io(std::io::Error),
    Json(serde_json::Error),
    UnknownEventKind {
        event: String,
        kind: String,
    },
    MissingField {
        event: String,
        field: &'static str,
    },
    InvalidPosition {
        event: String,
        field: &'static str,
    },
    InvalidSymbol {
        event: String,
        value: String,
    },
    OutOfOrder {
        event: String,
        sequence: u64,
        previous: u64,
    },
}

impl fmt::Display for LogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogError::Io(err) => write!(f, "read session: {err}"),
            LogError::Json(err) => write!(f, "parse session: {err}"),
            LogError::UnknownEventKind { event, kind } => {
                write!(f, "event {event}: unknown event type {kind:?}")
            }
            LogError::MissingField { event, field } => {
                write!(f, "event {event}: missing {field}")
            }
            LogError::InvalidPosition { event, field } => {
                write!(f, "event {event}: {field} must be 1 or greater")
            }
            LogError::InvalidSymbol { event, value } => {
                write!(f, "event {event}: {value:?} is not a single symbol")
            }
            LogError::OutOfOrder {
                event,
                sequence,
                previous,
            } => write!(
                f,
                "event {event}: sequence number {sequence} does not follow {previous}"
            ),
        }
    }
}

impl std::error::Error for LogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LogError::Io(err) => Some(err),
            LogError::Json(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for LogError {
    fn from(err: std::io::Error) -> Self {
        LogError::Io(err)
    }
}

impl From<serde_json::Error> for LogError {
    fn from(err: serde_json::Error) -> Self {
        LogError::Json(err)
    }
}

/// One event as it appears on disk. Line and column are 1-based.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    pub id: String,
    #[serde(alias = "eventSequenceNumber")]
    pub sequence_number: u64,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, alias = "createdByDevGroupId")]
    pub created_by_group_id: Option<String>,
    #[serde(default)]
    pub file_id: Option<String>,
    #[serde(default)]
    pub directory_id: Option<String>,
    #[serde(default)]
    pub line_number: Option<u64>,
    #[serde(default)]
    pub column: Option<u64>,
    #[serde(default)]
    pub character: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub old_path: Option<String>,
    #[serde(default)]
    pub new_path: Option<String>,
    #[serde(default, alias = "parentDirectoryId")]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub old_parent_id: Option<String>,
    #[serde(default)]
    pub new_parent_id: Option<String>,
    #[serde(default)]
    pub permanent_relevance: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RecordKind {
    Insert,
    Delete,
    CreateFile,
    DeleteFile,
    RenameFile,
    MoveFile,
    CreateDir,
    DeleteDir,
    RenameDir,
    MoveDir,
}

impl RecordKind {
    /// Accepts `CREATE_FILE`, `CREATE FILE`, `CREATE DIRECTORY`, `create_dir`...
    fn parse(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_ascii_uppercase().replace(' ', "_");
        let normalized = normalized.strip_suffix("ECTORY").unwrap_or(&normalized);
        Some(match normalized {
            "INSERT" => Self::Insert,
            "DELETE" => Self::Delete,
            "CREATE_FILE" => Self::CreateFile,
            "DELETE_FILE" => Self::DeleteFile,
            "RENAME_FILE" => Self::RenameFile,
            "MOVE_FILE" => Self::MoveFile,
            "CREATE_DIR" => Self::CreateDir,
            "DELETE_DIR" => Self::DeleteDir,
            "RENAME_DIR" => Self::RenameDir,
            "MOVE_DIR" => Self::MoveDir,
            _ => return None,
        })
    }
}

fn pick<'a>(candidates: &[&'a Option<String>]) -> Option<&'a str> {
    candidates.iter().find_map(|c| c.as_deref())
}

impl EventRecord {
    fn require<'a>(
        &self,
        field: &'static str,
        candidates: &[&'a Option<String>],
    ) -> Result<&'a str, LogError> {
        pick(candidates).ok_or_else(|| LogError::MissingField {
            event: self.id.clone(),
            field,
        })
    }

    fn position(&self, field: &'static str, value: Option<u64>) -> Result<usize, LogError> {
        let value = value.ok_or_else(|| LogError::MissingField {
            event: self.id.clone(),
            field,
        })?;
        if value == 0 {
            return Err(LogError::InvalidPosition {
                event: self.id.clone(),
                field,
            });
        }
        Ok((value - 1) as usize)
    }

    fn text_payload(&self) -> Result<(FileId, usize, usize, Symbol), LogError> {
        let file = FileId::from(self.require("fileId", &[&self.file_id])?);
        let row = self.position("lineNumber", self.line_number)?;
        let col = self.position("column", self.column)?;
        let raw = self.require("character", &[&self.character])?;
        let symbol = Symbol::parse(raw).ok_or_else(|| LogError::InvalidSymbol {
            event: self.id.clone(),
            value: raw.to_string(),
        })?;
        Ok((file, row, col, symbol))
    }

    pub fn to_event(&self) -> Result<Event, LogError> {
        let kind = RecordKind::parse(&self.kind).ok_or_else(|| LogError::UnknownEventKind {
            event: self.id.clone(),
            kind: self.kind.clone(),
        })?;
        let path = |s: &str| CompactString::new(s);

        let kind = match kind {
            RecordKind::Insert => {
                let (file, row, col, symbol) = self.text_payload()?;
                EventKind::Insert {
                    file,
                    row,
                    col,
                    symbol,
                }
            }
            RecordKind::Delete => {
                let (file, row, col, symbol) = self.text_payload()?;
                EventKind::Delete {
                    file,
                    row,
                    col,
                    symbol,
                }
            }
            RecordKind::CreateFile => EventKind::CreateFile {
                file: FileId::from(self.require("fileId", &[&self.file_id])?),
                parent: DirId::from(
                    self.require("parentId", &[&self.parent_id, &self.new_parent_id])?,
                ),
                path: path(self.require("path", &[&self.path, &self.new_path])?),
            },
            RecordKind::DeleteFile => EventKind::DeleteFile {
                file: FileId::from(self.require("fileId", &[&self.file_id])?),
                path: path(self.require("path", &[&self.path, &self.old_path])?),
            },
            RecordKind::RenameFile => EventKind::RenameFile {
                file: FileId::from(self.require("fileId", &[&self.file_id])?),
                old_path: path(self.require("oldPath", &[&self.old_path])?),
                new_path: path(self.require("newPath", &[&self.new_path])?),
            },
            RecordKind::MoveFile => EventKind::MoveFile {
                file: FileId::from(self.require("fileId", &[&self.file_id])?),
                old_parent: DirId::from(self.require("oldParentId", &[&self.old_parent_id])?),
                new_parent: DirId::from(self.require("newParentId", &[&self.new_parent_id])?),
                old_path: path(self.require("oldPath", &[&self.old_path])?),
                new_path: path(self.require("newPath", &[&self.new_path])?),
            },
            RecordKind::CreateDir => EventKind::CreateDir {
                dir: DirId::from(self.require("directoryId", &[&self.directory_id])?),
                parent: pick(&[&self.parent_id, &self.new_parent_id]).map(DirId::from),
                path: path(self.require("path", &[&self.path, &self.new_path])?),
            },
            RecordKind::DeleteDir => EventKind::DeleteDir {
                dir: DirId::from(self.require("directoryId", &[&self.directory_id])?),
                path: path(self.require("path", &[&self.path, &self.old_path])?),
            },
            RecordKind::RenameDir => EventKind::RenameDir {
                dir: DirId::from(self.require("directoryId", &[&self.directory_id])?),
                old_path: path(self.require("oldPath", &[&self.old_path])?),
                new_path: path(self.require("newPath", &[&self.new_path])?),
            },
            RecordKind::MoveDir => EventKind::MoveDir {
                dir: DirId::from(self.require("directoryId", &[&self.directory_id])?),
                old_parent: DirId::from(self.require("oldParentId", &[&self.old_parent_id])?),
                new_parent: DirId::from(self.require("newParentId", &[&self.new_parent_id])?),
                old_path: path(self.require("oldPath", &[&self.old_path])?),
                new_path: path(self.require("newPath", &[&self.new_path])?),
            },
        };

        let relevance = match self.permanent_relevance.as_deref() {
            Some(NEVER_RELEVANT) => Relevance::NeverRelevant,
            _ => Relevance::Normal,
        };

        Ok(Event {
            id: EventId::from(self.id.as_str()),
            sequence: self.sequence_number,
            group: self.created_by_group_id.as_deref().map(GroupId::from),
            relevance,
            kind,
        })
    }
}

/// Decodes records in log order, rejecting non-increasing sequence numbers.
pub fn decode_events(records: &[EventRecord]) -> Result<Vec<Event>, LogError> {
    let mut events = Vec::with_capacity(records.len());
    let mut previous: Option<u64> = None;
    for record in records {
        let event = record.to_event()?;
        if let Some(previous) = previous {
            if event.sequence <= previous {
                return Err(LogError::OutOfOrder {
                    event: record.id.clone(),
                    sequence: event.sequence,
                    previous,
                });
            }
        }
        previous = Some(event.sequence);
        events.push(event);
    }
    Ok(events)
}

pub fn parse_events(json: &str) -> Result<Vec<Event>, LogError> {
    let records: Vec<EventRecord> = serde_json::from_str(json)?;
    decode_events(&records)
}

#[derive(Debug, Clone, Deserialize)]
struct CommentRecord {
    id: String,
}

#[derive(Debug, Clone, Deserialize)]
struct SessionRecord {
    events: Vec<EventRecord>,
    #[serde(default)]
    comments: BTreeMap<String, Vec<CommentRecord>>,
}

/// A decoded recording: the event log plus where comments are pinned.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub events: Vec<Event>,
    pub annotations: Vec<AnnotationPlacement>,
}

impl Session {
    pub fn from_json_str(json: &str) -> Result<Self, LogError> {
        let record: SessionRecord = serde_json::from_str(json)?;
        let events = decode_events(&record.events)?;
        let annotations = record
            .comments
            .into_iter()
            .flat_map(|(event, comments)| {
                comments
                    .into_iter()
                    .enumerate()
                    .map(move |(position, c)| {
                        AnnotationPlacement::new(c.id.as_str(), event.as_str(), position)
                    })
            })
            .collect();
        Ok(Self {
            events,
            annotations,
        })
    }

    pub fn load(path: &Path) -> Result<Self, LogError> {
        let data = std::fs::read_to_string(path)?;
        Self::from_json_str(&data)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/models/log.rs"]
mod tests;
