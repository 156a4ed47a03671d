use super::*;

fn record(id: &str, seq: u64, kind: &str) -> EventRecord {
    EventRecord {
        id: id.to_string(),
        sequence_number: seq,
        kind: kind.to_string(),
        ..Default::default()
    }
}

#[test]
fn test_insert_record_uses_one_based_positions() {
    let json = r#"[
        {"id": "e1", "sequenceNumber": 1, "type": "INSERT", "fileId": "f1",
         "lineNumber": 3, "column": 1, "character": "NEWLINE",
         "createdByGroupId": "g1"}
    ]"#;
    let events = parse_events(json).unwrap();
    assert_eq!(events.len(), 1);
    let event = &events[0];
    assert_eq!(event.group, Some(GroupId::from("g1")));
    assert_eq!(
        event.kind,
        EventKind::Insert {
            file: FileId::from("f1"),
            row: 2,
            col: 0,
            symbol: Symbol::LineBreak,
        }
    );
}

#[test]
fn test_aliases_and_relevance() {
    let json = r#"[
        {"id": "e1", "eventSequenceNumber": 7, "type": "CREATE DIRECTORY",
         "directoryId": "root", "path": "/", "createdByDevGroupId": "g2",
         "permanentRelevance": "never relevant"}
    ]"#;
    let events = parse_events(json).unwrap();
    let event = &events[0];
    assert_eq!(event.sequence, 7);
    assert!(event.is_never_relevant());
    assert_eq!(event.group, Some(GroupId::from("g2")));
    assert_eq!(
        event.kind,
        EventKind::CreateDir {
            dir: DirId::from("root"),
            parent: None,
            path: CompactString::new("/"),
        }
    );
}

#[test]
fn test_move_file_record() {
    let mut r = record("e1", 1, "MOVE_FILE");
    r.file_id = Some("f1".into());
    r.old_parent_id = Some("root".into());
    r.new_parent_id = Some("docs".into());
    r.old_path = Some("/a.txt".into());
    r.new_path = Some("/docs/a.txt".into());

    let event = r.to_event().unwrap();
    assert_eq!(event.kind.name(), "MOVE_FILE");
    assert_eq!(event.kind.file_id(), Some(&FileId::from("f1")));
}

#[test]
fn test_unknown_kind_is_rejected() {
    let err = record("e9", 1, "PASTE").to_event().unwrap_err();
    assert!(matches!(err, LogError::UnknownEventKind { ref kind, .. } if kind == "PASTE"));
}

#[test]
fn test_missing_field_names_the_field() {
    let mut r = record("e1", 1, "INSERT");
    r.file_id = Some("f1".into());
    r.line_number = Some(1);
    r.column = Some(1);
    let err = r.to_event().unwrap_err();
    assert!(matches!(err, LogError::MissingField { field: "character", .. }));
}

#[test]
fn test_zero_position_is_invalid() {
    let mut r = record("e1", 1, "DELETE");
    r.file_id = Some("f1".into());
    r.line_number = Some(0);
    r.column = Some(1);
    r.character = Some("a".into());
    let err = r.to_event().unwrap_err();
    assert!(matches!(err, LogError::InvalidPosition { field: "lineNumber", .. }));
}

#[test]
fn test_multi_symbol_character_is_invalid() {
    let mut r = record("e1", 1, "INSERT");
    r.file_id = Some("f1".into());
    r.line_number = Some(1);
    r.column = Some(1);
    r.character = Some("ab".into());
    assert!(matches!(r.to_event(), Err(LogError::InvalidSymbol { .. })));
}

#[test]
fn test_sequence_must_increase() {
    let mut a = record("a", 5, "CREATE_DIR");
    a.directory_id = Some("root".into());
    a.path = Some("/".into());
    let mut b = a.clone();
    b.id = "b".into();
    b.directory_id = Some("other".into());

    let err = decode_events(&[a, b]).unwrap_err();
    assert!(matches!(
        err,
        LogError::OutOfOrder {
            sequence: 5,
            previous: 5,
            ..
        }
    ));
}

#[test]
fn test_session_collects_comments_per_event() {
    let json = r#"{
        "events": [
            {"id": "e1", "sequenceNumber": 1, "type": "CREATE_DIR",
             "directoryId": "root", "path": "/"}
        ],
        "comments": {
            "e1": [{"id": "c1", "text": "first"}, {"id": "c2"}]
        }
    }"#;
    let session = Session::from_json_str(json).unwrap();
    assert_eq!(session.events.len(), 1);
    assert_eq!(
        session.annotations,
        vec![
            AnnotationPlacement::new("c1", "e1", 0),
            AnnotationPlacement::new("c2", "e1", 1),
        ]
    );
}

#[test]
fn test_session_without_comments() {
    let session = Session::from_json_str(r#"{"events": []}"#).unwrap();
    assert!(session.events.is_empty());
    assert!(session.annotations.is_empty());
}

#[test]
fn test_load_reports_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = Session::load(&dir.path().join("missing.json")).unwrap_err();
    assert!(matches!(err, LogError::Io(_)));
}
