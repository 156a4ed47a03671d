use super::*;
use crate::models::{DirId, Symbol};
use compact_str::CompactString;

fn f1() -> FileId {
    FileId::from("f1")
}

fn ev(seq: u64, kind: EventKind) -> Event {
    Event::new(format!("e{seq}").as_str(), seq, kind)
}

fn root(seq: u64) -> Event {
    ev(
        seq,
        EventKind::CreateDir {
            dir: DirId::from("root"),
            parent: None,
            path: CompactString::new("/"),
        },
    )
}

fn create_file(seq: u64, id: &str, path: &str) -> Event {
    ev(
        seq,
        EventKind::CreateFile {
            file: FileId::from(id),
            parent: DirId::from("root"),
            path: CompactString::new(path),
        },
    )
}

fn insert(seq: u64, row: usize, col: usize, c: char) -> Event {
    ev(
        seq,
        EventKind::Insert {
            file: f1(),
            row,
            col,
            symbol: Symbol::ch(c),
        },
    )
}

fn typed(start_seq: u64, row: usize, col: usize, text: &str) -> Vec<Event> {
    text.chars()
        .enumerate()
        .map(|(i, c)| insert(start_seq + i as u64, row, col + i, c))
        .collect()
}

fn cursor(events: Vec<Event>) -> PlaybackCursor {
    PlaybackCursor::new(events, &[], &PlaybackConfig::default()).unwrap()
}

/// Root dir created as scaffolding, then CREATE_FILE(f1), INSERT 'H', INSERT 'i'.
fn hi_events() -> Vec<Event> {
    vec![
        root(0).never_relevant(),
        create_file(1, "f1", "/a.txt"),
        insert(2, 0, 0, 'H').with_group("g1"),
        insert(3, 0, 1, 'i').with_group("g2"),
    ]
}

#[test]
fn test_hi_scenario() {
    let mut cursor = cursor(hi_events());
    assert_eq!(cursor.first_relevant_index(), 1);
    assert_eq!(cursor.current_index(), Some(0));
    assert!(cursor.is_at_start());

    let outcome = cursor.step_forward(3).unwrap();
    assert_eq!(outcome.moved, 3);
    assert!(outcome.file_system_changed);
    assert_eq!(cursor.current_file_text(&f1()).as_deref(), Some("Hi"));
    assert_eq!(cursor.current_index(), Some(3));
    assert_eq!(cursor.active_file_id(), Some(&f1()));
    assert_eq!(
        cursor.active_contributor_group_id(),
        Some(&GroupId::from("g2"))
    );
    assert_eq!(cursor.touched_file_ids(), vec![f1()]);

    let outcome = cursor.step_backward(1).unwrap();
    assert_eq!(outcome.moved, 1);
    assert_eq!(outcome.direction, Direction::Backward);
    assert!(!outcome.file_system_changed);
    assert_eq!(cursor.current_file_text(&f1()).as_deref(), Some("H"));
    assert_eq!(
        cursor.active_contributor_group_id(),
        Some(&GroupId::from("g1"))
    );

    cursor.step_backward(1).unwrap();
    assert_eq!(cursor.current_file_text(&f1()).as_deref(), Some(""));
    assert!(cursor.touched_file_ids().is_empty());
    assert!(cursor.diff_ranges(&f1()).is_empty());
}

#[test]
fn test_boundaries_clamp_and_repeat_as_no_ops() {
    let mut cursor = cursor(hi_events());

    let outcome = cursor.step_backward(usize::MAX).unwrap();
    assert_eq!(outcome.moved, 0);
    assert_eq!(cursor.position(), 1);
    assert!(cursor.current_tree().directories.len() == 1);

    let outcome = cursor.step_forward(usize::MAX).unwrap();
    assert_eq!(outcome.moved, 3);
    assert!(cursor.is_at_end());
    let ranges = cursor.diff_ranges(&f1());

    for _ in 0..2 {
        let outcome = cursor.step_forward(usize::MAX).unwrap();
        assert_eq!(outcome.moved, 0);
        assert_eq!(cursor.current_file_text(&f1()).as_deref(), Some("Hi"));
        assert_eq!(cursor.diff_ranges(&f1()), ranges);
    }

    let outcome = cursor.step_backward(100).unwrap();
    assert_eq!(outcome.moved, 3);
    assert_eq!(cursor.current_index(), Some(0));
    assert!(cursor.current_file_text(&f1()).is_none());
    let outcome = cursor.step_backward(100).unwrap();
    assert_eq!(outcome.moved, 0);
}

#[test]
fn test_new_code_highlights_only_inserted_span() {
    let mut events = vec![
        root(0).never_relevant(),
        create_file(1, "f1", "/a.txt").never_relevant(),
    ];
    events.extend(
        typed(2, 0, 0, "this is text")
            .into_iter()
            .map(Event::never_relevant),
    );
    events.extend(typed(100, 0, 8, "cool "));

    let mut cursor = cursor(events);
    assert!(cursor.touched_file_ids().is_empty());

    cursor.step_forward(5).unwrap();
    assert_eq!(
        cursor.current_file_text(&f1()).as_deref(),
        Some("this is cool text")
    );
    assert_eq!(
        cursor.diff_ranges(&f1()),
        vec![MarkerRange {
            start_row: 0,
            start_col: 8,
            end_row: 0,
            end_col: 13,
        }]
    );
    assert_eq!(cursor.insert_lines(&f1()), vec![0]);
    assert!(cursor.delete_lines(&f1()).is_empty());

    cursor.clear_new_code();
    assert!(cursor.diff_ranges(&f1()).is_empty());
}

#[test]
fn test_each_forward_call_starts_fresh_markers() {
    let mut events = hi_events();
    events.push(insert(4, 0, 2, '!'));
    let mut cursor = cursor(events);

    cursor.step_forward(3).unwrap();
    cursor.step_forward(1).unwrap();
    assert_eq!(
        cursor.diff_ranges(&f1()),
        vec![MarkerRange {
            start_row: 0,
            start_col: 2,
            end_row: 0,
            end_col: 3,
        }]
    );
}

#[test]
fn test_markers_can_be_disabled() {
    let config = PlaybackConfig {
        track_new_code: false,
        ..PlaybackConfig::default()
    };
    let mut cursor = PlaybackCursor::new(hi_events(), &[], &config).unwrap();
    cursor.step_forward(3).unwrap();
    assert!(cursor.touched_file_ids().is_empty());
}

#[test]
fn test_without_skip_everything_is_steppable() {
    let config = PlaybackConfig {
        skip_never_relevant: false,
        ..PlaybackConfig::default()
    };
    let mut cursor = PlaybackCursor::new(hi_events(), &[], &config).unwrap();
    assert_eq!(cursor.first_relevant_index(), 0);
    assert_eq!(cursor.current_index(), None);
    assert_eq!(cursor.step_forward(10).unwrap().moved, 4);
    assert_eq!(cursor.step_backward(10).unwrap().moved, 4);
    assert!(cursor.current_tree().directories.is_empty());
}

#[test]
fn test_step_to_moves_by_delta() {
    let mut cursor = cursor(hi_events());
    let outcome = cursor.step_to(2).unwrap();
    assert_eq!(outcome.direction, Direction::Forward);
    assert_eq!(outcome.moved, 2);
    assert_eq!(cursor.current_file_text(&f1()).as_deref(), Some("H"));

    let outcome = cursor.step_to(1).unwrap();
    assert_eq!(outcome.direction, Direction::Backward);
    assert_eq!(outcome.moved, 1);
    assert_eq!(cursor.current_file_text(&f1()).as_deref(), Some(""));

    assert_eq!(cursor.step_to(1).unwrap().moved, 0);
}

#[test]
fn test_delete_file_backward_restores_order() {
    let events = vec![
        root(0).never_relevant(),
        create_file(1, "f0", "/0.txt").never_relevant(),
        create_file(2, "f1", "/a.txt").never_relevant(),
        create_file(3, "f2", "/b.txt").never_relevant(),
        ev(
            4,
            EventKind::DeleteFile {
                file: f1(),
                path: CompactString::new("/a.txt"),
            },
        ),
    ];
    let mut cursor = cursor(events);
    let root_dir = DirId::from("root");
    let before = cursor.project().tree().children(&root_dir).unwrap();

    let outcome = cursor.step_forward(1).unwrap();
    assert!(outcome.file_system_changed);
    assert_eq!(cursor.project().tree().children(&root_dir).unwrap().len(), 2);

    cursor.step_backward(1).unwrap();
    assert_eq!(cursor.project().tree().children(&root_dir).unwrap(), before);
}

#[test]
fn test_integrity_error_stops_before_bad_event() {
    let events = vec![
        root(0).never_relevant(),
        create_file(1, "f1", "/a.txt"),
        insert(2, 0, 0, 'a'),
        ev(
            3,
            EventKind::Delete {
                file: f1(),
                row: 0,
                col: 0,
                symbol: Symbol::ch('z'),
            },
        ),
        insert(4, 0, 0, 'b'),
    ];
    let mut cursor = cursor(events);

    let err = cursor.step_forward(4).unwrap_err();
    assert!(matches!(err, PlaybackError::Integrity { index: 3, .. }));
    assert_eq!(cursor.current_index(), Some(2));
    assert_eq!(cursor.current_file_text(&f1()).as_deref(), Some("a"));
}

fn annotated() -> PlaybackCursor {
    let mut events = vec![root(0).never_relevant(), create_file(1, "f1", "/a.txt")];
    events.extend(typed(2, 0, 0, "abcdefghijklmnopqrstuvwxyz012"));
    let placements = [
        AnnotationPlacement::new("c30", "e30", 0),
        AnnotationPlacement::new("c5b", "e5", 1),
        AnnotationPlacement::new("c12", "e12", 0),
        AnnotationPlacement::new("c5a", "e5", 0),
    ];
    PlaybackCursor::new(events, &placements, &PlaybackConfig::default()).unwrap()
}

fn active(cursor: &PlaybackCursor) -> Option<&str> {
    cursor.active_annotation().map(AnnotationId::as_str)
}

#[test]
fn test_next_and_previous_annotation_order() {
    let mut cursor = annotated();

    let mut visited = Vec::new();
    while cursor.next_annotation().unwrap().is_some() {
        visited.push(active(&cursor).unwrap().to_string());
    }
    assert_eq!(visited, vec!["c5a", "c5b", "c12", "c30"]);
    assert_eq!(cursor.current_event().unwrap().sequence, 30);

    let mut back = Vec::new();
    while cursor.previous_annotation().unwrap().is_some() {
        back.push(active(&cursor).unwrap().to_string());
    }
    assert_eq!(back, vec!["c12", "c5b", "c5a"]);
    assert_eq!(cursor.current_event().unwrap().sequence, 5);
}

#[test]
fn test_annotation_on_last_scaffold_event_is_visited_first() {
    let mut events = vec![root(0).never_relevant(), create_file(1, "f1", "/a.txt")];
    events.extend(typed(2, 0, 0, "abc"));
    let placements = [
        AnnotationPlacement::new("c3", "e3", 0),
        AnnotationPlacement::new("c0", "e0", 0),
    ];
    let mut cursor =
        PlaybackCursor::new(events, &placements, &PlaybackConfig::default()).unwrap();
    assert_eq!(cursor.current_index(), Some(0));
    assert_eq!(active(&cursor), None);

    let outcome = cursor.next_annotation().unwrap().unwrap();
    assert_eq!(outcome.moved, 0);
    assert_eq!(active(&cursor), Some("c0"));
    assert_eq!(cursor.current_index(), Some(0));

    cursor.next_annotation().unwrap().unwrap();
    assert_eq!(active(&cursor), Some("c3"));
    assert!(cursor.next_annotation().unwrap().is_none());

    cursor.previous_annotation().unwrap().unwrap();
    assert_eq!(active(&cursor), Some("c0"));
    assert_eq!(cursor.current_index(), Some(0));
    assert!(cursor.previous_annotation().unwrap().is_none());
}

#[test]
fn test_active_file_cleared_when_its_creation_is_undone() {
    let mut cursor = cursor(hi_events());
    cursor.step_forward(1).unwrap();
    assert_eq!(cursor.active_file_id(), Some(&f1()));

    cursor.step_backward(1).unwrap();
    assert!(cursor.current_file_text(&f1()).is_none());
    assert_eq!(cursor.active_file_id(), None);

    cursor.step_forward(2).unwrap();
    assert_eq!(cursor.active_file_id(), Some(&f1()));
}

#[test]
fn test_landing_on_annotated_event_pauses() {
    let mut cursor = annotated();
    // the cursor starts on e0; five steps land on e5
    let outcome = cursor.step_forward(5).unwrap();
    assert!(outcome.pause);
    assert_eq!(active(&cursor), Some("c5a"));
    let group: Vec<&str> = cursor
        .active_annotation_group()
        .iter()
        .map(|e| e.id.as_str())
        .collect();
    assert_eq!(group, vec!["c5a", "c5b"]);

    let outcome = cursor.step_forward(1).unwrap();
    assert!(!outcome.pause);
    assert_eq!(active(&cursor), None);
}

#[test]
fn test_navigation_from_cursor_without_active_annotation() {
    let mut cursor = annotated();
    cursor.step_to(20).unwrap();
    assert_eq!(active(&cursor), None);

    cursor.previous_annotation().unwrap().unwrap();
    assert_eq!(active(&cursor), Some("c12"));

    cursor.step_to(20).unwrap();
    cursor.next_annotation().unwrap().unwrap();
    assert_eq!(active(&cursor), Some("c30"));
}

#[test]
fn test_step_to_annotation() {
    let mut cursor = annotated();
    let outcome = cursor
        .step_to_annotation(&AnnotationId::from("c5b"))
        .unwrap()
        .unwrap();
    assert!(outcome.pause);
    assert_eq!(active(&cursor), Some("c5b"));
    assert_eq!(cursor.current_event().unwrap().id, EventId::from("e5"));

    assert!(cursor
        .step_to_annotation(&AnnotationId::from("missing"))
        .unwrap()
        .is_none());
    assert_eq!(active(&cursor), Some("c5b"));
}

#[test]
fn test_attribution_follows_config() {
    let config = PlaybackConfig {
        track_attribution: true,
        ..PlaybackConfig::default()
    };
    let mut cursor = PlaybackCursor::new(hi_events(), &[], &config).unwrap();
    cursor.step_forward(3).unwrap();
    assert_eq!(cursor.attribution(&f1(), 0, 1), Some(&EventId::from("e3")));

    let mut plain = self::cursor(hi_events());
    plain.step_forward(3).unwrap();
    assert_eq!(plain.attribution(&f1(), 0, 1), None);
}

#[test]
fn test_cursor_is_a_single_owner_value() {
    fn assert_send<T: Send>() {}
    assert_send::<PlaybackCursor>();

    // stepping needs exclusive access; a shared reference can only query
    fn step(cursor: &mut PlaybackCursor) -> usize {
        cursor.step_forward(1).map(|o| o.moved).unwrap_or(0)
    }
    fn read(cursor: &PlaybackCursor) -> Option<usize> {
        cursor.current_index()
    }

    let mut cursor = cursor(hi_events());
    assert_eq!(step(&mut cursor), 1);
    assert_eq!(read(&cursor), Some(1));

    let moved = std::thread::spawn(move || {
        let mut cursor = cursor;
        step(&mut cursor)
    })
    .join()
    .unwrap();
    assert_eq!(moved, 1);
}
