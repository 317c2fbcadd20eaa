// tests for the append-only message log

use std::collections::HashSet;
use std::sync::Arc;

use chatguard::{Error, MessageLog};

fn filled(n: usize) -> MessageLog {
    let log = MessageLog::new();
    for i in 0..n {
        log.append(format!("user{i}"), format!("message {i}")).unwrap();
    }
    log
}

#[test]
fn test_ids_start_at_one() {
    let log = MessageLog::new();
    let first = log.append("alice".into(), "hi".into()).unwrap();
    let second = log.append("bob".into(), "hey".into()).unwrap();

    assert_eq!(first.id, 1);
    assert_eq!(second.id, 2);
    assert_eq!(first.user, "alice");
    assert_eq!(second.text, "hey");
}

#[test]
fn test_empty_user_and_text_allowed() {
    let log = MessageLog::new();
    let msg = log.append(String::new(), String::new()).unwrap();
    assert_eq!(msg.id, 1);
    assert_eq!(log.len(), 1);
}

#[test]
fn test_empty_log() {
    let log = MessageLog::new();
    let page = log.after(0);

    assert!(log.is_empty());
    assert!(page.messages.is_empty());
    assert_eq!(page.cursor, 0);
}

#[test]
fn test_after_returns_everything_past_cursor() {
    let log = filled(5);

    for cursor in 0..=7u64 {
        let page = log.after(cursor);
        let ids: Vec<u64> = page.messages.iter().map(|m| m.id).collect();
        let expected: Vec<u64> = (cursor + 1..=5).collect();

        assert_eq!(ids, expected, "cursor {cursor}");
        assert_eq!(page.cursor, cursor.max(5));
    }
}

#[test]
fn test_cursor_never_moves_backwards() {
    let log = filled(2);
    let page = log.after(10);

    assert!(page.messages.is_empty());
    assert_eq!(page.cursor, 10);
}

#[test]
fn test_polling_twice_is_identical() {
    let log = filled(3);
    assert_eq!(log.after(1), log.after(1));
    assert_eq!(log.after(0), log.after(0));
}

#[test]
fn test_stored_message_matches_returned() {
    let log = MessageLog::new();
    let stored = log.append("carol".into(), "見て".into()).unwrap();
    let page = log.after(0);

    assert_eq!(page.messages, vec![stored]);
}

#[test]
fn test_text_limit() {
    let log = MessageLog::with_limit(Some(5));

    assert!(log.append("a".into(), "12345".into()).is_ok());
    let err = log.append("a".into(), "123456".into()).unwrap_err();
    assert!(matches!(err, Error::PayloadTooLarge { size: 6, limit: 5 }));

    // rejected message never got an id
    assert_eq!(log.len(), 1);
    assert_eq!(log.append("a".into(), "ok".into()).unwrap().id, 2);
}

#[test]
fn test_concurrent_appends_get_unique_gapless_ids() {
    let log = Arc::new(MessageLog::new());
    let threads = 8;
    let per_thread = 200;

    std::thread::scope(|s| {
        for t in 0..threads {
            let log = Arc::clone(&log);
            s.spawn(move || {
                for i in 0..per_thread {
                    log.append(format!("t{t}"), format!("{i}")).unwrap();
                }
            });
        }
    });

    let total = (threads * per_thread) as u64;
    let page = log.after(0);
    let ids: Vec<u64> = page.messages.iter().map(|m| m.id).collect();

    assert_eq!(ids, (1..=total).collect::<Vec<_>>());
    assert_eq!(ids.iter().collect::<HashSet<_>>().len(), ids.len());
    assert_eq!(page.cursor, total);
}

#[test]
fn test_reads_during_appends_are_consistent() {
    let log = Arc::new(MessageLog::new());

    std::thread::scope(|s| {
        let writer = Arc::clone(&log);
        s.spawn(move || {
            for i in 0..1000 {
                writer.append("w".into(), format!("{i}")).unwrap();
            }
        });

        for _ in 0..4 {
            let reader = Arc::clone(&log);
            s.spawn(move || {
                let mut cursor = 0;
                for _ in 0..200 {
                    let page = reader.after(cursor);
                    // every page is a contiguous run right after the cursor
                    for (offset, m) in page.messages.iter().enumerate() {
                        assert_eq!(m.id, cursor + 1 + offset as u64);
                        assert_eq!(m.user, "w");
                    }
                    assert!(page.cursor >= cursor);
                    cursor = page.cursor;
                }
            });
        }
    });

    assert_eq!(log.after(0).cursor, 1000);
}
