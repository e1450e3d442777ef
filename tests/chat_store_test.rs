// Tests for reading a Messages-shaped SQLite database
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use rusqlite::{params, Connection};
use sms_code_monitor::monitor::MonitorSession;
use sms_code_monitor::store::{ChatStore, MessageSource};

fn unique_temp_dir() -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock error")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!("sms-code-monitor-store-test-{nanos}"));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

fn setup_db(path: &Path) -> Connection {
    let conn = Connection::open(path).expect("open sqlite failed");
    conn.execute_batch(
        "CREATE TABLE message (
             ROWID INTEGER PRIMARY KEY AUTOINCREMENT,
             text TEXT,
             attributedBody BLOB,
             date INTEGER,
             is_from_me INTEGER DEFAULT 0
         );
         CREATE TABLE chat (
             ROWID INTEGER PRIMARY KEY AUTOINCREMENT,
             chat_identifier TEXT
         );
         CREATE TABLE chat_message_join (
             chat_id INTEGER,
             message_id INTEGER
         );
         INSERT INTO chat (chat_identifier) VALUES ('+15550001111'), ('Bank');",
    )
    .expect("create schema failed");
    conn
}

fn insert_message(
    conn: &Connection,
    chat_id: i64,
    text: Option<&str>,
    body: Option<&[u8]>,
    date: i64,
    is_from_me: i64,
) -> i64 {
    conn.execute(
        "INSERT INTO message (text, attributedBody, date, is_from_me) VALUES (?1, ?2, ?3, ?4)",
        params![text, body, date, is_from_me],
    )
    .expect("insert message failed");
    let id = conn.last_insert_rowid();
    conn.execute(
        "INSERT INTO chat_message_join (chat_id, message_id) VALUES (?1, ?2)",
        params![chat_id, id],
    )
    .expect("insert join failed");
    id
}

#[test]
fn fetch_returns_inbound_messages_newest_first() {
    let dir = unique_temp_dir();
    let path = dir.join("chat.db");
    let conn = setup_db(&path);
    insert_message(&conn, 1, Some("hello"), None, 100, 0);
    insert_message(&conn, 1, Some("my reply 123456"), None, 200, 1);
    insert_message(&conn, 2, None, Some(b"\x84\x01+Your code is 771204"), 300, 0);

    let mut store = ChatStore::new(&path);
    let messages = store.fetch_since(0).expect("fetch");

    let ids: Vec<_> = messages.iter().map(|m| m.id).collect();
    assert_eq!(ids, vec![3, 1]);
    assert_eq!(messages[0].chat_identifier.as_deref(), Some("Bank"));
    assert!(messages[0].text.is_none());
    assert!(messages[0].attributed_body.is_some());
    assert_eq!(messages[0].date, 300);

    assert_eq!(store.max_message_id().expect("max id"), 3);
    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn fetch_respects_watermark_and_batch_limit() {
    let dir = unique_temp_dir();
    let path = dir.join("chat.db");
    let conn = setup_db(&path);
    for i in 0..5 {
        insert_message(&conn, 1, Some("msg"), None, 100 + i, 0);
    }

    let mut store = ChatStore::new(&path).with_batch_limit(2);
    let ids: Vec<_> = store.fetch_since(1).expect("fetch").iter().map(|m| m.id).collect();
    assert_eq!(ids, vec![5, 4]);

    let none = store.fetch_since(5).expect("fetch");
    assert!(none.is_empty());
    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn missing_database_is_a_recoverable_store_error() {
    let dir = unique_temp_dir();
    let mut store = ChatStore::new(dir.join("absent.db"));
    let err = store.fetch_since(0).expect_err("missing db");
    assert!(!err.is_fatal());
    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn store_feeds_the_pipeline_across_polls() {
    let dir = unique_temp_dir();
    let path = dir.join("chat.db");
    let conn = setup_db(&path);
    insert_message(&conn, 2, Some("Your code is 482913, expires in 10 min"), None, 100, 0);

    let mut store = ChatStore::new(&path);
    let mut session = MonitorSession::new();

    let first = session.process_batch(&store.fetch_since(session.watermark()).expect("fetch"));
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].code, "482913");

    insert_message(&conn, 2, Some("Reminder 482913"), None, 200, 0);
    insert_message(&conn, 1, None, Some(b"\x01\x02hi"), 300, 0);
    insert_message(&conn, 2, None, Some(b"\x84\x01+Login code K7Q2ZP\x86"), 400, 0);

    let second = session.process_batch(&store.fetch_since(session.watermark()).expect("fetch"));
    let codes: Vec<_> = second.iter().map(|e| e.code.as_str()).collect();
    assert_eq!(codes, vec!["K7Q2ZP"]);
    assert_eq!(session.watermark(), 4);

    let third = session.process_batch(&store.fetch_since(session.watermark()).expect("fetch"));
    assert!(third.is_empty());
    let _ = std::fs::remove_dir_all(dir);
}
