// Tests for the history database

use dejavu_core::{CoreError, Database, HistoryRecord};
use dejavu_engine::{
    AnnotationSink, ClassificationDecision, ClassificationEngine, HistoryProvider,
    HistoryReplayer, InspectedRequest,
};
use tempfile::TempDir;

use ClassificationDecision::{Duplicate, StaticAsset, Suppressed, Unique};

fn create_test_db() -> (TempDir, Database) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");
    let db = Database::new(&db_path).unwrap();
    (temp_dir, db)
}

fn seed(db: &Database) {
    for url in [
        "http://example.com/api/users?id=1",
        "http://example.com/api/users?id=1",
        "http://example.com/static/app.js",
        "http://example.com/api/users?id=2",
    ] {
        db.record_request(&HistoryRecord::new("GET", url)).unwrap();
    }
}

// ============================================================================
// Database Creation Tests
// ============================================================================

#[test]
fn test_database_creation() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");

    let db = Database::new(&db_path);
    assert!(db.is_ok());
    assert!(db_path.exists());
}

#[test]
fn test_database_exists() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");

    assert!(!Database::exists(&db_path));

    let _db = Database::new(&db_path).unwrap();
    assert!(Database::exists(&db_path));
}

#[test]
fn test_database_drop() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");

    let _db = Database::new(&db_path).unwrap();
    assert!(Database::exists(&db_path));

    Database::drop(&db_path).unwrap();
    assert!(!Database::exists(&db_path));
}

#[test]
fn test_reopen_keeps_history() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");

    {
        let db = Database::new(&db_path).unwrap();
        seed(&db);
    }

    let db = Database::new(&db_path).unwrap();
    assert_eq!(db.request_count().unwrap(), 4);
}

// ============================================================================
// Request History Tests
// ============================================================================

#[test]
fn test_record_request_returns_sequential_ids() {
    let (_temp_dir, db) = create_test_db();

    let first = db
        .record_request(&HistoryRecord::new("GET", "http://example.com/a"))
        .unwrap();
    let second = db
        .record_request(&HistoryRecord::new("GET", "http://example.com/b"))
        .unwrap();

    assert_eq!(first, 1);
    assert_eq!(second, 2);
}

#[test]
fn test_record_request_rejects_invalid_url() {
    let (_temp_dir, db) = create_test_db();

    let result = db.record_request(&HistoryRecord::new("GET", "not a url"));
    assert!(matches!(result, Err(CoreError::InvalidUrl(_))));
    assert_eq!(db.request_count().unwrap(), 0);
}

#[test]
fn test_records_round_trip_headers_and_body() {
    let (_temp_dir, db) = create_test_db();
    let record = HistoryRecord::new("POST", "https://example.com/login")
        .with_header("Content-Type", "application/x-www-form-urlencoded")
        .with_header("Cookie", "sid=abc")
        .with_body("user=bob&pass=x");

    db.record_request(&record).unwrap();
    let stored = db.records().unwrap();

    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].id, Some(1));
    assert!(stored[0].timestamp.is_some());
    assert_eq!(stored[0].headers, record.headers);
    assert_eq!(stored[0].body.as_deref(), Some("user=bob&pass=x"));
}

#[test]
fn test_requests_preserve_arrival_order_and_ids() {
    let (_temp_dir, db) = create_test_db();
    seed(&db);

    let requests = db.requests().unwrap();
    let ids: Vec<u64> = requests.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![1, 2, 3, 4]);
    assert_eq!(requests[2].path_without_query(), "/static/app.js");
}

#[test]
fn test_record_requests_in_one_transaction() {
    let (_temp_dir, mut db) = create_test_db();
    let records = vec![
        HistoryRecord::new("GET", "http://example.com/a"),
        HistoryRecord::new("GET", "http://example.com/b"),
    ];

    assert_eq!(db.record_requests(&records).unwrap(), 2);
    assert_eq!(db.request_count().unwrap(), 2);
}

#[test]
fn test_record_requests_stores_what_record_request_stores() {
    let (_single_dir, single) = create_test_db();
    let (_batch_dir, mut batch) = create_test_db();
    let captured_at = "2024-05-01T12:00:00Z".parse().unwrap();
    let records = vec![
        HistoryRecord {
            timestamp: Some(captured_at),
            ..HistoryRecord::new("POST", "http://example.com/api")
                .with_header("Content-Type", "application/json")
                .with_body(r#"{"a":1}"#)
        },
        HistoryRecord::new("GET", "http://example.com/b").with_header("Cookie", "sid=1"),
    ];

    for record in &records {
        single.record_request(record).unwrap();
    }
    batch.record_requests(&records).unwrap();

    let single_rows = single.records().unwrap();
    let batch_rows = batch.records().unwrap();
    assert_eq!(single_rows[0], batch_rows[0]);
    assert_eq!(single_rows[0].timestamp, Some(captured_at));
    assert_eq!(single_rows[1].headers, batch_rows[1].headers);
    assert_eq!(single_rows[1].body, batch_rows[1].body);
}

#[test]
fn test_record_requests_rolls_back_on_bad_record() {
    let (_temp_dir, mut db) = create_test_db();
    let records = vec![
        HistoryRecord::new("GET", "http://example.com/a"),
        HistoryRecord::new("GET", "::nope::"),
    ];

    assert!(db.record_requests(&records).is_err());
    assert_eq!(db.request_count().unwrap(), 0);
}

// ============================================================================
// Annotation Tests
// ============================================================================

#[test]
fn test_set_annotation_overwrites() {
    let (_temp_dir, db) = create_test_db();
    seed(&db);

    db.set_annotation(1, Unique).unwrap();
    db.set_annotation(1, Duplicate).unwrap();

    assert_eq!(db.annotation(1).unwrap(), Some(Duplicate));
    assert_eq!(db.annotation(2).unwrap(), None);
    assert_eq!(db.annotations().unwrap(), vec![(1, Duplicate)]);
}

#[test]
fn test_annotation_for_unknown_request_fails() {
    let (_temp_dir, db) = create_test_db();
    assert!(db.set_annotation(42, Unique).is_err());
}

#[test]
fn test_annotation_counts() {
    let (_temp_dir, db) = create_test_db();
    seed(&db);

    db.set_annotation(1, Unique).unwrap();
    db.set_annotation(2, Duplicate).unwrap();
    db.set_annotation(3, StaticAsset).unwrap();
    db.set_annotation(4, Unique).unwrap();

    let mut counts = db.annotation_counts().unwrap();
    counts.sort_by_key(|(decision, _)| decision.as_str());
    assert_eq!(
        counts,
        vec![(Duplicate, 1), (StaticAsset, 1), (Unique, 2)]
    );
}

#[test]
fn test_clear_annotations() {
    let (_temp_dir, db) = create_test_db();
    seed(&db);
    db.set_annotation(1, Unique).unwrap();
    db.set_annotation(2, Suppressed).unwrap();

    assert_eq!(db.clear_annotations().unwrap(), 2);
    assert!(db.annotations().unwrap().is_empty());
    assert_eq!(db.request_count().unwrap(), 4);
}

// ============================================================================
// Replay Integration Tests
// ============================================================================

#[test]
fn test_database_as_provider_and_sink() {
    let (_temp_dir, db) = create_test_db();
    seed(&db);
    let engine = ClassificationEngine::default();

    let count = HistoryReplayer::new(&engine).replay_all(&db, &db).unwrap();

    assert_eq!(count, 4);
    assert_eq!(
        db.annotations().unwrap(),
        vec![(1, Unique), (2, Duplicate), (3, StaticAsset), (4, Unique)]
    );
}

#[test]
fn test_replay_overwrites_previous_highlights() {
    let (_temp_dir, db) = create_test_db();
    seed(&db);
    db.set_annotation(1, Duplicate).unwrap();

    let engine = ClassificationEngine::default();
    HistoryReplayer::new(&engine).replay_all(&db, &db).unwrap();

    assert_eq!(db.annotation(1).unwrap(), Some(Unique));
}

#[test]
fn test_trait_methods_map_errors() {
    let (_temp_dir, db) = create_test_db();
    assert!(db.history().unwrap().is_empty());
    assert!(db.report(7, Unique).is_err());
}

#[test]
fn test_in_memory_database() {
    let db = Database::in_memory().unwrap();
    seed(&db);
    assert_eq!(db.request_count().unwrap(), 4);
}
