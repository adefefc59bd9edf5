// Tests for history replay

use dejavu_engine::error::Result;
use dejavu_engine::{
    AnnotationSink, CapturedRequest, ClassificationDecision, ClassificationEngine,
    CollectingSink, EngineError, HistoryProvider, HistoryReplayer, MemoryHistory,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use ClassificationDecision::{Duplicate, StaticAsset, Unique};

fn entry(id: u64, url: &str) -> CapturedRequest {
    CapturedRequest::from_url("GET", url).unwrap().with_id(id)
}

fn sample_history() -> MemoryHistory {
    MemoryHistory::new(vec![
        entry(1, "http://example.com/api/users?id=1"),
        entry(2, "http://example.com/api/users?id=1"),
        entry(3, "http://example.com/app.js"),
        entry(4, "http://example.com/api/users?id=2"),
        entry(5, "http://example.com/api/users?id=2"),
    ])
}

struct FailingHistory;

impl HistoryProvider for FailingHistory {
    fn history(&self) -> Result<Vec<CapturedRequest>> {
        Err(EngineError::History("store offline".to_string()))
    }
}

struct FailingSink;

impl AnnotationSink for FailingSink {
    fn report(&self, _request_id: u64, _decision: ClassificationDecision) -> Result<()> {
        Err(EngineError::Sink("read only".to_string()))
    }
}

// ============================================================================
// Replay Tests
// ============================================================================

#[test]
fn test_replay_reports_every_entry_in_order() {
    let engine = ClassificationEngine::default();
    let sink = CollectingSink::new();

    let count = HistoryReplayer::new(&engine)
        .replay_all(&sample_history(), &sink)
        .unwrap();

    assert_eq!(count, 5);
    assert_eq!(
        sink.reports(),
        vec![
            (1, Unique),
            (2, Duplicate),
            (3, StaticAsset),
            (4, Unique),
            (5, Duplicate)
        ]
    );
}

#[test]
fn test_replay_is_idempotent() {
    let engine = ClassificationEngine::default();
    let history = sample_history();
    let replayer = HistoryReplayer::new(&engine);

    let first = CollectingSink::new();
    let second = CollectingSink::new();
    replayer.replay_all(&history, &first).unwrap();
    replayer.replay_all(&history, &second).unwrap();

    assert_eq!(first.reports(), second.reports());
}

#[test]
fn test_replay_forgets_live_state() {
    let engine = ClassificationEngine::default();
    engine.classify(&entry(99, "http://example.com/api/users?id=1"));

    let sink = CollectingSink::new();
    HistoryReplayer::new(&engine)
        .replay_all(&sample_history(), &sink)
        .unwrap();

    assert_eq!(sink.decisions()[0], Unique);
}

#[test]
fn test_replay_leaves_registry_populated() {
    let engine = ClassificationEngine::default();
    HistoryReplayer::new(&engine)
        .replay_all(&sample_history(), &CollectingSink::new())
        .unwrap();

    assert_eq!(engine.registry().len(), 2);
    assert_eq!(engine.classify(&entry(6, "http://example.com/api/users?id=2")), Duplicate);
}

#[test]
fn test_replay_empty_history() {
    let engine = ClassificationEngine::default();
    let sink = CollectingSink::new();
    let count = HistoryReplayer::new(&engine)
        .replay_all(&MemoryHistory::default(), &sink)
        .unwrap();
    assert_eq!(count, 0);
    assert!(sink.reports().is_empty());
}

#[test]
fn test_replay_progress_callback() {
    let engine = ClassificationEngine::default();
    let calls = Arc::new(AtomicUsize::new(0));
    let last = Arc::new(AtomicUsize::new(0));

    let calls_clone = calls.clone();
    let last_clone = last.clone();
    let replayer = HistoryReplayer::new(&engine).with_progress_callback(Arc::new(
        move |done: usize, total: usize| {
            assert_eq!(total, 5);
            calls_clone.fetch_add(1, Ordering::SeqCst);
            last_clone.store(done, Ordering::SeqCst);
        },
    ));

    replayer
        .replay_all(&sample_history(), &CollectingSink::new())
        .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 5);
    assert_eq!(last.load(Ordering::SeqCst), 5);
}

// ============================================================================
// Error Propagation Tests
// ============================================================================

#[test]
fn test_provider_error_propagates() {
    let engine = ClassificationEngine::default();
    let result = HistoryReplayer::new(&engine).replay_all(&FailingHistory, &CollectingSink::new());
    assert!(matches!(result, Err(EngineError::History(_))));
}

#[test]
fn test_sink_error_propagates() {
    let engine = ClassificationEngine::default();
    let result = HistoryReplayer::new(&engine).replay_all(&sample_history(), &FailingSink);
    assert!(matches!(result, Err(EngineError::Sink(_))));
}

// ============================================================================
// Concurrency Tests
// ============================================================================

#[test]
fn test_replay_alongside_live_traffic() {
    let engine = ClassificationEngine::default();
    let history = MemoryHistory::new(
        (1..=200)
            .map(|i| entry(i, &format!("http://example.com/history/{}", i)))
            .collect(),
    );
    let sink = CollectingSink::new();

    let count = thread::scope(|s| {
        let live = s.spawn(|| {
            for i in 0..200 {
                engine.classify(&entry(1000 + i, &format!("http://example.com/live/{}", i)));
            }
        });
        let count = HistoryReplayer::new(&engine).replay_all(&history, &sink).unwrap();
        live.join().unwrap();
        count
    });

    assert_eq!(count, 200);
    // history entries are all distinct, so each is Unique whatever the live side does
    assert!(sink.decisions().iter().all(|d| *d == Unique));
}
