use crate::engine::{ClassificationDecision, ClassificationEngine};
use crate::error::Result;
use crate::request::CapturedRequest;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info};

/// Ordered, replayable request history owned by the host.
pub trait HistoryProvider {
    /// Every stored request, oldest first.
    fn history(&self) -> Result<Vec<CapturedRequest>>;
}

/// Where decisions end up, typically a highlight on a history row.
pub trait AnnotationSink {
    fn report(&self, request_id: u64, decision: ClassificationDecision) -> Result<()>;
}

/// Called after each replayed entry with (processed, total).
pub type ReplayProgressCallback = Arc<dyn Fn(usize, usize) + Send + Sync>;

#[derive(Debug, Clone, Default)]
pub struct MemoryHistory {
    entries: Vec<CapturedRequest>,
}

impl MemoryHistory {
    pub fn new(entries: Vec<CapturedRequest>) -> Self {
        Self { entries }
    }

    pub fn push(&mut self, request: CapturedRequest) {
        self.entries.push(request);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl HistoryProvider for MemoryHistory {
    fn history(&self) -> Result<Vec<CapturedRequest>> {
        Ok(self.entries.clone())
    }
}

/// Sink that keeps every report in arrival order.
#[derive(Debug, Default)]
pub struct CollectingSink {
    reports: Mutex<Vec<(u64, ClassificationDecision)>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> Vec<(u64, ClassificationDecision)> {
        self.reports.lock().clone()
    }

    pub fn decisions(&self) -> Vec<ClassificationDecision> {
        self.reports.lock().iter().map(|(_, d)| *d).collect()
    }
}

impl AnnotationSink for CollectingSink {
    fn report(&self, request_id: u64, decision: ClassificationDecision) -> Result<()> {
        self.reports.lock().push((request_id, decision));
        Ok(())
    }
}

/// Re-runs classification over a stored history ("re-highlight all").
pub struct HistoryReplayer<'a> {
    engine: &'a ClassificationEngine,
    progress_callback: Option<ReplayProgressCallback>,
}

impl<'a> HistoryReplayer<'a> {
    pub fn new(engine: &'a ClassificationEngine) -> Self {
        Self {
            engine,
            progress_callback: None,
        }
    }

    pub fn with_progress_callback(mut self, callback: ReplayProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Clear the registry, classify every entry oldest first, and hand each
    /// decision to `sink`. Returns the number of entries processed.
    ///
    /// The engine's own registry is used, so requests classified live while
    /// a replay runs are deduplicated against the same set.
    pub fn replay_all<P, S>(&self, provider: &P, sink: &S) -> Result<usize>
    where
        P: HistoryProvider + ?Sized,
        S: AnnotationSink + ?Sized,
    {
        let entries = provider.history()?;
        let total = entries.len();
        info!("Replaying {} history entries", total);

        self.engine.reset();

        let mut processed = 0;
        for request in &entries {
            let decision = self.engine.classify(request);
            debug!("#{} {} {} -> {}", request.id, request.method, request.path, decision.as_str());
            sink.report(request.id, decision)?;
            processed += 1;

            if let Some(ref callback) = self.progress_callback {
                callback(processed, total);
            }
        }

        info!("Replay complete: {} entries processed", processed);
        Ok(processed)
    }
}
