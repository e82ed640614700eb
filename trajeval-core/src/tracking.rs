//! Test-tracking integration
//!
//! Evaluators run inside a [`scope`] forward every feedback record to the
//! scoped [`EvaluationTracker`]. Outside a scope nothing is recorded.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::Result;
use crate::result::EvaluatorResult;

/// A feedback record as seen by a tracker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedFeedback {
    /// Evaluator run that produced the record
    pub run_name: String,
    pub result: EvaluatorResult,
    pub recorded_at: DateTime<Utc>,
}

/// Sink for evaluator feedback
#[async_trait]
pub trait EvaluationTracker: Send + Sync {
    /// Record one feedback entry
    async fn record(&self, feedback: TrackedFeedback) -> Result<()>;
}

/// In-memory tracker for development and testing
#[derive(Default, Clone)]
pub struct MemoryTracker {
    records: Arc<RwLock<Vec<TrackedFeedback>>>,
}

impl MemoryTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// All records so far, oldest first
    pub async fn records(&self) -> Vec<TrackedFeedback> {
        self.records.read().await.clone()
    }

    /// Records reported under a feedback key
    pub async fn records_for_key(&self, key: &str) -> Vec<TrackedFeedback> {
        self.records.read().await.iter().filter(|r| r.result.key == key).cloned().collect()
    }

    pub async fn clear(&self) {
        self.records.write().await.clear();
    }
}

#[async_trait]
impl EvaluationTracker for MemoryTracker {
    async fn record(&self, feedback: TrackedFeedback) -> Result<()> {
        self.records.write().await.push(feedback);
        Ok(())
    }
}

tokio::task_local! {
    static ACTIVE_TRACKER: Arc<dyn EvaluationTracker>;
}

/// Run `fut` with `tracker` as the active tracking sink
pub async fn scope<F>(tracker: Arc<dyn EvaluationTracker>, fut: F) -> F::Output
where
    F: Future,
{
    ACTIVE_TRACKER.scope(tracker, fut).await
}

/// Whether a tracking scope is active on the current task
pub fn is_tracking() -> bool {
    ACTIVE_TRACKER.try_with(|_| ()).is_ok()
}

pub(crate) async fn record_if_active(run_name: &str, results: &[EvaluatorResult]) -> Result<()> {
    let Ok(tracker) = ACTIVE_TRACKER.try_with(Arc::clone) else {
        return Ok(());
    };
    for result in results {
        tracing::debug!(run_name, key = %result.key, "recording feedback");
        tracker
            .record(TrackedFeedback {
                run_name: run_name.to_string(),
                result: result.clone(),
                recorded_at: Utc::now(),
            })
            .await?;
    }
    Ok(())
}
