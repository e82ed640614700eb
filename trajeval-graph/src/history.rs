//! State-history providers
//!
//! A [`StateHistoryProvider`] returns the snapshots of one execution, newest
//! first. [`collect_state_history`] walks nested executions depth-first and
//! splices their histories in ahead of the snapshot that spawned them.

use async_trait::async_trait;
use futures::FutureExt;
use futures::future::BoxFuture;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::Instrument;

use trajeval_core::Result;

use crate::snapshot::{ExecutionHandle, StateSnapshot};

/// Source of execution snapshots
#[async_trait]
pub trait StateHistoryProvider: Send + Sync {
    /// Snapshots for `handle`, newest first
    async fn get_state_history(&self, handle: &ExecutionHandle) -> Result<Vec<StateSnapshot>>;
}

/// In-memory provider for development and testing
#[derive(Default, Clone)]
pub struct MemoryHistoryProvider {
    histories: Arc<RwLock<HashMap<(String, String), Vec<StateSnapshot>>>>,
}

impl MemoryHistoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a snapshot under its own config handle, in chronological order
    pub async fn record(&self, snapshot: StateSnapshot) {
        let key = (snapshot.config.thread_id.clone(), snapshot.config.checkpoint_ns.clone());
        self.histories.write().await.entry(key).or_default().push(snapshot);
    }

    pub async fn record_all(&self, snapshots: impl IntoIterator<Item = StateSnapshot>) {
        for snapshot in snapshots {
            self.record(snapshot).await;
        }
    }

    pub async fn clear(&self, handle: &ExecutionHandle) {
        self.histories
            .write()
            .await
            .remove(&(handle.thread_id.clone(), handle.checkpoint_ns.clone()));
    }
}

#[async_trait]
impl StateHistoryProvider for MemoryHistoryProvider {
    async fn get_state_history(&self, handle: &ExecutionHandle) -> Result<Vec<StateSnapshot>> {
        let store = self.histories.read().await;
        let key = (handle.thread_id.clone(), handle.checkpoint_ns.clone());
        Ok(store.get(&key).map(|h| h.iter().rev().cloned().collect()).unwrap_or_default())
    }
}

/// Fetch the history of `handle` with nested histories spliced in
///
/// Nested executions are fetched one at a time, depth-first, in task order.
/// A failed fetch fails the whole collection.
pub fn collect_state_history<'a>(
    provider: &'a dyn StateHistoryProvider,
    handle: &'a ExecutionHandle,
) -> BoxFuture<'a, Result<Vec<StateSnapshot>>> {
    async move {
        let span = trajeval_telemetry::history_fetch_span(&handle.thread_id, &handle.checkpoint_ns);
        let history = provider.get_state_history(handle).instrument(span).await?;
        tracing::debug!(count = history.len(), ns = %handle.checkpoint_ns, "fetched state history");

        let mut collected = Vec::with_capacity(history.len());
        for snapshot in history {
            for task in &snapshot.tasks {
                if let Some(nested) = task.nested_handle() {
                    collected.extend(collect_state_history(provider, nested).await?);
                }
            }
            collected.push(snapshot);
        }
        Ok(collected)
    }
    .boxed()
}
