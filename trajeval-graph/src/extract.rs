//! Trajectory reconstruction from state snapshots
//!
//! Snapshots arrive newest first. A round opens at a snapshot with nothing
//! pending or with an interrupted task; every snapshot after that (walking
//! backwards in time) adds its tasks to the open round until the next round
//! opens. The collected lists are reversed at the end so rounds, and the
//! steps within them, read oldest first.

use serde_json::{Map, Value};

use trajeval_core::{MESSAGES_KEY, Result};

use crate::history::{StateHistoryProvider, collect_state_history};
use crate::snapshot::{
    ExecutionHandle, ExtractedGraphTrajectory, GraphTrajectory, INTERRUPT, RoundInput,
    StateSnapshot,
};

/// Accumulates rounds during the newest-first walk
#[derive(Default)]
struct RoundAccumulator {
    accumulating: bool,
    inputs: Vec<RoundInput>,
    results: Vec<Value>,
    steps: Vec<Vec<String>>,
}

impl RoundAccumulator {
    fn start_round(&mut self, snapshot: &StateSnapshot, interrupted: bool) {
        self.accumulating = true;
        let result =
            if interrupted { Value::Object(Map::new()) } else { round_result(&snapshot.values) };
        self.results.push(result);
        self.steps.push(Vec::new());
    }

    fn record_tasks(&mut self, snapshot: &StateSnapshot) {
        let Some(round) = self.steps.last_mut() else {
            return;
        };
        let prefix = snapshot.config.step_prefix();
        for task in &snapshot.tasks {
            if task.is_interrupted() {
                round.push(INTERRUPT.to_string());
            }
            round.push(format!("{}{}", prefix, task.name));
        }
    }

    fn record_input(&mut self, snapshot: &StateSnapshot, older: Option<&StateSnapshot>) {
        if snapshot.is_input() {
            let writes = snapshot.metadata.as_ref().and_then(|m| m.writes.clone());
            self.inputs.push(RoundInput::Writes(writes.unwrap_or(Value::Null)));
        } else if older.is_some_and(StateSnapshot::has_interrupts) {
            self.inputs.push(RoundInput::Resuming);
        }
    }

    fn finish(mut self) -> ExtractedGraphTrajectory {
        self.inputs.reverse();
        self.results.reverse();
        self.steps.reverse();
        for round in &mut self.steps {
            round.reverse();
        }

        let extracted = ExtractedGraphTrajectory {
            inputs: self.inputs,
            outputs: GraphTrajectory { inputs: None, results: self.results, steps: self.steps },
        };
        if !extracted.is_aligned() {
            tracing::warn!(
                inputs = extracted.inputs.len(),
                results = extracted.outputs.results.len(),
                steps = extracted.outputs.steps.len(),
                "Trajectory parsing may be incomplete: \
                 inputs, results and steps have different lengths"
            );
        }
        extracted
    }
}

/// Result recorded for a completed round
///
/// A state holding a message list keeps only its last message.
fn round_result(values: &Value) -> Value {
    match values.get(MESSAGES_KEY) {
        Some(Value::Array(messages)) => {
            let last: Vec<Value> = messages.last().cloned().into_iter().collect();
            let mut result = Map::new();
            result.insert(MESSAGES_KEY.to_string(), Value::Array(last));
            Value::Object(result)
        }
        _ => values.clone(),
    }
}

/// Reconstruct a trajectory from snapshots ordered newest first
///
/// Misaligned inputs, results and steps are logged and returned as-is.
pub fn extract_trajectory_from_snapshots(snapshots: &[StateSnapshot]) -> ExtractedGraphTrajectory {
    let mut acc = RoundAccumulator::default();

    for (i, snapshot) in snapshots.iter().enumerate() {
        let interrupted = snapshot.has_interrupts();
        if snapshot.next.is_empty() || interrupted {
            acc.start_round(snapshot, interrupted);
        }
        if acc.accumulating {
            acc.record_tasks(snapshot);
            acc.record_input(snapshot, snapshots.get(i + 1));
        }
    }

    acc.finish()
}

/// Fetch the full (nested) history of `handle` and reconstruct its trajectory
pub async fn extract_trajectory(
    provider: &dyn StateHistoryProvider,
    handle: &ExecutionHandle,
) -> Result<ExtractedGraphTrajectory> {
    let snapshots = collect_state_history(provider, handle).await?;
    Ok(extract_trajectory_from_snapshots(&snapshots))
}
