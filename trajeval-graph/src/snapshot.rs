//! Execution snapshots and graph trajectories

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Step name recorded before a task that suspended execution
pub const INTERRUPT: &str = "__interrupt__";

/// Input recorded for a round that resumed after an interrupt
pub const RESUMING: &str = "__resuming__";

/// Metadata source tag marking fresh external input
pub const INPUT_SOURCE: &str = "input";

/// Identifies one (possibly nested) execution
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExecutionHandle {
    pub thread_id: String,
    /// Colon-delimited nesting path, empty for the root execution
    #[serde(default)]
    pub checkpoint_ns: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkpoint_id: Option<String>,
}

impl ExecutionHandle {
    pub fn new(thread_id: &str) -> Self {
        Self { thread_id: thread_id.to_string(), ..Default::default() }
    }

    pub fn nested(thread_id: &str, checkpoint_ns: &str) -> Self {
        Self {
            thread_id: thread_id.to_string(),
            checkpoint_ns: checkpoint_ns.to_string(),
            checkpoint_id: None,
        }
    }

    pub fn is_nested(&self) -> bool {
        !self.checkpoint_ns.is_empty()
    }

    /// `"<outer>:"` when the namespace has more than one segment, else empty
    pub fn step_prefix(&self) -> String {
        match self.checkpoint_ns.split_once(':') {
            Some((outer, _)) => format!("{}:", outer),
            None => String::new(),
        }
    }
}

/// A task scheduled at a snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotTask {
    pub name: String,
    /// Non-empty when the task suspended execution
    #[serde(default)]
    pub interrupts: Vec<Value>,
    /// Handle of the nested execution this task runs, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<ExecutionHandle>,
}

impl SnapshotTask {
    pub fn new(name: &str) -> Self {
        Self { name: name.to_string(), interrupts: Vec::new(), state: None }
    }

    pub fn with_interrupt(mut self, value: Value) -> Self {
        self.interrupts.push(value);
        self
    }

    pub fn with_state(mut self, state: ExecutionHandle) -> Self {
        self.state = Some(state);
        self
    }

    pub fn is_interrupted(&self) -> bool {
        !self.interrupts.is_empty()
    }

    /// Handle of a nested execution to fetch history for
    pub fn nested_handle(&self) -> Option<&ExecutionHandle> {
        self.state.as_ref().filter(|s| s.is_nested())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapshotMetadata {
    /// `"input"` for fresh external input
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub writes: Option<Value>,
    #[serde(default)]
    pub step: Option<i64>,
}

/// State of an execution at one checkpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    /// State payload
    #[serde(default)]
    pub values: Value,
    /// Steps pending after this checkpoint
    #[serde(default)]
    pub next: Vec<String>,
    #[serde(default)]
    pub tasks: Vec<SnapshotTask>,
    #[serde(default)]
    pub config: ExecutionHandle,
    #[serde(default)]
    pub metadata: Option<SnapshotMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl StateSnapshot {
    pub fn new(config: ExecutionHandle, values: Value) -> Self {
        Self {
            values,
            next: Vec::new(),
            tasks: Vec::new(),
            config,
            metadata: None,
            created_at: Some(Utc::now()),
        }
    }

    pub fn with_next(mut self, next: &[&str]) -> Self {
        self.next = next.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_task(mut self, task: SnapshotTask) -> Self {
        self.tasks.push(task);
        self
    }

    pub fn with_metadata(mut self, source: &str, writes: Option<Value>) -> Self {
        self.metadata =
            Some(SnapshotMetadata { source: Some(source.to_string()), writes, step: None });
        self
    }

    pub fn has_interrupts(&self) -> bool {
        self.tasks.iter().any(SnapshotTask::is_interrupted)
    }

    pub fn is_input(&self) -> bool {
        self.metadata.as_ref().and_then(|m| m.source.as_deref()) == Some(INPUT_SOURCE)
    }
}

/// Input for one round: external writes, or resumption after an interrupt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum RoundInput {
    Writes(Value),
    Resuming,
}

impl From<Value> for RoundInput {
    fn from(value: Value) -> Self {
        match value {
            Value::String(s) if s == RESUMING => Self::Resuming,
            other => Self::Writes(other),
        }
    }
}

impl From<RoundInput> for Value {
    fn from(input: RoundInput) -> Self {
        match input {
            RoundInput::Writes(value) => value,
            RoundInput::Resuming => Value::String(RESUMING.to_string()),
        }
    }
}

/// Steps and results per round
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphTrajectory {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inputs: Option<Vec<RoundInput>>,
    #[serde(default)]
    pub results: Vec<Value>,
    pub steps: Vec<Vec<String>>,
}

impl GraphTrajectory {
    /// A trajectory with steps only, one empty result per round
    pub fn from_steps<I, R, S>(steps: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let steps: Vec<Vec<String>> =
            steps.into_iter().map(|r| r.into_iter().map(Into::into).collect()).collect();
        let results = vec![Value::Object(Default::default()); steps.len()];
        Self { inputs: None, results, steps }
    }

    /// All step names in order, round boundaries dropped
    pub fn flat_steps(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().flatten().map(String::as_str)
    }
}

/// Result of reconstructing a trajectory from snapshots
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedGraphTrajectory {
    pub inputs: Vec<RoundInput>,
    pub outputs: GraphTrajectory,
}

impl ExtractedGraphTrajectory {
    /// Whether inputs, results and steps have one entry per round
    pub fn is_aligned(&self) -> bool {
        self.inputs.len() == self.outputs.results.len()
            && self.inputs.len() == self.outputs.steps.len()
    }

    /// The outputs with the extracted inputs attached
    pub fn into_trajectory(self) -> GraphTrajectory {
        GraphTrajectory { inputs: Some(self.inputs), ..self.outputs }
    }
}
