//! # trajeval-graph
//!
//! Evaluate graph-structured agents from their execution snapshots.
//!
//! - **Extraction**: rebuild per-round `{inputs, steps, results}` from a state
//!   history, including nested sub-executions and human-in-the-loop
//!   interrupts ([`extract_trajectory`])
//! - **Matching**: compare two [`GraphTrajectory`] values
//!   ([`GraphTrajectoryMatcher`])
//! - **Judging**: grade a trajectory with an LLM ([`GraphTrajectoryJudge`])
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use trajeval_graph::{ExecutionHandle, extract_trajectory, graph_trajectory_strict_match};
//!
//! let extracted = extract_trajectory(&provider, &ExecutionHandle::new("thread-1")).await?;
//! let result = graph_trajectory_strict_match(Some(&extracted.outputs), Some(&reference)).await?;
//! ```

pub mod extract;
pub mod history;
pub mod llm;
pub mod matcher;
pub mod snapshot;

pub use extract::{extract_trajectory, extract_trajectory_from_snapshots};
pub use history::{MemoryHistoryProvider, StateHistoryProvider, collect_state_history};
pub use llm::{
    GRAPH_TRAJECTORY_ACCURACY_PROMPT, GraphJudgeConfig, GraphTrajectoryJudge, format_thread,
};
pub use matcher::{
    GraphTrajectoryMatchMode, GraphTrajectoryMatcher, graph_trajectory_strict_match,
    is_graph_trajectory_superset, steps_strict_match,
};
pub use snapshot::{
    ExecutionHandle, ExtractedGraphTrajectory, GraphTrajectory, INPUT_SOURCE, INTERRUPT,
    RESUMING, RoundInput, SnapshotMetadata, SnapshotTask, StateSnapshot,
};
