//! # trajeval
//!
//! Evaluate AI agent trajectories against references.
//!
//! ## Overview
//!
//! An agent's run leaves a trajectory: the messages and tool calls it made,
//! or, for graph-structured agents, the steps it executed in each round.
//! This crate compares such trajectories with a reference, or hands them to an
//! LLM judge, and reports uniform `{key, score, comment}` feedback.
//!
//! | Feature | Provides |
//! |---|---|
//! | `trajectory` (default) | strict / unordered / subset / superset message matching |
//! | `graph` (default) | trajectory extraction from execution snapshots and graph matching |
//! | `telemetry` | `tracing` subscriber setup and span helpers |
//! | `full` | all of the above |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use trajeval::prelude::*;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let outputs = json!([
//!         {"role": "user", "content": "What is the weather in SF?"},
//!         {"role": "assistant", "content": "", "tool_calls": [
//!             {"function": {"name": "get_weather", "arguments": "{\"city\": \"SF\"}"}}
//!         ]},
//!         {"role": "tool", "content": "80 degrees and sunny"},
//!         {"role": "assistant", "content": "It is 80 degrees and sunny in SF."}
//!     ]);
//!
//!     let matcher = TrajectoryMatcher::new(TrajectoryMatchMode::Superset)
//!         .with_tool_args_mode(ToolArgsMatchMode::Ignore);
//!     let result = matcher.evaluate(Some(&outputs), Some(&outputs)).await?;
//!     assert_eq!(result.score, Score::Bool(true));
//!     Ok(())
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]

// ============================================================================
// Core (always available)
// ============================================================================

/// Messages, results, judge and tracking seams, errors.
pub use trajeval_core::*;

pub use async_trait::async_trait;
pub use futures;
pub use serde;
pub use serde_json;
pub use tokio;

// ============================================================================
// Component Modules (feature-gated)
// ============================================================================

/// Message-trajectory matching and the trajectory LLM judge.
///
/// Available with feature: `trajectory`
#[cfg(feature = "trajectory")]
#[cfg_attr(docsrs, doc(cfg(feature = "trajectory")))]
pub mod trajectory {
    pub use trajeval_trajectory::*;
}

/// Graph-trajectory extraction, matching and judging.
///
/// Available with feature: `graph`
#[cfg(feature = "graph")]
#[cfg_attr(docsrs, doc(cfg(feature = "graph")))]
pub mod graph {
    pub use trajeval_graph::*;
}

/// Logging setup and span helpers.
///
/// Available with feature: `telemetry`
#[cfg(feature = "telemetry")]
#[cfg_attr(docsrs, doc(cfg(feature = "telemetry")))]
pub mod telemetry {
    pub use trajeval_telemetry::*;
}

/// Convenience prelude
pub mod prelude {
    pub use crate::{
        EvalError, EvaluationOutcome, EvaluationTracker, EvaluatorResult, JudgeModel,
        JudgeRequest, MemoryTracker, Message, PromptedJudge, Result, Role, Score, ScoreValue,
        TextCompletion, ToolCall, normalize_messages, run_evaluator,
    };

    #[cfg(feature = "trajectory")]
    pub use crate::trajectory::{
        ToolArgsMatchMode, ToolArgsOverride, TrajectoryJudge, TrajectoryMatchConfig,
        TrajectoryMatchMode, TrajectoryMatcher,
    };

    #[cfg(feature = "graph")]
    pub use crate::graph::{
        ExecutionHandle, GraphTrajectory, GraphTrajectoryJudge, GraphTrajectoryMatchMode,
        GraphTrajectoryMatcher, MemoryHistoryProvider, StateHistoryProvider, StateSnapshot,
        extract_trajectory, graph_trajectory_strict_match,
    };

    #[cfg(feature = "telemetry")]
    pub use crate::telemetry::{init_json_telemetry, init_telemetry};

    pub use crate::async_trait;
}
