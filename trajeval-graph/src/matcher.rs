//! Graph trajectory matching
//!
//! Strict matching compares steps round by round. The other modes compare
//! the multiset of step names across all rounds. Results are never compared.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use trajeval_core::{EvalError, EvaluatorResult, Result, run_single_evaluator};

use crate::snapshot::GraphTrajectory;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GraphTrajectoryMatchMode {
    /// Same steps in the same rounds and order
    #[default]
    Strict,
    /// Same step names with the same multiplicities
    Unordered,
    /// Every output step name occurs in the reference
    Subset,
    /// Every reference step name occurs in the output
    Superset,
}

impl GraphTrajectoryMatchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Unordered => "unordered",
            Self::Subset => "subset",
            Self::Superset => "superset",
        }
    }
}

impl fmt::Display for GraphTrajectoryMatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GraphTrajectoryMatchMode {
    type Err = EvalError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "strict" => Ok(Self::Strict),
            "unordered" => Ok(Self::Unordered),
            "subset" => Ok(Self::Subset),
            "superset" => Ok(Self::Superset),
            other => Err(EvalError::InvalidMode(format!(
                "Invalid graph trajectory match type: {}",
                other
            ))),
        }
    }
}

/// Round-by-round step equality
pub fn steps_strict_match(outputs: &GraphTrajectory, reference: &GraphTrajectory) -> bool {
    outputs.steps.len() == reference.steps.len()
        && outputs.steps.iter().zip(&reference.steps).all(|(a, b)| a == b)
}

fn step_counts(trajectory: &GraphTrajectory) -> HashMap<&str, usize> {
    let mut counts = HashMap::new();
    for step in trajectory.flat_steps() {
        *counts.entry(step).or_insert(0) += 1;
    }
    counts
}

/// Every step name occurs in `outputs` at least as often as in `reference`
pub fn is_graph_trajectory_superset(
    outputs: &GraphTrajectory,
    reference: &GraphTrajectory,
) -> bool {
    let available = step_counts(outputs);
    step_counts(reference)
        .into_iter()
        .all(|(step, needed)| available.get(step).copied().unwrap_or(0) >= needed)
}

/// Graph trajectory evaluator for one match mode
#[derive(Debug, Clone, Default)]
pub struct GraphTrajectoryMatcher {
    mode: GraphTrajectoryMatchMode,
    feedback_key: Option<String>,
}

impl GraphTrajectoryMatcher {
    pub fn new(mode: GraphTrajectoryMatchMode) -> Self {
        Self { mode, feedback_key: None }
    }

    pub fn from_mode_str(mode: &str) -> Result<Self> {
        Ok(Self::new(mode.parse()?))
    }

    pub fn with_feedback_key(mut self, key: impl Into<String>) -> Self {
        self.feedback_key = Some(key.into());
        self
    }

    pub fn mode(&self) -> GraphTrajectoryMatchMode {
        self.mode
    }

    /// `graph_trajectory_<mode>_match` unless overridden
    pub fn feedback_key(&self) -> String {
        self.feedback_key.clone().unwrap_or_else(|| format!("graph_trajectory_{}_match", self.mode))
    }

    pub fn score(&self, outputs: &GraphTrajectory, reference: &GraphTrajectory) -> bool {
        let matched = match self.mode {
            GraphTrajectoryMatchMode::Strict => steps_strict_match(outputs, reference),
            GraphTrajectoryMatchMode::Unordered => {
                is_graph_trajectory_superset(outputs, reference)
                    && is_graph_trajectory_superset(reference, outputs)
            }
            GraphTrajectoryMatchMode::Subset => is_graph_trajectory_superset(reference, outputs),
            GraphTrajectoryMatchMode::Superset => is_graph_trajectory_superset(outputs, reference),
        };
        tracing::debug!(mode = %self.mode, matched, "graph trajectory compared");
        matched
    }

    /// Evaluate two trajectories, either of which may be absent
    pub async fn evaluate(
        &self,
        outputs: Option<&GraphTrajectory>,
        reference_outputs: Option<&GraphTrajectory>,
    ) -> Result<EvaluatorResult> {
        let (Some(outputs), Some(reference_outputs)) = (outputs, reference_outputs) else {
            return Err(EvalError::MissingTrajectory(format!(
                "graph trajectory {} match requires both outputs and reference_outputs",
                self.mode
            )));
        };
        let key = self.feedback_key();
        run_single_evaluator(&key, &key, async {
            Ok::<_, EvalError>(self.score(outputs, reference_outputs))
        })
        .await
    }

    /// Evaluate trajectories given in their external JSON shape
    pub async fn evaluate_value(
        &self,
        outputs: Option<&Value>,
        reference_outputs: Option<&Value>,
    ) -> Result<EvaluatorResult> {
        let outputs = outputs.map(parse_trajectory).transpose()?;
        let reference_outputs = reference_outputs.map(parse_trajectory).transpose()?;
        self.evaluate(outputs.as_ref(), reference_outputs.as_ref()).await
    }
}

fn parse_trajectory(value: &Value) -> Result<GraphTrajectory> {
    GraphTrajectory::deserialize(value)
        .map_err(|e| EvalError::InputShape(format!("invalid graph trajectory: {}", e)))
}

/// Strict step-for-step comparison, reported as `graph_trajectory_strict_match`
pub async fn graph_trajectory_strict_match(
    outputs: Option<&GraphTrajectory>,
    reference_outputs: Option<&GraphTrajectory>,
) -> Result<EvaluatorResult> {
    GraphTrajectoryMatcher::new(GraphTrajectoryMatchMode::Strict)
        .evaluate(outputs, reference_outputs)
        .await
}
