//! Flat trajectory matching
//!
//! Compares two message lists under one of four [`TrajectoryMatchMode`]s.
//! Tool calls are paired greedily: each reference call claims the first
//! unclaimed output call with the same name and equivalent arguments. This is
//! deterministic in input order but not an optimal assignment, so an early
//! claim can block a pairing that a full bipartite matching would find.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use trajeval_core::{
    EvalError, EvaluatorResult, Message, Result, ToolCall, extract_tool_calls, normalize_messages,
    run_single_evaluator,
};

use crate::tool_args::{ToolArgsMatchMode, ToolArgsMatcher, ToolArgsOverride};

/// How two trajectories are compared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrajectoryMatchMode {
    /// Same messages in the same order with matching tool calls
    #[default]
    Strict,
    /// Same multiset of tool calls, any order
    Unordered,
    /// Every output tool call appears in the reference
    Subset,
    /// Every reference tool call appears in the output
    Superset,
}

impl TrajectoryMatchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Unordered => "unordered",
            Self::Subset => "subset",
            Self::Superset => "superset",
        }
    }
}

impl fmt::Display for TrajectoryMatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TrajectoryMatchMode {
    type Err = EvalError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "strict" => Ok(Self::Strict),
            "unordered" => Ok(Self::Unordered),
            "subset" => Ok(Self::Subset),
            "superset" => Ok(Self::Superset),
            other => {
                Err(EvalError::InvalidMode(format!("Invalid trajectory match type: {}", other)))
            }
        }
    }
}

/// Trajectory evaluator for one match mode
#[derive(Debug, Clone, Default)]
pub struct TrajectoryMatcher {
    mode: TrajectoryMatchMode,
    tool_args: ToolArgsMatcher,
    feedback_key: Option<String>,
}

impl TrajectoryMatcher {
    /// Create a matcher with exact tool-argument matching
    pub fn new(mode: TrajectoryMatchMode) -> Self {
        Self { mode, tool_args: ToolArgsMatcher::default(), feedback_key: None }
    }

    /// Create a matcher from a mode name
    pub fn from_mode_str(mode: &str) -> Result<Self> {
        Ok(Self::new(mode.parse()?))
    }

    /// Set the global tool-argument mode, keeping overrides
    pub fn with_tool_args_mode(mut self, mode: ToolArgsMatchMode) -> Self {
        let mut tool_args = ToolArgsMatcher::new(mode);
        for (tool, override_) in self.tool_args.overrides() {
            tool_args = tool_args.with_override(tool, override_.clone());
        }
        self.tool_args = tool_args;
        self
    }

    pub fn with_tool_args_override(mut self, tool_name: &str, override_: ToolArgsOverride) -> Self {
        self.tool_args = self.tool_args.with_override(tool_name, override_);
        self
    }

    pub fn with_tool_args_matcher(mut self, tool_args: ToolArgsMatcher) -> Self {
        self.tool_args = tool_args;
        self
    }

    /// Report under a custom feedback key
    pub fn with_feedback_key(mut self, key: impl Into<String>) -> Self {
        self.feedback_key = Some(key.into());
        self
    }

    pub fn mode(&self) -> TrajectoryMatchMode {
        self.mode
    }

    pub fn tool_args(&self) -> &ToolArgsMatcher {
        &self.tool_args
    }

    /// Key results are reported under, `trajectory_<mode>_match` by default
    pub fn feedback_key(&self) -> String {
        self.feedback_key.clone().unwrap_or_else(|| format!("trajectory_{}_match", self.mode))
    }

    /// Compare two canonical trajectories
    pub async fn score(&self, outputs: &[Message], reference: &[Message]) -> bool {
        let matched = match self.mode {
            TrajectoryMatchMode::Strict => strict_match(outputs, reference, &self.tool_args).await,
            TrajectoryMatchMode::Unordered => {
                is_trajectory_superset(outputs, reference, &self.tool_args).await
                    && is_trajectory_superset(reference, outputs, &self.tool_args).await
            }
            TrajectoryMatchMode::Subset => {
                is_trajectory_superset(reference, outputs, &self.tool_args).await
            }
            TrajectoryMatchMode::Superset => {
                is_trajectory_superset(outputs, reference, &self.tool_args).await
            }
        };
        tracing::debug!(mode = %self.mode, matched, "trajectory compared");
        matched
    }

    /// Normalize raw inputs and evaluate them
    ///
    /// Either side being absent is an error, as is an input that is neither a
    /// message list nor an object with a `messages` list.
    pub async fn evaluate(
        &self,
        outputs: Option<&Value>,
        reference_outputs: Option<&Value>,
    ) -> Result<EvaluatorResult> {
        let (Some(outputs), Some(reference_outputs)) = (outputs, reference_outputs) else {
            return Err(EvalError::MissingTrajectory(format!(
                "{} trajectory match requires both outputs and reference_outputs",
                self.mode
            )));
        };
        let outputs = normalize_messages(Some(outputs))?;
        let reference_outputs = normalize_messages(Some(reference_outputs))?;
        self.evaluate_messages(&outputs, &reference_outputs).await
    }

    /// Evaluate already-canonical trajectories
    pub async fn evaluate_messages(
        &self,
        outputs: &[Message],
        reference_outputs: &[Message],
    ) -> Result<EvaluatorResult> {
        let key = self.feedback_key();
        run_single_evaluator(&key, &key, async {
            Ok::<_, EvalError>(self.score(outputs, reference_outputs).await)
        })
        .await
    }
}

/// Whether every tool call in `reference` has a distinct equivalent call in
/// `outputs`
///
/// Calls are flattened across messages in order. Each reference call claims
/// the first unclaimed output call with the same name whose arguments match;
/// claims are never revisited.
pub async fn is_trajectory_superset(
    outputs: &[Message],
    reference: &[Message],
    tool_args: &ToolArgsMatcher,
) -> bool {
    let output_calls = extract_tool_calls(outputs);
    let reference_calls = extract_tool_calls(reference);
    claim_all(&output_calls, &reference_calls, tool_args).await
}

/// Greedily pair each of `wanted` with an unclaimed call in `available`
async fn claim_all(
    available: &[&ToolCall],
    wanted: &[&ToolCall],
    tool_args: &ToolArgsMatcher,
) -> bool {
    let mut claimed = vec![false; available.len()];

    for want in wanted {
        let mut found = false;
        for (idx, candidate) in available.iter().enumerate() {
            if claimed[idx] || candidate.name != want.name {
                continue;
            }
            // Arguments are (candidate, want): the output side comes first.
            if tool_args.matches(&want.name, &candidate.args, &want.args).await {
                claimed[idx] = true;
                found = true;
                break;
            }
        }
        if !found {
            tracing::debug!(tool = %want.name, "no matching tool call");
            return false;
        }
    }
    true
}

/// Strict comparison
///
/// Message counts, roles and presence of tool calls must agree index by
/// index. Within one message the tool calls may appear in any order but must
/// pair up one-to-one.
pub async fn strict_match(
    outputs: &[Message],
    reference: &[Message],
    tool_args: &ToolArgsMatcher,
) -> bool {
    if outputs.len() != reference.len() {
        return false;
    }

    for (output, reference) in outputs.iter().zip(reference) {
        if output.role != reference.role || output.has_tool_calls() != reference.has_tool_calls() {
            return false;
        }
        if !output.has_tool_calls() {
            continue;
        }
        if output.tool_calls().len() != reference.tool_calls().len() {
            return false;
        }

        let mut seen = vec![false; reference.tool_calls().len()];
        for output_call in output.tool_calls() {
            let mut found = false;
            for (idx, reference_call) in reference.tool_calls().iter().enumerate() {
                if seen[idx] || output_call.name != reference_call.name {
                    continue;
                }
                let matched = tool_args
                    .matches(&output_call.name, &output_call.args, &reference_call.args)
                    .await;
                if matched {
                    seen[idx] = true;
                    found = true;
                    break;
                }
            }
            if !found {
                return false;
            }
        }
    }
    true
}
