//! Evaluator results
//!
//! Every matcher and judge adapter reports through [`run_evaluator`], which
//! turns a raw score (or a set of named sub-scores) into uniform
//! `{key, score, comment}` records and forwards them to the active test
//! tracker, if any.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;
use tracing::Instrument;

use crate::error::{EvalError, Result};
use crate::tracking;

/// A score: pass/fail or continuous
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Score {
    Bool(bool),
    Number(f64),
}

impl Score {
    /// Numeric view, `true` counting as 1.0
    pub fn as_f64(&self) -> f64 {
        match self {
            Self::Bool(true) => 1.0,
            Self::Bool(false) => 0.0,
            Self::Number(n) => *n,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::Number(_) => None,
        }
    }
}

impl From<bool> for Score {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for Score {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

/// A score with optional reasoning, as produced by a scorer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreValue {
    pub score: Score,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}

impl ScoreValue {
    pub fn new(score: impl Into<Score>) -> Self {
        Self { score: score.into(), reasoning: None }
    }

    pub fn with_reasoning(mut self, reasoning: impl Into<String>) -> Self {
        self.reasoning = Some(reasoning.into());
        self
    }

    /// Interpret a raw JSON sub-score: a boolean, a number, or an object
    /// carrying `score` and an optional string `reasoning`.
    pub fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Bool(b) => Ok(Self::new(*b)),
            Value::Number(n) => n
                .as_f64()
                .map(Self::new)
                .ok_or_else(|| EvalError::InputShape(format!("score {} is not finite", n))),
            Value::Object(map) => {
                let score = map.get("score").ok_or_else(|| {
                    EvalError::InputShape(format!(
                        "Expected a dictionary with a \"score\" key, but got {}",
                        value
                    ))
                })?;
                let mut parsed = Self::from_value(score)?;
                parsed.reasoning = map.get("reasoning").and_then(Value::as_str).map(String::from);
                Ok(parsed)
            }
            other => Err(EvalError::InputShape(format!(
                "Expected a boolean, number or object score, but got {}",
                other
            ))),
        }
    }
}

impl From<bool> for ScoreValue {
    fn from(value: bool) -> Self {
        Self::new(value)
    }
}

impl From<f64> for ScoreValue {
    fn from(value: f64) -> Self {
        Self::new(value)
    }
}

/// Raw scorer output before it is wrapped into records
#[derive(Debug, Clone, PartialEq)]
pub enum ScorerOutput {
    Single(ScoreValue),
    /// Named sub-scores, reported in order
    Multi(Vec<(String, ScoreValue)>),
}

impl ScorerOutput {
    /// Interpret a raw JSON scorer output
    ///
    /// An object with a `score` key is a single score; any other object is a
    /// mapping of named sub-scores.
    pub fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Object(map) if !map.contains_key("score") => map
                .iter()
                .map(|(name, v)| ScoreValue::from_value(v).map(|s| (name.clone(), s)))
                .collect::<Result<Vec<_>>>()
                .map(Self::Multi),
            other => ScoreValue::from_value(other).map(Self::Single),
        }
    }
}

impl From<ScoreValue> for ScorerOutput {
    fn from(value: ScoreValue) -> Self {
        Self::Single(value)
    }
}

impl From<bool> for ScorerOutput {
    fn from(value: bool) -> Self {
        Self::Single(value.into())
    }
}

impl From<f64> for ScorerOutput {
    fn from(value: f64) -> Self {
        Self::Single(value.into())
    }
}

/// A single feedback record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluatorResult {
    /// Feedback key the score is reported under
    pub key: String,
    pub score: Score,
    /// Explanation, typically the judge's reasoning
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub metadata: Option<Value>,
}

impl EvaluatorResult {
    pub fn new(key: &str, score: impl Into<Score>) -> Self {
        Self { key: key.to_string(), score: score.into(), comment: None, metadata: None }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    fn from_score_value(key: &str, value: ScoreValue) -> Self {
        Self { key: key.to_string(), score: value.score, comment: value.reasoning, metadata: None }
    }
}

/// Wrapped output of an evaluator run
#[derive(Debug, Clone, PartialEq)]
pub enum EvaluationOutcome {
    Single(EvaluatorResult),
    Multiple(Vec<EvaluatorResult>),
}

impl EvaluationOutcome {
    /// All records, in report order
    pub fn results(&self) -> &[EvaluatorResult] {
        match self {
            Self::Single(result) => std::slice::from_ref(result),
            Self::Multiple(results) => results,
        }
    }

    /// The single record, or `None` when the scorer produced named sub-scores
    pub fn into_single(self) -> Option<EvaluatorResult> {
        match self {
            Self::Single(result) => Some(result),
            Self::Multiple(_) => None,
        }
    }
}

impl From<(&str, ScorerOutput)> for EvaluationOutcome {
    fn from((feedback_key, output): (&str, ScorerOutput)) -> Self {
        match output {
            ScorerOutput::Single(value) => {
                Self::Single(EvaluatorResult::from_score_value(feedback_key, value))
            }
            ScorerOutput::Multi(values) => Self::Multiple(
                values
                    .into_iter()
                    .map(|(name, value)| EvaluatorResult::from_score_value(&name, value))
                    .collect(),
            ),
        }
    }
}

/// Run a scorer and wrap its output
///
/// Scorer failures propagate unchanged. When a tracking scope is active the
/// records are forwarded to the tracker under `run_name`.
pub async fn run_evaluator<F, O>(
    run_name: &str,
    feedback_key: &str,
    scorer: F,
) -> Result<EvaluationOutcome>
where
    F: Future<Output = Result<O>>,
    O: Into<ScorerOutput>,
{
    let span = trajeval_telemetry::evaluator_run_span(run_name, feedback_key);
    async {
        let output = scorer.await?.into();
        let outcome = EvaluationOutcome::from((feedback_key, output));
        tracing::debug!(results = ?outcome.results(), "evaluator finished");
        tracking::record_if_active(run_name, outcome.results()).await?;
        Ok(outcome)
    }
    .instrument(span)
    .await
}

/// Run a scorer that yields one score and return its single record
pub async fn run_single_evaluator<F, O>(
    run_name: &str,
    feedback_key: &str,
    scorer: F,
) -> Result<EvaluatorResult>
where
    F: Future<Output = Result<O>>,
    O: Into<ScoreValue>,
{
    run_evaluator(run_name, feedback_key, async {
        scorer.await.map(|o| ScorerOutput::Single(o.into()))
    })
    .await?
    .into_single()
    .ok_or_else(|| EvalError::InputShape(format!("{} produced more than one score", run_name)))
}
