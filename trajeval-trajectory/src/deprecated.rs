//! Single-mode entry points from the older API
//!
//! Each wraps a [`TrajectoryMatcher`] and reports under its historical
//! feedback key.

use serde_json::Value;

use trajeval_core::{EvaluatorResult, Result};

use crate::matcher::{TrajectoryMatchMode, TrajectoryMatcher};
use crate::tool_args::ToolArgsMatchMode;

async fn run(
    mode: TrajectoryMatchMode,
    tool_args_mode: ToolArgsMatchMode,
    key: &str,
    outputs: Option<&Value>,
    reference_outputs: Option<&Value>,
) -> Result<EvaluatorResult> {
    TrajectoryMatcher::new(mode)
        .with_tool_args_mode(tool_args_mode)
        .with_feedback_key(key)
        .evaluate(outputs, reference_outputs)
        .await
}

#[deprecated(note = "use TrajectoryMatcher::new(TrajectoryMatchMode::Strict)")]
pub async fn trajectory_strict_match(
    outputs: Option<&Value>,
    reference_outputs: Option<&Value>,
    tool_call_args_exact_match: bool,
) -> Result<EvaluatorResult> {
    let tool_args_mode = if tool_call_args_exact_match {
        ToolArgsMatchMode::Exact
    } else {
        ToolArgsMatchMode::Ignore
    };
    run(
        TrajectoryMatchMode::Strict,
        tool_args_mode,
        "trajectory_strict_match",
        outputs,
        reference_outputs,
    )
    .await
}

#[deprecated(note = "use TrajectoryMatcher::new(TrajectoryMatchMode::Unordered)")]
pub async fn trajectory_unordered_match(
    outputs: Option<&Value>,
    reference_outputs: Option<&Value>,
) -> Result<EvaluatorResult> {
    run(
        TrajectoryMatchMode::Unordered,
        ToolArgsMatchMode::Ignore,
        "trajectory_unordered_match",
        outputs,
        reference_outputs,
    )
    .await
}

#[deprecated(note = "use TrajectoryMatcher::new(TrajectoryMatchMode::Subset)")]
pub async fn trajectory_subset(
    outputs: Option<&Value>,
    reference_outputs: Option<&Value>,
) -> Result<EvaluatorResult> {
    run(
        TrajectoryMatchMode::Subset,
        ToolArgsMatchMode::Ignore,
        "trajectory_subset",
        outputs,
        reference_outputs,
    )
    .await
}

#[deprecated(note = "use TrajectoryMatcher::new(TrajectoryMatchMode::Superset)")]
pub async fn trajectory_superset(
    outputs: Option<&Value>,
    reference_outputs: Option<&Value>,
) -> Result<EvaluatorResult> {
    run(
        TrajectoryMatchMode::Superset,
        ToolArgsMatchMode::Ignore,
        "trajectory_superset",
        outputs,
        reference_outputs,
    )
    .await
}

#[cfg(test)]
#[allow(deprecated)]
mod tests {
    use super::*;
    use serde_json::json;
    use trajeval_core::Score;

    fn call(city: &str) -> Value {
        let arguments = json!({"city": city}).to_string();
        json!({
            "role": "assistant",
            "content": "",
            "tool_calls": [{"function": {"name": "get_weather", "arguments": arguments}}]
        })
    }

    #[tokio::test]
    async fn test_strict_match_exact_flag() {
        let outputs = json!([call("SF")]);
        let reference = json!([call("San Francisco")]);

        let exact = trajectory_strict_match(Some(&outputs), Some(&reference), true).await.unwrap();
        assert_eq!(exact.key, "trajectory_strict_match");
        assert_eq!(exact.score, Score::Bool(false));

        let loose = trajectory_strict_match(Some(&outputs), Some(&reference), false).await.unwrap();
        assert_eq!(loose.score, Score::Bool(true));
    }

    #[tokio::test]
    async fn test_legacy_keys_ignore_args() {
        let outputs = json!([call("SF"), call("London")]);
        let reference = json!([call("Paris")]);

        let result = trajectory_superset(Some(&outputs), Some(&reference)).await.unwrap();
        assert_eq!(result.key, "trajectory_superset");
        assert_eq!(result.score, Score::Bool(true));

        let result = trajectory_subset(Some(&outputs), Some(&reference)).await.unwrap();
        assert_eq!(result.key, "trajectory_subset");
        assert_eq!(result.score, Score::Bool(false));

        let result = trajectory_unordered_match(Some(&outputs), Some(&reference)).await.unwrap();
        assert_eq!(result.key, "trajectory_unordered_match");
        assert_eq!(result.score, Score::Bool(false));
    }
}
