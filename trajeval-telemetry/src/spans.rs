//! Span helpers for common evaluation operations
//!
//! Provides pre-configured spans for instrumenting evaluator runs, judge calls
//! and state-history fetches.

use tracing::Span;

/// Create a span for a single evaluator run
///
/// # Arguments
/// * `run_name` - Name of the evaluator run (e.g. `trajectory_strict_match`)
/// * `feedback_key` - Key the resulting score is reported under
///
/// # Example
/// ```
/// use trajeval_telemetry::evaluator_run_span;
/// let span = evaluator_run_span("trajectory_subset", "trajectory_subset");
/// let _enter = span.enter();
/// ```
pub fn evaluator_run_span(run_name: &str, feedback_key: &str) -> Span {
    tracing::info_span!(
        "evaluator.run",
        evaluator.run_name = run_name,
        evaluator.feedback_key = feedback_key,
        otel.kind = "internal"
    )
}

/// Create a span for an external judge call
///
/// # Example
/// ```
/// use trajeval_telemetry::judge_call_span;
/// let span = judge_call_span("trajectory_accuracy");
/// let _enter = span.enter();
/// ```
pub fn judge_call_span(feedback_key: &str) -> Span {
    tracing::info_span!("judge.call", judge.feedback_key = feedback_key, otel.kind = "client")
}

/// Create a span for a state-history fetch
///
/// # Arguments
/// * `thread_id` - Execution handle the history belongs to
/// * `checkpoint_ns` - Namespace of the (possibly nested) execution
pub fn history_fetch_span(thread_id: &str, checkpoint_ns: &str) -> Span {
    tracing::debug_span!(
        "history.fetch",
        history.thread_id = thread_id,
        history.checkpoint_ns = checkpoint_ns,
    )
}
