//! # trajeval-core
//!
//! Shared building blocks for trajectory evaluation.
//!
//! - **Messages**: the canonical [`Message`] / [`ToolCall`] shape every
//!   comparison operates on, plus [`normalize_messages`] for raw inputs
//! - **Results**: [`run_evaluator`] wraps raw scores into feedback records
//! - **Judges**: the [`JudgeModel`] seam used by LLM-as-judge adapters
//! - **Tracking**: forward feedback to an [`EvaluationTracker`] inside a
//!   [`tracking::scope`]
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use trajeval_core::{normalize_messages, run_evaluator};
//! use serde_json::json;
//!
//! let messages = normalize_messages(Some(&json!({"messages": [
//!     {"role": "user", "content": "hi"}
//! ]})))?;
//!
//! let result = run_evaluator("my_check", "my_check", async move {
//!     Ok(messages.len() == 1)
//! })
//! .await?;
//! ```

pub mod error;
pub mod judge;
pub mod message;
pub mod normalize;
pub mod result;
pub mod tracking;

pub use error::{EvalError, Result};
pub use judge::{
    FewShotExample, JudgeModel, JudgeRequest, PromptedJudge, TextCompletion,
    append_few_shot_examples, render_template,
};
pub use message::{Message, Role, ToolArgs, ToolCall, extract_tool_calls};
pub use normalize::{
    MESSAGES_KEY, generate_tool_call_id, normalize_message_list, normalize_messages,
};
pub use result::{
    EvaluationOutcome, EvaluatorResult, Score, ScoreValue, ScorerOutput, run_evaluator,
    run_single_evaluator,
};
pub use tracking::{EvaluationTracker, MemoryTracker, TrackedFeedback};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::error::{EvalError, Result};
    pub use crate::judge::{
        FewShotExample, JudgeModel, JudgeRequest, PromptedJudge, TextCompletion,
    };
    pub use crate::message::{Message, Role, ToolCall};
    pub use crate::normalize::normalize_messages;
    pub use crate::result::{EvaluationOutcome, EvaluatorResult, Score, ScoreValue};
    pub use crate::tracking::{EvaluationTracker, MemoryTracker};
}
