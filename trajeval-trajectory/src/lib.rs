//! # trajeval-trajectory
//!
//! Compare an agent's message trajectory with a reference.
//!
//! ## Match modes
//!
//! - **strict**: same messages in the same order, tool calls paired per message
//! - **unordered**: same tool calls, any order
//! - **subset**: the agent called no tool the reference did not
//! - **superset**: the agent called every tool the reference did
//!
//! Tool arguments are compared with a [`ToolArgsMatchMode`], replaceable per
//! tool by a [`ToolArgsOverride`].
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use trajeval_trajectory::{ToolArgsMatchMode, TrajectoryMatchMode, TrajectoryMatcher};
//!
//! let matcher = TrajectoryMatcher::new(TrajectoryMatchMode::Unordered)
//!     .with_tool_args_mode(ToolArgsMatchMode::Ignore);
//!
//! let result = matcher.evaluate(Some(&outputs), Some(&reference_outputs)).await?;
//! assert_eq!(result.key, "trajectory_unordered_match");
//! ```

pub mod config;
pub mod deprecated;
pub mod llm;
pub mod matcher;
pub mod tool_args;

pub use config::{ToolArgsOverrideConfig, TrajectoryMatchConfig};
#[allow(deprecated)]
pub use deprecated::{
    trajectory_strict_match, trajectory_subset, trajectory_superset, trajectory_unordered_match,
};
pub use llm::{
    DEFAULT_TRAJECTORY_PROMPT, TrajectoryJudge, TrajectoryJudgeConfig, messages_to_string,
};
pub use matcher::{TrajectoryMatchMode, TrajectoryMatcher, is_trajectory_superset, strict_match};
pub use tool_args::{
    ArgsPredicate, ToolArgsMatchMode, ToolArgsMatcher, ToolArgsOverride, values_equal,
};
