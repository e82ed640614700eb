//! Serializable trajectory-match configuration

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use trajeval_core::{EvalError, Result};

use crate::matcher::{TrajectoryMatchMode, TrajectoryMatcher};
use crate::tool_args::{ToolArgsMatchMode, ToolArgsMatcher, ToolArgsOverride};

/// A per-tool override expressible in configuration files
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ToolArgsOverrideConfig {
    Mode(ToolArgsMatchMode),
    KeyPaths(Vec<String>),
}

impl From<ToolArgsOverrideConfig> for ToolArgsOverride {
    fn from(config: ToolArgsOverrideConfig) -> Self {
        match config {
            ToolArgsOverrideConfig::Mode(mode) => Self::Mode(mode),
            ToolArgsOverrideConfig::KeyPaths(paths) => Self::KeyPaths(paths),
        }
    }
}

/// Configuration for a [`TrajectoryMatcher`]
///
/// ```json
/// {
///   "trajectory_match_mode": "unordered",
///   "tool_args_match_mode": "exact",
///   "tool_args_match_overrides": {
///     "search": "ignore",
///     "book_flight": ["itinerary.from", "itinerary.to"]
///   }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrajectoryMatchConfig {
    pub trajectory_match_mode: TrajectoryMatchMode,
    pub tool_args_match_mode: ToolArgsMatchMode,
    pub tool_args_match_overrides: BTreeMap<String, ToolArgsOverrideConfig>,
    /// Custom feedback key, `trajectory_<mode>_match` when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback_key: Option<String>,
}

/// File shape with modes left as strings, so unknown names surface as
/// `InvalidMode` rather than a parse error
#[derive(Default, Deserialize)]
#[serde(default)]
struct RawMatchConfig {
    trajectory_match_mode: Option<String>,
    tool_args_match_mode: Option<String>,
    tool_args_match_overrides: BTreeMap<String, RawOverride>,
    feedback_key: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawOverride {
    Mode(String),
    KeyPaths(Vec<String>),
}

impl TryFrom<RawMatchConfig> for TrajectoryMatchConfig {
    type Error = EvalError;

    fn try_from(raw: RawMatchConfig) -> Result<Self> {
        let tool_args_match_overrides = raw
            .tool_args_match_overrides
            .into_iter()
            .map(|(tool, override_)| -> Result<(String, ToolArgsOverrideConfig)> {
                let override_ = match override_ {
                    RawOverride::Mode(mode) => ToolArgsOverrideConfig::Mode(mode.parse()?),
                    RawOverride::KeyPaths(paths) => ToolArgsOverrideConfig::KeyPaths(paths),
                };
                Ok((tool, override_))
            })
            .collect::<Result<_>>()?;

        Ok(Self {
            trajectory_match_mode: raw
                .trajectory_match_mode
                .map(|mode| mode.parse())
                .transpose()?
                .unwrap_or_default(),
            tool_args_match_mode: raw
                .tool_args_match_mode
                .map(|mode| mode.parse())
                .transpose()?
                .unwrap_or_default(),
            tool_args_match_overrides,
            feedback_key: raw.feedback_key,
        })
    }
}

impl TrajectoryMatchConfig {
    pub fn new(mode: TrajectoryMatchMode) -> Self {
        Self { trajectory_match_mode: mode, ..Default::default() }
    }

    /// Load from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&content)
    }

    /// Parse a JSON document
    ///
    /// Malformed JSON is a `Config` error; an unknown mode name is `InvalidMode`.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: RawMatchConfig =
            serde_json::from_str(json).map_err(|e| EvalError::Config(e.to_string()))?;
        raw.try_into()
    }

    pub fn with_tool_args_mode(mut self, mode: ToolArgsMatchMode) -> Self {
        self.tool_args_match_mode = mode;
        self
    }

    pub fn with_override(mut self, tool_name: &str, override_: ToolArgsOverrideConfig) -> Self {
        self.tool_args_match_overrides.insert(tool_name.to_string(), override_);
        self
    }

    pub fn with_feedback_key(mut self, key: impl Into<String>) -> Self {
        self.feedback_key = Some(key.into());
        self
    }

    /// Build the matcher. Predicate overrides can be added to the result.
    pub fn into_matcher(self) -> TrajectoryMatcher {
        let tool_args = self
            .tool_args_match_overrides
            .into_iter()
            .fold(ToolArgsMatcher::new(self.tool_args_match_mode), |matcher, (tool, override_)| {
                matcher.with_override(&tool, override_.into())
            });
        let matcher =
            TrajectoryMatcher::new(self.trajectory_match_mode).with_tool_args_matcher(tool_args);
        match self.feedback_key {
            Some(key) => matcher.with_feedback_key(key),
            None => matcher,
        }
    }
}
