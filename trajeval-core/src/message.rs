//! Canonical message model
//!
//! Every comparison in the workspace operates on [`Message`] and [`ToolCall`].
//! Both accept the flat `{name, args}` tool-call form and the function-wrapped
//! `{function: {name, arguments}}` form on input and always serialize the flat
//! form.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::error::{EvalError, Result};

/// Tool-call arguments, keyed by parameter name
pub type ToolArgs = Map<String, Value>;

/// Speaker of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[serde(alias = "human")]
    User,
    #[serde(alias = "ai")]
    Assistant,
    System,
    Developer,
    Tool,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::System => "system",
            Self::Developer => "developer",
            Self::Tool => "tool",
        };
        f.write_str(s)
    }
}

/// A structured request to invoke a named tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawToolCall")]
pub struct ToolCall {
    /// Tool/function name
    pub name: String,
    /// Arguments passed to the tool
    pub args: ToolArgs,
}

impl ToolCall {
    /// Create a tool call with no arguments
    pub fn new(name: &str) -> Self {
        Self { name: name.to_string(), args: ToolArgs::new() }
    }

    /// Set arguments. Anything other than a JSON object leaves the arguments empty.
    pub fn with_args(mut self, args: Value) -> Self {
        self.args = match args {
            Value::Object(map) => map,
            _ => ToolArgs::new(),
        };
        self
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawToolCall {
    Wrapped {
        function: RawFunction,
    },
    Flat {
        name: String,
        #[serde(default)]
        args: Value,
    },
}

#[derive(Deserialize)]
struct RawFunction {
    name: String,
    #[serde(default)]
    arguments: Value,
}

impl TryFrom<RawToolCall> for ToolCall {
    type Error = EvalError;

    fn try_from(raw: RawToolCall) -> Result<Self> {
        let (name, args) = match raw {
            RawToolCall::Wrapped { function } => (function.name, function.arguments),
            RawToolCall::Flat { name, args } => (name, args),
        };
        let args = parse_tool_args(&name, args)?;
        Ok(Self { name, args })
    }
}

/// Interpret a tool-call argument payload, decoding serialized JSON strings.
fn parse_tool_args(tool_name: &str, value: Value) -> Result<ToolArgs> {
    match value {
        Value::Null => Ok(ToolArgs::new()),
        Value::Object(map) => Ok(map),
        Value::String(s) if s.trim().is_empty() => Ok(ToolArgs::new()),
        Value::String(s) => match serde_json::from_str::<Value>(&s) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(Value::Null) => Ok(ToolArgs::new()),
            Ok(other) => Err(EvalError::InputShape(format!(
                "arguments for tool '{}' must decode to an object, got {}",
                tool_name, other
            ))),
            Err(e) => Err(EvalError::InputShape(format!(
                "arguments for tool '{}' are not valid JSON: {}",
                tool_name, e
            ))),
        },
        other => Err(EvalError::InputShape(format!(
            "arguments for tool '{}' must be an object, got {}",
            tool_name, other
        ))),
    }
}

/// One turn in a trajectory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    /// Text or structured content
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Value>,
    /// Tool invocations, present only on assistant turns that call tools
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    /// Back-reference from a tool result to the invoking call
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl Message {
    /// Create a message with the given role and text content
    pub fn new(role: Role, content: &str) -> Self {
        Self {
            role,
            content: Some(Value::String(content.to_string())),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    pub fn user(content: &str) -> Self {
        Self::new(Role::User, content)
    }

    pub fn system(content: &str) -> Self {
        Self::new(Role::System, content)
    }

    pub fn assistant(content: &str) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Create an assistant turn that invokes tools
    pub fn assistant_with_tool_calls(content: &str, tool_calls: Vec<ToolCall>) -> Self {
        Self { tool_calls: Some(tool_calls), ..Self::assistant(content) }
    }

    /// Create a tool result answering `tool_call_id`
    pub fn tool(content: &str, tool_call_id: &str) -> Self {
        Self { tool_call_id: Some(tool_call_id.to_string()), ..Self::new(Role::Tool, content) }
    }

    /// Parse a single message from any supported source shape
    pub fn from_value(value: &Value) -> Result<Self> {
        Message::deserialize(value).map_err(|e| {
            EvalError::InputShape(format!("could not interpret message {}: {}", value, e))
        })
    }

    /// Text content, if the content is a plain string
    pub fn text(&self) -> Option<&str> {
        self.content.as_ref().and_then(Value::as_str)
    }

    /// Tool calls on this message, empty when none were made
    pub fn tool_calls(&self) -> &[ToolCall] {
        self.tool_calls.as_deref().unwrap_or_default()
    }

    pub fn has_tool_calls(&self) -> bool {
        self.tool_calls.is_some()
    }
}

/// Flatten the tool calls of a message list, preserving order
pub fn extract_tool_calls(messages: &[Message]) -> Vec<&ToolCall> {
    messages.iter().flat_map(|m| m.tool_calls().iter()).collect()
}
