//! Message normalization
//!
//! Converts the accepted input shapes (a bare list of messages, or an object
//! holding the list under `messages`) into canonical [`Message`] values.

use serde_json::Value;

use crate::error::{EvalError, Result};
use crate::message::{Message, Role};

/// Field that wraps a message list when the input is an object
pub const MESSAGES_KEY: &str = "messages";

/// Normalize an optional raw input into a canonical message list
///
/// An absent input normalizes to an empty list. The input is never mutated;
/// every call allocates fresh messages.
pub fn normalize_messages(input: Option<&Value>) -> Result<Vec<Message>> {
    let Some(input) = input else {
        return Ok(Vec::new());
    };

    let list = match input {
        Value::Array(items) => items,
        Value::Object(map) => match map.get(MESSAGES_KEY) {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(EvalError::InputShape(format!(
                    "If passing messages as an object, it must contain a \"{}\" key",
                    MESSAGES_KEY
                )));
            }
        },
        other => {
            return Err(EvalError::InputShape(format!(
                "expected a list of messages or an object with a \"{}\" key, got {}",
                MESSAGES_KEY, other
            )));
        }
    };

    list.iter().map(Message::from_value).map(|m| m.map(ensure_tool_call_id)).collect()
}

/// Normalize messages that are already typed
///
/// Tool results missing a call id receive a generated one.
pub fn normalize_message_list(messages: &[Message]) -> Vec<Message> {
    messages.iter().cloned().map(ensure_tool_call_id).collect()
}

fn ensure_tool_call_id(mut message: Message) -> Message {
    if message.role == Role::Tool && message.tool_call_id.is_none() {
        message.tool_call_id = Some(generate_tool_call_id());
    }
    message
}

/// Opaque identifier for tool results that arrived without one
pub fn generate_tool_call_id() -> String {
    format!("generated-{}", uuid::Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::ToolCall;
    use serde_json::json;

    fn sample() -> Value {
        json!([
            {"role": "user", "content": "What is the weather in SF?"},
            {
                "role": "assistant",
                "content": "",
                "tool_calls": [{
                    "function": {"name": "get_weather", "arguments": "{\"city\": \"SF\"}"}
                }]
            },
            {"role": "tool", "content": "80 degrees and sunny"},
            {"role": "assistant", "content": "It is 80 degrees and sunny in SF."}
        ])
    }

    #[test]
    fn test_normalize_bare_list() {
        let messages = normalize_messages(Some(&sample())).unwrap();
        assert_eq!(messages.len(), 4);
        assert_eq!(
            messages[1].tool_calls(),
            &[ToolCall::new("get_weather").with_args(json!({"city": "SF"}))]
        );
    }

    #[test]
    fn test_normalize_wrapped_list() {
        let wrapped = json!({"messages": sample()});
        let messages = normalize_messages(Some(&wrapped)).unwrap();
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0].role, Role::User);
    }

    #[test]
    fn test_object_without_messages_key() {
        let err = normalize_messages(Some(&json!({"turns": []}))).unwrap_err();
        assert!(matches!(err, EvalError::InputShape(_)));

        let err = normalize_messages(Some(&json!({"messages": "nope"}))).unwrap_err();
        assert!(matches!(err, EvalError::InputShape(_)));
    }

    #[test]
    fn test_absent_input_is_empty() {
        assert!(normalize_messages(None).unwrap().is_empty());
    }

    #[test]
    fn test_tool_call_id_synthesized() {
        let messages = normalize_messages(Some(&sample())).unwrap();
        let id = messages[2].tool_call_id.as_deref().unwrap();
        assert!(id.starts_with("generated-"));

        // Fresh ids per call
        let again = normalize_messages(Some(&sample())).unwrap();
        assert_ne!(again[2].tool_call_id, messages[2].tool_call_id);
    }

    #[test]
    fn test_input_not_mutated() {
        let input = sample();
        let before = input.clone();
        let _ = normalize_messages(Some(&input)).unwrap();
        assert_eq!(input, before);
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let once = normalize_messages(Some(&sample())).unwrap();
        let reserialized = serde_json::to_value(&once).unwrap();
        let twice = normalize_messages(Some(&reserialized)).unwrap();
        assert_eq!(once, twice);
        assert_eq!(normalize_message_list(&once), once);
    }
}
