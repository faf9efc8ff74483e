use serde::Serialize;
use serde_json::{Value, json};

use crate::FredError;

/// Uniform result of every tool call.
///
/// `is_error` is true exactly when `structured` carries an `error` field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResponse {
    pub display_text: String,
    pub structured: Value,
    pub is_error: bool,
}

impl ToolResponse {
    #[inline]
    pub fn success(display_text: String, structured: Value) -> Self {
        Self {
            display_text,
            structured,
            is_error: false,
        }
    }

    /// Failure of an operation, with `action` naming what was attempted
    #[inline]
    pub fn failure(action: &str, error: &FredError) -> Self {
        let message = format!("Error {action}: {error}");
        Self {
            structured: json!({ "error": message }),
            display_text: message,
            is_error: true,
        }
    }

    /// The lookup ran but the upstream had nothing for the identifier
    #[inline]
    pub fn not_found(message: String) -> Self {
        Self::success(
            message.clone(),
            json!({ "status": "not_found", "message": message }),
        )
    }

    /// Capability the upstream client cannot serve; informational, not a failure
    #[inline]
    pub fn unsupported(message: String) -> Self {
        Self::success(
            message.clone(),
            json!({ "status": "unsupported", "message": message }),
        )
    }

    #[cfg(test)]
    pub fn error_message(&self) -> Option<&str> {
        self.structured.get("error").and_then(Value::as_str)
    }
}
