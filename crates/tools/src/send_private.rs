//! `send_private` — address exactly one participant.

use async_trait::async_trait;
use weaver_core::error::ToolError;
use weaver_core::message::{ParticipantId, Visibility};
use weaver_core::tool::{Tool, ToolResult};

use crate::string_arg;

/// Format a private note. Pure and deterministic.
pub fn send_private(recipient: &str, content: &str) -> String {
    format!("[private -> {recipient}] {content}")
}

pub struct SendPrivateTool;

#[async_trait]
impl Tool for SendPrivateTool {
    fn name(&self) -> &str {
        "send_private"
    }

    fn description(&self) -> &str {
        "Send a message that only the named participant will see."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "recipient": {
                    "type": "string",
                    "description": "Participant id of the only reader"
                },
                "content": {
                    "type": "string",
                    "description": "The message text"
                }
            },
            "required": ["recipient", "content"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let recipient = string_arg(&arguments, "recipient")?;
        let content = string_arg(&arguments, "content")?;
        if recipient.trim().is_empty() {
            return Err(ToolError::InvalidArguments("'recipient' must not be empty".into()));
        }

        Ok(ToolResult {
            call_id: String::new(),
            tool_name: self.name().to_string(),
            output: send_private(recipient, content),
            visibility: Visibility::PrivateTo(ParticipantId::new(recipient)),
        })
    }
}
