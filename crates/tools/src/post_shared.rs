//! `post_shared` — address the whole space.

use async_trait::async_trait;
use weaver_core::error::ToolError;
use weaver_core::message::Visibility;
use weaver_core::tool::{Tool, ToolResult};

use crate::string_arg;

/// Format a shared post. Pure and deterministic.
pub fn post_shared(content: &str) -> String {
    format!("[shared] {content}")
}

pub struct PostSharedTool;

#[async_trait]
impl Tool for PostSharedTool {
    fn name(&self) -> &str {
        "post_shared"
    }

    fn description(&self) -> &str {
        "Post a message that every participant in the space will see."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "content": {
                    "type": "string",
                    "description": "The message text"
                }
            },
            "required": ["content"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let content = string_arg(&arguments, "content")?;

        Ok(ToolResult {
            call_id: String::new(),
            tool_name: self.name().to_string(),
            output: post_shared(content),
            visibility: Visibility::Shared,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_shared_post() {
        assert_eq!(post_shared("x"), "[shared] x");
    }

    #[tokio::test]
    async fn result_is_shared() {
        let result = PostSharedTool
            .execute(serde_json::json!({"content": "broadcast msg"}))
            .await
            .unwrap();
        assert_eq!(result.output, "[shared] broadcast msg");
        assert_eq!(result.visibility, Visibility::Shared);
    }

    #[tokio::test]
    async fn non_string_content_is_invalid() {
        let err = PostSharedTool
            .execute(serde_json::json!({"content": 42}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }
}
