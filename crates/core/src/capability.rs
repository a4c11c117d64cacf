//! ReasoningCapability trait — the abstraction over the facilitator's brain.
//!
//! A capability receives the system instruction, the visible context, and
//! the tool schema, and answers with either a terminal text message or an
//! ordered list of tool invocation requests.
//!
//! Implementations: OpenAI-compatible endpoints, scripted replies for tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ReasoningError;
use crate::message::{Message, Visibility};
use crate::tool::ToolCall;

/// A tool description sent to the capability so it knows what it can call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    /// The tool name
    pub name: String,

    /// Description of what the tool does
    pub description: String,

    /// JSON Schema describing the tool's parameters
    pub parameters: serde_json::Value,
}

/// Everything the capability sees for one reasoning step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReasoningRequest {
    /// Rendered mediation policy
    pub system_instruction: String,

    /// Participant-visible context, the new human message, and every
    /// message produced so far this turn
    pub messages: Vec<Message>,

    /// Tools the capability may request
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolSpec>,
}

/// The two shapes a capability answer can take.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Reply {
    /// A terminal mediator message. Visibility defaults to shared.
    Text {
        content: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        visibility: Option<Visibility>,
    },

    /// One or more tool invocations, to be executed in order.
    ToolCalls {
        /// Text the capability produced alongside the requests, if any
        #[serde(default)]
        content: String,
        calls: Vec<ToolCall>,
    },
}

impl Reply {
    /// A shared terminal reply.
    pub fn text(content: impl Into<String>) -> Self {
        Reply::Text {
            content: content.into(),
            visibility: None,
        }
    }

    pub fn tool_calls(calls: Vec<ToolCall>) -> Self {
        Reply::ToolCalls {
            content: String::new(),
            calls,
        }
    }
}

/// Token usage information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// A complete answer from a capability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReasoningResponse {
    pub reply: Reply,

    /// Token usage statistics
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,

    /// Which model actually answered
    pub model: String,
}

impl ReasoningResponse {
    pub fn new(reply: Reply, model: impl Into<String>) -> Self {
        Self {
            reply,
            usage: None,
            model: model.into(),
        }
    }
}

/// The core ReasoningCapability trait.
///
/// The reasoning loop calls `reason()` without knowing which backend
/// answers. Any failure here aborts the turn before the ledger changes.
#[async_trait]
pub trait ReasoningCapability: Send + Sync {
    /// A human-readable name for this capability (e.g., "openai", "scripted").
    fn name(&self) -> &str;

    /// Run one reasoning step.
    async fn reason(
        &self,
        request: ReasoningRequest,
    ) -> std::result::Result<ReasoningResponse, ReasoningError>;

    /// Health check — can we reach the backend?
    async fn health_check(&self) -> std::result::Result<bool, ReasoningError> {
        Ok(true)
    }
}
