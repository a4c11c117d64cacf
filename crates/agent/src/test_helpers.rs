//! Shared test helpers for loop and runtime tests.

use std::sync::Mutex;
use weaver_core::capability::{Reply, ReasoningCapability, ReasoningRequest, ReasoningResponse, Usage};
use weaver_core::error::ReasoningError;
use weaver_core::tool::ToolCall;

/// A capability that returns a sequence of scripted replies.
///
/// Each call to `reason` returns the next reply and records the request.
/// Panics if more calls are made than replies provided.
pub struct SequentialMockCapability {
    replies: Vec<Reply>,
    requests: Mutex<Vec<ReasoningRequest>>,
}

impl SequentialMockCapability {
    pub fn new(replies: Vec<Reply>) -> Self {
        Self {
            replies,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A capability that answers once with plain text.
    pub fn single_text(text: &str) -> Self {
        Self::new(vec![Reply::text(text)])
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ReasoningRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ReasoningCapability for SequentialMockCapability {
    fn name(&self) -> &str {
        "sequential_mock"
    }

    async fn reason(&self, request: ReasoningRequest) -> Result<ReasoningResponse, ReasoningError> {
        let mut requests = self.requests.lock().unwrap();
        let index = requests.len();
        requests.push(request);
        let reply = self.replies.get(index).cloned().unwrap_or_else(|| {
            panic!(
                "SequentialMockCapability: no more replies (call #{}, have {})",
                index + 1,
                self.replies.len()
            )
        });
        Ok(ReasoningResponse {
            reply,
            usage: Some(Usage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            }),
            model: "mock-model".into(),
        })
    }
}

/// A capability that requests the same tool forever.
pub struct RepeatingToolCapability {
    pub call: ToolCall,
}

#[async_trait::async_trait]
impl ReasoningCapability for RepeatingToolCapability {
    fn name(&self) -> &str {
        "repeating_tool"
    }

    async fn reason(&self, _request: ReasoningRequest) -> Result<ReasoningResponse, ReasoningError> {
        Ok(ReasoningResponse::new(
            Reply::ToolCalls {
                content: "still thinking".into(),
                calls: vec![self.call.clone()],
            },
            "mock-model",
        ))
    }
}

/// A capability whose backend is unreachable.
pub struct UnreachableCapability;

#[async_trait::async_trait]
impl ReasoningCapability for UnreachableCapability {
    fn name(&self) -> &str {
        "unreachable"
    }

    async fn reason(&self, _request: ReasoningRequest) -> Result<ReasoningResponse, ReasoningError> {
        Err(ReasoningError::Network("connection refused".into()))
    }
}

pub fn tool_call(id: &str, name: &str, arguments: serde_json::Value) -> ToolCall {
    ToolCall {
        id: id.into(),
        name: name.into(),
        arguments,
    }
}
