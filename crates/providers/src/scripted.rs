//! Scripted reasoning capability.
//!
//! Replays a fixed list of replies in order, wrapping around when the list
//! runs out. Used for offline demos and tests where no backend is reachable.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use weaver_core::capability::{Reply, ReasoningCapability, ReasoningRequest, ReasoningResponse};
use weaver_core::error::ReasoningError;
use weaver_core::tool::ToolCall;

pub struct ScriptedCapability {
    replies: Vec<Reply>,
    cursor: AtomicUsize,
}

impl ScriptedCapability {
    pub fn new(replies: Vec<Reply>) -> Self {
        Self {
            replies,
            cursor: AtomicUsize::new(0),
        }
    }

    /// Shared terminal replies only.
    pub fn from_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(texts.into_iter().map(Reply::text).collect())
    }

    /// The replies used by `weaver demo` when no API key is configured.
    pub fn demo() -> Self {
        Self::new(vec![
            Reply::text(
                "Welcome, Jane. This space is for working through your finances together. \
                 What would you most like to get on track?",
            ),
            Reply::ToolCalls {
                content: "Acknowledging Jane privately before summarizing for everyone.".into(),
                calls: vec![
                    ToolCall {
                        id: "demo_1".into(),
                        name: "send_private".into(),
                        arguments: serde_json::json!({
                            "recipient": "jane",
                            "content": "Thank you for sharing that. Nothing you tell me privately will be repeated."
                        }),
                    },
                    ToolCall {
                        id: "demo_2".into(),
                        name: "post_shared".into(),
                        arguments: serde_json::json!({
                            "content": "Jane wants to build a monthly budget that leaves room for savings."
                        }),
                    },
                ],
            },
            Reply::text("Let's list your fixed monthly costs first, then the flexible ones."),
            Reply::text("That's a solid start. Which of those costs feels hardest to reduce?"),
            Reply::text(
                "Welcome, John. Jane has been sketching a household budget. \
                 What matters most to you in this plan?",
            ),
            Reply::text("You both want savings to grow. Could we agree on a target amount per month?"),
        ])
    }

    /// Number of capability calls served so far.
    pub fn calls(&self) -> usize {
        self.cursor.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReasoningCapability for ScriptedCapability {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn reason(
        &self,
        _request: ReasoningRequest,
    ) -> std::result::Result<ReasoningResponse, ReasoningError> {
        if self.replies.is_empty() {
            return Err(ReasoningError::NotConfigured(
                "scripted capability has no replies".into(),
            ));
        }
        let index = self.cursor.fetch_add(1, Ordering::SeqCst) % self.replies.len();
        Ok(ReasoningResponse::new(self.replies[index].clone(), "scripted"))
    }
}
