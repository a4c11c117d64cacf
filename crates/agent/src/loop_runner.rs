//! The bounded reason-act loop.

use std::sync::Arc;
use weaver_core::capability::{Reply, ReasoningCapability, ReasoningRequest};
use weaver_core::event::{DomainEvent, EventBus};
use weaver_core::message::{Message, MessageKind, SpaceId, Visibility};
use weaver_core::tool::{ToolCall, ToolRegistry};
use weaver_core::{Error, Result};
use tracing::{debug, warn};

/// Capability calls allowed per turn unless configured otherwise.
pub const DEFAULT_MAX_ITERATIONS: u32 = 25;

/// Where the loop is in a turn.
#[derive(Debug, Clone, PartialEq)]
pub enum LoopState {
    /// About to send the accumulated context to the capability
    AwaitingCapability,
    /// Executing the tool requests of the last answer, in order
    DispatchingTools(Vec<ToolCall>),
    /// A terminal reply was produced
    Done,
}

/// Everything a turn produced.
#[derive(Debug, Clone)]
pub struct LoopOutcome {
    /// Tool results and the terminal mediator message, in production order
    pub messages: Vec<Message>,

    /// Text the capability wrote alongside its last tool request when the
    /// bound ran out. Returned to the caller only, never committed.
    pub degraded_text: Option<String>,

    /// Capability calls made
    pub iterations: u32,

    /// The iteration bound ran out before a terminal reply
    pub degraded: bool,
}

impl LoopOutcome {
    /// Content of the last mediator message, else the degraded text, else "".
    pub fn response_text(&self) -> &str {
        self.messages
            .iter()
            .rev()
            .find(|m| m.kind == MessageKind::Mediator)
            .map(|m| m.content.as_str())
            .or(self.degraded_text.as_deref())
            .unwrap_or("")
    }
}

/// Alternates between the reasoning capability and tool execution.
pub struct ReasoningLoop {
    /// The facilitator's reasoning backend
    capability: Arc<dyn ReasoningCapability>,

    /// Tools the capability may request
    tools: Arc<ToolRegistry>,

    /// Maximum capability calls per turn
    max_iterations: u32,

    /// Abort the turn when a tool fails instead of reporting the failure back
    fatal_tool_errors: bool,

    /// Event bus for domain events
    event_bus: Arc<EventBus>,
}

impl ReasoningLoop {
    pub fn new(
        capability: Arc<dyn ReasoningCapability>,
        tools: Arc<ToolRegistry>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            capability,
            tools,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            fatal_tool_errors: false,
            event_bus,
        }
    }

    /// Set the maximum number of capability calls per turn. Clamped to at least 1.
    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.max_iterations = max.max(1);
        self
    }

    pub fn with_fatal_tool_errors(mut self, fatal: bool) -> Self {
        self.fatal_tool_errors = fatal;
        self
    }

    pub fn with_tools(mut self, tools: Arc<ToolRegistry>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_event_bus(mut self, event_bus: Arc<EventBus>) -> Self {
        self.event_bus = event_bus;
        self
    }

    pub fn max_iterations(&self) -> u32 {
        self.max_iterations
    }

    pub fn tools(&self) -> &Arc<ToolRegistry> {
        &self.tools
    }

    /// Run one turn.
    ///
    /// `context` is the speaking participant's view of the ledger with the
    /// new human message already at its tail. On re-entry the capability
    /// always sees that context plus every tool result produced so far.
    ///
    /// Capability failures, unknown tool names, and (when configured) tool
    /// failures abort with an error and no output.
    pub async fn run(
        &self,
        system_instruction: &str,
        mut context: Vec<Message>,
        space_id: &SpaceId,
    ) -> Result<LoopOutcome> {
        let tool_specs = self.tools.specs();
        let mut output: Vec<Message> = Vec::new();
        let mut iterations: u32 = 0;
        let mut last_text: Option<String> = None;
        let mut state = LoopState::AwaitingCapability;

        loop {
            state = match state {
                LoopState::AwaitingCapability => {
                    if iterations >= self.max_iterations {
                        warn!(
                            space_id = %space_id,
                            iterations,
                            degraded = true,
                            "Iteration bound reached without a terminal reply"
                        );
                        return Ok(LoopOutcome {
                            messages: output,
                            degraded_text: last_text,
                            iterations,
                            degraded: true,
                        });
                    }
                    iterations += 1;

                    debug!(space_id = %space_id, iteration = iterations, "Reasoning loop iteration");

                    let response = self
                        .capability
                        .reason(ReasoningRequest {
                            system_instruction: system_instruction.to_string(),
                            messages: context.clone(),
                            tools: tool_specs.clone(),
                        })
                        .await?;

                    if let Some(usage) = &response.usage {
                        self.event_bus.publish(DomainEvent::CapabilityInvoked {
                            space_id: space_id.to_string(),
                            model: response.model.clone(),
                            tokens_used: usage.total_tokens,
                            timestamp: chrono::Utc::now(),
                        });
                    }

                    match response.reply {
                        Reply::Text { content, visibility } => {
                            output.push(
                                Message::mediator(content)
                                    .with_visibility(visibility.unwrap_or(Visibility::Shared)),
                            );
                            LoopState::Done
                        }
                        Reply::ToolCalls { content, calls } if calls.is_empty() => {
                            if !content.trim().is_empty() {
                                output.push(Message::mediator(content));
                            }
                            LoopState::Done
                        }
                        Reply::ToolCalls { content, calls } => {
                            if !content.trim().is_empty() {
                                last_text = Some(content);
                            }
                            LoopState::DispatchingTools(calls)
                        }
                    }
                }

                LoopState::DispatchingTools(calls) => {
                    // Contract check before anything runs
                    if let Some(unknown) = calls.iter().find(|c| !self.tools.contains(&c.name)) {
                        warn!(space_id = %space_id, tool = %unknown.name, "Capability requested an unknown tool");
                        return Err(Error::UnknownToolRequested {
                            name: unknown.name.clone(),
                        });
                    }

                    debug!(space_id = %space_id, tool_count = calls.len(), "Dispatching tool calls");

                    for call in &calls {
                        let message = self.dispatch(call).await?;
                        context.push(message.clone());
                        output.push(message);
                    }
                    LoopState::AwaitingCapability
                }

                LoopState::Done => break,
            };
        }

        Ok(LoopOutcome {
            messages: output,
            degraded_text: None,
            iterations,
            degraded: false,
        })
    }

    /// Execute one tool call and wrap the result as a ledger message.
    async fn dispatch(&self, call: &ToolCall) -> Result<Message> {
        let start = std::time::Instant::now();
        let result = self.tools.execute(call).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        self.event_bus.publish(DomainEvent::ToolExecuted {
            tool_name: call.name.clone(),
            success: result.is_ok(),
            duration_ms,
            timestamp: chrono::Utc::now(),
        });

        match result {
            Ok(tool_result) => Ok(Message::tool_result(
                tool_result.tool_name,
                tool_result.call_id,
                tool_result.output,
                tool_result.visibility,
            )),
            Err(e) => {
                warn!(tool = %call.name, error = %e, "Tool execution failed");
                if self.fatal_tool_errors {
                    return Err(Error::ToolFailed(e));
                }
                // Report the failure to the capability so it can recover
                Ok(Message::tool_result(
                    &call.name,
                    &call.id,
                    format!("Error: {e}"),
                    Visibility::Shared,
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{
        RepeatingToolCapability, SequentialMockCapability, UnreachableCapability, tool_call,
    };
    use weaver_core::capability::Reply;
    use weaver_core::error::ReasoningError;
    use weaver_tools::communication_registry;

    fn build(capability: Arc<dyn ReasoningCapability>) -> ReasoningLoop {
        ReasoningLoop::new(
            capability,
            Arc::new(communication_registry()),
            Arc::new(EventBus::default()),
        )
    }

    fn hello() -> Vec<Message> {
        vec![Message::human("jane".into(), "hello")]
    }

    #[tokio::test]
    async fn terminal_text_finishes_in_one_iteration() {
        let capability = Arc::new(SequentialMockCapability::single_text("Hi Jane"));
        let outcome = build(capability.clone())
            .run("SYSTEM", hello(), &"s1".into())
            .await
            .unwrap();

        assert_eq!(outcome.iterations, 1);
        assert!(!outcome.degraded);
        assert_eq!(outcome.messages.len(), 1);
        assert_eq!(outcome.response_text(), "Hi Jane");
        assert!(outcome.messages[0].visibility.is_shared());

        let request = &capability.requests()[0];
        assert_eq!(request.system_instruction, "SYSTEM");
        assert_eq!(request.messages.len(), 1);
        assert_eq!(request.tools.len(), 2);
    }

    #[tokio::test]
    async fn tools_run_in_requested_order_and_feed_back() {
        let capability = Arc::new(SequentialMockCapability::new(vec![
            Reply::tool_calls(vec![
                tool_call("c1", "send_private", serde_json::json!({"recipient": "bob", "content": "secret"})),
                tool_call("c2", "post_shared", serde_json::json!({"content": "update"})),
            ]),
            Reply::text("Let's move on"),
        ]));
        let outcome = build(capability.clone())
            .run("SYSTEM", hello(), &"s1".into())
            .await
            .unwrap();

        let contents: Vec<_> = outcome.messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(
            contents,
            vec!["[private -> bob] secret", "[shared] update", "Let's move on"]
        );
        assert_eq!(outcome.messages[0].visibility, Visibility::PrivateTo("bob".into()));
        assert_eq!(outcome.messages[0].tool_call_id.as_deref(), Some("c1"));
        assert!(outcome.messages[1].visibility.is_shared());
        assert_eq!(outcome.iterations, 2);

        // Second capability call sees the human message plus both tool results
        let second = &capability.requests()[1];
        assert_eq!(second.messages.len(), 3);
        assert_eq!(second.messages[1].content, "[private -> bob] secret");
    }

    #[tokio::test]
    async fn capability_may_mark_terminal_reply_private() {
        let capability = Arc::new(SequentialMockCapability::new(vec![Reply::Text {
            content: "Only for you".into(),
            visibility: Some(Visibility::PrivateTo("jane".into())),
        }]));
        let outcome = build(capability).run("SYSTEM", hello(), &"s1".into()).await.unwrap();
        assert_eq!(outcome.messages[0].visibility, Visibility::PrivateTo("jane".into()));
    }

    #[tokio::test]
    async fn loop_terminates_when_capability_never_stops() {
        let capability = Arc::new(RepeatingToolCapability {
            call: tool_call("c", "post_shared", serde_json::json!({"content": "again"})),
        });
        let outcome = build(capability)
            .with_max_iterations(5)
            .run("SYSTEM", hello(), &"s1".into())
            .await
            .unwrap();

        assert!(outcome.degraded);
        assert_eq!(outcome.iterations, 5);
        // Only the five tool results; the narration stays out of the output
        assert_eq!(outcome.messages.len(), 5);
        assert!(outcome.messages.iter().all(|m| m.kind == MessageKind::ToolResult));
        assert_eq!(outcome.degraded_text.as_deref(), Some("still thinking"));
        assert_eq!(outcome.response_text(), "still thinking");
    }

    #[tokio::test]
    async fn default_bound_is_twenty_five() {
        let capability = Arc::new(RepeatingToolCapability {
            call: tool_call("c", "post_shared", serde_json::json!({"content": "again"})),
        });
        let reasoning = build(capability);
        assert_eq!(reasoning.max_iterations(), DEFAULT_MAX_ITERATIONS);
        let outcome = reasoning.run("SYSTEM", hello(), &"s1".into()).await.unwrap();
        assert!(outcome.degraded);
        assert_eq!(outcome.iterations, 25);
    }

    #[tokio::test]
    async fn degraded_without_text_has_empty_response() {
        let capability = Arc::new(SequentialMockCapability::new(vec![Reply::tool_calls(vec![
            tool_call("c1", "post_shared", serde_json::json!({"content": "x"})),
        ])]));
        let outcome = build(capability)
            .with_max_iterations(1)
            .run("SYSTEM", hello(), &"s1".into())
            .await
            .unwrap();
        assert!(outcome.degraded);
        assert!(outcome.degraded_text.is_none());
        assert_eq!(outcome.response_text(), "");
        assert_eq!(outcome.messages.len(), 1);
    }

    #[tokio::test]
    async fn empty_tool_call_list_without_text_emits_nothing() {
        let capability = Arc::new(SequentialMockCapability::new(vec![Reply::ToolCalls {
            content: "   ".into(),
            calls: vec![],
        }]));
        let outcome = build(capability).run("SYSTEM", hello(), &"s1".into()).await.unwrap();
        assert!(!outcome.degraded);
        assert_eq!(outcome.iterations, 1);
        assert!(outcome.messages.is_empty());
        assert_eq!(outcome.response_text(), "");
    }

    #[tokio::test]
    async fn empty_tool_call_list_with_text_is_terminal() {
        let capability = Arc::new(SequentialMockCapability::new(vec![Reply::ToolCalls {
            content: "All set.".into(),
            calls: vec![],
        }]));
        let outcome = build(capability).run("SYSTEM", hello(), &"s1".into()).await.unwrap();
        assert_eq!(outcome.messages.len(), 1);
        assert_eq!(outcome.response_text(), "All set.");
    }

    #[tokio::test]
    async fn unknown_tool_is_fatal_and_nothing_runs() {
        let capability = Arc::new(SequentialMockCapability::new(vec![Reply::tool_calls(vec![
            tool_call("c1", "post_shared", serde_json::json!({"content": "x"})),
            tool_call("c2", "shell", serde_json::json!({"command": "ls"})),
        ])]));
        let err = build(capability.clone())
            .run("SYSTEM", hello(), &"s1".into())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UnknownToolRequested { ref name } if name == "shell"));
        assert_eq!(capability.call_count(), 1);
    }

    #[tokio::test]
    async fn tool_failure_is_reported_back() {
        let capability = Arc::new(SequentialMockCapability::new(vec![
            Reply::tool_calls(vec![tool_call("c1", "send_private", serde_json::json!({"content": "no recipient"}))]),
            Reply::text("Sorry, let me try again later"),
        ]));
        let outcome = build(capability.clone())
            .run("SYSTEM", hello(), &"s1".into())
            .await
            .unwrap();
        assert!(outcome.messages[0].content.starts_with("Error:"));
        assert_eq!(outcome.response_text(), "Sorry, let me try again later");
        assert!(capability.requests()[1].messages[1].content.starts_with("Error:"));
    }

    #[tokio::test]
    async fn tool_failure_can_be_fatal() {
        let capability = Arc::new(SequentialMockCapability::new(vec![Reply::tool_calls(vec![
            tool_call("c1", "post_shared", serde_json::json!({})),
        ])]));
        let err = build(capability)
            .with_fatal_tool_errors(true)
            .run("SYSTEM", hello(), &"s1".into())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ToolFailed(_)));
    }

    #[tokio::test]
    async fn unreachable_capability_is_reasoning_unavailable() {
        let err = build(Arc::new(UnreachableCapability))
            .run("SYSTEM", hello(), &"s1".into())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ReasoningUnavailable(ReasoningError::Network(_))));
    }

    #[tokio::test]
    async fn tool_execution_publishes_events() {
        let bus = Arc::new(EventBus::default());
        let mut rx = bus.subscribe();
        let capability = Arc::new(SequentialMockCapability::new(vec![
            Reply::tool_calls(vec![tool_call("c1", "post_shared", serde_json::json!({"content": "x"}))]),
            Reply::text("done"),
        ]));
        build(capability)
            .with_event_bus(bus.clone())
            .run("SYSTEM", hello(), &"s1".into())
            .await
            .unwrap();

        let mut saw_tool = false;
        while let Ok(event) = rx.try_recv() {
            if let DomainEvent::ToolExecuted { tool_name, success, .. } = event.as_ref() {
                assert_eq!(tool_name, "post_shared");
                assert!(success);
                saw_tool = true;
            }
        }
        assert!(saw_tool);
    }
}
