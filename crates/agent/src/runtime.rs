//! The mediation runtime — one `invoke()` per participant utterance.
//!
//! Composes the policy, the space memory, and the reasoning loop. Turns on
//! the same space are serialized; turns on different spaces run freely.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::{info, warn};
use weaver_core::capability::ReasoningCapability;
use weaver_core::error::ReasoningError;
use weaver_core::event::{DomainEvent, EventBus};
use weaver_core::memory::SpaceMemory;
use weaver_core::message::{Message, ParticipantId, SpaceId, TurnResult};
use weaver_core::policy::MediationPolicy;
use weaver_core::tool::ToolRegistry;
use weaver_core::Result;
use weaver_memory::InMemorySpaceMemory;
use weaver_tools::communication_registry;

use crate::loop_runner::ReasoningLoop;

/// One async mutex per space, created on first use and kept for the
/// life of the runtime (spaces are never deleted).
#[derive(Default)]
struct SpaceLocks {
    locks: Mutex<HashMap<SpaceId, Arc<tokio::sync::Mutex<()>>>>,
}

impl SpaceLocks {
    fn lock_for(&self, space_id: &SpaceId) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.entry(space_id.clone()).or_default().clone()
    }
}

/// Façade over policy + memory + loop.
pub struct MediationRuntime {
    /// Behavioral principles injected into every turn
    policy: MediationPolicy,

    /// Rendered from the policy and the offered tools whenever either changes
    system_instruction: String,

    /// Ledger store
    memory: Arc<dyn SpaceMemory>,

    /// Reason-act loop
    reasoning: ReasoningLoop,

    /// Event bus for domain events
    event_bus: Arc<EventBus>,

    /// Optional bound on a whole turn
    turn_timeout: Option<Duration>,

    space_locks: SpaceLocks,
}

impl MediationRuntime {
    /// Create a runtime with the canonical policy, in-process ledgers, and
    /// the communication tools.
    pub fn new(capability: Arc<dyn ReasoningCapability>) -> Self {
        let event_bus = Arc::new(EventBus::default());
        let mut runtime = Self {
            system_instruction: String::new(),
            policy: MediationPolicy::default(),
            memory: Arc::new(InMemorySpaceMemory::new()),
            reasoning: ReasoningLoop::new(
                capability,
                Arc::new(communication_registry()),
                event_bus.clone(),
            ),
            event_bus,
            turn_timeout: None,
            space_locks: SpaceLocks::default(),
        };
        runtime.render_instruction();
        runtime
    }

    pub fn with_policy(mut self, policy: MediationPolicy) -> Self {
        self.policy = policy;
        self.render_instruction();
        self
    }

    /// Swap the ledger store (e.g. for a durable backend).
    pub fn with_memory(mut self, memory: Arc<dyn SpaceMemory>) -> Self {
        self.memory = memory;
        self
    }

    /// Replace the tool registry offered to the capability.
    pub fn with_tools(mut self, tools: Arc<ToolRegistry>) -> Self {
        self.reasoning = self.reasoning.with_tools(tools);
        self.render_instruction();
        self
    }

    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.reasoning = self.reasoning.with_max_iterations(max);
        self
    }

    pub fn with_fatal_tool_errors(mut self, fatal: bool) -> Self {
        self.reasoning = self.reasoning.with_fatal_tool_errors(fatal);
        self
    }

    /// Bound every turn; expiry surfaces as `ReasoningUnavailable` and commits nothing.
    pub fn with_turn_timeout(mut self, timeout: Duration) -> Self {
        self.turn_timeout = Some(timeout);
        self
    }

    pub fn with_event_bus(mut self, event_bus: Arc<EventBus>) -> Self {
        self.reasoning = self.reasoning.with_event_bus(event_bus.clone());
        self.event_bus = event_bus;
        self
    }

    pub fn policy(&self) -> &MediationPolicy {
        &self.policy
    }

    pub fn system_instruction(&self) -> &str {
        &self.system_instruction
    }

    pub fn memory(&self) -> &Arc<dyn SpaceMemory> {
        &self.memory
    }

    pub fn event_bus(&self) -> &Arc<EventBus> {
        &self.event_bus
    }

    fn render_instruction(&mut self) {
        self.system_instruction = self
            .policy
            .format_system_instruction_with_tools(&self.reasoning.tools().specs());
    }

    /// Process one participant utterance in `space_id`.
    ///
    /// The human message and everything the loop produced are committed in
    /// a single append. If the turn fails for any reason, the ledger is left
    /// exactly as it was.
    pub async fn invoke(
        &self,
        space_id: &str,
        participant_id: &str,
        content: &str,
    ) -> Result<TurnResult> {
        let space = SpaceId::new(space_id);
        let participant = ParticipantId::new(participant_id);

        let turn = self.serialized_turn(&space, &participant, content);
        let result = match self.turn_timeout {
            Some(limit) => match tokio::time::timeout(limit, turn).await {
                Ok(result) => result,
                Err(_) => Err(ReasoningError::Timeout(format!(
                    "turn exceeded {}ms",
                    limit.as_millis()
                ))
                .into()),
            },
            None => turn.await,
        };

        match &result {
            Ok(turn) => {
                info!(
                    space_id = %space,
                    participant_id = %participant,
                    messages_appended = turn.messages_appended,
                    iterations = turn.iterations,
                    degraded = turn.degraded,
                    "Turn committed"
                );
                self.event_bus.publish(DomainEvent::TurnCompleted {
                    space_id: space.to_string(),
                    participant_id: participant.to_string(),
                    messages_appended: turn.messages_appended,
                    iterations: turn.iterations,
                    degraded: turn.degraded,
                    timestamp: chrono::Utc::now(),
                });
            }
            Err(e) => {
                warn!(space_id = %space, participant_id = %participant, error = %e, "Turn aborted");
                self.event_bus.publish(DomainEvent::TurnFailed {
                    space_id: space.to_string(),
                    participant_id: participant.to_string(),
                    error_message: e.to_string(),
                    timestamp: chrono::Utc::now(),
                });
            }
        }

        result
    }

    async fn serialized_turn(
        &self,
        space: &SpaceId,
        participant: &ParticipantId,
        content: &str,
    ) -> Result<TurnResult> {
        let lock = self.space_locks.lock_for(space);
        let _guard = lock.lock().await;

        let mut context = self.memory.prepare_context(space, participant).await?;
        let human = Message::human(participant.clone(), content);
        context.push(human.clone());

        let outcome = self
            .reasoning
            .run(&self.system_instruction, context, space)
            .await?;
        let response_text = outcome.response_text().to_string();

        let mut batch = Vec::with_capacity(1 + outcome.messages.len());
        batch.push(human);
        batch.extend(outcome.messages);
        let messages_appended = self.memory.append(space, batch).await?;

        Ok(TurnResult {
            space_id: space.clone(),
            participant_id: participant.clone(),
            response_text,
            messages_appended,
            iterations: outcome.iterations,
            degraded: outcome.degraded,
        })
    }
}
