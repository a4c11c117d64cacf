//! In-memory ledgers — one `Vec<Message>` per space for the life of the process.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;
use weaver_core::error::MemoryError;
use weaver_core::memory::SpaceMemory;
use weaver_core::message::{Message, MessageKind, ParticipantId, SpaceId, Speaker, Visibility};

/// Stores every space's ledger in a map guarded by a single lock.
///
/// The lock is only held for the copy-in / copy-out of a ledger, never across
/// a reasoning call, so turns on different spaces do not wait on each other.
pub struct InMemorySpaceMemory {
    ledgers: Arc<RwLock<HashMap<SpaceId, Vec<Message>>>>,
}

impl InMemorySpaceMemory {
    pub fn new() -> Self {
        Self {
            ledgers: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemorySpaceMemory {
    fn default() -> Self {
        Self::new()
    }
}

/// Reject messages whose tags contradict each other before they reach a ledger.
fn validate(message: &Message) -> Result<(), MemoryError> {
    if let Visibility::PrivateTo(recipient) = &message.visibility {
        if recipient.as_str().trim().is_empty() {
            return Err(MemoryError::InvalidMessage(format!(
                "message {} is private to an empty recipient",
                message.id
            )));
        }
    }

    let consistent = matches!(
        (&message.kind, &message.speaker),
        (MessageKind::Human, Speaker::Participant(_))
            | (MessageKind::Mediator, Speaker::Mediator)
            | (MessageKind::ToolResult, Speaker::Tool)
    );
    if !consistent {
        return Err(MemoryError::InvalidMessage(format!(
            "message {} has kind {:?} but speaker '{}'",
            message.id, message.kind, message.speaker
        )));
    }

    Ok(())
}

#[async_trait]
impl SpaceMemory for InMemorySpaceMemory {
    fn name(&self) -> &str { "in_memory" }

    async fn prepare_context(
        &self,
        space_id: &SpaceId,
        participant: &ParticipantId,
    ) -> Result<Vec<Message>, MemoryError> {
        let ledgers = self.ledgers.read().await;
        let Some(ledger) = ledgers.get(space_id) else {
            return Ok(Vec::new());
        };

        Ok(ledger
            .iter()
            .filter(|m| m.is_visible_to(participant))
            .cloned()
            .collect())
    }

    async fn append(&self, space_id: &SpaceId, messages: Vec<Message>) -> Result<usize, MemoryError> {
        if messages.is_empty() {
            return Ok(0);
        }
        for message in &messages {
            validate(message)?;
        }

        let mut ledgers = self.ledgers.write().await;
        let ledger = ledgers.entry(space_id.clone()).or_default();
        let start = ledger.len() as u64;
        let count = messages.len();

        ledger.extend(messages.into_iter().enumerate().map(|(i, mut m)| {
            m.sequence = start + i as u64;
            m
        }));

        debug!(space_id = %space_id, appended = count, ledger_len = ledger.len(), "Ledger append");
        Ok(count)
    }

    async fn ledger_len(&self, space_id: &SpaceId) -> Result<usize, MemoryError> {
        Ok(self
            .ledgers
            .read()
            .await
            .get(space_id)
            .map(Vec::len)
            .unwrap_or(0))
    }
}
