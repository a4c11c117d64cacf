//! SpaceMemory trait — the per-space message ledger.
//!
//! Each space owns one append-only ledger. Readers never see the whole
//! ledger, only the view of a single participant: every shared message plus
//! the messages addressed privately to them, in insertion order.
//!
//! Operations are keyed strictly by space id. There is deliberately no way
//! to list spaces or read across them.

use async_trait::async_trait;

use crate::error::MemoryError;
use crate::message::{Message, ParticipantId, SpaceId};

/// The core SpaceMemory trait.
///
/// Implementations: in-process ledgers (`weaver-memory`). A durable store can
/// implement the same contract.
#[async_trait]
pub trait SpaceMemory: Send + Sync {
    /// The backend name (e.g., "in_memory").
    fn name(&self) -> &str;

    /// Messages of `space_id` visible to `participant`, in ledger order.
    /// A space never written to yields an empty context.
    async fn prepare_context(
        &self,
        space_id: &SpaceId,
        participant: &ParticipantId,
    ) -> std::result::Result<Vec<Message>, MemoryError>;

    /// Append `messages` at the tail of the ledger as one atomic step,
    /// creating the ledger on first write. Visibility is kept as given.
    /// Returns the number of messages appended.
    async fn append(
        &self,
        space_id: &SpaceId,
        messages: Vec<Message>,
    ) -> std::result::Result<usize, MemoryError>;

    /// Current ledger length for `space_id` (0 if never written).
    async fn ledger_len(&self, space_id: &SpaceId) -> std::result::Result<usize, MemoryError>;
}
