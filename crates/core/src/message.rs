//! Message and ledger domain types.
//!
//! These are the value objects that flow through a mediation turn:
//! a participant speaks → the runtime records a human message → the
//! reasoning loop produces tool results and a mediator reply → all of it
//! lands in the space's ledger with a fixed visibility.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of a mediated conversation space.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpaceId(pub String);

impl SpaceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SpaceId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for SpaceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque participant identifier. Carries no profile.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(pub String);

impl ParticipantId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ParticipantId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who produced a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum Speaker {
    /// A human participant of the space
    Participant(ParticipantId),
    /// The automated facilitator
    Mediator,
    /// A communication tool executed on the mediator's behalf
    Tool,
}

impl std::fmt::Display for Speaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Speaker::Participant(id) => write!(f, "{id}"),
            Speaker::Mediator => write!(f, "mediator"),
            Speaker::Tool => write!(f, "tool"),
        }
    }
}

/// The kind of a ledger message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Human,
    Mediator,
    ToolResult,
}

/// Who may see a message. Fixed at creation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "scope", content = "participant", rename_all = "snake_case")]
pub enum Visibility {
    /// Visible to every participant of the space
    Shared,
    /// Visible only to the named participant
    PrivateTo(ParticipantId),
}

impl Visibility {
    /// Whether `participant` may see a message with this visibility.
    pub fn is_visible_to(&self, participant: &ParticipantId) -> bool {
        match self {
            Visibility::Shared => true,
            Visibility::PrivateTo(recipient) => recipient == participant,
        }
    }

    pub fn is_shared(&self) -> bool {
        matches!(self, Visibility::Shared)
    }
}

/// A single message in a space ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Unique message ID
    pub id: String,

    /// Who produced this message
    pub speaker: Speaker,

    /// Human, mediator, or tool result
    pub kind: MessageKind,

    /// Who may see it
    pub visibility: Visibility,

    /// The text content
    pub content: String,

    /// For tool results, the tool that produced it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,

    /// For tool results, the invocation request it answers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,

    /// Position in the ledger. Assigned by the memory at append time.
    #[serde(default)]
    pub sequence: u64,
}

impl Message {
    /// Create a shared message spoken by a participant.
    pub fn human(participant: ParticipantId, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            speaker: Speaker::Participant(participant),
            kind: MessageKind::Human,
            visibility: Visibility::Shared,
            content: content.into(),
            tool_name: None,
            tool_call_id: None,
            sequence: 0,
        }
    }

    /// Create a shared mediator message.
    pub fn mediator(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            speaker: Speaker::Mediator,
            kind: MessageKind::Mediator,
            visibility: Visibility::Shared,
            content: content.into(),
            tool_name: None,
            tool_call_id: None,
            sequence: 0,
        }
    }

    /// Create a tool result message with the visibility the tool assigned.
    pub fn tool_result(
        tool_name: impl Into<String>,
        tool_call_id: impl Into<String>,
        content: impl Into<String>,
        visibility: Visibility,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            speaker: Speaker::Tool,
            kind: MessageKind::ToolResult,
            visibility,
            content: content.into(),
            tool_name: Some(tool_name.into()),
            tool_call_id: Some(tool_call_id.into()),
            sequence: 0,
        }
    }

    /// Replace the visibility. Only meaningful before the message is appended.
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn is_visible_to(&self, participant: &ParticipantId) -> bool {
        self.visibility.is_visible_to(participant)
    }
}

/// Outcome of one `invoke()` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnResult {
    pub space_id: SpaceId,

    pub participant_id: ParticipantId,

    /// Content of the last mediator message produced this turn, or empty.
    #[serde(rename = "response")]
    pub response_text: String,

    /// Number of messages committed to the ledger (human message included)
    pub messages_appended: usize,

    /// Reasoning iterations consumed
    #[serde(default)]
    pub iterations: u32,

    /// The iteration bound was exhausted before a terminal reply
    #[serde(default)]
    pub degraded: bool,
}
