//! # Weaver Core
//!
//! Domain types, traits, and error definitions for the Weaver mediation engine.
//! This crate has **zero framework dependencies** — it defines the domain model
//! that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every collaborator of the mediation runtime is defined as a trait here:
//! the reasoning capability, the communication tools, and the space memory.
//! Implementations live in their respective crates. This enables:
//! - Swapping the reasoning backend or ledger store via configuration
//! - Easy testing with scripted capabilities
//! - Clean dependency graph (all crates depend inward on core)

pub mod capability;
pub mod error;
pub mod event;
pub mod memory;
pub mod message;
pub mod policy;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use capability::{Reply, ReasoningCapability, ReasoningRequest, ReasoningResponse, ToolSpec, Usage};
pub use error::{Error, Result};
pub use event::{DomainEvent, EventBus};
pub use memory::SpaceMemory;
pub use message::{Message, MessageKind, ParticipantId, SpaceId, Speaker, TurnResult, Visibility};
pub use policy::{MediationPolicy, Principle};
pub use tool::{Tool, ToolCall, ToolRegistry, ToolResult};
