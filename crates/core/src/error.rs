//! Error types for the Weaver domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum; the top-level [`Error`]
//! is what a mediation turn returns.

use thiserror::Error;

/// The top-level error type for all Weaver operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Reasoning capability errors ---
    #[error("Reasoning capability unavailable: {0}")]
    ReasoningUnavailable(#[from] ReasoningError),

    // --- Contract violations by the capability ---
    #[error("Unknown tool requested by reasoning capability: {name}")]
    UnknownToolRequested { name: String },

    // --- Tool errors (only surfaced when tool failures are configured fatal) ---
    #[error("Tool failed: {0}")]
    ToolFailed(ToolError),

    // --- Memory errors ---
    #[error("Memory error: {0}")]
    Memory(#[from] MemoryError),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ReasoningError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by backend, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Backend not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response from backend: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Clone, Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),

    #[error("Tool execution failed: {tool_name} — {reason}")]
    ExecutionFailed { tool_name: String, reason: String },
}

#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invalid message at append: {0}")]
    InvalidMessage(String),
}
