//! Communication tools for the Weaver mediator.
//!
//! The mediator has exactly two ways to speak besides its final reply:
//! addressing one participant privately, or posting to the whole space.
//! Both are pure text formatters; the visibility they attach to their
//! result is what keeps private content private in the ledger.

pub mod post_shared;
pub mod send_private;

use weaver_core::tool::ToolRegistry;

pub use post_shared::{PostSharedTool, post_shared};
pub use send_private::{SendPrivateTool, send_private};

/// Create the fixed tool registry exposed to the reasoning capability.
pub fn communication_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(SendPrivateTool));
    registry.register(Box::new(PostSharedTool));
    registry
}

/// Pull a required string argument out of a tool call.
pub(crate) fn string_arg<'a>(
    arguments: &'a serde_json::Value,
    key: &str,
) -> Result<&'a str, weaver_core::error::ToolError> {
    arguments[key].as_str().ok_or_else(|| {
        weaver_core::error::ToolError::InvalidArguments(format!(
            "missing or non-string '{key}' argument"
        ))
    })
}
