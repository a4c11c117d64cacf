//! Mediation policy — the behavioral principles injected into every turn.
//!
//! A policy is a header plus an ordered list of named principles. It renders
//! into one system instruction that the reasoning loop hands to the
//! capability. Rendering is a pure function of the policy and the tools on
//! offer: the same inputs always produce the same bytes.

use serde::{Deserialize, Serialize};

use crate::capability::ToolSpec;

/// A named behavioral constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principle {
    pub name: String,
    pub guidance: String,
}

impl Principle {
    pub fn new(name: impl Into<String>, guidance: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            guidance: guidance.into(),
        }
    }
}

pub const DEFAULT_HEADER: &str = "You are Weaver, a neutral mediator facilitating a multi-party \
financial counseling conversation. You speak with each participant, decide what may be shared \
with the group, and keep every private disclosure private.";

const TOOLS_FOOTER: &str = "Reply with plain text when you have nothing further to send.";

/// An ordered set of principles plus a header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediationPolicy {
    pub header: String,
    pub principles: Vec<Principle>,
}

impl MediationPolicy {
    pub fn new(header: impl Into<String>, principles: Vec<Principle>) -> Self {
        Self {
            header: header.into(),
            principles,
        }
    }

    /// The canonical policy used when the runtime is not given one.
    pub fn default_principles() -> Vec<Principle> {
        vec![
            Principle::new(
                "Privacy Preservation",
                "Never reveal what one participant told you privately to any other participant, \
                 directly or by implication, unless they explicitly asked you to share it.",
            ),
            Principle::new(
                "Balanced Facilitation",
                "Give every participant equal standing; do not take sides or let one voice dominate.",
            ),
            Principle::new(
                "De-escalation",
                "When tension rises, acknowledge feelings, restate concerns neutrally, and slow the pace.",
            ),
            Principle::new(
                "Goal Orientation",
                "Steer the conversation toward a concrete, mutually acceptable plan such as a shared budget.",
            ),
        ]
    }

    /// Render the header and the numbered principles.
    pub fn format_system_instruction(&self) -> String {
        let mut out = String::with_capacity(
            self.header.len()
                + self
                    .principles
                    .iter()
                    .map(|p| p.name.len() + p.guidance.len() + 8)
                    .sum::<usize>()
                + 32,
        );
        out.push_str(&self.header);
        out.push_str("\n\n## Core Principles\n");
        for (i, principle) in self.principles.iter().enumerate() {
            out.push_str(&format!(
                "{}. {}: {}\n",
                i + 1,
                principle.name,
                principle.guidance
            ));
        }
        out
    }

    /// Render the instruction followed by a section describing exactly `tools`.
    ///
    /// With no tools the section is omitted.
    pub fn format_system_instruction_with_tools(&self, tools: &[ToolSpec]) -> String {
        let mut out = self.format_system_instruction();
        if tools.is_empty() {
            return out;
        }
        out.push_str("\n## Communication Tools\n");
        for tool in tools {
            out.push_str(&format!("- {}: {}\n", tool.name, tool.description));
        }
        out.push_str(TOOLS_FOOTER);
        out
    }
}

impl Default for MediationPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_HEADER, Self::default_principles())
    }
}
