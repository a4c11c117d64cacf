pub mod chat;
pub mod demo;
pub mod policy;

use std::sync::Arc;
use weaver_agent::MediationRuntime;
use weaver_config::AppConfig;
use weaver_core::capability::ReasoningCapability;

/// Assemble a runtime from configuration around the given capability.
pub fn build_runtime(config: &AppConfig, capability: Arc<dyn ReasoningCapability>) -> MediationRuntime {
    let mut runtime = MediationRuntime::new(capability)
        .with_policy(config.policy.build())
        .with_max_iterations(config.reasoning.max_iterations)
        .with_fatal_tool_errors(config.reasoning.fatal_tool_errors);
    if let Some(timeout) = config.reasoning.turn_timeout() {
        runtime = runtime.with_turn_timeout(timeout);
    }
    runtime
}

/// Split a `participant: message` line.
pub fn parse_line(line: &str) -> Option<(&str, &str)> {
    let (participant, content) = line.split_once(':')?;
    let participant = participant.trim();
    let content = content.trim();
    if participant.is_empty() || content.is_empty() {
        return None;
    }
    Some((participant, content))
}

#[cfg(test)]
mod tests {
    use super::*;
    use weaver_core::capability::Reply;
    use weaver_core::tool::ToolCall;
    use weaver_providers::ScriptedCapability;

    #[test]
    fn parses_participant_lines() {
        assert_eq!(parse_line("jane: hello there"), Some(("jane", "hello there")));
        assert_eq!(parse_line("  john :  we should save more "), Some(("john", "we should save more")));
        assert_eq!(parse_line("note: a: b"), Some(("note", "a: b")));
    }

    #[test]
    fn rejects_malformed_lines() {
        assert_eq!(parse_line("no separator"), None);
        assert_eq!(parse_line(": orphan"), None);
        assert_eq!(parse_line("jane:   "), None);
    }

    #[tokio::test]
    async fn runtime_uses_configured_policy_and_bound() {
        let mut config = AppConfig::default();
        config.policy.header = Some("You mediate a lease dispute.".into());
        config.reasoning.max_iterations = 3;

        let endless = ScriptedCapability::new(vec![Reply::tool_calls(vec![ToolCall {
            id: "c1".into(),
            name: "post_shared".into(),
            arguments: serde_json::json!({"content": "still here"}),
        }])]);
        let runtime = build_runtime(&config, Arc::new(endless));
        assert!(runtime.system_instruction().starts_with("You mediate a lease dispute."));

        let turn = runtime.invoke("lease", "tenant", "The heating is broken").await.unwrap();
        assert!(turn.degraded);
        assert_eq!(turn.iterations, 3);
    }
}
