//! `weaver demo` — The financial counseling walkthrough.
//!
//! Jane raises three concerns, John joins, and Jane replies. Falls back to
//! the scripted capability when no API key is configured.

use std::sync::Arc;
use weaver_config::AppConfig;
use weaver_core::capability::ReasoningCapability;
use weaver_providers::ScriptedCapability;

use super::build_runtime;

const SPACE: &str = "counseling_123";

pub const TURNS: &[(&str, &str)] = &[
    ("jane", "We keep arguing about saving versus spending lately, and it's stressing me out."),
    ("jane", "I just want a bigger emergency fund, but I don't want to give up fun entirely."),
    ("jane", "Can we come up with a budget we're both comfortable with?"),
    ("john", "I think we could spend a little more on experiences."),
    ("jane", "Then could we first agree on a minimum we save every month?"),
];

pub async fn run(offline: bool) -> anyhow::Result<()> {
    let config = AppConfig::load()?;

    let capability: Arc<dyn ReasoningCapability> = match weaver_providers::build_from_config(&config) {
        Some(capability) if !offline => capability,
        _ => {
            println!("  (offline: using scripted replies)");
            println!();
            Arc::new(ScriptedCapability::demo())
        }
    };

    let runtime = build_runtime(&config, capability);

    for (participant, content) in TURNS {
        println!("[{participant}] {content}");
        match runtime.invoke(SPACE, participant, content).await {
            Ok(turn) => println!("Mediator: {}", turn.response_text),
            Err(e) => println!("Mediator unavailable: {e}"),
        }
        println!();
    }

    let total = runtime.memory().ledger_len(&SPACE.into()).await?;
    println!("(internal) total messages stored: {total}");
    Ok(())
}
