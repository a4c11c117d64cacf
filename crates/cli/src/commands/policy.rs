//! `weaver policy` — Print the rendered mediation instruction.

use weaver_config::AppConfig;
use weaver_tools::communication_registry;

pub fn run() -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    let policy = config.policy.build();
    println!(
        "{}",
        policy.format_system_instruction_with_tools(&communication_registry().specs())
    );
    Ok(())
}
