//! `weaver chat` — Mediate one space from stdin.
//!
//! Each input line is `participant: message`. The mediator's reply is
//! printed after every turn; a failed turn is reported and leaves the
//! ledger untouched, so the session continues.

use anyhow::bail;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use weaver_config::AppConfig;

use super::{build_runtime, parse_line};

pub async fn run(space: &str) -> anyhow::Result<()> {
    let config = AppConfig::load()?;

    let Some(capability) = weaver_providers::build_from_config(&config) else {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    WEAVER_API_KEY = 'sk-...'");
        eprintln!("    OPENAI_API_KEY = 'sk-...'");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        eprintln!("  `weaver demo --offline` runs without a key.");
        eprintln!();
        bail!("No API key found. See above for setup instructions.");
    };

    let runtime = build_runtime(&config, capability);

    println!();
    println!("  Space:  {space}");
    println!("  Model:  {}", config.model);
    println!();
    println!("  Type `participant: message` and press Enter. Ctrl+D to quit.");
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    prompt()?;

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            prompt()?;
            continue;
        }

        match parse_line(line) {
            Some((participant, content)) => match runtime.invoke(space, participant, content).await {
                Ok(turn) => {
                    for text in turn.response_text.lines() {
                        println!("  Mediator > {text}");
                    }
                    if turn.degraded {
                        eprintln!("  [warning] turn hit the reasoning bound after {} iterations", turn.iterations);
                    }
                }
                Err(e) => eprintln!("  [Error] {e}"),
            },
            None => eprintln!("  expected `participant: message`"),
        }

        println!();
        prompt()?;
    }

    let total = runtime.memory().ledger_len(&space.into()).await?;
    println!();
    println!("  {total} message(s) in space {space}");
    Ok(())
}

fn prompt() -> std::io::Result<()> {
    print!("  > ");
    std::io::stdout().flush()
}
