//! Weaver CLI — the main entry point.
//!
//! Commands:
//! - `policy` — Print the rendered mediation instruction
//! - `chat`   — Mediate a space from stdin, one `participant: message` per line
//! - `demo`   — Run the financial counseling walkthrough

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "weaver",
    about = "Weaver — multi-party mediation sessions over an LLM",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the system instruction built from the configured policy
    Policy,

    /// Mediate a space interactively
    Chat {
        /// Space to mediate
        #[arg(short, long, default_value = "default")]
        space: String,
    },

    /// Run the financial counseling demo
    Demo {
        /// Use the scripted capability even when an API key is configured
        #[arg(long)]
        offline: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Policy => commands::policy::run()?,
        Commands::Chat { space } => commands::chat::run(&space).await?,
        Commands::Demo { offline } => commands::demo::run(offline).await?,
    }

    Ok(())
}
