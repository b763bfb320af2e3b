//! supportdesk CLI — the main entry point.
//!
//! Commands:
//! - `serve` — Start the HTTP gateway
//! - `ask`   — Run one message through the chat pipeline, no HTTP
//! - `kb`    — Inspect knowledge retrieval for a query

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "supportdesk",
    about = "supportdesk — gated FAQ chat assistant",
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
    /// Start the HTTP gateway server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Answer a single message from the command line
    Ask {
        /// The message to answer
        message: String,
    },

    /// Show which knowledge entries a query retrieves, with scores
    Kb {
        /// The query to rank against
        query: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Serve { port } => commands::serve::run(port).await?,
        Commands::Ask { message } => commands::ask::run(&message).await?,
        Commands::Kb { query } => commands::kb::run(&query)?,
    }

    Ok(())
}
