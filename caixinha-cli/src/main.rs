//! Caixinha CLI - income and expense records from a chat, in your terminal

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{chat, logs, records, report};

/// Caixinha - record income and expenses by chatting
#[derive(Parser)]
#[command(name = "cx", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Talk to the wizard as a chat user would
    Chat {
        /// Sender id used for the conversation
        #[arg(long, short, default_value = "terminal")]
        user: String,
    },

    /// Summarize stored records for a period
    Report {
        /// Period: today, 7d, month, 3m, 6m, 12m (or mensal, semana, ...)
        period: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List stored records
    Records {
        /// Show only the last N records
        #[arg(short, long)]
        limit: Option<usize>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// View and manage the event log
    Logs {
        #[command(subcommand)]
        command: logs::LogsCommands,
    },
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("CAIXINHA_LOG").unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Chat { user } => chat::run(&user),
        Commands::Report { period, json } => report::run(&period, json),
        Commands::Records { limit, json } => records::run(limit, json),
        Commands::Logs { command } => logs::run(command),
    }
}
