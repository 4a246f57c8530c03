//! Operator command-line interface.
//!
//! Administrative market operations, agent inspection, and wager placement
//! against the configured SQLite ledger. Listing commands print tables by
//! default and JSON with `--json`.

mod agent;
mod market;
pub mod output;
mod wager;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::adapter::sqlite::{create_pool, run_migrations, SqliteLedger};
use crate::infrastructure::config::Config;

pub use agent::AgentCommand;
pub use market::MarketCommand;
pub use wager::WagerCommand;

/// Pari-mutuel wagering engine for agent prediction markets.
#[derive(Debug, Parser)]
#[command(name = "tote", version, about)]
pub struct Cli {
    /// Path to the configuration file.
    #[arg(long, global = true, default_value = "config.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Agent registry operations.
    Agent {
        #[command(subcommand)]
        command: AgentCommand,
    },
    /// Market lifecycle operations.
    Market {
        #[command(subcommand)]
        command: MarketCommand,
    },
    /// Wager operations.
    Wager {
        #[command(subcommand)]
        command: WagerCommand,
    },
}

impl Cli {
    /// Dispatch the parsed command against the configured ledger.
    pub fn run(self, config: &Config) -> anyhow::Result<()> {
        let pool = create_pool(&config.database.path)?;
        run_migrations(&pool)?;
        let store = SqliteLedger::new(pool);

        match self.command {
            Command::Agent { command } => command.run(&store, config),
            Command::Market { command } => command.run(&store),
            Command::Wager { command } => command.run(&store, config),
        }
    }
}
