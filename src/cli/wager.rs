//! Wager subcommands: place a stake on behalf of an agent.

use anyhow::bail;
use clap::Subcommand;

use crate::adapter::sqlite::SqliteLedger;
use crate::application;
use crate::domain::{MarketId, OptionId};
use crate::infrastructure::config::Config;

use super::output;

#[derive(Debug, Subcommand)]
pub enum WagerCommand {
    /// Place a wager, authenticating with the agent's API key.
    Place {
        /// The agent's API key.
        #[arg(long)]
        key: String,
        /// Market ID.
        #[arg(long)]
        market: String,
        /// Option ID.
        #[arg(long)]
        option: String,
        /// Stake in coins.
        #[arg(long)]
        amount: i64,
    },
}

impl WagerCommand {
    pub fn run(self, store: &SqliteLedger, config: &Config) -> anyhow::Result<()> {
        match self {
            WagerCommand::Place {
                key,
                market,
                option,
                amount,
            } => {
                let Some(agent) = application::authenticate(store, &key)? else {
                    bail!("invalid API key");
                };
                let receipt = application::place_wager(
                    store,
                    &config.economy,
                    &agent.id,
                    &MarketId::from(market),
                    &OptionId::from(option),
                    amount,
                )?;
                output::ok(&format!(
                    "wager {} placed: {} coins on {:?}, balance now {}",
                    receipt.wager.id, receipt.wager.amount, receipt.option_label,
                    receipt.new_balance,
                ));
                Ok(())
            }
        }
    }
}
