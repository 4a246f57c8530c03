//! Agent subcommands: register, show, leaderboard.

use clap::Subcommand;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::adapter::sqlite::SqliteLedger;
use crate::application;
use crate::domain::AgentId;
use crate::infrastructure::config::Config;

use super::output;

#[derive(Debug, Subcommand)]
pub enum AgentCommand {
    /// Register a new agent and print its API key (shown exactly once).
    Register {
        /// Unique display name.
        name: String,
    },
    /// Show an agent's public profile.
    Show {
        /// Agent ID.
        id: String,
        /// Emit JSON instead of text.
        #[arg(long)]
        json: bool,
    },
    /// Rank all agents by balance.
    Leaderboard {
        /// Emit JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
}

#[derive(Tabled)]
struct LeaderboardRow {
    #[tabled(rename = "#")]
    rank: usize,
    name: String,
    balance: i64,
}

impl AgentCommand {
    pub fn run(self, store: &SqliteLedger, config: &Config) -> anyhow::Result<()> {
        match self {
            AgentCommand::Register { name } => {
                let registration = application::register(store, &config.economy, &name)?;
                output::section("Agent registered");
                output::key_value("id", &registration.agent.id);
                output::key_value("name", &registration.agent.name);
                output::key_value("balance", registration.agent.balance);
                output::key_value("api key", &registration.api_key);
                output::note("Save the API key now; it will not be shown again.");
                Ok(())
            }
            AgentCommand::Show { id, json } => {
                let profile = application::profile(store, &AgentId::from(id))?;
                if json {
                    println!("{}", serde_json::to_string_pretty(&profile)?);
                    return Ok(());
                }
                output::section(&profile.name);
                output::key_value("id", &profile.id);
                output::key_value("balance", profile.balance);
                output::key_value("wagers", profile.stats.total_wagers);
                output::key_value("won", profile.stats.total_won);
                output::key_value("lost", profile.stats.total_lost);
                output::key_value("net profit", profile.stats.net_profit);
                for wager in &profile.recent_wagers {
                    let payout = wager
                        .payout
                        .map_or_else(|| "-".to_string(), |p| p.to_string());
                    output::note(&format!(
                        "  {} on {:?} ({}): staked {}, payout {}",
                        wager.market_status, wager.market_title, wager.option_label,
                        wager.amount, payout,
                    ));
                }
                Ok(())
            }
            AgentCommand::Leaderboard { json } => {
                let entries = application::leaderboard(store)?;
                if json {
                    println!("{}", serde_json::to_string_pretty(&entries)?);
                    return Ok(());
                }
                let rows: Vec<LeaderboardRow> = entries
                    .iter()
                    .enumerate()
                    .map(|(i, e)| LeaderboardRow {
                        rank: i + 1,
                        name: e.name.clone(),
                        balance: e.balance,
                    })
                    .collect();
                println!("{}", Table::new(rows).with(Style::sharp()));
                Ok(())
            }
        }
    }
}
