//! Agent registry: registration, key lookup, profiles, leaderboard.

use chrono::{DateTime, Utc};
use rand::RngCore;
use serde::Serialize;
use tracing::info;

use crate::domain::{Agent, AgentId, MarketId, MarketStatus, WagerId};
use crate::error::{Error, Result};
use crate::port::{LedgerStore, LedgerTx};

use super::EconomyConfig;

const API_KEY_PREFIX: &str = "ak_";
const API_KEY_BYTES: usize = 32;
const RECENT_WAGER_COUNT: usize = 10;

/// A freshly registered agent together with its API key.
///
/// This is the only place the key ever leaves the system; `Agent`'s
/// serialization skips it everywhere else.
#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    pub agent: Agent,
    pub api_key: String,
}

/// Win/loss statistics over an agent's settled wagers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AgentStats {
    pub total_wagers: u64,
    pub total_won: u64,
    pub total_lost: u64,
    pub net_profit: i64,
}

/// One historical wager in a profile.
#[derive(Debug, Clone, Serialize)]
pub struct WagerHistoryEntry {
    pub id: WagerId,
    pub market_id: MarketId,
    pub market_title: String,
    pub market_status: MarketStatus,
    pub option_label: String,
    pub amount: i64,
    pub payout: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// Public profile of an agent. Never carries the API key.
#[derive(Debug, Clone, Serialize)]
pub struct AgentProfile {
    pub id: AgentId,
    pub name: String,
    pub balance: i64,
    pub created_at: DateTime<Utc>,
    pub stats: AgentStats,
    pub recent_wagers: Vec<WagerHistoryEntry>,
}

/// One row of the balance leaderboard.
#[derive(Debug, Clone, Serialize)]
pub struct LeaderboardEntry {
    pub id: AgentId,
    pub name: String,
    pub balance: i64,
    pub created_at: DateTime<Utc>,
}

/// Register a new agent under a unique display name.
///
/// The returned API key is shown exactly once; it cannot be retrieved
/// again through any operation.
pub fn register<S: LedgerStore>(
    store: &S,
    economy: &EconomyConfig,
    name: &str,
) -> Result<Registration> {
    Agent::validate_name(name)?;

    let api_key = generate_api_key();
    let agent = Agent::new(name, api_key.clone(), economy.starting_balance);

    store.transaction(|tx| {
        if tx.agent_by_name(name)?.is_some() {
            return Err(Error::NameTaken {
                name: name.to_string(),
            });
        }
        tx.insert_agent(&agent)
    })?;

    info!(agent = %agent.id, name, balance = agent.balance, "agent registered");
    Ok(Registration { agent, api_key })
}

/// Look up an agent by API key. `None` means the key is unknown; the
/// caller owns the authentication failure.
pub fn authenticate<S: LedgerStore>(store: &S, api_key: &str) -> Result<Option<Agent>> {
    store.transaction(|tx| tx.agent_by_api_key(api_key))
}

/// Assemble the public profile of an agent: stats over settled wagers plus
/// the most recent wagers with their market context.
pub fn profile<S: LedgerStore>(store: &S, agent_id: &AgentId) -> Result<AgentProfile> {
    store.transaction(|tx| {
        let agent = tx.agent(agent_id)?.ok_or_else(|| Error::NotFound {
            entity: "agent",
            id: agent_id.to_string(),
        })?;

        let wagers = tx.wagers_for_agent(agent_id)?;

        let settled: Vec<_> = wagers.iter().filter(|w| w.payout.is_some()).collect();
        let stats = AgentStats {
            total_wagers: wagers.len() as u64,
            total_won: settled
                .iter()
                .filter(|w| w.payout.unwrap_or(0) > 0)
                .count() as u64,
            total_lost: settled.iter().filter(|w| w.payout == Some(0)).count() as u64,
            net_profit: settled
                .iter()
                .map(|w| w.payout.unwrap_or(0) - w.amount)
                .sum(),
        };

        let mut recent_wagers = Vec::with_capacity(RECENT_WAGER_COUNT.min(wagers.len()));
        for wager in wagers.iter().take(RECENT_WAGER_COUNT) {
            let market = tx.market(&wager.market_id)?;
            let (market_title, market_status, option_label) = match &market {
                Some(m) => (
                    m.title().to_string(),
                    m.status(),
                    m.option(&wager.option_id)
                        .map(|o| o.label().to_string())
                        .unwrap_or_default(),
                ),
                None => (String::new(), MarketStatus::Cancelled, String::new()),
            };
            recent_wagers.push(WagerHistoryEntry {
                id: wager.id.clone(),
                market_id: wager.market_id.clone(),
                market_title,
                market_status,
                option_label,
                amount: wager.amount,
                payout: wager.payout,
                created_at: wager.created_at,
            });
        }

        Ok(AgentProfile {
            id: agent.id,
            name: agent.name,
            balance: agent.balance,
            created_at: agent.created_at,
            stats,
            recent_wagers,
        })
    })
}

/// All agents ranked by balance, richest first.
pub fn leaderboard<S: LedgerStore>(store: &S) -> Result<Vec<LeaderboardEntry>> {
    store.transaction(|tx| {
        Ok(tx
            .agents_by_balance()?
            .into_iter()
            .map(|agent| LeaderboardEntry {
                id: agent.id,
                name: agent.name,
                balance: agent.balance,
                created_at: agent.created_at,
            })
            .collect())
    })
}

/// Generate an opaque API key: `ak_` followed by 64 hex characters.
fn generate_api_key() -> String {
    let mut bytes = [0u8; API_KEY_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    let mut key = String::with_capacity(API_KEY_PREFIX.len() + API_KEY_BYTES * 2);
    key.push_str(API_KEY_PREFIX);
    for byte in bytes {
        key.push_str(&format!("{byte:02x}"));
    }
    key
}
