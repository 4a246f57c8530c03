//! Wager admission: validation and atomic placement.
//!
//! The checks run in a fixed order, each with its own failure, and all of
//! them happen inside the placement transaction. The storage layer backs
//! the two race-prone checks with constraints of its own: the
//! (agent, market) uniqueness rule on insert and the guarded debit.

use chrono::Utc;
use serde::Serialize;
use tracing::info;

use crate::domain::{validate_stake, AgentId, DomainError, MarketId, MarketStatus, OptionId, Wager};
use crate::error::{Error, Result};
use crate::port::{LedgerStore, LedgerTx};

use super::EconomyConfig;

/// Outcome of a successful placement.
#[derive(Debug, Clone, Serialize)]
pub struct WagerReceipt {
    pub wager: Wager,
    pub option_label: String,
    pub new_balance: i64,
}

/// Place a wager for `agent_id` on `option_id` of `market_id`.
///
/// Checks, in order: market exists, market is open, deadline not passed,
/// amount at least the minimum, option belongs to the market, no prior
/// wager by this agent, balance covers the stake. On success the wager row
/// and the balance debit commit together.
///
/// # Errors
///
/// One distinct error per failed check; nothing is written on failure.
pub fn place_wager<S: LedgerStore>(
    store: &S,
    economy: &EconomyConfig,
    agent_id: &AgentId,
    market_id: &MarketId,
    option_id: &OptionId,
    amount: i64,
) -> Result<WagerReceipt> {
    let receipt = store.transaction(|tx| {
        let market = tx.market(market_id)?.ok_or_else(|| Error::NotFound {
            entity: "market",
            id: market_id.to_string(),
        })?;

        if market.status() != MarketStatus::Open {
            return Err(Error::InvalidState {
                operation: "place a wager",
                status: market.status(),
            });
        }

        let now = Utc::now();
        if let Some(deadline) = market.closes_at() {
            if deadline < now {
                return Err(Error::MarketClosed {
                    closed_at: deadline,
                });
            }
        }

        validate_stake(amount, economy.min_wager)?;

        let Some(option) = market.option(option_id) else {
            return Err(DomainError::UnknownOption {
                option_id: option_id.to_string(),
            }
            .into());
        };

        if tx.wager_for(agent_id, market_id)?.is_some() {
            return Err(Error::DuplicateWager);
        }

        let agent = tx.agent(agent_id)?.ok_or_else(|| Error::NotFound {
            entity: "agent",
            id: agent_id.to_string(),
        })?;
        if agent.balance < amount {
            return Err(Error::InsufficientFunds {
                balance: agent.balance,
                requested: amount,
            });
        }

        let wager = Wager::new(
            agent_id.clone(),
            market_id.clone(),
            option_id.clone(),
            amount,
        );
        tx.insert_wager(&wager)?;
        let new_balance = tx.debit_agent(agent_id, amount)?;

        Ok(WagerReceipt {
            wager,
            option_label: option.label().to_string(),
            new_balance,
        })
    })?;

    info!(
        market = %market_id,
        agent = %agent_id,
        option = %option_id,
        amount,
        new_balance = receipt.new_balance,
        "wager admitted"
    );
    Ok(receipt)
}
