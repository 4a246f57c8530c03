//! Wagers: an agent's stake on one option of one market.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::id::{AgentId, MarketId, OptionId, WagerId};

/// One agent's stake on one option of one market.
///
/// At most one wager exists per (agent, market) pair; the storage layer
/// enforces that with a uniqueness constraint. The amount is immutable
/// after creation: the balance was debited at placement time, so the
/// stake is committed capital.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wager {
    pub id: WagerId,
    pub agent_id: AgentId,
    pub market_id: MarketId,
    pub option_id: OptionId,
    /// Staked coins, always >= 1.
    pub amount: i64,
    /// None until the market settles; then 0 for losers, the stake for a
    /// refund, and the proportional share for winners.
    pub payout: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl Wager {
    /// Create a new unsettled wager.
    pub fn new(agent_id: AgentId, market_id: MarketId, option_id: OptionId, amount: i64) -> Self {
        Self {
            id: WagerId::new(),
            agent_id,
            market_id,
            option_id,
            amount,
            payout: None,
            created_at: Utc::now(),
        }
    }

    /// Whether this wager has been settled (resolved or refunded).
    #[must_use]
    pub const fn is_settled(&self) -> bool {
        self.payout.is_some()
    }
}

/// Validate a stake amount against the configured minimum.
///
/// # Errors
///
/// Returns `DomainError::StakeTooSmall` for amounts below the minimum.
pub fn validate_stake(amount: i64, min: i64) -> Result<(), DomainError> {
    if amount < min {
        return Err(DomainError::StakeTooSmall { amount, min });
    }
    Ok(())
}
