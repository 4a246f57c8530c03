//! Application services: the caller-facing operations of the system.
//!
//! Each operation runs against any [`crate::port::LedgerStore`] and does
//! all of its reads and writes inside one transaction, so the ledger is
//! the only serialization point. These functions are what an HTTP layer
//! (out of scope for this crate) exposes to agents and operators.

mod admission;
mod comments;
mod lifecycle;
mod registry;

use serde::Deserialize;

pub use admission::{place_wager, WagerReceipt};
pub use comments::{list_comments, post_comment, CommentList, CommentView};
pub use lifecycle::{
    cancel_market, create_market, delete_market, list_markets, market_view, resolve_market,
    update_market, MarketDraft, MarketList, MarketPatch, MarketSummary, MarketView, OptionBook,
    PayoutLine, ResolutionReport, ResolutionView,
};
pub use registry::{
    authenticate, leaderboard, profile, register, AgentProfile, AgentStats, LeaderboardEntry,
    Registration, WagerHistoryEntry,
};

/// Pagination echo attached to list responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u64,
}

impl Pagination {
    pub(crate) fn new(page: u32, limit: u32, total: u64) -> Self {
        Self {
            page: page.max(1),
            limit,
            total,
            total_pages: total.div_ceil(u64::from(limit)),
        }
    }
}

/// Coin-economy knobs, loaded from configuration.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct EconomyConfig {
    /// Balance granted to every newly registered agent.
    pub starting_balance: i64,
    /// Smallest admissible stake.
    pub min_wager: i64,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            starting_balance: 100,
            min_wager: 1,
        }
    }
}
