//! Persistence port for the wagering ledger.
//!
//! [`LedgerStore::transaction`] is the sole concurrency-control mechanism
//! in the system: every mutating operation runs as one closure-scoped unit
//! of work that either fully commits or leaves the ledger untouched. The
//! row-level operations live on [`LedgerTx`], which only exists inside a
//! transaction.

use crate::domain::{
    Agent, AgentId, Comment, Market, MarketCategory, MarketId, MarketStatus, Resolution, Wager,
    WagerId,
};
use crate::error::Result;

/// Filter for market listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MarketFilter {
    pub status: Option<MarketStatus>,
    pub category: Option<MarketCategory>,
}

/// Offset/limit window for paginated listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub offset: u32,
    pub limit: u32,
}

impl Page {
    /// Build a window from 1-based page parameters, clamping the limit into
    /// `1..=max_limit` and defaulting it when absent.
    #[must_use]
    pub fn clamped(page: u32, limit: Option<u32>, default_limit: u32, max_limit: u32) -> Self {
        let page = page.max(1);
        let limit = limit.unwrap_or(default_limit).clamp(1, max_limit);
        Self {
            offset: (page - 1).saturating_mul(limit),
            limit,
        }
    }
}

/// Row operations available inside one ledger transaction.
///
/// Implementations map constraint violations to the crate's Conflict-family
/// errors (`NameTaken` for agent names, `DuplicateWager` for the one
/// wager per (agent, market) rule) so that races lost at the storage layer
/// surface exactly like races lost at the check.
pub trait LedgerTx {
    // --- Agents ---

    /// Insert a new agent. Name and API key are unique.
    fn insert_agent(&mut self, agent: &Agent) -> Result<()>;

    /// Get an agent by ID.
    fn agent(&mut self, id: &AgentId) -> Result<Option<Agent>>;

    /// Get an agent by display name (exact match).
    fn agent_by_name(&mut self, name: &str) -> Result<Option<Agent>>;

    /// Get an agent by API key.
    fn agent_by_api_key(&mut self, api_key: &str) -> Result<Option<Agent>>;

    /// All agents ordered by balance descending, then name.
    fn agents_by_balance(&mut self) -> Result<Vec<Agent>>;

    /// Add `amount` coins to an agent's balance; returns the new balance.
    fn credit_agent(&mut self, id: &AgentId, amount: i64) -> Result<i64>;

    /// Remove `amount` coins from an agent's balance; returns the new
    /// balance. Fails with `InsufficientFunds` when the balance cannot
    /// cover the amount — the check and the decrement are one guarded
    /// statement, so a concurrent debit cannot slip between them.
    fn debit_agent(&mut self, id: &AgentId, amount: i64) -> Result<i64>;

    // --- Markets ---

    /// Insert a market and its options.
    fn insert_market(&mut self, market: &Market) -> Result<()>;

    /// Get a market (with options) by ID.
    fn market(&mut self, id: &MarketId) -> Result<Option<Market>>;

    /// Persist changed market fields. Options are immutable; only the
    /// market row is written.
    fn update_market(&mut self, market: &Market) -> Result<()>;

    /// Delete a market, its options, and its comments. Callers must have
    /// verified that no wagers exist. Returns false when absent.
    fn delete_market(&mut self, id: &MarketId) -> Result<bool>;

    /// Markets matching `filter`, newest first, windowed by `page`.
    fn list_markets(&mut self, filter: &MarketFilter, page: Page) -> Result<Vec<Market>>;

    /// Total number of markets matching `filter`.
    fn count_markets(&mut self, filter: &MarketFilter) -> Result<u64>;

    // --- Wagers ---

    /// Insert a wager. At most one per (agent, market).
    fn insert_wager(&mut self, wager: &Wager) -> Result<()>;

    /// Get the wager an agent holds on a market, if any.
    fn wager_for(&mut self, agent_id: &AgentId, market_id: &MarketId) -> Result<Option<Wager>>;

    /// All wagers on a market, in creation order. Settlement depends on
    /// this order: the calculator's tie-break is stable with respect to it.
    fn wagers_for_market(&mut self, market_id: &MarketId) -> Result<Vec<Wager>>;

    /// All wagers by an agent, newest first.
    fn wagers_for_agent(&mut self, agent_id: &AgentId) -> Result<Vec<Wager>>;

    /// Record a wager's terminal payout.
    fn set_wager_payout(&mut self, id: &WagerId, payout: i64) -> Result<()>;

    // --- Resolutions ---

    /// Insert the resolution record for a market. One per market, ever.
    fn insert_resolution(&mut self, resolution: &Resolution) -> Result<()>;

    /// Get a market's resolution, if resolved.
    fn resolution(&mut self, market_id: &MarketId) -> Result<Option<Resolution>>;

    // --- Comments ---

    /// Insert a comment.
    fn insert_comment(&mut self, comment: &Comment) -> Result<()>;

    /// Comments on a market, newest first, windowed by `page`.
    fn comments_for_market(&mut self, market_id: &MarketId, page: Page) -> Result<Vec<Comment>>;

    /// Total number of comments on a market.
    fn count_comments(&mut self, market_id: &MarketId) -> Result<u64>;
}

/// A ledger with an atomic transaction primitive.
///
/// The closure receives the unit of work; when it returns `Ok` the
/// transaction commits, and any `Err` rolls every row operation back.
/// Reads may also run through `transaction` — a read-only closure simply
/// commits nothing.
pub trait LedgerStore: Send + Sync {
    /// The unit-of-work type handed to transaction closures.
    type Tx<'conn>: LedgerTx
    where
        Self: 'conn;

    /// Run `f` as one atomic unit of work.
    fn transaction<T>(&self, f: impl FnOnce(&mut Self::Tx<'_>) -> Result<T>) -> Result<T>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_clamps_limit_and_offset() {
        let page = Page::clamped(1, None, 20, 50);
        assert_eq!(page.offset, 0);
        assert_eq!(page.limit, 20);

        let page = Page::clamped(3, Some(10), 20, 50);
        assert_eq!(page.offset, 20);
        assert_eq!(page.limit, 10);

        // Oversized limits clamp to the maximum
        let page = Page::clamped(1, Some(500), 20, 50);
        assert_eq!(page.limit, 50);

        // Page 0 is treated as page 1
        let page = Page::clamped(0, Some(5), 20, 50);
        assert_eq!(page.offset, 0);
    }
}
