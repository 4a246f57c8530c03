//! Shared helpers for integration tests.

// Not every test binary uses every helper.
#![allow(dead_code)]

use tote::adapter::MemoryLedger;
use tote::application::{self, EconomyConfig, MarketDraft, Registration};
use tote::domain::{Market, MarketCategory, MarketStatus, OptionId};
use tote::port::LedgerStore;

/// Default economy: 100 starting coins, minimum stake 1.
pub fn economy() -> EconomyConfig {
    EconomyConfig::default()
}

/// Register an agent, panicking on failure.
pub fn register<S: LedgerStore>(store: &S, name: &str) -> Registration {
    application::register(store, &economy(), name).expect("registration failed")
}

/// Create an open two-or-more-option market.
pub fn open_market<S: LedgerStore>(store: &S, title: &str, options: &[&str]) -> Market {
    application::create_market(
        store,
        MarketDraft {
            title: title.to_string(),
            description: None,
            category: MarketCategory::Sports,
            status: MarketStatus::Open,
            opens_at: None,
            closes_at: None,
            options: options.iter().map(|s| (*s).to_string()).collect(),
        },
    )
    .expect("market creation failed")
}

/// The ID of the market's `index`-th option.
pub fn option_id(market: &Market, index: usize) -> OptionId {
    market.options()[index].id().clone()
}

/// Sum of all agent balances, via the leaderboard.
pub fn balance_sum<S: LedgerStore>(store: &S) -> i64 {
    application::leaderboard(store)
        .expect("leaderboard failed")
        .iter()
        .map(|e| e.balance)
        .sum()
}

/// A fresh in-memory ledger.
pub fn memory_store() -> MemoryLedger {
    MemoryLedger::new()
}
