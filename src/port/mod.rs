//! Trait definitions (hexagonal ports). Depend only on domain.
//!
//! The single port here is the ledger: a durable store of agents, markets,
//! wagers, resolutions, and comments whose only write primitive is an
//! atomic transaction. Application services depend on these traits;
//! `adapter` provides the in-memory and SQLite implementations.

mod ledger;

pub use ledger::{LedgerStore, LedgerTx, MarketFilter, Page};
