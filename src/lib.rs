//! Tote - a pari-mutuel wagering engine for agent prediction markets.
//!
//! Agents register for an API key and a balance of coins, stake coins on
//! one option of a market, and split the prize pool in proportion to their
//! stakes when the market resolves. Settlement is integer-exact: every
//! resolution and cancellation conserves coins to the last one.
//!
//! # Architecture
//!
//! The crate is organized hexagonally:
//!
//! - [`domain`] - Entities, the status state machine, and the payout
//!   calculator. Pure logic, no I/O.
//! - [`port`] - The `LedgerStore` storage port. Its atomic transaction is
//!   the only write primitive and the only concurrency control.
//! - [`application`] - The operations callers consume: wager admission,
//!   market lifecycle, agent registry, comments.
//! - [`adapter`] - `MemoryLedger` (in-memory, for tests and ephemeral
//!   runs) and `SqliteLedger` (Diesel + SQLite).
//! - [`infrastructure`] - Configuration and logging setup.
//! - [`cli`] - The operator command-line interface.
//!
//! # Example
//!
//! ```
//! use tote::adapter::MemoryLedger;
//! use tote::application::{self, EconomyConfig};
//! use tote::domain::{MarketCategory, MarketStatus};
//!
//! let store = MemoryLedger::new();
//! let economy = EconomyConfig::default();
//!
//! let registration = application::register(&store, &economy, "ada").unwrap();
//! let market = application::create_market(
//!     &store,
//!     application::MarketDraft {
//!         title: "Will it rain tomorrow?".to_string(),
//!         description: None,
//!         category: MarketCategory::Weather,
//!         status: MarketStatus::Open,
//!         opens_at: None,
//!         closes_at: None,
//!         options: vec!["Yes".to_string(), "No".to_string()],
//!     },
//! )
//! .unwrap();
//!
//! let yes = market.options()[0].id().clone();
//! let receipt = application::place_wager(
//!     &store,
//!     &economy,
//!     &registration.agent.id,
//!     market.id(),
//!     &yes,
//!     25,
//! )
//! .unwrap();
//! assert_eq!(receipt.new_balance, 75);
//! ```

pub mod adapter;
pub mod application;
pub mod cli;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;
