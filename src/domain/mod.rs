//! Storage-agnostic domain logic: entities, invariants, and the
//! settlement math. No I/O lives here.

mod agent;
mod comment;
mod error;
mod id;
mod market;
mod payout;
mod resolution;
mod wager;

// Core domain types
pub use agent::Agent;
pub use comment::Comment;
pub use error::DomainError;
pub use id::{AgentId, CommentId, MarketId, OptionId, WagerId};
pub use market::{
    even_odds_percent, odds_percent, Market, MarketCategory, MarketOption, MarketStatus,
};
pub use resolution::Resolution;
pub use wager::{validate_stake, Wager};

// Settlement core
pub use payout::{calculate_payouts, PayoutAward};
