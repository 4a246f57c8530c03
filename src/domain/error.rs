//! Domain validation errors for core domain types.
//!
//! These errors are returned by `try_new` constructors and other methods
//! that validate domain rules before anything touches the ledger.

use thiserror::Error;

use super::market::MarketStatus;

/// Errors that occur when domain invariants are violated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Market titles are bounded to keep listings renderable.
    #[error("title must be 5-200 characters, got {len}")]
    InvalidTitleLength {
        /// Length of the rejected title.
        len: usize,
    },

    /// Descriptions are free text but bounded.
    #[error("description must be at most 1000 characters, got {len}")]
    DescriptionTooLong {
        /// Length of the rejected description.
        len: usize,
    },

    /// A market needs at least two options to be a question at all, and
    /// more than ten is unreadable.
    #[error("a market requires 2-10 options, got {count}")]
    InvalidOptionCount {
        /// Number of options provided.
        count: usize,
    },

    /// Option labels must be 1-100 characters.
    #[error("option label must be 1-100 characters, got {len}")]
    InvalidOptionLabel {
        /// Length of the rejected label.
        len: usize,
    },

    /// Option labels are compared case-insensitively.
    #[error("option labels must be unique: {label:?} appears more than once")]
    DuplicateOptionLabel {
        /// The colliding label.
        label: String,
    },

    /// The referenced option does not belong to the market.
    #[error("option {option_id} does not belong to this market")]
    UnknownOption {
        /// The unknown option ID, stringified.
        option_id: String,
    },

    /// Agent names are 2-50 characters from a restricted alphabet.
    #[error("agent name must be 2-50 characters of letters, digits, '_', '-', '.' or spaces")]
    InvalidAgentName,

    /// Stakes are whole coins, minimum one.
    #[error("wager amount must be at least {min}, got {amount}")]
    StakeTooSmall {
        /// The rejected amount.
        amount: i64,
        /// The configured minimum.
        min: i64,
    },

    /// Resolution notes are bounded.
    #[error("resolution notes must be at most 500 characters, got {len}")]
    NotesTooLong {
        /// Length of the rejected notes.
        len: usize,
    },

    /// Comments must be non-empty and bounded.
    #[error("comment must be 1-500 characters, got {len}")]
    InvalidCommentLength {
        /// Length of the rejected content.
        len: usize,
    },

    /// The requested status change is not in the transition table.
    #[error("illegal status transition: {from} -> {to}")]
    IllegalTransition {
        /// Current status.
        from: MarketStatus,
        /// Requested status.
        to: MarketStatus,
    },

    /// Markets are created as Upcoming or Open, nothing else.
    #[error("a market cannot be created with status {status}")]
    InvalidInitialStatus {
        /// The rejected initial status.
        status: MarketStatus,
    },
}
