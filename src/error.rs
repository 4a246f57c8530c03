use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::{DomainError, MarketStatus};

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

/// Coarse classification of an [`Error`], for callers (such as an HTTP
/// layer) that map outcomes onto a fixed set of response families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// An entity referenced by the request does not exist.
    NotFound,
    /// The operation is not allowed in the market's current lifecycle state.
    InvalidState,
    /// Malformed input rejected before any mutation.
    Validation,
    /// A uniqueness rule refused the request.
    Conflict,
    /// The agent's balance cannot cover the stake.
    InsufficientFunds,
    /// Storage or configuration failure; ledger state is unchanged.
    Internal,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("cannot {operation} while market is {status}")]
    InvalidState {
        operation: &'static str,
        status: MarketStatus,
    },

    #[error("market closed for wagers at {closed_at}")]
    MarketClosed { closed_at: DateTime<Utc> },

    #[error("agent name already taken: {name}")]
    NameTaken { name: String },

    #[error("agent has already placed a wager on this market")]
    DuplicateWager,

    #[error("cannot delete a market that has wagers; cancel it instead")]
    MarketHasWagers,

    #[error("insufficient balance: have {balance}, need {requested}")]
    InsufficientFunds { balance: i64, requested: i64 },

    #[error("connection error: {0}")]
    Connection(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Classify this error into the coarse taxonomy.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Error::NotFound { .. } => ErrorKind::NotFound,
            Error::InvalidState { .. } | Error::MarketClosed { .. } => ErrorKind::InvalidState,
            Error::Domain(_) => ErrorKind::Validation,
            Error::NameTaken { .. } | Error::DuplicateWager | Error::MarketHasWagers => {
                ErrorKind::Conflict
            }
            Error::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            Error::Config(_)
            | Error::Connection(_)
            | Error::Database(_)
            | Error::Parse(_)
            | Error::Io(_) => ErrorKind::Internal,
        }
    }
}

// Lets store adapters use `?` inside Diesel transaction closures; specific
// constraint violations are mapped at the statement sites where the context
// is known.
impl From<diesel::result::Error> for Error {
    fn from(err: diesel::result::Error) -> Self {
        Error::Database(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_the_taxonomy() {
        let not_found = Error::NotFound {
            entity: "market",
            id: "m1".to_string(),
        };
        assert_eq!(not_found.kind(), ErrorKind::NotFound);

        let invalid = Error::InvalidState {
            operation: "place a wager",
            status: MarketStatus::Locked,
        };
        assert_eq!(invalid.kind(), ErrorKind::InvalidState);

        assert_eq!(Error::DuplicateWager.kind(), ErrorKind::Conflict);
        assert_eq!(
            Error::InsufficientFunds {
                balance: 3,
                requested: 10
            }
            .kind(),
            ErrorKind::InsufficientFunds
        );
        assert_eq!(
            Error::Domain(DomainError::InvalidAgentName).kind(),
            ErrorKind::Validation
        );
        assert_eq!(Error::Database("boom".to_string()).kind(), ErrorKind::Internal);
    }

    #[test]
    fn messages_carry_context() {
        let err = Error::InvalidState {
            operation: "place a wager",
            status: MarketStatus::Locked,
        };
        assert_eq!(err.to_string(), "cannot place a wager while market is LOCKED");

        let err = Error::InsufficientFunds {
            balance: 40,
            requested: 60,
        };
        assert_eq!(err.to_string(), "insufficient balance: have 40, need 60");
    }
}
