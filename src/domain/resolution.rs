//! The immutable record of how a market settled.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::id::{MarketId, OptionId};

const NOTES_MAX: usize = 500;

/// One-to-one with a resolved market. Created exactly once, never edited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub market_id: MarketId,
    pub winning_option_id: OptionId,
    pub notes: Option<String>,
    pub resolved_at: DateTime<Utc>,
}

impl Resolution {
    /// Create a resolution record, validating the notes bound.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NotesTooLong` for notes over 500 characters.
    pub fn try_new(
        market_id: MarketId,
        winning_option_id: OptionId,
        notes: Option<String>,
        resolved_at: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        if let Some(notes) = &notes {
            let len = notes.chars().count();
            if len > NOTES_MAX {
                return Err(DomainError::NotesTooLong { len });
            }
        }
        Ok(Self {
            market_id,
            winning_option_id,
            notes,
            resolved_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn try_new_accepts_short_notes() {
        let res = Resolution::try_new(
            MarketId::new(),
            OptionId::new(),
            Some("confirmed by the official feed".to_string()),
            Utc::now(),
        );
        assert!(res.is_ok());
    }

    #[test]
    fn try_new_rejects_long_notes() {
        let res = Resolution::try_new(
            MarketId::new(),
            OptionId::new(),
            Some("x".repeat(501)),
            Utc::now(),
        );
        assert_eq!(res.unwrap_err(), DomainError::NotesTooLong { len: 501 });
    }
}
