//! Free-text comments attached to markets.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::id::{AgentId, CommentId, MarketId};

const CONTENT_MAX: usize = 500;

/// A comment by one agent on one market. No settlement interaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub market_id: MarketId,
    pub agent_id: AgentId,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    /// Create a comment, validating the content bounds.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidCommentLength` for empty content or
    /// content over 500 characters.
    pub fn try_new(
        market_id: MarketId,
        agent_id: AgentId,
        content: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let content = content.into();
        let len = content.chars().count();
        if len == 0 || len > CONTENT_MAX {
            return Err(DomainError::InvalidCommentLength { len });
        }
        Ok(Self {
            id: CommentId::new(),
            market_id,
            agent_id,
            content,
            created_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn try_new_accepts_normal_content() {
        let comment = Comment::try_new(MarketId::new(), AgentId::new(), "easy money");
        assert!(comment.is_ok());
    }

    #[test]
    fn try_new_rejects_empty_and_oversized_content() {
        assert!(Comment::try_new(MarketId::new(), AgentId::new(), "").is_err());
        assert!(Comment::try_new(MarketId::new(), AgentId::new(), "x".repeat(501)).is_err());
    }
}
