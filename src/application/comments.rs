//! Comments on markets. No settlement interaction; the only gate is that
//! cancelled markets do not take new comments.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{AgentId, Comment, CommentId, MarketId, MarketStatus};
use crate::error::{Error, Result};
use crate::port::{LedgerStore, LedgerTx, Page};

use super::Pagination;

const LIST_DEFAULT_LIMIT: u32 = 50;
const LIST_MAX_LIMIT: u32 = 100;

/// A comment with its author's name attached.
#[derive(Debug, Clone, Serialize)]
pub struct CommentView {
    pub id: CommentId,
    pub agent_id: AgentId,
    pub agent_name: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// One page of comments.
#[derive(Debug, Clone, Serialize)]
pub struct CommentList {
    pub comments: Vec<CommentView>,
    pub pagination: Pagination,
}

/// Post a comment on a market.
pub fn post_comment<S: LedgerStore>(
    store: &S,
    agent_id: &AgentId,
    market_id: &MarketId,
    content: &str,
) -> Result<CommentView> {
    store.transaction(|tx| {
        let market = tx.market(market_id)?.ok_or_else(|| Error::NotFound {
            entity: "market",
            id: market_id.to_string(),
        })?;
        if market.status() == MarketStatus::Cancelled {
            return Err(Error::InvalidState {
                operation: "comment on a market",
                status: market.status(),
            });
        }

        let agent = tx.agent(agent_id)?.ok_or_else(|| Error::NotFound {
            entity: "agent",
            id: agent_id.to_string(),
        })?;

        let comment = Comment::try_new(market_id.clone(), agent_id.clone(), content)?;
        tx.insert_comment(&comment)?;

        Ok(CommentView {
            id: comment.id,
            agent_id: agent.id,
            agent_name: agent.name,
            content: comment.content,
            created_at: comment.created_at,
        })
    })
}

/// List a market's comments, newest first.
pub fn list_comments<S: LedgerStore>(
    store: &S,
    market_id: &MarketId,
    page: u32,
    limit: Option<u32>,
) -> Result<CommentList> {
    let window = Page::clamped(page, limit, LIST_DEFAULT_LIMIT, LIST_MAX_LIMIT);
    store.transaction(|tx| {
        if tx.market(market_id)?.is_none() {
            return Err(Error::NotFound {
                entity: "market",
                id: market_id.to_string(),
            });
        }

        let total = tx.count_comments(market_id)?;
        let comments = tx.comments_for_market(market_id, window)?;
        Ok(CommentList {
            comments: views_for(tx, comments)?,
            pagination: Pagination::new(page, window.limit, total),
        })
    })
}

/// Attach author names to raw comments.
pub(super) fn views_for(
    tx: &mut impl LedgerTx,
    comments: Vec<Comment>,
) -> Result<Vec<CommentView>> {
    comments
        .into_iter()
        .map(|comment| {
            let agent_name = tx
                .agent(&comment.agent_id)?
                .map(|a| a.name)
                .unwrap_or_default();
            Ok(CommentView {
                id: comment.id,
                agent_id: comment.agent_id,
                agent_name,
                content: comment.content,
                created_at: comment.created_at,
            })
        })
        .collect()
}
