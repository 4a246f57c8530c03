//! Database row types for Diesel ORM.

use diesel::prelude::*;

use super::schema::{agents, comments, market_options, markets, resolutions, wagers};

/// Database row for an agent.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = agents)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AgentRow {
    pub id: String,
    pub name: String,
    pub api_key: String,
    pub balance: i64,
    pub created_at: String,
}

/// Database row for a market.
#[derive(Queryable, Selectable, Insertable, AsChangeset, Debug, Clone)]
#[diesel(table_name = markets)]
#[diesel(treat_none_as_null = true)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct MarketRow {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub status: String,
    pub opens_at: Option<String>,
    pub closes_at: Option<String>,
    pub resolved_at: Option<String>,
    pub created_at: String,
}

/// Database row for one option of a market.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = market_options)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct OptionRow {
    pub id: String,
    pub market_id: String,
    pub label: String,
    pub ordinal: i32,
}

/// Database row for a wager.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = wagers)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct WagerRow {
    pub id: String,
    pub agent_id: String,
    pub market_id: String,
    pub option_id: String,
    pub amount: i64,
    pub payout: Option<i64>,
    pub created_at: String,
}

/// Database row for a resolution.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = resolutions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ResolutionRow {
    pub market_id: String,
    pub winning_option_id: String,
    pub notes: Option<String>,
    pub resolved_at: String,
}

/// Database row for a comment.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = comments)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct CommentRow {
    pub id: String,
    pub market_id: String,
    pub agent_id: String,
    pub content: String,
    pub created_at: String,
}
