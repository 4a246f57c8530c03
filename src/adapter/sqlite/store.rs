//! SQLite ledger implementation using Diesel.
//!
//! Every [`LedgerStore::transaction`] call checks one connection out of
//! the pool and wraps the closure in a Diesel transaction, so the unit of
//! work commits or rolls back as a whole. Constraint violations surface
//! as the crate's Conflict-family errors at the statements that can raise
//! them.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::SqliteConnection;

use super::model::{AgentRow, CommentRow, MarketRow, OptionRow, ResolutionRow, WagerRow};
use super::schema::{agents, comments, market_options, markets, resolutions, wagers};
use super::DbPool;
use crate::domain::{
    Agent, AgentId, Comment, CommentId, Market, MarketId, MarketOption, OptionId, Resolution,
    Wager, WagerId,
};
use crate::error::{Error, Result};
use crate::port::{LedgerStore, LedgerTx, MarketFilter, Page};

/// SQLite-backed ledger.
pub struct SqliteLedger {
    pool: DbPool,
}

impl SqliteLedger {
    /// Create a new SQLite ledger over the given pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Unit of work over one pooled connection inside a transaction.
pub struct SqliteTx<'conn> {
    conn: &'conn mut SqliteConnection,
}

impl LedgerStore for SqliteLedger {
    type Tx<'conn>
        = SqliteTx<'conn>
    where
        Self: 'conn;

    fn transaction<T>(&self, f: impl FnOnce(&mut Self::Tx<'_>) -> Result<T>) -> Result<T> {
        let mut conn = self
            .pool
            .get()
            .map_err(|e| Error::Connection(e.to_string()))?;
        conn.transaction(|conn| f(&mut SqliteTx { conn }))
    }
}

fn timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

fn opt_timestamp(dt: Option<DateTime<Utc>>) -> Option<String> {
    dt.map(timestamp)
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Parse(format!("bad timestamp {s:?}: {e}")))
}

fn parse_opt_timestamp(s: Option<String>) -> Result<Option<DateTime<Utc>>> {
    s.as_deref().map(parse_timestamp).transpose()
}

fn agent_to_row(agent: &Agent) -> AgentRow {
    AgentRow {
        id: agent.id.to_string(),
        name: agent.name.clone(),
        api_key: agent.api_key.clone(),
        balance: agent.balance,
        created_at: timestamp(agent.created_at),
    }
}

fn agent_from_row(row: AgentRow) -> Result<Agent> {
    Ok(Agent {
        id: AgentId::from(row.id),
        name: row.name,
        api_key: row.api_key,
        balance: row.balance,
        created_at: parse_timestamp(&row.created_at)?,
    })
}

fn market_to_row(market: &Market) -> MarketRow {
    MarketRow {
        id: market.id().to_string(),
        title: market.title().to_string(),
        description: market.description().map(str::to_string),
        category: market.category().as_str().to_string(),
        status: market.status().as_str().to_string(),
        opens_at: opt_timestamp(market.opens_at()),
        closes_at: opt_timestamp(market.closes_at()),
        resolved_at: opt_timestamp(market.resolved_at()),
        created_at: timestamp(market.created_at()),
    }
}

fn market_from_rows(row: MarketRow, option_rows: Vec<OptionRow>) -> Result<Market> {
    let category = row
        .category
        .parse()
        .map_err(|e: String| Error::Parse(e))?;
    let status = row.status.parse().map_err(|e: String| Error::Parse(e))?;
    let options = option_rows
        .into_iter()
        .map(|o| MarketOption::new(OptionId::from(o.id), o.label, o.ordinal as u32))
        .collect();
    Ok(Market::from_parts(
        MarketId::from(row.id),
        row.title,
        row.description,
        category,
        status,
        parse_opt_timestamp(row.opens_at)?,
        parse_opt_timestamp(row.closes_at)?,
        parse_opt_timestamp(row.resolved_at)?,
        parse_timestamp(&row.created_at)?,
        options,
    ))
}

fn wager_to_row(wager: &Wager) -> WagerRow {
    WagerRow {
        id: wager.id.to_string(),
        agent_id: wager.agent_id.to_string(),
        market_id: wager.market_id.to_string(),
        option_id: wager.option_id.to_string(),
        amount: wager.amount,
        payout: wager.payout,
        created_at: timestamp(wager.created_at),
    }
}

fn wager_from_row(row: WagerRow) -> Result<Wager> {
    Ok(Wager {
        id: WagerId::from(row.id),
        agent_id: AgentId::from(row.agent_id),
        market_id: MarketId::from(row.market_id),
        option_id: OptionId::from(row.option_id),
        amount: row.amount,
        payout: row.payout,
        created_at: parse_timestamp(&row.created_at)?,
    })
}

fn comment_from_row(row: CommentRow) -> Result<Comment> {
    Ok(Comment {
        id: CommentId::from(row.id),
        market_id: MarketId::from(row.market_id),
        agent_id: AgentId::from(row.agent_id),
        content: row.content,
        created_at: parse_timestamp(&row.created_at)?,
    })
}

/// True when `err` is a unique-constraint violation mentioning `column`.
fn is_unique_violation_on(err: &DieselError, column: &str) -> bool {
    matches!(
        err,
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info)
            if info.message().contains(column)
    )
}

impl SqliteTx<'_> {
    fn load_market(&mut self, row: MarketRow) -> Result<Market> {
        let option_rows: Vec<OptionRow> = market_options::table
            .filter(market_options::market_id.eq(&row.id))
            .order(market_options::ordinal.asc())
            .load(self.conn)?;
        market_from_rows(row, option_rows)
    }

    fn boxed_markets(filter: &MarketFilter) -> markets::BoxedQuery<'static, diesel::sqlite::Sqlite> {
        let mut query = markets::table.into_boxed();
        if let Some(status) = filter.status {
            query = query.filter(markets::status.eq(status.as_str()));
        }
        if let Some(category) = filter.category {
            query = query.filter(markets::category.eq(category.as_str()));
        }
        query
    }
}

impl LedgerTx for SqliteTx<'_> {
    fn insert_agent(&mut self, agent: &Agent) -> Result<()> {
        diesel::insert_into(agents::table)
            .values(&agent_to_row(agent))
            .execute(self.conn)
            .map_err(|e| {
                if is_unique_violation_on(&e, "agents.name") {
                    Error::NameTaken {
                        name: agent.name.clone(),
                    }
                } else {
                    e.into()
                }
            })?;
        Ok(())
    }

    fn agent(&mut self, id: &AgentId) -> Result<Option<Agent>> {
        let row: Option<AgentRow> = agents::table
            .find(id.as_str())
            .first(self.conn)
            .optional()?;
        row.map(agent_from_row).transpose()
    }

    fn agent_by_name(&mut self, name: &str) -> Result<Option<Agent>> {
        let row: Option<AgentRow> = agents::table
            .filter(agents::name.eq(name))
            .first(self.conn)
            .optional()?;
        row.map(agent_from_row).transpose()
    }

    fn agent_by_api_key(&mut self, api_key: &str) -> Result<Option<Agent>> {
        let row: Option<AgentRow> = agents::table
            .filter(agents::api_key.eq(api_key))
            .first(self.conn)
            .optional()?;
        row.map(agent_from_row).transpose()
    }

    fn agents_by_balance(&mut self) -> Result<Vec<Agent>> {
        let rows: Vec<AgentRow> = agents::table
            .order(agents::balance.desc())
            .then_order_by(agents::name.asc())
            .load(self.conn)?;
        rows.into_iter().map(agent_from_row).collect()
    }

    fn credit_agent(&mut self, id: &AgentId, amount: i64) -> Result<i64> {
        let updated = diesel::update(agents::table.find(id.as_str()))
            .set(agents::balance.eq(agents::balance + amount))
            .execute(self.conn)?;
        if updated == 0 {
            return Err(Error::NotFound {
                entity: "agent",
                id: id.to_string(),
            });
        }
        let balance = agents::table
            .find(id.as_str())
            .select(agents::balance)
            .first(self.conn)?;
        Ok(balance)
    }

    fn debit_agent(&mut self, id: &AgentId, amount: i64) -> Result<i64> {
        // Check and decrement in one guarded statement so a concurrent
        // debit cannot interleave.
        let updated = diesel::update(
            agents::table
                .find(id.as_str())
                .filter(agents::balance.ge(amount)),
        )
        .set(agents::balance.eq(agents::balance - amount))
        .execute(self.conn)?;

        if updated == 0 {
            let balance: Option<i64> = agents::table
                .find(id.as_str())
                .select(agents::balance)
                .first(self.conn)
                .optional()?;
            return match balance {
                Some(balance) => Err(Error::InsufficientFunds {
                    balance,
                    requested: amount,
                }),
                None => Err(Error::NotFound {
                    entity: "agent",
                    id: id.to_string(),
                }),
            };
        }

        let balance = agents::table
            .find(id.as_str())
            .select(agents::balance)
            .first(self.conn)?;
        Ok(balance)
    }

    fn insert_market(&mut self, market: &Market) -> Result<()> {
        diesel::insert_into(markets::table)
            .values(&market_to_row(market))
            .execute(self.conn)?;
        let option_rows: Vec<OptionRow> = market
            .options()
            .iter()
            .map(|o| OptionRow {
                id: o.id().to_string(),
                market_id: market.id().to_string(),
                label: o.label().to_string(),
                ordinal: o.ordinal() as i32,
            })
            .collect();
        diesel::insert_into(market_options::table)
            .values(&option_rows)
            .execute(self.conn)?;
        Ok(())
    }

    fn market(&mut self, id: &MarketId) -> Result<Option<Market>> {
        let row: Option<MarketRow> = markets::table
            .find(id.as_str())
            .first(self.conn)
            .optional()?;
        row.map(|row| self.load_market(row)).transpose()
    }

    fn update_market(&mut self, market: &Market) -> Result<()> {
        let updated = diesel::update(markets::table.find(market.id().as_str()))
            .set(&market_to_row(market))
            .execute(self.conn)?;
        if updated == 0 {
            return Err(Error::NotFound {
                entity: "market",
                id: market.id().to_string(),
            });
        }
        Ok(())
    }

    fn delete_market(&mut self, id: &MarketId) -> Result<bool> {
        diesel::delete(comments::table.filter(comments::market_id.eq(id.as_str())))
            .execute(self.conn)?;
        diesel::delete(market_options::table.filter(market_options::market_id.eq(id.as_str())))
            .execute(self.conn)?;
        let deleted =
            diesel::delete(markets::table.find(id.as_str())).execute(self.conn)?;
        Ok(deleted > 0)
    }

    fn list_markets(&mut self, filter: &MarketFilter, page: Page) -> Result<Vec<Market>> {
        let rows: Vec<MarketRow> = Self::boxed_markets(filter)
            .order(markets::created_at.desc())
            .then_order_by(markets::id.asc())
            .offset(i64::from(page.offset))
            .limit(i64::from(page.limit))
            .load(self.conn)?;
        rows.into_iter().map(|row| self.load_market(row)).collect()
    }

    fn count_markets(&mut self, filter: &MarketFilter) -> Result<u64> {
        let count: i64 = Self::boxed_markets(filter).count().get_result(self.conn)?;
        Ok(count as u64)
    }

    fn insert_wager(&mut self, wager: &Wager) -> Result<()> {
        diesel::insert_into(wagers::table)
            .values(&wager_to_row(wager))
            .execute(self.conn)
            .map_err(|e| {
                if is_unique_violation_on(&e, "wagers.agent_id") {
                    Error::DuplicateWager
                } else {
                    e.into()
                }
            })?;
        Ok(())
    }

    fn wager_for(&mut self, agent_id: &AgentId, market_id: &MarketId) -> Result<Option<Wager>> {
        let row: Option<WagerRow> = wagers::table
            .filter(wagers::agent_id.eq(agent_id.as_str()))
            .filter(wagers::market_id.eq(market_id.as_str()))
            .first(self.conn)
            .optional()?;
        row.map(wager_from_row).transpose()
    }

    fn wagers_for_market(&mut self, market_id: &MarketId) -> Result<Vec<Wager>> {
        let rows: Vec<WagerRow> = wagers::table
            .filter(wagers::market_id.eq(market_id.as_str()))
            .order(wagers::created_at.asc())
            .then_order_by(wagers::id.asc())
            .load(self.conn)?;
        rows.into_iter().map(wager_from_row).collect()
    }

    fn wagers_for_agent(&mut self, agent_id: &AgentId) -> Result<Vec<Wager>> {
        let rows: Vec<WagerRow> = wagers::table
            .filter(wagers::agent_id.eq(agent_id.as_str()))
            .order(wagers::created_at.desc())
            .then_order_by(wagers::id.asc())
            .load(self.conn)?;
        rows.into_iter().map(wager_from_row).collect()
    }

    fn set_wager_payout(&mut self, id: &WagerId, payout: i64) -> Result<()> {
        let updated = diesel::update(wagers::table.find(id.as_str()))
            .set(wagers::payout.eq(Some(payout)))
            .execute(self.conn)?;
        if updated == 0 {
            return Err(Error::NotFound {
                entity: "wager",
                id: id.to_string(),
            });
        }
        Ok(())
    }

    fn insert_resolution(&mut self, resolution: &Resolution) -> Result<()> {
        diesel::insert_into(resolutions::table)
            .values(&ResolutionRow {
                market_id: resolution.market_id.to_string(),
                winning_option_id: resolution.winning_option_id.to_string(),
                notes: resolution.notes.clone(),
                resolved_at: timestamp(resolution.resolved_at),
            })
            .execute(self.conn)?;
        Ok(())
    }

    fn resolution(&mut self, market_id: &MarketId) -> Result<Option<Resolution>> {
        let row: Option<ResolutionRow> = resolutions::table
            .find(market_id.as_str())
            .first(self.conn)
            .optional()?;
        row.map(|row| {
            Ok(Resolution {
                market_id: MarketId::from(row.market_id),
                winning_option_id: OptionId::from(row.winning_option_id),
                notes: row.notes,
                resolved_at: parse_timestamp(&row.resolved_at)?,
            })
        })
        .transpose()
    }

    fn insert_comment(&mut self, comment: &Comment) -> Result<()> {
        diesel::insert_into(comments::table)
            .values(&CommentRow {
                id: comment.id.to_string(),
                market_id: comment.market_id.to_string(),
                agent_id: comment.agent_id.to_string(),
                content: comment.content.clone(),
                created_at: timestamp(comment.created_at),
            })
            .execute(self.conn)?;
        Ok(())
    }

    fn comments_for_market(&mut self, market_id: &MarketId, page: Page) -> Result<Vec<Comment>> {
        let rows: Vec<CommentRow> = comments::table
            .filter(comments::market_id.eq(market_id.as_str()))
            .order(comments::created_at.desc())
            .then_order_by(comments::id.asc())
            .offset(i64::from(page.offset))
            .limit(i64::from(page.limit))
            .load(self.conn)?;
        rows.into_iter().map(comment_from_row).collect()
    }

    fn count_comments(&mut self, market_id: &MarketId) -> Result<u64> {
        let count: i64 = comments::table
            .filter(comments::market_id.eq(market_id.as_str()))
            .count()
            .get_result(self.conn)?;
        Ok(count as u64)
    }
}
