//! Market lifecycle: creation, edits, cancellation, resolution, and the
//! read-side views.
//!
//! Resolution and cancellation are the two operations that move coins, and
//! each runs as one transaction: the status check at the top of the
//! transaction doubles as the compare-and-set that keeps a second
//! concurrent attempt from settling a market twice.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::domain::{
    calculate_payouts, even_odds_percent, odds_percent, AgentId, DomainError, Market,
    MarketCategory, MarketId, MarketStatus, OptionId, Resolution, Wager,
};
use crate::error::{Error, Result};
use crate::port::{LedgerStore, LedgerTx, MarketFilter, Page};

use super::{CommentView, Pagination};

const LIST_DEFAULT_LIMIT: u32 = 20;
const LIST_MAX_LIMIT: u32 = 50;
const VIEW_COMMENT_COUNT: u32 = 50;

/// Inputs for creating a market.
#[derive(Debug, Clone)]
pub struct MarketDraft {
    pub title: String,
    pub description: Option<String>,
    pub category: MarketCategory,
    /// `Upcoming` or `Open`; anything else is rejected.
    pub status: MarketStatus,
    pub opens_at: Option<DateTime<Utc>>,
    pub closes_at: Option<DateTime<Utc>>,
    pub options: Vec<String>,
}

/// Field edits for a non-resolved market. Outer `None` leaves a field
/// untouched; the nested `Option` distinguishes "set" from "clear".
#[derive(Debug, Clone, Default)]
pub struct MarketPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub status: Option<MarketStatus>,
    pub opens_at: Option<Option<DateTime<Utc>>>,
    pub closes_at: Option<Option<DateTime<Utc>>>,
}

/// Read-side stats for one option.
#[derive(Debug, Clone, Serialize)]
pub struct OptionBook {
    pub option_id: OptionId,
    pub label: String,
    pub staked: i64,
    pub wager_count: u64,
    /// `round(staked / total * 100)`, or the even split when nothing is
    /// staked. Advisory; options need not sum to exactly 100.
    pub odds_percent: u32,
}

/// A market as shown in listings.
#[derive(Debug, Clone, Serialize)]
pub struct MarketSummary {
    pub id: MarketId,
    pub title: String,
    pub description: Option<String>,
    pub category: MarketCategory,
    pub status: MarketStatus,
    pub opens_at: Option<DateTime<Utc>>,
    pub closes_at: Option<DateTime<Utc>>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub options: Vec<OptionBook>,
    pub total_staked: i64,
    pub wager_count: u64,
}

/// How a resolved market settled, as shown to callers.
#[derive(Debug, Clone, Serialize)]
pub struct ResolutionView {
    pub winning_option_id: OptionId,
    pub winning_option_label: String,
    pub resolved_at: DateTime<Utc>,
    pub notes: Option<String>,
}

/// Full detail view of one market.
#[derive(Debug, Clone, Serialize)]
pub struct MarketView {
    #[serde(flatten)]
    pub summary: MarketSummary,
    pub resolution: Option<ResolutionView>,
    pub recent_comments: Vec<CommentView>,
}

/// One page of market summaries.
#[derive(Debug, Clone, Serialize)]
pub struct MarketList {
    pub markets: Vec<MarketSummary>,
    pub pagination: Pagination,
}

/// One agent's line in a resolution report.
#[derive(Debug, Clone, Serialize)]
pub struct PayoutLine {
    pub agent_id: AgentId,
    pub agent_name: String,
    pub wagered: i64,
    pub payout: i64,
    pub won: bool,
}

/// What `resolve_market` hands back for observability: the winner plus a
/// per-agent breakdown of the settlement.
#[derive(Debug, Clone, Serialize)]
pub struct ResolutionReport {
    pub market_id: MarketId,
    pub winning_option_id: OptionId,
    pub winning_option_label: String,
    pub resolved_at: DateTime<Utc>,
    pub notes: Option<String>,
    pub payouts: Vec<PayoutLine>,
}

/// Create a market from a draft, validating every domain bound.
pub fn create_market<S: LedgerStore>(store: &S, draft: MarketDraft) -> Result<Market> {
    let market = Market::try_new(
        draft.title,
        draft.description,
        draft.category,
        draft.status,
        draft.opens_at,
        draft.closes_at,
        draft.options,
    )?;

    store.transaction(|tx| tx.insert_market(&market))?;

    info!(market = %market.id(), title = market.title(), "market created");
    Ok(market)
}

/// Fetch the detail view of one market: options with stakes and odds, the
/// resolution if settled, and the newest comments.
pub fn market_view<S: LedgerStore>(store: &S, market_id: &MarketId) -> Result<MarketView> {
    store.transaction(|tx| {
        let market = require_market(tx, market_id)?;
        let summary = summarize(tx, &market)?;

        let resolution = match tx.resolution(market_id)? {
            Some(resolution) => Some(ResolutionView {
                winning_option_label: market
                    .option(&resolution.winning_option_id)
                    .map(|o| o.label().to_string())
                    .unwrap_or_default(),
                winning_option_id: resolution.winning_option_id,
                resolved_at: resolution.resolved_at,
                notes: resolution.notes,
            }),
            None => None,
        };

        let page = Page {
            offset: 0,
            limit: VIEW_COMMENT_COUNT,
        };
        let comments = tx.comments_for_market(market_id, page)?;
        let recent_comments = super::comments::views_for(tx, comments)?;

        Ok(MarketView {
            summary,
            resolution,
            recent_comments,
        })
    })
}

/// List markets matching the filter, newest first.
pub fn list_markets<S: LedgerStore>(
    store: &S,
    filter: MarketFilter,
    page: u32,
    limit: Option<u32>,
) -> Result<MarketList> {
    let window = Page::clamped(page, limit, LIST_DEFAULT_LIMIT, LIST_MAX_LIMIT);
    store.transaction(|tx| {
        let total = tx.count_markets(&filter)?;
        let markets = tx
            .list_markets(&filter, window)?
            .iter()
            .map(|market| summarize(tx, market))
            .collect::<Result<Vec<_>>>()?;
        Ok(MarketList {
            markets,
            pagination: Pagination::new(page, window.limit, total),
        })
    })
}

/// Apply field edits to a non-resolved market.
///
/// A status change must be legal per the transition table; changing status
/// to `Cancelled` refunds every wager in the same transaction. Setting
/// `Resolved` through here is rejected — resolution goes through
/// [`resolve_market`] so the payout pass can never be skipped.
pub fn update_market<S: LedgerStore>(
    store: &S,
    market_id: &MarketId,
    patch: MarketPatch,
) -> Result<Market> {
    let (market, refunded) = store.transaction(|tx| {
        let mut market = require_market(tx, market_id)?;

        if market.status() == MarketStatus::Resolved {
            return Err(Error::InvalidState {
                operation: "edit a market",
                status: market.status(),
            });
        }

        if let Some(title) = patch.title {
            market.set_title(title)?;
        }
        if let Some(description) = patch.description {
            market.set_description(description)?;
        }
        if let Some(opens_at) = patch.opens_at {
            market.set_opens_at(opens_at);
        }
        if let Some(closes_at) = patch.closes_at {
            market.set_closes_at(closes_at);
        }

        let mut refunded = 0usize;
        match patch.status {
            Some(MarketStatus::Resolved) => {
                return Err(Error::InvalidState {
                    operation: "resolve a market by field update",
                    status: market.status(),
                });
            }
            Some(MarketStatus::Cancelled) => {
                if !market.status().can_transition_to(MarketStatus::Cancelled) {
                    return Err(Error::InvalidState {
                        operation: "cancel a market",
                        status: market.status(),
                    });
                }
                refunded = refund_wagers(tx, market_id)?;
                market.transition_to(MarketStatus::Cancelled)?;
            }
            Some(next) if next != market.status() => {
                market.transition_to(next)?;
            }
            _ => {}
        }

        tx.update_market(&market)?;
        Ok((market, refunded))
    })?;

    if market.status() == MarketStatus::Cancelled {
        info!(market = %market_id, wagers = refunded, "market cancelled, stakes refunded");
    }
    Ok(market)
}

/// Cancel a market, refunding every wager. Shorthand for a status update.
pub fn cancel_market<S: LedgerStore>(store: &S, market_id: &MarketId) -> Result<Market> {
    update_market(
        store,
        market_id,
        MarketPatch {
            status: Some(MarketStatus::Cancelled),
            ..MarketPatch::default()
        },
    )
}

/// Delete a market that has no wagers. Markets with stake attached must be
/// cancelled instead so the coins flow back.
pub fn delete_market<S: LedgerStore>(store: &S, market_id: &MarketId) -> Result<()> {
    store.transaction(|tx| {
        require_market(tx, market_id)?;
        if !tx.wagers_for_market(market_id)?.is_empty() {
            return Err(Error::MarketHasWagers);
        }
        tx.delete_market(market_id)?;
        Ok(())
    })?;

    info!(market = %market_id, "market deleted");
    Ok(())
}

/// Resolve a market: record the winning option, settle every wager through
/// the payout calculator, and credit the winners — all in one transaction.
pub fn resolve_market<S: LedgerStore>(
    store: &S,
    market_id: &MarketId,
    winning_option_id: &OptionId,
    notes: Option<String>,
) -> Result<ResolutionReport> {
    let report = store.transaction(|tx| {
        let mut market = require_market(tx, market_id)?;

        // The compare-and-set: a concurrent resolve that committed first
        // leaves the market Resolved and this check fails the transaction.
        if market.status().is_terminal() {
            return Err(Error::InvalidState {
                operation: "resolve a market",
                status: market.status(),
            });
        }

        let winning_label = market
            .option(winning_option_id)
            .ok_or_else(|| DomainError::UnknownOption {
                option_id: winning_option_id.to_string(),
            })?
            .label()
            .to_string();

        let now = Utc::now();
        let resolution = Resolution::try_new(
            market_id.clone(),
            winning_option_id.clone(),
            notes,
            now,
        )?;

        let wagers = tx.wagers_for_market(market_id)?;
        let awards = calculate_payouts(&wagers, winning_option_id);

        market.resolve(now)?;
        tx.update_market(&market)?;
        tx.insert_resolution(&resolution)?;

        let mut payouts = Vec::with_capacity(awards.len());
        for award in awards {
            tx.set_wager_payout(&award.wager_id, award.amount)?;
            if award.amount > 0 {
                tx.credit_agent(&award.agent_id, award.amount)?;
            }

            let wagered = wagers
                .iter()
                .find(|w| w.id == award.wager_id)
                .map_or(0, |w| w.amount);
            let agent_name = tx
                .agent(&award.agent_id)?
                .map(|a| a.name)
                .unwrap_or_default();
            payouts.push(PayoutLine {
                agent_id: award.agent_id,
                agent_name,
                wagered,
                payout: award.amount,
                won: award.amount > wagered,
            });
        }

        Ok(ResolutionReport {
            market_id: market_id.clone(),
            winning_option_id: winning_option_id.clone(),
            winning_option_label: winning_label,
            resolved_at: now,
            notes: resolution.notes,
            payouts,
        })
    })?;

    info!(
        market = %market_id,
        winner = %report.winning_option_label,
        wagers = report.payouts.len(),
        pool = report.payouts.iter().map(|p| p.payout).sum::<i64>(),
        "market resolved"
    );
    Ok(report)
}

fn require_market(tx: &mut impl LedgerTx, market_id: &MarketId) -> Result<Market> {
    tx.market(market_id)?.ok_or_else(|| Error::NotFound {
        entity: "market",
        id: market_id.to_string(),
    })
}

/// Refund every wager on a market: credit the stake back and pin the
/// payout to the stake. Returns the number of wagers refunded.
fn refund_wagers(tx: &mut impl LedgerTx, market_id: &MarketId) -> Result<usize> {
    let wagers = tx.wagers_for_market(market_id)?;
    for wager in &wagers {
        tx.credit_agent(&wager.agent_id, wager.amount)?;
        tx.set_wager_payout(&wager.id, wager.amount)?;
    }
    Ok(wagers.len())
}

fn summarize(tx: &mut impl LedgerTx, market: &Market) -> Result<MarketSummary> {
    let wagers = tx.wagers_for_market(market.id())?;
    Ok(build_summary(market, &wagers))
}

fn build_summary(market: &Market, wagers: &[Wager]) -> MarketSummary {
    let total_staked: i64 = wagers.iter().map(|w| w.amount).sum();
    let options = market
        .options()
        .iter()
        .map(|option| {
            let staked: i64 = wagers
                .iter()
                .filter(|w| &w.option_id == option.id())
                .map(|w| w.amount)
                .sum();
            let wager_count = wagers.iter().filter(|w| &w.option_id == option.id()).count();
            OptionBook {
                option_id: option.id().clone(),
                label: option.label().to_string(),
                staked,
                wager_count: wager_count as u64,
                odds_percent: if total_staked > 0 {
                    odds_percent(staked, total_staked)
                } else {
                    even_odds_percent(market.options().len())
                },
            }
        })
        .collect();

    MarketSummary {
        id: market.id().clone(),
        title: market.title().to_string(),
        description: market.description().map(str::to_string),
        category: market.category(),
        status: market.status(),
        opens_at: market.opens_at(),
        closes_at: market.closes_at(),
        resolved_at: market.resolved_at(),
        created_at: market.created_at(),
        options,
        total_staked,
        wager_count: wagers.len() as u64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AgentId, OptionId, Wager};

    fn market_with_yes_no() -> Market {
        Market::try_new(
            "Will the river flood this spring?",
            None,
            MarketCategory::Weather,
            MarketStatus::Open,
            None,
            None,
            vec!["Yes".to_string(), "No".to_string()],
        )
        .unwrap()
    }

    #[test]
    fn build_summary_computes_books_and_odds() {
        let market = market_with_yes_no();
        let yes = market.options()[0].id().clone();
        let no = market.options()[1].id().clone();
        let wagers = vec![
            Wager::new(AgentId::new(), market.id().clone(), yes.clone(), 30),
            Wager::new(AgentId::new(), market.id().clone(), yes.clone(), 10),
            Wager::new(AgentId::new(), market.id().clone(), no.clone(), 60),
        ];

        let summary = build_summary(&market, &wagers);

        assert_eq!(summary.total_staked, 100);
        assert_eq!(summary.wager_count, 3);
        assert_eq!(summary.options[0].staked, 40);
        assert_eq!(summary.options[0].wager_count, 2);
        assert_eq!(summary.options[0].odds_percent, 40);
        assert_eq!(summary.options[1].staked, 60);
        assert_eq!(summary.options[1].odds_percent, 60);
    }

    #[test]
    fn build_summary_with_no_stakes_uses_even_split() {
        let market = market_with_yes_no();
        let summary = build_summary(&market, &[]);
        assert_eq!(summary.total_staked, 0);
        assert!(summary.options.iter().all(|o| o.odds_percent == 50));
    }

    #[test]
    fn odds_of_a_skewed_three_way_book_need_not_sum_to_100() {
        let market = Market::try_new(
            "Who takes the cup?",
            None,
            MarketCategory::Sports,
            MarketStatus::Open,
            None,
            None,
            vec!["Ada".to_string(), "Bo".to_string(), "Cy".to_string()],
        )
        .unwrap();
        let ids: Vec<OptionId> = market.options().iter().map(|o| o.id().clone()).collect();
        let wagers: Vec<Wager> = ids
            .iter()
            .map(|id| Wager::new(AgentId::new(), market.id().clone(), id.clone(), 1))
            .collect();

        let summary = build_summary(&market, &wagers);

        // Each option rounds 33.33 down to 33; 99 total is expected.
        let sum: u32 = summary.options.iter().map(|o| o.odds_percent).sum();
        assert_eq!(sum, 99);
    }
}
