//! Market subcommands: create, list, show, and lifecycle moves.

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::Subcommand;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::adapter::sqlite::SqliteLedger;
use crate::application::{self, MarketDraft, MarketPatch};
use crate::domain::{Market, MarketCategory, MarketId, MarketStatus, OptionId};
use crate::error::Error;
use crate::port::MarketFilter;

use super::output;

#[derive(Debug, Subcommand)]
pub enum MarketCommand {
    /// Create a market.
    Create {
        /// Market title (question).
        #[arg(long)]
        title: String,
        /// Optional longer description.
        #[arg(long)]
        description: Option<String>,
        /// Category: sports, economics, weather, awards, or politics.
        #[arg(long)]
        category: MarketCategory,
        /// Create the market already open for wagers.
        #[arg(long)]
        open: bool,
        /// Scheduled opening time (RFC 3339).
        #[arg(long)]
        opens_at: Option<String>,
        /// Wagering deadline (RFC 3339).
        #[arg(long)]
        closes_at: Option<String>,
        /// Option label; repeat for each option (2-10).
        #[arg(long = "option", required = true)]
        options: Vec<String>,
    },
    /// List markets, newest first.
    List {
        /// Filter by status.
        #[arg(long)]
        status: Option<MarketStatus>,
        /// Filter by category.
        #[arg(long)]
        category: Option<MarketCategory>,
        /// 1-based page number.
        #[arg(long, default_value_t = 1)]
        page: u32,
        /// Page size (1-50).
        #[arg(long)]
        limit: Option<u32>,
        /// Emit JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
    /// Show one market with books, odds, and resolution.
    Show {
        /// Market ID.
        id: String,
        /// Emit JSON instead of text.
        #[arg(long)]
        json: bool,
    },
    /// Open an upcoming market for wagers.
    Open {
        /// Market ID.
        id: String,
    },
    /// Lock an open market against further wagers.
    Lock {
        /// Market ID.
        id: String,
    },
    /// Resolve a market and pay out the pool.
    Resolve {
        /// Market ID.
        id: String,
        /// Winning option: its ID or its label.
        #[arg(long = "winner")]
        winner: String,
        /// Optional resolution notes.
        #[arg(long)]
        notes: Option<String>,
    },
    /// Cancel a market and refund every stake.
    Cancel {
        /// Market ID.
        id: String,
    },
    /// Delete a market that has no wagers.
    Delete {
        /// Market ID.
        id: String,
    },
}

#[derive(Tabled)]
struct MarketRowView {
    id: String,
    title: String,
    category: MarketCategory,
    status: MarketStatus,
    staked: i64,
    wagers: u64,
}

impl MarketCommand {
    pub fn run(self, store: &SqliteLedger) -> anyhow::Result<()> {
        match self {
            MarketCommand::Create {
                title,
                description,
                category,
                open,
                opens_at,
                closes_at,
                options,
            } => {
                let market = application::create_market(
                    store,
                    MarketDraft {
                        title,
                        description,
                        category,
                        status: if open {
                            MarketStatus::Open
                        } else {
                            MarketStatus::Upcoming
                        },
                        opens_at: parse_time(opens_at.as_deref())?,
                        closes_at: parse_time(closes_at.as_deref())?,
                        options,
                    },
                )?;
                output::section("Market created");
                print_market_lines(&market);
                Ok(())
            }
            MarketCommand::List {
                status,
                category,
                page,
                limit,
                json,
            } => {
                let list = application::list_markets(
                    store,
                    MarketFilter { status, category },
                    page,
                    limit,
                )?;
                if json {
                    println!("{}", serde_json::to_string_pretty(&list)?);
                    return Ok(());
                }
                let rows: Vec<MarketRowView> = list
                    .markets
                    .iter()
                    .map(|m| MarketRowView {
                        id: m.id.to_string(),
                        title: m.title.clone(),
                        category: m.category,
                        status: m.status,
                        staked: m.total_staked,
                        wagers: m.wager_count,
                    })
                    .collect();
                println!("{}", Table::new(rows).with(Style::sharp()));
                output::note(&format!(
                    "page {} of {} ({} markets)",
                    list.pagination.page, list.pagination.total_pages, list.pagination.total
                ));
                Ok(())
            }
            MarketCommand::Show { id, json } => {
                let view = application::market_view(store, &MarketId::from(id))?;
                if json {
                    println!("{}", serde_json::to_string_pretty(&view)?);
                    return Ok(());
                }
                output::section(&view.summary.title);
                output::key_value("id", &view.summary.id);
                output::key_value("category", view.summary.category);
                output::key_value("status", view.summary.status);
                output::key_value("staked", view.summary.total_staked);
                output::key_value("wagers", view.summary.wager_count);
                for option in &view.summary.options {
                    output::note(&format!(
                        "  [{}] {} — {} coins, {} wagers, {}%",
                        option.option_id, option.label, option.staked,
                        option.wager_count, option.odds_percent,
                    ));
                }
                if let Some(resolution) = &view.resolution {
                    output::key_value("winner", &resolution.winning_option_label);
                    if let Some(notes) = &resolution.notes {
                        output::key_value("notes", notes);
                    }
                }
                Ok(())
            }
            MarketCommand::Open { id } => {
                update_status(store, &id, MarketStatus::Open)?;
                output::ok("market open for wagers");
                Ok(())
            }
            MarketCommand::Lock { id } => {
                update_status(store, &id, MarketStatus::Locked)?;
                output::ok("market locked");
                Ok(())
            }
            MarketCommand::Resolve { id, winner, notes } => {
                let market_id = MarketId::from(id);
                let winning_option = resolve_option_ref(store, &market_id, &winner)?;
                let report =
                    application::resolve_market(store, &market_id, &winning_option, notes)?;
                output::section(&format!("Resolved: {} wins", report.winning_option_label));
                for line in &report.payouts {
                    output::note(&format!(
                        "  {}: staked {}, paid {}{}",
                        line.agent_name,
                        line.wagered,
                        line.payout,
                        if line.won { " (won)" } else { "" },
                    ));
                }
                Ok(())
            }
            MarketCommand::Cancel { id } => {
                application::cancel_market(store, &MarketId::from(id))?;
                output::ok("market cancelled, stakes refunded");
                Ok(())
            }
            MarketCommand::Delete { id } => {
                application::delete_market(store, &MarketId::from(id))?;
                output::ok("market deleted");
                Ok(())
            }
        }
    }
}

fn update_status(store: &SqliteLedger, id: &str, status: MarketStatus) -> anyhow::Result<Market> {
    Ok(application::update_market(
        store,
        &MarketId::from(id),
        MarketPatch {
            status: Some(status),
            ..MarketPatch::default()
        },
    )?)
}

fn print_market_lines(market: &Market) {
    output::key_value("id", market.id());
    output::key_value("status", market.status());
    for option in market.options() {
        output::note(&format!("  [{}] {}", option.id(), option.label()));
    }
}

/// Accept a winning option as either its ID or its label.
fn resolve_option_ref(
    store: &SqliteLedger,
    market_id: &MarketId,
    reference: &str,
) -> anyhow::Result<OptionId> {
    let view = application::market_view(store, market_id)?;
    let by_id = view
        .summary
        .options
        .iter()
        .find(|o| o.option_id.as_str() == reference);
    let by_label = view
        .summary
        .options
        .iter()
        .find(|o| o.label.eq_ignore_ascii_case(reference));
    by_id
        .or(by_label)
        .map(|o| o.option_id.clone())
        .ok_or_else(|| {
            Error::Domain(crate::domain::DomainError::UnknownOption {
                option_id: reference.to_string(),
            })
            .into()
        })
}

fn parse_time(value: Option<&str>) -> anyhow::Result<Option<DateTime<Utc>>> {
    value
        .map(|s| {
            DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.with_timezone(&Utc))
                .with_context(|| format!("invalid RFC 3339 timestamp: {s}"))
        })
        .transpose()
}
