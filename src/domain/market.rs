//! Market-related domain types.
//!
//! - [`Market`] - A prediction market with 2-10 mutually exclusive options
//! - [`MarketOption`] - A single option within a market
//! - [`MarketStatus`] - The lifecycle state machine
//! - [`MarketCategory`] - Closed set of market categories
//!
//! Status legality lives in one place, [`MarketStatus::can_transition_to`];
//! everything that moves a market through its lifecycle goes through
//! [`Market::transition_to`] or [`Market::resolve`].

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::id::{MarketId, OptionId};

const TITLE_MIN: usize = 5;
const TITLE_MAX: usize = 200;
const DESCRIPTION_MAX: usize = 1000;
const OPTIONS_MIN: usize = 2;
const OPTIONS_MAX: usize = 10;
const OPTION_LABEL_MAX: usize = 100;

/// Category of a market question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MarketCategory {
    Sports,
    Economics,
    Weather,
    Awards,
    Politics,
}

impl MarketCategory {
    /// All categories, in display order.
    pub const ALL: [MarketCategory; 5] = [
        MarketCategory::Sports,
        MarketCategory::Economics,
        MarketCategory::Weather,
        MarketCategory::Awards,
        MarketCategory::Politics,
    ];

    /// Stable uppercase name used in storage and query parameters.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            MarketCategory::Sports => "SPORTS",
            MarketCategory::Economics => "ECONOMICS",
            MarketCategory::Weather => "WEATHER",
            MarketCategory::Awards => "AWARDS",
            MarketCategory::Politics => "POLITICS",
        }
    }
}

impl fmt::Display for MarketCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MarketCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "SPORTS" => Ok(MarketCategory::Sports),
            "ECONOMICS" => Ok(MarketCategory::Economics),
            "WEATHER" => Ok(MarketCategory::Weather),
            "AWARDS" => Ok(MarketCategory::Awards),
            "POLITICS" => Ok(MarketCategory::Politics),
            other => Err(format!("unknown market category: {other}")),
        }
    }
}

/// Lifecycle state of a market.
///
/// `Upcoming -> Open -> Locked -> Resolved`, and any non-terminal state may
/// move to `Cancelled`. `Resolved` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MarketStatus {
    Upcoming,
    Open,
    Locked,
    Resolved,
    Cancelled,
}

impl MarketStatus {
    /// Whether `self -> next` is a legal lifecycle move.
    ///
    /// This is the single transition table; nothing else in the crate
    /// compares statuses to decide legality.
    #[must_use]
    pub const fn can_transition_to(self, next: MarketStatus) -> bool {
        matches!(
            (self, next),
            (MarketStatus::Upcoming, MarketStatus::Open)
                | (MarketStatus::Open, MarketStatus::Locked)
                | (
                    MarketStatus::Upcoming | MarketStatus::Open | MarketStatus::Locked,
                    MarketStatus::Resolved | MarketStatus::Cancelled,
                )
        )
    }

    /// Terminal states accept no further transitions.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, MarketStatus::Resolved | MarketStatus::Cancelled)
    }

    /// Stable uppercase name used in storage and query parameters.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            MarketStatus::Upcoming => "UPCOMING",
            MarketStatus::Open => "OPEN",
            MarketStatus::Locked => "LOCKED",
            MarketStatus::Resolved => "RESOLVED",
            MarketStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for MarketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MarketStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "UPCOMING" => Ok(MarketStatus::Upcoming),
            "OPEN" => Ok(MarketStatus::Open),
            "LOCKED" => Ok(MarketStatus::Locked),
            "RESOLVED" => Ok(MarketStatus::Resolved),
            "CANCELLED" => Ok(MarketStatus::Cancelled),
            other => Err(format!("unknown market status: {other}")),
        }
    }
}

/// A single option within a market.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketOption {
    id: OptionId,
    label: String,
    ordinal: u32,
}

impl MarketOption {
    /// Create a new option. Labels are validated by [`Market::try_new`].
    pub fn new(id: OptionId, label: impl Into<String>, ordinal: u32) -> Self {
        Self {
            id,
            label: label.into(),
            ordinal,
        }
    }

    /// Get the option ID.
    #[must_use]
    pub const fn id(&self) -> &OptionId {
        &self.id
    }

    /// Get the display label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Get the position of this option within its market.
    #[must_use]
    pub const fn ordinal(&self) -> u32 {
        self.ordinal
    }
}

/// A prediction market: one question, 2-10 mutually exclusive options.
///
/// Fields are private; lifecycle moves go through [`Market::transition_to`]
/// and [`Market::resolve`] so that the transition table cannot be bypassed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Market {
    id: MarketId,
    title: String,
    description: Option<String>,
    category: MarketCategory,
    status: MarketStatus,
    opens_at: Option<DateTime<Utc>>,
    closes_at: Option<DateTime<Utc>>,
    resolved_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    options: Vec<MarketOption>,
}

impl Market {
    /// Create a new market with domain invariant validation.
    ///
    /// Option IDs and ordinals are assigned here, in label order.
    ///
    /// # Domain Invariants
    ///
    /// - title is 5-200 characters
    /// - description, when present, is at most 1000 characters
    /// - 2-10 options with labels of 1-100 characters, unique
    ///   case-insensitively
    /// - initial status is `Upcoming` or `Open`
    ///
    /// # Errors
    ///
    /// Returns `DomainError` if any invariant is violated.
    pub fn try_new(
        title: impl Into<String>,
        description: Option<String>,
        category: MarketCategory,
        status: MarketStatus,
        opens_at: Option<DateTime<Utc>>,
        closes_at: Option<DateTime<Utc>>,
        option_labels: Vec<String>,
    ) -> Result<Self, DomainError> {
        let title = title.into();
        let title_len = title.chars().count();
        if !(TITLE_MIN..=TITLE_MAX).contains(&title_len) {
            return Err(DomainError::InvalidTitleLength { len: title_len });
        }

        if let Some(desc) = &description {
            let len = desc.chars().count();
            if len > DESCRIPTION_MAX {
                return Err(DomainError::DescriptionTooLong { len });
            }
        }

        if !matches!(status, MarketStatus::Upcoming | MarketStatus::Open) {
            return Err(DomainError::InvalidInitialStatus { status });
        }

        if !(OPTIONS_MIN..=OPTIONS_MAX).contains(&option_labels.len()) {
            return Err(DomainError::InvalidOptionCount {
                count: option_labels.len(),
            });
        }

        let mut seen = Vec::with_capacity(option_labels.len());
        for label in &option_labels {
            let len = label.chars().count();
            if len == 0 || len > OPTION_LABEL_MAX {
                return Err(DomainError::InvalidOptionLabel { len });
            }
            let lower = label.to_lowercase();
            if seen.contains(&lower) {
                return Err(DomainError::DuplicateOptionLabel {
                    label: label.clone(),
                });
            }
            seen.push(lower);
        }

        let options = option_labels
            .into_iter()
            .enumerate()
            .map(|(i, label)| MarketOption::new(OptionId::new(), label, i as u32))
            .collect();

        Ok(Self {
            id: MarketId::new(),
            title,
            description,
            category,
            status,
            opens_at,
            closes_at,
            resolved_at: None,
            created_at: Utc::now(),
            options,
        })
    }

    /// Reassemble a market from stored parts. Storage adapters only; the
    /// rows were validated when first written.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_parts(
        id: MarketId,
        title: String,
        description: Option<String>,
        category: MarketCategory,
        status: MarketStatus,
        opens_at: Option<DateTime<Utc>>,
        closes_at: Option<DateTime<Utc>>,
        resolved_at: Option<DateTime<Utc>>,
        created_at: DateTime<Utc>,
        mut options: Vec<MarketOption>,
    ) -> Self {
        options.sort_by_key(|o| o.ordinal);
        Self {
            id,
            title,
            description,
            category,
            status,
            opens_at,
            closes_at,
            resolved_at,
            created_at,
            options,
        }
    }

    /// Get the market ID.
    #[must_use]
    pub const fn id(&self) -> &MarketId {
        &self.id
    }

    /// Get the market title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Get the description, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Get the category.
    #[must_use]
    pub const fn category(&self) -> MarketCategory {
        self.category
    }

    /// Get the current lifecycle status.
    #[must_use]
    pub const fn status(&self) -> MarketStatus {
        self.status
    }

    /// Get the scheduled opening time, if any.
    #[must_use]
    pub const fn opens_at(&self) -> Option<DateTime<Utc>> {
        self.opens_at
    }

    /// Get the wagering deadline, if any.
    #[must_use]
    pub const fn closes_at(&self) -> Option<DateTime<Utc>> {
        self.closes_at
    }

    /// Get the resolution time, once resolved.
    #[must_use]
    pub const fn resolved_at(&self) -> Option<DateTime<Utc>> {
        self.resolved_at
    }

    /// Get the creation time.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Get all options in ordinal order.
    #[must_use]
    pub fn options(&self) -> &[MarketOption] {
        &self.options
    }

    /// Find an option by ID.
    #[must_use]
    pub fn option(&self, id: &OptionId) -> Option<&MarketOption> {
        self.options.iter().find(|o| o.id() == id)
    }

    /// Find an option by label (case-insensitive).
    #[must_use]
    pub fn option_by_label(&self, label: &str) -> Option<&MarketOption> {
        let lower = label.to_lowercase();
        self.options.iter().find(|o| o.label.to_lowercase() == lower)
    }

    /// Whether the wagering deadline has passed at `now`.
    #[must_use]
    pub fn is_closed_at(&self, now: DateTime<Utc>) -> bool {
        self.closes_at.is_some_and(|deadline| deadline < now)
    }

    /// Move to `next` if the transition table allows it.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::IllegalTransition` for any move not in the
    /// table, including re-cancelling a cancelled market.
    pub fn transition_to(&mut self, next: MarketStatus) -> Result<(), DomainError> {
        if !self.status.can_transition_to(next) {
            return Err(DomainError::IllegalTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    /// Mark the market resolved at `now`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::IllegalTransition` if the market is already
    /// terminal.
    pub fn resolve(&mut self, now: DateTime<Utc>) -> Result<(), DomainError> {
        self.transition_to(MarketStatus::Resolved)?;
        self.resolved_at = Some(now);
        Ok(())
    }

    /// Replace the title, revalidating its bounds.
    pub fn set_title(&mut self, title: impl Into<String>) -> Result<(), DomainError> {
        let title = title.into();
        let len = title.chars().count();
        if !(TITLE_MIN..=TITLE_MAX).contains(&len) {
            return Err(DomainError::InvalidTitleLength { len });
        }
        self.title = title;
        Ok(())
    }

    /// Replace or clear the description, revalidating its bound.
    pub fn set_description(&mut self, description: Option<String>) -> Result<(), DomainError> {
        if let Some(desc) = &description {
            let len = desc.chars().count();
            if len > DESCRIPTION_MAX {
                return Err(DomainError::DescriptionTooLong { len });
            }
        }
        self.description = description;
        Ok(())
    }

    /// Replace or clear the scheduled opening time.
    pub fn set_opens_at(&mut self, opens_at: Option<DateTime<Utc>>) {
        self.opens_at = opens_at;
    }

    /// Replace or clear the wagering deadline.
    pub fn set_closes_at(&mut self, closes_at: Option<DateTime<Utc>>) {
        self.closes_at = closes_at;
    }
}

/// Display odds for one option: `round(stake / total * 100)`, integer
/// half-up. Advisory only; the percentages of a market's options are not
/// guaranteed to sum to 100.
#[must_use]
pub fn odds_percent(option_stake: i64, total_stake: i64) -> u32 {
    debug_assert!(option_stake >= 0 && option_stake <= total_stake);
    if total_stake <= 0 {
        return 0;
    }
    let numer = option_stake as i128 * 100 * 2 + total_stake as i128;
    (numer / (total_stake as i128 * 2)) as u32
}

/// Even-split odds shown when nothing is staked yet: `round(100 / count)`.
#[must_use]
pub fn even_odds_percent(option_count: usize) -> u32 {
    if option_count == 0 {
        return 0;
    }
    let count = option_count as i128;
    ((100 * 2 + count) / (count * 2)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| (*s).to_string()).collect()
    }

    fn create_open_market() -> Market {
        Market::try_new(
            "Will it rain tomorrow?",
            None,
            MarketCategory::Weather,
            MarketStatus::Open,
            None,
            None,
            labels(&["Yes", "No"]),
        )
        .unwrap()
    }

    // --- Validation tests ---

    #[test]
    fn try_new_accepts_valid_inputs() {
        let market = create_open_market();
        assert_eq!(market.title(), "Will it rain tomorrow?");
        assert_eq!(market.status(), MarketStatus::Open);
        assert_eq!(market.options().len(), 2);
        assert_eq!(market.options()[0].ordinal(), 0);
        assert_eq!(market.options()[1].ordinal(), 1);
    }

    #[test]
    fn try_new_rejects_short_title() {
        let result = Market::try_new(
            "Hm?",
            None,
            MarketCategory::Sports,
            MarketStatus::Open,
            None,
            None,
            labels(&["Yes", "No"]),
        );
        assert_eq!(result.unwrap_err(), DomainError::InvalidTitleLength { len: 3 });
    }

    #[test]
    fn try_new_rejects_long_description() {
        let result = Market::try_new(
            "A perfectly fine title",
            Some("x".repeat(1001)),
            MarketCategory::Sports,
            MarketStatus::Open,
            None,
            None,
            labels(&["Yes", "No"]),
        );
        assert!(matches!(
            result.unwrap_err(),
            DomainError::DescriptionTooLong { len: 1001 }
        ));
    }

    #[test]
    fn try_new_rejects_too_few_options() {
        let result = Market::try_new(
            "One-sided question?",
            None,
            MarketCategory::Sports,
            MarketStatus::Open,
            None,
            None,
            labels(&["Yes"]),
        );
        assert_eq!(result.unwrap_err(), DomainError::InvalidOptionCount { count: 1 });
    }

    #[test]
    fn try_new_rejects_too_many_options() {
        let many: Vec<String> = (0..11).map(|i| format!("Option {i}")).collect();
        let result = Market::try_new(
            "Too many choices?",
            None,
            MarketCategory::Awards,
            MarketStatus::Open,
            None,
            None,
            many,
        );
        assert_eq!(result.unwrap_err(), DomainError::InvalidOptionCount { count: 11 });
    }

    #[test]
    fn try_new_rejects_duplicate_labels_case_insensitively() {
        let result = Market::try_new(
            "Pick one of the same?",
            None,
            MarketCategory::Sports,
            MarketStatus::Open,
            None,
            None,
            labels(&["Yes", "YES"]),
        );
        assert!(matches!(
            result.unwrap_err(),
            DomainError::DuplicateOptionLabel { .. }
        ));
    }

    #[test]
    fn try_new_rejects_terminal_initial_status() {
        for status in [MarketStatus::Locked, MarketStatus::Resolved, MarketStatus::Cancelled] {
            let result = Market::try_new(
                "Born settled?",
                None,
                MarketCategory::Politics,
                status,
                None,
                None,
                labels(&["Yes", "No"]),
            );
            assert_eq!(
                result.unwrap_err(),
                DomainError::InvalidInitialStatus { status }
            );
        }
    }

    #[test]
    fn option_lookup_by_label_is_case_insensitive() {
        let market = create_open_market();
        assert!(market.option_by_label("yes").is_some());
        assert!(market.option_by_label("NO").is_some());
        assert!(market.option_by_label("Maybe").is_none());
    }

    // --- Transition table tests ---

    #[test]
    fn transition_table_allows_forward_chain() {
        assert!(MarketStatus::Upcoming.can_transition_to(MarketStatus::Open));
        assert!(MarketStatus::Open.can_transition_to(MarketStatus::Locked));
        assert!(MarketStatus::Locked.can_transition_to(MarketStatus::Resolved));
    }

    #[test]
    fn transition_table_allows_resolution_without_locking() {
        assert!(MarketStatus::Upcoming.can_transition_to(MarketStatus::Resolved));
        assert!(MarketStatus::Open.can_transition_to(MarketStatus::Resolved));
    }

    #[test]
    fn transition_table_allows_cancel_from_any_non_terminal() {
        assert!(MarketStatus::Upcoming.can_transition_to(MarketStatus::Cancelled));
        assert!(MarketStatus::Open.can_transition_to(MarketStatus::Cancelled));
        assert!(MarketStatus::Locked.can_transition_to(MarketStatus::Cancelled));
    }

    #[test]
    fn transition_table_rejects_backwards_and_terminal_moves() {
        assert!(!MarketStatus::Open.can_transition_to(MarketStatus::Upcoming));
        assert!(!MarketStatus::Locked.can_transition_to(MarketStatus::Open));
        assert!(!MarketStatus::Upcoming.can_transition_to(MarketStatus::Locked));
        assert!(!MarketStatus::Resolved.can_transition_to(MarketStatus::Cancelled));
        assert!(!MarketStatus::Cancelled.can_transition_to(MarketStatus::Cancelled));
        assert!(!MarketStatus::Cancelled.can_transition_to(MarketStatus::Open));
    }

    #[test]
    fn transition_to_rejects_illegal_move() {
        let mut market = create_open_market();
        let err = market.transition_to(MarketStatus::Upcoming).unwrap_err();
        assert_eq!(
            err,
            DomainError::IllegalTransition {
                from: MarketStatus::Open,
                to: MarketStatus::Upcoming,
            }
        );
        assert_eq!(market.status(), MarketStatus::Open);
    }

    #[test]
    fn resolve_sets_status_and_timestamp() {
        let mut market = create_open_market();
        let now = Utc::now();
        market.resolve(now).unwrap();
        assert_eq!(market.status(), MarketStatus::Resolved);
        assert_eq!(market.resolved_at(), Some(now));
    }

    #[test]
    fn resolve_twice_fails() {
        let mut market = create_open_market();
        market.resolve(Utc::now()).unwrap();
        assert!(market.resolve(Utc::now()).is_err());
    }

    // --- Deadline tests ---

    #[test]
    fn is_closed_at_with_no_deadline_is_false() {
        let market = create_open_market();
        assert!(!market.is_closed_at(Utc::now()));
    }

    #[test]
    fn is_closed_at_respects_deadline() {
        let mut market = create_open_market();
        let deadline = Utc::now();
        market.set_closes_at(Some(deadline));
        assert!(market.is_closed_at(deadline + chrono::Duration::seconds(1)));
        assert!(!market.is_closed_at(deadline - chrono::Duration::seconds(1)));
    }

    // --- Odds tests ---

    #[test]
    fn odds_percent_rounds_half_up() {
        assert_eq!(odds_percent(50, 100), 50);
        assert_eq!(odds_percent(1, 3), 33);
        assert_eq!(odds_percent(2, 3), 67);
        assert_eq!(odds_percent(1, 8), 13); // 12.5 rounds up
        assert_eq!(odds_percent(0, 10), 0);
        assert_eq!(odds_percent(10, 10), 100);
    }

    #[test]
    fn odds_percent_zero_total_is_zero() {
        assert_eq!(odds_percent(0, 0), 0);
    }

    #[test]
    fn even_odds_percent_splits_by_count() {
        assert_eq!(even_odds_percent(2), 50);
        assert_eq!(even_odds_percent(3), 33);
        assert_eq!(even_odds_percent(8), 13); // 12.5 rounds up
    }

    #[test]
    fn status_and_category_string_roundtrip() {
        for status in [
            MarketStatus::Upcoming,
            MarketStatus::Open,
            MarketStatus::Locked,
            MarketStatus::Resolved,
            MarketStatus::Cancelled,
        ] {
            assert_eq!(status.as_str().parse::<MarketStatus>().unwrap(), status);
        }
        for category in MarketCategory::ALL {
            assert_eq!(category.as_str().parse::<MarketCategory>().unwrap(), category);
        }
    }
}
