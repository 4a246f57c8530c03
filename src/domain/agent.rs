//! Agent identity and coin balance.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::id::AgentId;

const NAME_MIN: usize = 2;
const NAME_MAX: usize = 50;

/// A registered agent.
///
/// The `api_key` is the agent's secret credential. It is returned exactly
/// once, by registration; no other operation exposes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    pub name: String,
    #[serde(skip_serializing)]
    pub api_key: String,
    pub balance: i64,
    pub created_at: DateTime<Utc>,
}

impl Agent {
    /// Create a new agent with the given starting balance.
    ///
    /// The name must already have passed [`Agent::validate_name`]; key
    /// generation lives in the registry service.
    pub fn new(name: impl Into<String>, api_key: impl Into<String>, starting_balance: i64) -> Self {
        Self {
            id: AgentId::new(),
            name: name.into(),
            api_key: api_key.into(),
            balance: starting_balance,
            created_at: Utc::now(),
        }
    }

    /// Validate a display name: 2-50 characters of letters, digits,
    /// underscore, dash, dot, or space.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidAgentName` otherwise.
    pub fn validate_name(name: &str) -> Result<(), DomainError> {
        let len = name.chars().count();
        if !(NAME_MIN..=NAME_MAX).contains(&len) {
            return Err(DomainError::InvalidAgentName);
        }
        let valid = name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | ' '));
        if !valid {
            return Err(DomainError::InvalidAgentName);
        }
        Ok(())
    }
}
