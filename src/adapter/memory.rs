//! In-memory ledger for tests and ephemeral runs.
//!
//! Transactions run serialized behind a mutex against a working copy of
//! the whole state; the copy replaces the shared state only when the
//! closure succeeds, so a failed transaction leaves nothing behind.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::domain::{
    Agent, AgentId, Comment, Market, MarketId, Resolution, Wager, WagerId,
};
use crate::error::{Error, Result};
use crate::port::{LedgerStore, LedgerTx, MarketFilter, Page};

#[derive(Debug, Default, Clone)]
struct LedgerState {
    agents: HashMap<AgentId, Agent>,
    markets: HashMap<MarketId, Market>,
    /// Creation order; settlement relies on it for the stable tie-break.
    wagers: Vec<Wager>,
    resolutions: HashMap<MarketId, Resolution>,
    comments: Vec<Comment>,
}

/// In-memory implementation of the ledger port.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    state: Mutex<LedgerState>,
}

impl MemoryLedger {
    /// Create a new empty ledger.
    pub fn new() -> Self {
        Self::default()
    }
}

/// Unit of work over a working copy of the in-memory state.
pub struct MemoryTx<'conn> {
    state: &'conn mut LedgerState,
}

impl LedgerStore for MemoryLedger {
    type Tx<'conn>
        = MemoryTx<'conn>
    where
        Self: 'conn;

    fn transaction<T>(&self, f: impl FnOnce(&mut Self::Tx<'_>) -> Result<T>) -> Result<T> {
        let mut guard = self.state.lock();
        let mut working = guard.clone();
        let out = f(&mut MemoryTx {
            state: &mut working,
        })?;
        *guard = working;
        Ok(out)
    }
}

impl LedgerTx for MemoryTx<'_> {
    fn insert_agent(&mut self, agent: &Agent) -> Result<()> {
        if self.state.agents.values().any(|a| a.name == agent.name) {
            return Err(Error::NameTaken {
                name: agent.name.clone(),
            });
        }
        if self
            .state
            .agents
            .values()
            .any(|a| a.api_key == agent.api_key)
        {
            return Err(Error::Database("api key collision".to_string()));
        }
        self.state.agents.insert(agent.id.clone(), agent.clone());
        Ok(())
    }

    fn agent(&mut self, id: &AgentId) -> Result<Option<Agent>> {
        Ok(self.state.agents.get(id).cloned())
    }

    fn agent_by_name(&mut self, name: &str) -> Result<Option<Agent>> {
        Ok(self
            .state
            .agents
            .values()
            .find(|a| a.name == name)
            .cloned())
    }

    fn agent_by_api_key(&mut self, api_key: &str) -> Result<Option<Agent>> {
        Ok(self
            .state
            .agents
            .values()
            .find(|a| a.api_key == api_key)
            .cloned())
    }

    fn agents_by_balance(&mut self) -> Result<Vec<Agent>> {
        let mut agents: Vec<Agent> = self.state.agents.values().cloned().collect();
        agents.sort_by(|a, b| b.balance.cmp(&a.balance).then_with(|| a.name.cmp(&b.name)));
        Ok(agents)
    }

    fn credit_agent(&mut self, id: &AgentId, amount: i64) -> Result<i64> {
        let agent = self.state.agents.get_mut(id).ok_or_else(|| Error::NotFound {
            entity: "agent",
            id: id.to_string(),
        })?;
        agent.balance += amount;
        Ok(agent.balance)
    }

    fn debit_agent(&mut self, id: &AgentId, amount: i64) -> Result<i64> {
        let agent = self.state.agents.get_mut(id).ok_or_else(|| Error::NotFound {
            entity: "agent",
            id: id.to_string(),
        })?;
        if agent.balance < amount {
            return Err(Error::InsufficientFunds {
                balance: agent.balance,
                requested: amount,
            });
        }
        agent.balance -= amount;
        Ok(agent.balance)
    }

    fn insert_market(&mut self, market: &Market) -> Result<()> {
        self.state
            .markets
            .insert(market.id().clone(), market.clone());
        Ok(())
    }

    fn market(&mut self, id: &MarketId) -> Result<Option<Market>> {
        Ok(self.state.markets.get(id).cloned())
    }

    fn update_market(&mut self, market: &Market) -> Result<()> {
        if !self.state.markets.contains_key(market.id()) {
            return Err(Error::NotFound {
                entity: "market",
                id: market.id().to_string(),
            });
        }
        self.state
            .markets
            .insert(market.id().clone(), market.clone());
        Ok(())
    }

    fn delete_market(&mut self, id: &MarketId) -> Result<bool> {
        let removed = self.state.markets.remove(id).is_some();
        if removed {
            self.state.comments.retain(|c| &c.market_id != id);
        }
        Ok(removed)
    }

    fn list_markets(&mut self, filter: &MarketFilter, page: Page) -> Result<Vec<Market>> {
        let mut markets: Vec<Market> = self
            .state
            .markets
            .values()
            .filter(|m| matches_filter(m, filter))
            .cloned()
            .collect();
        // Newest first; IDs break creation-time ties deterministically.
        markets.sort_by(|a, b| {
            b.created_at()
                .cmp(&a.created_at())
                .then_with(|| a.id().as_str().cmp(b.id().as_str()))
        });
        Ok(markets
            .into_iter()
            .skip(page.offset as usize)
            .take(page.limit as usize)
            .collect())
    }

    fn count_markets(&mut self, filter: &MarketFilter) -> Result<u64> {
        Ok(self
            .state
            .markets
            .values()
            .filter(|m| matches_filter(m, filter))
            .count() as u64)
    }

    fn insert_wager(&mut self, wager: &Wager) -> Result<()> {
        let duplicate = self
            .state
            .wagers
            .iter()
            .any(|w| w.agent_id == wager.agent_id && w.market_id == wager.market_id);
        if duplicate {
            return Err(Error::DuplicateWager);
        }
        self.state.wagers.push(wager.clone());
        Ok(())
    }

    fn wager_for(&mut self, agent_id: &AgentId, market_id: &MarketId) -> Result<Option<Wager>> {
        Ok(self
            .state
            .wagers
            .iter()
            .find(|w| &w.agent_id == agent_id && &w.market_id == market_id)
            .cloned())
    }

    fn wagers_for_market(&mut self, market_id: &MarketId) -> Result<Vec<Wager>> {
        Ok(self
            .state
            .wagers
            .iter()
            .filter(|w| &w.market_id == market_id)
            .cloned()
            .collect())
    }

    fn wagers_for_agent(&mut self, agent_id: &AgentId) -> Result<Vec<Wager>> {
        Ok(self
            .state
            .wagers
            .iter()
            .rev()
            .filter(|w| &w.agent_id == agent_id)
            .cloned()
            .collect())
    }

    fn set_wager_payout(&mut self, id: &WagerId, payout: i64) -> Result<()> {
        let wager = self
            .state
            .wagers
            .iter_mut()
            .find(|w| &w.id == id)
            .ok_or_else(|| Error::NotFound {
                entity: "wager",
                id: id.to_string(),
            })?;
        wager.payout = Some(payout);
        Ok(())
    }

    fn insert_resolution(&mut self, resolution: &Resolution) -> Result<()> {
        if self.state.resolutions.contains_key(&resolution.market_id) {
            return Err(Error::Database(
                "resolution already recorded for market".to_string(),
            ));
        }
        self.state
            .resolutions
            .insert(resolution.market_id.clone(), resolution.clone());
        Ok(())
    }

    fn resolution(&mut self, market_id: &MarketId) -> Result<Option<Resolution>> {
        Ok(self.state.resolutions.get(market_id).cloned())
    }

    fn insert_comment(&mut self, comment: &Comment) -> Result<()> {
        self.state.comments.push(comment.clone());
        Ok(())
    }

    fn comments_for_market(&mut self, market_id: &MarketId, page: Page) -> Result<Vec<Comment>> {
        Ok(self
            .state
            .comments
            .iter()
            .rev()
            .filter(|c| &c.market_id == market_id)
            .skip(page.offset as usize)
            .take(page.limit as usize)
            .cloned()
            .collect())
    }

    fn count_comments(&mut self, market_id: &MarketId) -> Result<u64> {
        Ok(self
            .state
            .comments
            .iter()
            .filter(|c| &c.market_id == market_id)
            .count() as u64)
    }
}

fn matches_filter(market: &Market, filter: &MarketFilter) -> bool {
    filter.status.map_or(true, |s| market.status() == s)
        && filter.category.map_or(true, |c| market.category() == c)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MarketCategory, MarketStatus};

    fn some_agent(name: &str) -> Agent {
        Agent::new(name, format!("ak_{name}"), 100)
    }

    #[test]
    fn failed_transaction_rolls_back_every_write() {
        let store = MemoryLedger::new();
        let agent = some_agent("ada");

        let result: Result<()> = store.transaction(|tx| {
            tx.insert_agent(&agent)?;
            tx.credit_agent(&agent.id, 50)?;
            Err(Error::Database("forced abort".to_string()))
        });

        assert!(result.is_err());
        let stored = store.transaction(|tx| tx.agent(&agent.id)).unwrap();
        assert!(stored.is_none(), "aborted insert leaked");
    }

    #[test]
    fn committed_transaction_persists() {
        let store = MemoryLedger::new();
        let agent = some_agent("ada");

        store.transaction(|tx| tx.insert_agent(&agent)).unwrap();
        let stored = store.transaction(|tx| tx.agent(&agent.id)).unwrap().unwrap();
        assert_eq!(stored.name, "ada");
        assert_eq!(stored.balance, 100);
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let store = MemoryLedger::new();
        store
            .transaction(|tx| tx.insert_agent(&some_agent("ada")))
            .unwrap();
        let err = store
            .transaction(|tx| tx.insert_agent(&some_agent("ada")))
            .unwrap_err();
        assert!(matches!(err, Error::NameTaken { .. }));
    }

    #[test]
    fn debit_is_guarded() {
        let store = MemoryLedger::new();
        let agent = some_agent("ada");
        store.transaction(|tx| tx.insert_agent(&agent)).unwrap();

        let err = store
            .transaction(|tx| tx.debit_agent(&agent.id, 101))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::InsufficientFunds {
                balance: 100,
                requested: 101
            }
        ));

        let balance = store
            .transaction(|tx| tx.debit_agent(&agent.id, 100))
            .unwrap();
        assert_eq!(balance, 0);
    }

    #[test]
    fn duplicate_wager_is_rejected_at_the_store() {
        let store = MemoryLedger::new();
        let agent = some_agent("ada");
        let market = Market::try_new(
            "Will it snow in June?",
            None,
            MarketCategory::Weather,
            MarketStatus::Open,
            None,
            None,
            vec!["Yes".to_string(), "No".to_string()],
        )
        .unwrap();
        let option = market.options()[0].id().clone();

        store
            .transaction(|tx| {
                tx.insert_agent(&agent)?;
                tx.insert_market(&market)
            })
            .unwrap();

        let first = Wager::new(agent.id.clone(), market.id().clone(), option.clone(), 5);
        store.transaction(|tx| tx.insert_wager(&first)).unwrap();

        let second = Wager::new(agent.id.clone(), market.id().clone(), option, 7);
        let err = store.transaction(|tx| tx.insert_wager(&second)).unwrap_err();
        assert!(matches!(err, Error::DuplicateWager));
    }

    #[test]
    fn wagers_for_market_preserves_creation_order() {
        let store = MemoryLedger::new();
        let market = Market::try_new(
            "Creation order preserved?",
            None,
            MarketCategory::Economics,
            MarketStatus::Open,
            None,
            None,
            vec!["Yes".to_string(), "No".to_string()],
        )
        .unwrap();
        let option = market.options()[0].id().clone();

        store.transaction(|tx| tx.insert_market(&market)).unwrap();
        let mut expected = Vec::new();
        for i in 0..4 {
            let agent = some_agent(&format!("agent-{i}"));
            let wager = Wager::new(agent.id.clone(), market.id().clone(), option.clone(), 10);
            expected.push(wager.id.clone());
            store
                .transaction(|tx| {
                    tx.insert_agent(&agent)?;
                    tx.insert_wager(&wager)
                })
                .unwrap();
        }

        let loaded = store
            .transaction(|tx| tx.wagers_for_market(market.id()))
            .unwrap();
        let ids: Vec<_> = loaded.into_iter().map(|w| w.id).collect();
        assert_eq!(ids, expected);
    }
}
