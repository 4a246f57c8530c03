//! Storage adapters implementing the ledger port.

mod memory;
pub mod sqlite;

pub use memory::{MemoryLedger, MemoryTx};
