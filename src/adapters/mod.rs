//! Adapters layer: Concrete implementations of ports.
//!
//! - `memory`: in-memory ledger for tests and demos
//! - `sqlite`: durable local stand-in for the ledger contract
//! - `fhe`: simulated encryption collaborator
//! - `wallet`: static identity supplier
//! - `sanitize`: confidential-data filtering for logs

pub mod fhe;
pub mod memory;
pub mod sanitize;
pub mod sqlite;
pub mod wallet;

pub use fhe::SimulatedFheCipher;
pub use memory::MemoryLedger;
pub use sqlite::SqliteLedger;
pub use wallet::StaticWallet;

/// Error type for ledger adapters.
///
/// `Commit` carries the collaborator's failure reason verbatim: no retry,
/// no rewording.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("commit failed: {0}")]
    Commit(String),
}
