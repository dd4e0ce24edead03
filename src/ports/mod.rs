//! Ports layer: Trait definitions for external collaborators.
//!
//! Following Hexagonal Architecture, these traits define the boundaries
//! between the application and external systems (ledger contract,
//! encryption scheme, wallet).

mod cipher;
mod ledger;
mod wallet;

pub use cipher::{CipherError, PayloadCipher};
pub use ledger::LedgerStore;
pub use wallet::Wallet;
