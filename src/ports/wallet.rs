//! Wallet port: Trait for the identity collaborator.
//!
//! Supplies the active account identifier. The account can change at any
//! time (wallet switch); authorization checks therefore read it at action
//! time, never caching it at load time.

/// Trait for the wallet / identity collaborator.
pub trait Wallet: Send + Sync {
    /// The currently connected account, if any.
    fn current_account(&self) -> Option<String>;
}
