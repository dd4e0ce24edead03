//! Static wallet adapter.
//!
//! Models the wallet collaborator for local runs: the account is seeded from
//! configuration and can be swapped at runtime, which is how account-change
//! notifications reach the rest of the system.

use std::sync::Mutex;

use crate::ports::Wallet;

/// Environment variable holding the connected account for local runs.
pub const ACCOUNT_ENV: &str = "TCMLEDGER_ACCOUNT";

/// Wallet with an externally supplied, swappable account.
pub struct StaticWallet {
    account: Mutex<Option<String>>,
}

impl StaticWallet {
    /// Create a wallet with no connected account.
    #[must_use]
    pub fn disconnected() -> Self {
        Self {
            account: Mutex::new(None),
        }
    }

    /// Create a wallet connected as `account`.
    #[must_use]
    pub fn connected(account: impl Into<String>) -> Self {
        let wallet = Self::disconnected();
        wallet.set_account(Some(account.into()));
        wallet
    }

    /// Create a wallet from the `TCMLEDGER_ACCOUNT` environment variable.
    #[must_use]
    pub fn from_env() -> Self {
        match std::env::var(ACCOUNT_ENV) {
            Ok(account) if !account.trim().is_empty() => Self::connected(account),
            _ => Self::disconnected(),
        }
    }

    /// Replace the connected account (`None` disconnects).
    pub fn set_account(&self, account: Option<String>) {
        let normalized = account
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty());
        *self.account.lock().expect("Lock failed") = normalized;
    }
}

impl Wallet for StaticWallet {
    fn current_account(&self) -> Option<String> {
        self.account.lock().expect("Lock failed").clone()
    }
}
