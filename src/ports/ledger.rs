//! Ledger port: Trait for the remote key-value store.
//!
//! This trait abstracts the ledger contract's byte-oriented get/set surface
//! from the application logic. Transaction execution, gas and finality all
//! stay behind the implementing adapter.

/// Trait for the remote key-value store exposed by the ledger contract.
pub trait LedgerStore: Send + Sync {
    /// Error type for store operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Whether the remote computation environment is ready.
    ///
    /// Callers treat a probe *error* the same as `Ok(false)`: a soft
    /// failure, never an exception.
    ///
    /// # Errors
    /// Returns error if the probe itself cannot be performed.
    fn is_available(&self) -> Result<bool, Self::Error>;

    /// Read the bytes stored under `key`.
    ///
    /// A key that was never written yields an **empty buffer**, not an
    /// error; callers must treat empty as "absent".
    ///
    /// # Errors
    /// Returns error if the read fails.
    fn get_data(&self, key: &str) -> Result<Vec<u8>, Self::Error>;

    /// Commit `value` under `key`, overwriting any previous bytes.
    ///
    /// Failure carries the collaborator's reason verbatim (e.g. a signature
    /// rejection); this layer adds no retry.
    ///
    /// # Errors
    /// Returns error if the commit fails.
    fn set_data(&self, key: &str, value: &[u8]) -> Result<(), Self::Error>;
}
