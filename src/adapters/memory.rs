//! In-memory ledger adapter.
//!
//! A process-local stand-in for the ledger contract, used by tests and
//! demos. Availability and write rejection can be injected to exercise the
//! orchestrator's failure paths.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::adapters::LedgerError;
use crate::ports::LedgerStore;

/// In-memory key-value ledger.
pub struct MemoryLedger {
    entries: Mutex<HashMap<String, Vec<u8>>>,
    available: AtomicBool,
    reject_writes: Mutex<Option<String>>,
    reject_key: Mutex<Option<(String, String)>>,
}

impl MemoryLedger {
    /// Create an empty, available ledger.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            available: AtomicBool::new(true),
            reject_writes: Mutex::new(None),
            reject_key: Mutex::new(None),
        }
    }

    /// Toggle the availability probe result.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Make every subsequent write fail with `reason`, verbatim.
    pub fn reject_writes(&self, reason: impl Into<String>) {
        *self.reject_writes.lock().expect("Lock failed") = Some(reason.into());
    }

    /// Make writes to one specific key fail with `reason`, verbatim.
    pub fn reject_writes_to(&self, key: impl Into<String>, reason: impl Into<String>) {
        *self.reject_key.lock().expect("Lock failed") = Some((key.into(), reason.into()));
    }

    /// Accept writes again.
    pub fn accept_writes(&self) {
        *self.reject_writes.lock().expect("Lock failed") = None;
        *self.reject_key.lock().expect("Lock failed") = None;
    }
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl LedgerStore for MemoryLedger {
    type Error = LedgerError;

    fn is_available(&self) -> Result<bool, Self::Error> {
        Ok(self.available.load(Ordering::SeqCst))
    }

    fn get_data(&self, key: &str) -> Result<Vec<u8>, Self::Error> {
        let entries = self.entries.lock().expect("Lock failed");
        Ok(entries.get(key).cloned().unwrap_or_default())
    }

    fn set_data(&self, key: &str, value: &[u8]) -> Result<(), Self::Error> {
        if let Some(reason) = self.reject_writes.lock().expect("Lock failed").as_ref() {
            return Err(LedgerError::Commit(reason.clone()));
        }
        if let Some((rejected_key, reason)) = self.reject_key.lock().expect("Lock failed").as_ref()
        {
            if rejected_key == key {
                return Err(LedgerError::Commit(reason.clone()));
            }
        }

        let mut entries = self.entries.lock().expect("Lock failed");
        entries.insert(key.to_string(), value.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unwritten_key_reads_empty() {
        let ledger = MemoryLedger::new();
        let bytes = ledger.get_data("tcm_record_missing").expect("Should read");
        assert!(bytes.is_empty());
    }

    #[test]
    fn test_write_then_read() {
        let ledger = MemoryLedger::new();
        ledger.set_data("k", b"value").expect("Should write");
        assert_eq!(ledger.get_data("k").expect("Should read"), b"value");

        ledger.set_data("k", b"newer").expect("Should overwrite");
        assert_eq!(ledger.get_data("k").expect("Should read"), b"newer");
    }

    #[test]
    fn test_availability_toggle() {
        let ledger = MemoryLedger::new();
        assert!(ledger.is_available().expect("Should probe"));

        ledger.set_available(false);
        assert!(!ledger.is_available().expect("Should probe"));
    }

    #[test]
    fn test_write_rejection_is_verbatim() {
        let ledger = MemoryLedger::new();
        ledger.reject_writes("user rejected transaction");

        let err = ledger.set_data("k", b"v").expect_err("Should reject");
        assert_eq!(err.to_string(), "commit failed: user rejected transaction");

        ledger.accept_writes();
        ledger.set_data("k", b"v").expect("Should write again");
    }
}
