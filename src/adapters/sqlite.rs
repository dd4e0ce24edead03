//! SQLite ledger adapter.
//!
//! A durable local stand-in for the ledger contract: one `kv` table of raw
//! byte values, addressed by the same key schema the contract exposes.
//! Useful for local runs where no chain is reachable.
//!
//! # Mutex Behavior
//!
//! The connection is protected by `Mutex`. A poisoned mutex (from panic in
//! another thread) will cause panic. This fail-fast behavior is intentional
//! for data integrity.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection, OptionalExtension};

use crate::adapters::LedgerError;
use crate::ports::LedgerStore;

/// SQLite-backed key-value ledger.
pub struct SqliteLedger {
    conn: Mutex<Connection>,
}

impl SqliteLedger {
    /// Open (or create) a ledger database at the given path.
    ///
    /// # Errors
    /// Returns error if the database cannot be opened or initialized.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, LedgerError> {
        let conn = Connection::open(path)?;
        let ledger = Self {
            conn: Mutex::new(conn),
        };
        ledger.init_schema()?;
        Ok(ledger)
    }

    /// Create an in-memory ledger database (for testing).
    ///
    /// # Errors
    /// Returns error if the database cannot be created.
    pub fn in_memory() -> Result<Self, LedgerError> {
        let conn = Connection::open_in_memory()?;
        let ledger = Self {
            conn: Mutex::new(conn),
        };
        ledger.init_schema()?;
        Ok(ledger)
    }

    fn init_schema(&self) -> Result<(), LedgerError> {
        let conn = self.conn.lock().expect("Lock failed");

        conn.execute_batch(
            r"
            CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value BLOB NOT NULL
            );
            ",
        )?;

        Ok(())
    }
}

impl LedgerStore for SqliteLedger {
    type Error = LedgerError;

    fn is_available(&self) -> Result<bool, Self::Error> {
        let conn = self.conn.lock().expect("Lock failed");
        // A trivial query doubles as the readiness probe.
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
        Ok(true)
    }

    fn get_data(&self, key: &str) -> Result<Vec<u8>, Self::Error> {
        let conn = self.conn.lock().expect("Lock failed");

        let value: Option<Vec<u8>> = conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()?;

        // Absent keys read as empty, matching the contract surface.
        Ok(value.unwrap_or_default())
    }

    fn set_data(&self, key: &str, value: &[u8]) -> Result<(), Self::Error> {
        let conn = self.conn.lock().expect("Lock failed");

        conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;

        tracing::debug!("Committed {} bytes under {}", value.len(), key);
        Ok(())
    }
}
