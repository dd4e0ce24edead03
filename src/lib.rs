//! # tcmledger
//!
//! Client for confidential Traditional-Chinese-Medicine diagnosis records
//! persisted as encrypted blobs in a key-value ledger store.
//!
//! This crate provides:
//! - Synchronization of a local record view against the append-only,
//!   key-indexed remote store
//! - A linear per-record status lifecycle with owner-only transitions
//! - A terminal UI over the synchronized collection
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core business types (records, lifecycle, wire codec)
//! - `ports`: Trait definitions for external collaborators (ledger,
//!   encryption scheme, wallet)
//! - `adapters`: Concrete implementations (SQLite, in-memory, simulated FHE)
//! - `application`: Use cases orchestrating domain and ports
//! - `tui`: Terminal user interface

pub mod adapters;
pub mod application;
pub mod domain;
pub mod ports;
pub mod tui;

pub use domain::{DiagnosisRecord, RecordDraft, RecordStatus};

/// Result type for tcmledger operations.
pub type Result<T> = std::result::Result<T, TcmError>;

/// Main error type for tcmledger.
///
/// Nothing here is fatal to the process: every failure leaves the
/// last-known-good local snapshot in place.
#[derive(Debug, thiserror::Error)]
pub enum TcmError {
    /// The remote computation environment is not ready. Soft; retryable by
    /// user action.
    #[error("ledger is not available yet, try again shortly")]
    Unavailable,

    /// A targeted record key was absent. Hard for analyze/archive, since the
    /// id came from the index.
    #[error("record {0} not found in the store")]
    NotFound(String),

    /// Malformed stored bytes. Swallowed with a skip during bulk loads,
    /// surfaced for targeted operations.
    #[error("codec error: {0}")]
    Codec(#[from] domain::envelope::CodecError),

    /// Authorization or lifecycle refusal. User-visible, no retry.
    #[error("rejected: {0}")]
    Rejected(#[from] domain::TransitionError),

    /// Input validation failure, checked before any store interaction.
    #[error("invalid input: {0}")]
    Validation(String),

    /// The ledger collaborator failed; the reason is surfaced verbatim.
    #[error("ledger error: {0}")]
    Ledger(#[from] adapters::LedgerError),

    /// The encryption collaborator failed.
    #[error("cipher error: {0}")]
    Cipher(#[from] ports::CipherError),
}
