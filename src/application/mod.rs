//! Application layer: Use cases and services.
//!
//! Orchestrates domain logic with ports: index maintenance, the
//! synchronization service, and snapshot statistics.

mod index;
mod stats;
mod sync;

pub use index::RecordIndex;
pub use stats::RecordStats;
pub use sync::{CreationOutcome, Snapshot, SyncService};
