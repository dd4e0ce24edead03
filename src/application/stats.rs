//! Per-status record statistics for the dashboard.

use crate::domain::{DiagnosisRecord, RecordStatus};

/// Counts of records by lifecycle status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordStats {
    pub total: usize,
    pub pending: usize,
    pub analyzed: usize,
    pub archived: usize,
}

impl RecordStats {
    /// Tally a snapshot.
    #[must_use]
    pub fn collect(records: &[DiagnosisRecord]) -> Self {
        let mut stats = Self {
            total: records.len(),
            ..Self::default()
        };

        for record in records {
            match record.status {
                RecordStatus::Pending => stats.pending += 1,
                RecordStatus::Analyzed => stats.analyzed += 1,
                RecordStatus::Archived => stats.archived += 1,
            }
        }

        stats
    }
}
