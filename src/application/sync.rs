//! Synchronization orchestrator.
//!
//! Coordinates full reloads (index fetch, per-key fetch, decode, sort) and
//! the mutations (create, analyze, archive), keeping a last-known-good
//! immutable snapshot of the record collection. The remote store is the
//! single source of truth; the snapshot is always disposable and
//! reconstructible from it.

use std::sync::Arc;

use crate::adapters::LedgerError;
use crate::application::index::RecordIndex;
use crate::domain::envelope::{self, record_key};
use crate::domain::{self, DiagnosisRecord, RecordDraft, RecordStatus};
use crate::ports::{LedgerStore, PayloadCipher};
use crate::TcmError;

/// Immutable view of the record collection, ordered most-recent-first.
///
/// The presentation layer holds a reference to the latest snapshot and never
/// mutates it in place; reloads swap in a fully rebuilt collection.
pub type Snapshot = Arc<Vec<DiagnosisRecord>>;

/// Outcome of a record creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreationOutcome {
    /// Record written and indexed.
    Created { id: String },

    /// Record written, but the index append failed: the entry exists under
    /// its key yet is invisible to reloads until repaired. Never masked as
    /// plain success.
    CreatedButUnindexed { id: String },
}

impl CreationOutcome {
    /// Id of the record that was written.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Created { id } | Self::CreatedButUnindexed { id } => id,
        }
    }
}

/// Service synchronizing the local record view with the remote store.
pub struct SyncService<L, C>
where
    L: LedgerStore,
    C: PayloadCipher,
{
    ledger: Arc<L>,
    cipher: Arc<C>,
    index: RecordIndex<L>,
    snapshot: Snapshot,
}

impl<L, C> SyncService<L, C>
where
    L: LedgerStore,
    L::Error: Into<LedgerError>,
    C: PayloadCipher,
{
    /// Create a new synchronization service with an empty snapshot.
    pub fn new(ledger: Arc<L>, cipher: Arc<C>) -> Self {
        let index = RecordIndex::new(ledger.clone());
        Self {
            ledger,
            cipher,
            index,
            snapshot: Arc::new(Vec::new()),
        }
    }

    /// The last-known-good collection.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        self.snapshot.clone()
    }

    /// Probe the remote computation environment.
    ///
    /// A probe error is a soft failure: it reads as "not available", never
    /// as an exception.
    fn probe(&self) -> bool {
        match self.ledger.is_available() {
            Ok(ready) => ready,
            Err(e) => {
                tracing::warn!("Availability probe failed, treating as unavailable: {e}");
                false
            }
        }
    }

    /// Rebuild the collection from the store.
    ///
    /// Unreachable or unparsable entries are skipped with a warning;
    /// partial visibility beats total failure. The held snapshot is swapped
    /// only after the full pass, so callers observe either the old or the
    /// fully new collection.
    ///
    /// # Errors
    /// Returns [`TcmError::Unavailable`] (snapshot untouched) when the
    /// probe fails, or a ledger error if a read fails mid-pass.
    pub fn full_reload(&mut self) -> Result<Snapshot, TcmError> {
        if !self.probe() {
            return Err(TcmError::Unavailable);
        }

        let ids = self.index.load()?;
        let mut records = Vec::with_capacity(ids.len());

        for id in &ids {
            let bytes = self
                .ledger
                .get_data(&record_key(id))
                .map_err(|e| TcmError::Ledger(e.into()))?;

            if bytes.is_empty() {
                tracing::warn!("Indexed record {id} has no store entry, skipping");
                continue;
            }

            match envelope::decode_record(id, &bytes) {
                Ok(record) => records.push(record),
                Err(e) => {
                    tracing::warn!("Record {id} is unparsable, skipping: {e}");
                }
            }
        }

        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        tracing::info!("Reloaded {} of {} indexed records", records.len(), ids.len());
        let snapshot: Snapshot = Arc::new(records);
        self.snapshot = snapshot.clone();
        Ok(snapshot)
    }

    /// Create a new record owned by `actor`.
    ///
    /// Validation runs before any store interaction. The steps then run
    /// strictly in order (encrypt, write record, append index, reload) and
    /// failure of any step aborts the remaining ones. An index-append
    /// failure after a successful record write yields
    /// [`CreationOutcome::CreatedButUnindexed`].
    ///
    /// # Errors
    /// Returns validation, availability, cipher, or ledger errors; in every
    /// error case the local snapshot is unmodified.
    pub fn create_record(
        &mut self,
        draft: &RecordDraft,
        actor: &str,
    ) -> Result<CreationOutcome, TcmError> {
        draft.validate().map_err(TcmError::Validation)?;
        if actor.trim().is_empty() {
            return Err(TcmError::Validation(
                "connect a wallet before submitting".to_string(),
            ));
        }

        if !self.probe() {
            return Err(TcmError::Unavailable);
        }

        let encrypted_payload = self.cipher.encrypt(draft)?;

        let now = chrono::Utc::now();
        let id = domain::generate_record_id(now.timestamp_millis());
        let record = DiagnosisRecord::new(
            id.clone(),
            encrypted_payload,
            now.timestamp(),
            actor.to_string(),
            draft.symptom_pattern.clone(),
            draft.herb_formula.clone(),
        );

        let bytes = envelope::encode_record(&record)?;
        self.ledger
            .set_data(&record_key(&id), &bytes)
            .map_err(|e| TcmError::Ledger(e.into()))?;

        if let Err(e) = self.index.append(&id) {
            tracing::warn!("Record {id} written but index append failed: {e}");
            return Ok(CreationOutcome::CreatedButUnindexed { id });
        }

        tracing::info!("Created record {id}");
        self.reload_best_effort();
        Ok(CreationOutcome::Created { id })
    }

    /// Move a pending record to `analyzed`. Owner-only, one-shot.
    ///
    /// # Errors
    /// See [`Self::transition_record`].
    pub fn analyze_record(
        &mut self,
        id: &str,
        actor: &str,
    ) -> Result<DiagnosisRecord, TcmError> {
        self.transition_record(id, RecordStatus::Analyzed, actor)
    }

    /// Move a pending record to `archived`. Owner-only, one-shot.
    ///
    /// # Errors
    /// See [`Self::transition_record`].
    pub fn archive_record(
        &mut self,
        id: &str,
        actor: &str,
    ) -> Result<DiagnosisRecord, TcmError> {
        self.transition_record(id, RecordStatus::Archived, actor)
    }

    /// Fetch, transition, and overwrite a record under its existing key.
    ///
    /// The id never changes, so the index is untouched. The authorization
    /// check uses `actor` as supplied at call time (current-signer model).
    ///
    /// # Errors
    /// `Unavailable` when the probe fails; `NotFound` when the key is empty
    /// (hard, since the id came from the index); codec errors surfaced (not
    /// skipped, unlike bulk loads); `Rejected` from the lifecycle engine;
    /// ledger errors verbatim from the commit.
    fn transition_record(
        &mut self,
        id: &str,
        target: RecordStatus,
        actor: &str,
    ) -> Result<DiagnosisRecord, TcmError> {
        if !self.probe() {
            return Err(TcmError::Unavailable);
        }

        let key = record_key(id);
        let bytes = self
            .ledger
            .get_data(&key)
            .map_err(|e| TcmError::Ledger(e.into()))?;
        if bytes.is_empty() {
            return Err(TcmError::NotFound(id.to_string()));
        }

        let record = envelope::decode_record(id, &bytes)?;
        let updated = domain::transition(&record, target, actor)?;

        let bytes = envelope::encode_record(&updated)?;
        self.ledger
            .set_data(&key, &bytes)
            .map_err(|e| TcmError::Ledger(e.into()))?;

        tracing::info!("Record {id} moved to {target}");
        self.reload_best_effort();
        Ok(updated)
    }

    /// Reconcile one known orphan: a record whose entry exists but whose id
    /// is missing from the index.
    ///
    /// Returns `true` when the id was appended, `false` when it was already
    /// indexed.
    ///
    /// # Errors
    /// `NotFound` when no record entry exists for `id`; ledger errors from
    /// the read or the append.
    pub fn repair_unindexed(&mut self, id: &str) -> Result<bool, TcmError> {
        let bytes = self
            .ledger
            .get_data(&record_key(id))
            .map_err(|e| TcmError::Ledger(e.into()))?;
        if bytes.is_empty() {
            return Err(TcmError::NotFound(id.to_string()));
        }

        let ids = self.index.load()?;
        if ids.iter().any(|known| known == id) {
            return Ok(false);
        }

        self.index.append(id)?;
        tracing::info!("Re-indexed orphaned record {id}");
        self.reload_best_effort();
        Ok(true)
    }

    /// Refresh the snapshot after a successful mutation. A soft failure here
    /// leaves the previous snapshot in place, which is still consistent.
    fn reload_best_effort(&mut self) {
        if let Err(e) = self.full_reload() {
            tracing::warn!("Post-mutation reload failed: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{MemoryLedger, SimulatedFheCipher};
    use crate::domain::envelope::INDEX_KEY;

    fn create_test_service() -> (Arc<MemoryLedger>, SyncService<MemoryLedger, SimulatedFheCipher>)
    {
        let ledger = Arc::new(MemoryLedger::new());
        let cipher = Arc::new(SimulatedFheCipher::new());
        let service = SyncService::new(ledger.clone(), cipher);
        (ledger, service)
    }

    fn sample_draft() -> RecordDraft {
        RecordDraft {
            symptom_pattern: "Wind-Cold".to_string(),
            herb_formula: "Gui Zhi Tang".to_string(),
            patient_info: "Chills, no sweating".to_string(),
        }
    }

    fn stored_record(id: &str, created_at: i64, owner: &str) -> DiagnosisRecord {
        DiagnosisRecord::new(
            id.to_string(),
            "FHE-TCM-c3RvcmVk".to_string(),
            created_at,
            owner.to_string(),
            "Qi Deficiency".to_string(),
            "Si Jun Zi Tang".to_string(),
        )
    }

    fn seed_record(ledger: &MemoryLedger, record: &DiagnosisRecord) {
        let bytes = envelope::encode_record(record).expect("Should encode");
        ledger
            .set_data(&record_key(&record.id), &bytes)
            .expect("Should write");
    }

    fn seed_index(ledger: &MemoryLedger, ids: &[&str]) {
        let ids: Vec<String> = ids.iter().map(|s| (*s).to_string()).collect();
        let bytes = envelope::encode_index(&ids).expect("Should encode");
        ledger.set_data(INDEX_KEY, &bytes).expect("Should write");
    }

    #[test]
    fn test_empty_store_reloads_empty() {
        let (_ledger, mut service) = create_test_service();
        let snapshot = service.full_reload().expect("Should reload");
        assert!(snapshot.is_empty());
    }

    #[test]
    fn test_missing_and_unparsable_entries_are_skipped() {
        let (ledger, mut service) = create_test_service();

        seed_index(&ledger, &["a", "b", "c"]);
        seed_record(&ledger, &stored_record("a", 100, "0xABC"));
        // "b" has no entry at all; "c" is garbage.
        ledger
            .set_data(&record_key("c"), b"{broken")
            .expect("Should write");

        let snapshot = service.full_reload().expect("Should reload");
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].id, "a");
    }

    #[test]
    fn test_reload_orders_most_recent_first() {
        let (ledger, mut service) = create_test_service();

        seed_index(&ledger, &["older", "newer"]);
        seed_record(&ledger, &stored_record("older", 100, "0xABC"));
        seed_record(&ledger, &stored_record("newer", 200, "0xABC"));

        let snapshot = service.full_reload().expect("Should reload");
        assert_eq!(snapshot[0].id, "newer");
        assert_eq!(snapshot[1].id, "older");
    }

    #[test]
    fn test_unavailable_keeps_previous_snapshot() {
        let (ledger, mut service) = create_test_service();

        seed_index(&ledger, &["a"]);
        seed_record(&ledger, &stored_record("a", 100, "0xABC"));
        service.full_reload().expect("Should reload");
        assert_eq!(service.snapshot().len(), 1);

        ledger.set_available(false);
        let err = service.full_reload().expect_err("Should be unavailable");
        assert!(matches!(err, TcmError::Unavailable));
        assert_eq!(service.snapshot().len(), 1);
    }

    #[test]
    fn test_create_record_appears_first_and_pending() {
        let (ledger, mut service) = create_test_service();

        seed_index(&ledger, &["old"]);
        seed_record(&ledger, &stored_record("old", 100, "0xDEF"));

        let outcome = service
            .create_record(&sample_draft(), "0xABC")
            .expect("Should create");
        let id = match outcome {
            CreationOutcome::Created { ref id } => id.clone(),
            ref other => panic!("Unexpected outcome: {other:?}"),
        };

        let snapshot = service.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].id, id);
        assert_eq!(snapshot[0].status, RecordStatus::Pending);
        assert_eq!(snapshot[0].owner, "0xABC");
        assert_eq!(snapshot[0].symptom_pattern, "Wind-Cold");
        assert_eq!(snapshot[0].herb_formula, "Gui Zhi Tang");
        assert!(snapshot[0].encrypted_payload.starts_with("FHE-TCM-"));
    }

    #[test]
    fn test_create_validates_before_store_interaction() {
        let (ledger, mut service) = create_test_service();

        // Even with the ledger down, validation errors come first.
        ledger.set_available(false);

        let err = service
            .create_record(&RecordDraft::default(), "0xABC")
            .expect_err("Should reject empty draft");
        assert!(matches!(err, TcmError::Validation(_)));

        let err = service
            .create_record(&sample_draft(), "  ")
            .expect_err("Should reject missing account");
        assert!(matches!(err, TcmError::Validation(_)));
    }

    #[test]
    fn test_create_surfaces_commit_failure_verbatim() {
        let (ledger, mut service) = create_test_service();
        ledger.reject_writes("user rejected transaction");

        let err = service
            .create_record(&sample_draft(), "0xABC")
            .expect_err("Should fail");
        assert!(err.to_string().contains("user rejected transaction"));
        assert!(service.snapshot().is_empty());
    }

    #[test]
    fn test_orphan_on_index_append_failure() {
        let (ledger, mut service) = create_test_service();
        ledger.reject_writes_to(INDEX_KEY, "out of gas");

        let outcome = service
            .create_record(&sample_draft(), "0xABC")
            .expect("Creation itself succeeds");
        let id = match outcome {
            CreationOutcome::CreatedButUnindexed { ref id } => id.clone(),
            ref other => panic!("Unexpected outcome: {other:?}"),
        };

        // The entry exists under its key but reloads cannot see it.
        ledger.accept_writes();
        let bytes = ledger.get_data(&record_key(&id)).expect("Should read");
        assert!(!bytes.is_empty());
        let snapshot = service.full_reload().expect("Should reload");
        assert!(snapshot.is_empty());

        // The repair pass makes it visible.
        assert!(service.repair_unindexed(&id).expect("Should repair"));
        assert_eq!(service.snapshot().len(), 1);
        assert_eq!(service.snapshot()[0].id, id);

        // Repairing again is a no-op.
        assert!(!service.repair_unindexed(&id).expect("Should be indexed"));
    }

    #[test]
    fn test_repair_unknown_id_is_not_found() {
        let (_ledger, mut service) = create_test_service();
        let err = service
            .repair_unindexed("tcm-0-nothere")
            .expect_err("Should fail");
        assert!(matches!(err, TcmError::NotFound(_)));
    }

    #[test]
    fn test_analyze_persists_status_change() {
        let (ledger, mut service) = create_test_service();

        seed_index(&ledger, &["a"]);
        seed_record(&ledger, &stored_record("a", 100, "0xABC"));

        let updated = service
            .analyze_record("a", "0xabc")
            .expect("Should analyze (case-insensitive owner)");
        assert_eq!(updated.status, RecordStatus::Analyzed);

        // Persisted: a fresh reload sees the new status, same everything else.
        let snapshot = service.full_reload().expect("Should reload");
        assert_eq!(snapshot[0].status, RecordStatus::Analyzed);
        assert_eq!(snapshot[0].created_at, 100);
        assert_eq!(snapshot[0].encrypted_payload, "FHE-TCM-c3RvcmVk");
    }

    #[test]
    fn test_transition_rejections_leave_store_untouched() {
        let (ledger, mut service) = create_test_service();

        seed_index(&ledger, &["a"]);
        seed_record(&ledger, &stored_record("a", 100, "0xABC"));
        service.full_reload().expect("Should reload");

        let err = service
            .archive_record("a", "0xEVIL")
            .expect_err("Should reject non-owner");
        assert!(matches!(err, TcmError::Rejected(_)));

        let snapshot = service.full_reload().expect("Should reload");
        assert_eq!(snapshot[0].status, RecordStatus::Pending);
    }

    #[test]
    fn test_transition_missing_record_is_not_found() {
        let (ledger, mut service) = create_test_service();
        seed_index(&ledger, &["ghost"]);

        let err = service
            .analyze_record("ghost", "0xABC")
            .expect_err("Should fail");
        assert!(matches!(err, TcmError::NotFound(_)));
    }

    #[test]
    fn test_transition_unavailable_is_soft() {
        let (ledger, mut service) = create_test_service();

        seed_index(&ledger, &["a"]);
        seed_record(&ledger, &stored_record("a", 100, "0xABC"));
        service.full_reload().expect("Should reload");

        ledger.set_available(false);
        let err = service
            .analyze_record("a", "0xABC")
            .expect_err("Should be unavailable");
        assert!(matches!(err, TcmError::Unavailable));
        assert_eq!(service.snapshot()[0].status, RecordStatus::Pending);
    }
}
