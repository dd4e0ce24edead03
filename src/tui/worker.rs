//! Background worker for non-blocking store operations.
//!
//! Creation and status transitions go through the remote collaborator and
//! take observable wall-clock time (the encrypted-computation latency), so
//! they run on a worker thread that reports progress over a channel. The
//! main loop polls the handle each frame and never blocks.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::adapters::LedgerError;
use crate::application::{CreationOutcome, SyncService};
use crate::domain::{RecordDraft, RecordStatus};
use crate::ports::{LedgerStore, PayloadCipher};

/// Simulated encrypted-computation latency before an analysis commit.
const ANALYSIS_LATENCY: Duration = Duration::from_millis(3000);

/// Simulated encrypted-computation latency before an archive commit.
const ARCHIVE_LATENCY: Duration = Duration::from_millis(2000);

/// Latency of the encryption collaborator during creation.
const ENCRYPTION_LATENCY: Duration = Duration::from_millis(300);

/// Progress updates from the task worker.
#[derive(Debug, Clone)]
pub enum TaskProgress {
    /// Encrypting the draft payload
    Encrypting,
    /// Committing bytes to the store
    Submitting,
    /// Running the encrypted computation
    Computing,
    /// Task finished; user-visible success message
    Complete(String),
    /// Task failed; user-visible error message
    Error(String),
}

/// Handle to a running task worker.
pub struct TaskWorkerHandle {
    progress_rx: Receiver<TaskProgress>,
    _handle: JoinHandle<()>,
}

impl TaskWorkerHandle {
    /// Try to receive the next progress update (non-blocking).
    #[must_use]
    pub fn try_recv(&self) -> Option<TaskProgress> {
        self.progress_rx.try_recv().ok()
    }
}

/// Worker that runs store mutations in the background.
pub struct TaskWorker;

impl TaskWorker {
    /// Spawn a background record creation.
    pub fn spawn_create<L, C>(
        service: Arc<Mutex<SyncService<L, C>>>,
        draft: RecordDraft,
        actor: String,
    ) -> TaskWorkerHandle
    where
        L: LedgerStore + 'static,
        L::Error: Into<LedgerError>,
        C: PayloadCipher + 'static,
    {
        let (tx, rx) = mpsc::channel();

        let handle = thread::spawn(move || {
            Self::run_create(service, draft, actor, &tx);
        });

        TaskWorkerHandle {
            progress_rx: rx,
            _handle: handle,
        }
    }

    /// Spawn a background status transition.
    pub fn spawn_transition<L, C>(
        service: Arc<Mutex<SyncService<L, C>>>,
        id: String,
        target: RecordStatus,
        actor: String,
    ) -> TaskWorkerHandle
    where
        L: LedgerStore + 'static,
        L::Error: Into<LedgerError>,
        C: PayloadCipher + 'static,
    {
        let (tx, rx) = mpsc::channel();

        let handle = thread::spawn(move || {
            Self::run_transition(service, &id, target, &actor, &tx);
        });

        TaskWorkerHandle {
            progress_rx: rx,
            _handle: handle,
        }
    }

    fn run_create<L, C>(
        service: Arc<Mutex<SyncService<L, C>>>,
        draft: RecordDraft,
        actor: String,
        tx: &Sender<TaskProgress>,
    ) where
        L: LedgerStore,
        L::Error: Into<LedgerError>,
        C: PayloadCipher,
    {
        let _ = tx.send(TaskProgress::Encrypting);
        thread::sleep(ENCRYPTION_LATENCY);

        let _ = tx.send(TaskProgress::Submitting);

        let result = match service.lock() {
            Ok(mut svc) => svc.create_record(&draft, &actor),
            Err(_) => {
                let _ = tx.send(TaskProgress::Error(
                    "Sync service lock poisoned".to_string(),
                ));
                return;
            }
        };

        let progress = match result {
            Ok(CreationOutcome::Created { .. }) => {
                TaskProgress::Complete("Diagnosis encrypted and submitted".to_string())
            }
            Ok(CreationOutcome::CreatedButUnindexed { id }) => TaskProgress::Error(format!(
                "Record {id} was stored but the index update failed; it stays hidden until repaired"
            )),
            Err(e) => TaskProgress::Error(format!("Submission failed: {e}")),
        };
        let _ = tx.send(progress);
    }

    fn run_transition<L, C>(
        service: Arc<Mutex<SyncService<L, C>>>,
        id: &str,
        target: RecordStatus,
        actor: &str,
        tx: &Sender<TaskProgress>,
    ) where
        L: LedgerStore,
        L::Error: Into<LedgerError>,
        C: PayloadCipher,
    {
        let _ = tx.send(TaskProgress::Computing);

        // The encrypted computation runs before the store write is attempted.
        let latency = match target {
            RecordStatus::Archived => ARCHIVE_LATENCY,
            _ => ANALYSIS_LATENCY,
        };
        thread::sleep(latency);

        let _ = tx.send(TaskProgress::Submitting);

        let result = match service.lock() {
            Ok(mut svc) => match target {
                RecordStatus::Analyzed => svc.analyze_record(id, actor),
                RecordStatus::Archived => svc.archive_record(id, actor),
                RecordStatus::Pending => {
                    let _ = tx.send(TaskProgress::Error(
                        "A record cannot be moved back to pending".to_string(),
                    ));
                    return;
                }
            },
            Err(_) => {
                let _ = tx.send(TaskProgress::Error(
                    "Sync service lock poisoned".to_string(),
                ));
                return;
            }
        };

        let progress = match result {
            Ok(record) => match record.status {
                RecordStatus::Analyzed => {
                    TaskProgress::Complete("Pattern analysis completed".to_string())
                }
                _ => TaskProgress::Complete("Record archived".to_string()),
            },
            Err(e) => TaskProgress::Error(format!("{e}")),
        };
        let _ = tx.send(progress);
    }
}
