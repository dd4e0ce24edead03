//! Record lifecycle engine.
//!
//! Governs the linear status lifecycle (`pending -> analyzed`,
//! `pending -> archived`) and the authorization rule for each transition.

use crate::domain::{DiagnosisRecord, RecordStatus};

/// Reasons a transition is refused. All variants are user-visible
/// rejections; none is retryable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("account {actor} does not own record {id}")]
    NotOwner { id: String, actor: String },

    #[error("record {id} is already {status}")]
    NotPending { id: String, status: RecordStatus },

    #[error("a record cannot be moved back to pending")]
    InvalidTarget,
}

/// Apply a status transition, returning the updated record.
///
/// Authorization is evaluated against the actor supplied *at call time*, not
/// the account that loaded the record. If the connected account changes
/// between load and action, the outcome changes with it; this matches the
/// "current signer must match" model and is intentional.
///
/// Checks run in a fixed order so that rejections are stable:
/// 1. non-owners are refused regardless of the record's status;
/// 2. records past `Pending` are refused regardless of target (one-shot);
/// 3. `Pending` is never a valid target.
///
/// On success only `status` changes; every other field is carried over
/// untouched.
///
/// # Errors
/// Returns [`TransitionError`] when the transition is refused.
pub fn transition(
    record: &DiagnosisRecord,
    target: RecordStatus,
    actor: &str,
) -> Result<DiagnosisRecord, TransitionError> {
    if !record.owner.eq_ignore_ascii_case(actor) {
        return Err(TransitionError::NotOwner {
            id: record.id.clone(),
            actor: actor.to_string(),
        });
    }

    if record.status != RecordStatus::Pending {
        return Err(TransitionError::NotPending {
            id: record.id.clone(),
            status: record.status,
        });
    }

    if target == RecordStatus::Pending {
        return Err(TransitionError::InvalidTarget);
    }

    let mut updated = record.clone();
    updated.status = target;
    Ok(updated)
}
