//! Diagnosis record types.
//!
//! A record is the unit of persisted state: an opaque encrypted payload plus
//! a small plaintext envelope (pattern, formula, owner, status).

use serde::{Deserialize, Serialize};

/// Lifecycle status of a diagnosis record.
///
/// The lifecycle is strictly linear: every record starts `Pending` and moves
/// at most once, to either `Analyzed` or `Archived`. Both are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordStatus {
    /// Submitted, not yet analyzed
    #[default]
    Pending,
    /// Pattern analysis completed
    Analyzed,
    /// Retired without analysis
    Archived,
}

impl RecordStatus {
    /// Wire tag for this status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Analyzed => "analyzed",
            Self::Archived => "archived",
        }
    }

    /// Parse a wire tag.
    ///
    /// Unknown or legacy tags fall back to `Pending` so that old envelopes
    /// (written before the status field existed) stay loadable.
    #[must_use]
    pub fn parse(tag: &str) -> Self {
        match tag {
            "analyzed" => Self::Analyzed,
            "archived" => Self::Archived,
            _ => Self::Pending,
        }
    }

    /// Whether any further transition is allowed from this status.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Associated color for TUI display (RGB).
    #[must_use]
    pub fn color(&self) -> (u8, u8, u8) {
        match self {
            Self::Pending => (251, 191, 36),  // Amber (#FBBF24)
            Self::Analyzed => (16, 185, 129), // Emerald (#10B981)
            Self::Archived => (100, 116, 139), // Slate (#64748B)
        }
    }
}

impl std::fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for RecordStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for RecordStatus {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Ok(Self::parse(&tag))
    }
}

/// A confidential diagnosis record as seen by the client.
///
/// `encrypted_payload` is produced once at creation by the encryption
/// collaborator and never mutated afterward; only `status` changes on
/// subsequent writes. `owner` is compared case-insensitively everywhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosisRecord {
    /// Unique identifier, generated client-side at creation
    pub id: String,

    /// Opaque ciphertext from the encryption collaborator
    pub encrypted_payload: String,

    /// Creation time, Unix seconds
    pub created_at: i64,

    /// Account that created the record
    pub owner: String,

    /// Diagnosed symptom pattern (e.g. "Wind-Cold")
    pub symptom_pattern: String,

    /// Prescribed herbal formula (e.g. "Gui Zhi Tang")
    pub herb_formula: String,

    /// Lifecycle status
    pub status: RecordStatus,
}

impl DiagnosisRecord {
    /// Build a freshly created record. Status is always `Pending` at birth.
    #[must_use]
    pub fn new(
        id: String,
        encrypted_payload: String,
        created_at: i64,
        owner: String,
        symptom_pattern: String,
        herb_formula: String,
    ) -> Self {
        Self {
            id,
            encrypted_payload,
            created_at,
            owner,
            symptom_pattern,
            herb_formula,
            status: RecordStatus::Pending,
        }
    }
}

/// Creation input for a new record, prior to encryption.
///
/// `patient_info` is only ever persisted inside the ciphertext; the other two
/// fields also appear in the plaintext envelope.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RecordDraft {
    #[serde(rename = "symptomPattern")]
    pub symptom_pattern: String,

    #[serde(rename = "herbFormula")]
    pub herb_formula: String,

    #[serde(rename = "patientInfo")]
    pub patient_info: String,
}

impl RecordDraft {
    /// Validate required fields.
    ///
    /// # Errors
    /// Returns a user-visible message when a required field is empty.
    pub fn validate(&self) -> Result<(), String> {
        if self.symptom_pattern.trim().is_empty() {
            return Err("Symptom pattern is required".to_string());
        }
        if self.herb_formula.trim().is_empty() {
            return Err("Herbal formula is required".to_string());
        }
        Ok(())
    }
}

/// Generate a record id: time-based prefix plus a random suffix.
///
/// Uses ChaCha20Rng seeded from OS entropy so ids stay unpredictable even on
/// platforms with a weak default generator.
#[must_use]
pub fn generate_record_id(now_millis: i64) -> String {
    use rand::Rng;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    const SUFFIX_LEN: usize = 7;
    const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

    let mut rng = ChaCha20Rng::from_entropy();
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect();

    format!("tcm-{now_millis}-{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse_known_tags() {
        assert_eq!(RecordStatus::parse("pending"), RecordStatus::Pending);
        assert_eq!(RecordStatus::parse("analyzed"), RecordStatus::Analyzed);
        assert_eq!(RecordStatus::parse("archived"), RecordStatus::Archived);
    }

    #[test]
    fn test_status_parse_unknown_falls_back_to_pending() {
        assert_eq!(RecordStatus::parse("reviewed"), RecordStatus::Pending);
        assert_eq!(RecordStatus::parse(""), RecordStatus::Pending);
    }

    #[test]
    fn test_status_terminal() {
        assert!(!RecordStatus::Pending.is_terminal());
        assert!(RecordStatus::Analyzed.is_terminal());
        assert!(RecordStatus::Archived.is_terminal());
    }

    #[test]
    fn test_draft_validation() {
        let valid = RecordDraft {
            symptom_pattern: "Wind-Cold".to_string(),
            herb_formula: "Gui Zhi Tang".to_string(),
            patient_info: String::new(),
        };
        assert!(valid.validate().is_ok());

        let missing_formula = RecordDraft {
            symptom_pattern: "Wind-Cold".to_string(),
            ..Default::default()
        };
        assert!(missing_formula.validate().is_err());

        let blank_pattern = RecordDraft {
            symptom_pattern: "   ".to_string(),
            herb_formula: "Gui Zhi Tang".to_string(),
            patient_info: String::new(),
        };
        assert!(blank_pattern.validate().is_err());
    }

    #[test]
    fn test_record_id_generation() {
        let id1 = generate_record_id(1_700_000_000_000);
        let id2 = generate_record_id(1_700_000_000_000);

        assert!(id1.starts_with("tcm-1700000000000-"));
        assert_ne!(id1, id2);
        assert_eq!(id1.len(), "tcm-1700000000000-".len() + 7);
    }

    #[test]
    fn test_new_record_starts_pending() {
        let record = DiagnosisRecord::new(
            "tcm-1-abc".to_string(),
            "FHE-TCM-xxxx".to_string(),
            100,
            "0xABC".to_string(),
            "Wind-Cold".to_string(),
            "Gui Zhi Tang".to_string(),
        );
        assert_eq!(record.status, RecordStatus::Pending);
    }
}
