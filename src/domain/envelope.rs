//! Record codec: the wire envelope and the id index.
//!
//! The remote store speaks raw bytes; values are UTF-8 JSON. The envelope is
//! field-tagged; its `data` field carries the ciphertext as an opaque string
//! and is never interpreted here.

use serde::{Deserialize, Serialize};

use crate::domain::{DiagnosisRecord, RecordStatus};

/// Store key holding the ordered list of record ids.
pub const INDEX_KEY: &str = "tcm_record_keys";

/// Store key for a single record entry.
#[must_use]
pub fn record_key(id: &str) -> String {
    format!("tcm_record_{id}")
}

/// Error type for codec operations.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("malformed stored bytes: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("stored bytes are not valid UTF-8")]
    NotUtf8(#[from] std::str::Utf8Error),
}

/// Persisted shape of a record entry.
///
/// The id is not part of the envelope: it lives in the store key and in the
/// index, and is re-attached at decode time.
#[derive(Debug, Serialize, Deserialize)]
struct RecordEnvelope {
    data: String,
    timestamp: i64,
    owner: String,
    #[serde(rename = "symptomPattern")]
    symptom_pattern: String,
    #[serde(rename = "herbFormula")]
    herb_formula: String,
    // Absent in envelopes written before the lifecycle existed.
    #[serde(default)]
    status: RecordStatus,
}

/// Serialize a record into its store bytes.
///
/// # Errors
/// Returns [`CodecError`] if serialization fails.
pub fn encode_record(record: &DiagnosisRecord) -> Result<Vec<u8>, CodecError> {
    let envelope = RecordEnvelope {
        data: record.encrypted_payload.clone(),
        timestamp: record.created_at,
        owner: record.owner.clone(),
        symptom_pattern: record.symptom_pattern.clone(),
        herb_formula: record.herb_formula.clone(),
        status: record.status,
    };
    Ok(serde_json::to_vec(&envelope)?)
}

/// Deserialize a record entry fetched under `record_key(id)`.
///
/// # Errors
/// Returns [`CodecError`] for malformed buffers. Bulk loaders skip the
/// offending entry and continue; targeted operations surface the error.
pub fn decode_record(id: &str, bytes: &[u8]) -> Result<DiagnosisRecord, CodecError> {
    let text = std::str::from_utf8(bytes)?;
    let envelope: RecordEnvelope = serde_json::from_str(text)?;
    Ok(DiagnosisRecord {
        id: id.to_string(),
        encrypted_payload: envelope.data,
        created_at: envelope.timestamp,
        owner: envelope.owner,
        symptom_pattern: envelope.symptom_pattern,
        herb_formula: envelope.herb_formula,
        status: envelope.status,
    })
}

/// Serialize the id index.
///
/// # Errors
/// Returns [`CodecError`] if serialization fails.
pub fn encode_index(ids: &[String]) -> Result<Vec<u8>, CodecError> {
    Ok(serde_json::to_vec(ids)?)
}

/// Deserialize the id index, preserving order.
///
/// # Errors
/// Returns [`CodecError`] for malformed buffers; the index manager treats
/// that as an empty index.
pub fn decode_index(bytes: &[u8]) -> Result<Vec<String>, CodecError> {
    let text = std::str::from_utf8(bytes)?;
    Ok(serde_json::from_str(text)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> DiagnosisRecord {
        DiagnosisRecord {
            id: "tcm-1700000000000-a1b2c3d".to_string(),
            encrypted_payload: "FHE-TCM-eyJzeW1wdG9tIjoiV2luZC1Db2xkIn0=".to_string(),
            created_at: 1_700_000_000,
            owner: "0xAbCdEf0123".to_string(),
            symptom_pattern: "Wind-Cold".to_string(),
            herb_formula: "Gui Zhi Tang".to_string(),
            status: RecordStatus::Analyzed,
        }
    }

    #[test]
    fn test_record_round_trip() {
        let record = sample_record();
        let bytes = encode_record(&record).expect("Should encode");
        let decoded = decode_record(&record.id, &bytes).expect("Should decode");
        assert_eq!(decoded, record);
    }

    #[test]
    fn test_index_round_trip_preserves_order() {
        let ids = vec![
            "tcm-3-zzz".to_string(),
            "tcm-1-aaa".to_string(),
            "tcm-2-mmm".to_string(),
        ];
        let bytes = encode_index(&ids).expect("Should encode");
        let decoded = decode_index(&bytes).expect("Should decode");
        assert_eq!(decoded, ids);

        let empty = decode_index(&encode_index(&[]).expect("Should encode"))
            .expect("Should decode");
        assert!(empty.is_empty());
    }

    #[test]
    fn test_missing_status_defaults_to_pending() {
        let json = r#"{"data":"FHE-TCM-x","timestamp":42,"owner":"0xA","symptomPattern":"Qi Deficiency","herbFormula":"Si Jun Zi Tang"}"#;
        let record = decode_record("tcm-42-old", json.as_bytes()).expect("Should decode");
        assert_eq!(record.status, RecordStatus::Pending);
    }

    #[test]
    fn test_unknown_status_tag_falls_back_to_pending() {
        let json = r#"{"data":"FHE-TCM-x","timestamp":42,"owner":"0xA","symptomPattern":"Qi Deficiency","herbFormula":"Si Jun Zi Tang","status":"reviewed"}"#;
        let record = decode_record("tcm-42-new", json.as_bytes()).expect("Should decode");
        assert_eq!(record.status, RecordStatus::Pending);
    }

    #[test]
    fn test_malformed_bytes_are_an_error() {
        assert!(decode_record("x", b"not json").is_err());
        assert!(decode_record("x", &[0xff, 0xfe]).is_err());
        assert!(decode_index(b"{\"oops\":1}").is_err());
    }

    #[test]
    fn test_record_key_schema() {
        assert_eq!(record_key("tcm-1-abc"), "tcm_record_tcm-1-abc");
        assert_eq!(INDEX_KEY, "tcm_record_keys");
    }
}
