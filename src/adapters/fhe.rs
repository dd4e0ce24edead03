//! Simulated-FHE cipher adapter.
//!
//! Implements the `PayloadCipher` port with the same observable contract as
//! the real encryption collaborator: plaintext fields in, opaque ciphertext
//! string out. The transform here is a stand-in (tagged base64), not a
//! cryptographic primitive; nothing downstream may depend on its shape.

use base64::engine::general_purpose;
use base64::Engine;
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::domain::RecordDraft;
use crate::ports::{CipherError, PayloadCipher};

/// Ciphertext prefix identifying the simulated scheme.
const CIPHERTEXT_PREFIX: &str = "FHE-TCM-";

/// Simulated encryption collaborator.
pub struct SimulatedFheCipher;

impl SimulatedFheCipher {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for SimulatedFheCipher {
    fn default() -> Self {
        Self::new()
    }
}

impl PayloadCipher for SimulatedFheCipher {
    fn encrypt(&self, draft: &RecordDraft) -> Result<String, CipherError> {
        // Hold the serialized plaintext only as long as needed.
        let plaintext = Zeroizing::new(
            serde_json::to_string(draft).map_err(|e| CipherError::Encryption(e.to_string()))?,
        );

        let ciphertext = format!(
            "{CIPHERTEXT_PREFIX}{}",
            general_purpose::STANDARD.encode(plaintext.as_bytes())
        );

        tracing::debug!(
            "Encrypted payload, {} bytes, fingerprint {}",
            ciphertext.len(),
            fingerprint(&ciphertext)
        );

        Ok(ciphertext)
    }
}

/// Short SHA-256 fingerprint of a ciphertext, safe to log.
#[must_use]
pub fn fingerprint(ciphertext: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(ciphertext.as_bytes());
    let digest = hasher.finalize();

    digest[..8].iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_draft() -> RecordDraft {
        RecordDraft {
            symptom_pattern: "Wind-Cold".to_string(),
            herb_formula: "Gui Zhi Tang".to_string(),
            patient_info: "Chills, floating-tight pulse".to_string(),
        }
    }

    #[test]
    fn test_ciphertext_is_tagged_and_opaque() {
        let cipher = SimulatedFheCipher::new();
        let ciphertext = cipher.encrypt(&sample_draft()).expect("Should encrypt");

        assert!(ciphertext.starts_with("FHE-TCM-"));
        // The plaintext must not leak into the ciphertext string.
        assert!(!ciphertext.contains("Wind-Cold"));
        assert!(!ciphertext.contains("floating-tight"));
    }

    #[test]
    fn test_ciphertext_body_is_valid_base64() {
        let cipher = SimulatedFheCipher::new();
        let ciphertext = cipher.encrypt(&sample_draft()).expect("Should encrypt");

        let body = ciphertext.strip_prefix("FHE-TCM-").expect("Should be tagged");
        general_purpose::STANDARD
            .decode(body)
            .expect("Should be base64");
    }

    #[test]
    fn test_fingerprint_is_short_and_stable() {
        let fp1 = fingerprint("FHE-TCM-abc");
        let fp2 = fingerprint("FHE-TCM-abc");
        assert_eq!(fp1, fp2);
        assert_eq!(fp1.len(), 16); // 8 bytes = 16 hex chars
        assert_ne!(fp1, fingerprint("FHE-TCM-abd"));
    }
}
