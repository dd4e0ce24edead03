//! Cipher port: Trait for the encryption collaborator.
//!
//! The encryption scheme is a black box to this client: it turns plaintext
//! diagnosis fields into an opaque ciphertext string, once, at creation
//! time. Nothing in this crate ever decrypts or inspects the result.

use crate::domain::RecordDraft;

/// Error type for encryption operations.
#[derive(Debug, thiserror::Error)]
pub enum CipherError {
    #[error("payload encryption failed: {0}")]
    Encryption(String),
}

/// Trait for the payload encryption collaborator.
pub trait PayloadCipher: Send + Sync {
    /// Encrypt a draft into an opaque ciphertext string.
    ///
    /// The ciphertext is produced exactly once per record and carried
    /// verbatim in the envelope's `data` field forever after.
    ///
    /// # Errors
    /// Returns [`CipherError`] if the collaborator fails.
    fn encrypt(&self, draft: &RecordDraft) -> Result<String, CipherError>;
}
