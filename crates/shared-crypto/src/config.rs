//! Encryption configuration from environment variables.

use crate::symmetric::{Cipher, StorageCodec};
use crate::CryptoError;
use std::env;
use zeroize::Zeroizing;

/// Environment variable holding the pre-shared storage secret.
pub const SECRET_ENV_VAR: &str = "EXTENSION_STORAGE_ENCRYPTION_KEY";

/// Configuration for encrypted stores.
#[derive(Clone, Default)]
pub struct EncryptionConfig {
    /// Pre-shared secret. Absent means encrypted stores cannot be created.
    pub secret: Option<Zeroizing<String>>,
    /// Cipher for stored values.
    pub cipher: Cipher,
}

impl EncryptionConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `EXTENSION_STORAGE_ENCRYPTION_KEY`: storage secret (default: unset)
    pub fn from_env() -> Self {
        Self {
            secret: env::var(SECRET_ENV_VAR)
                .ok()
                .filter(|v| !v.is_empty())
                .map(Zeroizing::new),
            cipher: Cipher::default(),
        }
    }

    /// Configuration with an explicit secret.
    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self {
            secret: Some(Zeroizing::new(secret.into())),
            cipher: Cipher::default(),
        }
    }

    /// Returns true if a secret is configured.
    pub fn has_secret(&self) -> bool {
        self.secret.is_some()
    }

    /// Build the codec for encrypted stores.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::MissingSecret` if no secret is configured.
    pub fn codec(&self) -> Result<StorageCodec, CryptoError> {
        let secret = self.secret.as_ref().map(|s| s.as_str());
        Ok(StorageCodec::from_secret(secret)?.with_cipher(self.cipher))
    }
}

impl std::fmt::Debug for EncryptionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptionConfig")
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .field("cipher", &self.cipher)
            .finish()
    }
}
