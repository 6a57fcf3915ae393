//! # Symmetric Encryption
//!
//! Provides XChaCha20-Poly1305 (default) and AES-GCM encryption of stored
//! values.
//!
//! ## Wire Form
//!
//! `hex(nonce || ciphertext)`. The nonce length depends on the cipher (24 bytes
//! for XChaCha20, 12 for AES-GCM).
//!
//! ## Security Properties
//!
//! - **XChaCha20-Poly1305**: 192-bit nonce, constant-time ARX design
//! - **AES-GCM**: Use only with AES-NI hardware acceleration

use crate::CryptoError;
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::trace;
use zeroize::Zeroize;

/// Secret key (256-bit).
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct SecretKey([u8; 32]);

impl SecretKey {
    /// Create from bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Derive a key from a pre-shared secret string (SHA-256).
    pub fn derive(secret: &str) -> Self {
        let digest = Sha256::digest(secret.as_bytes());
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&digest);
        Self(bytes)
    }

    /// Generate random key.
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        rand::RngCore::fill_bytes(&mut rand::thread_rng(), &mut bytes);
        Self(bytes)
    }

    /// Get inner bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

/// Nonce for encryption.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Nonce(Vec<u8>);

impl Nonce {
    /// Create from bytes, checking the length the cipher expects.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::InvalidNonceLength` on a length mismatch.
    pub fn from_bytes(cipher: Cipher, bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != cipher.nonce_len() {
            return Err(CryptoError::InvalidNonceLength {
                expected: cipher.nonce_len(),
                actual: bytes.len(),
            });
        }
        Ok(Self(bytes.to_vec()))
    }

    /// Generate a random nonce of the right size for `cipher`.
    pub fn generate(cipher: Cipher) -> Self {
        let mut bytes = vec![0u8; cipher.nonce_len()];
        rand::RngCore::fill_bytes(&mut rand::thread_rng(), &mut bytes);
        Self(bytes)
    }

    /// Get inner bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// Cipher selection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Cipher {
    /// XChaCha20-Poly1305 (default, side-channel immune)
    #[default]
    XChaCha20Poly1305,
    /// AES-256-GCM (use with AES-NI only)
    Aes256Gcm,
}

impl Cipher {
    /// Nonce size in bytes.
    pub fn nonce_len(self) -> usize {
        match self {
            Cipher::XChaCha20Poly1305 => 24,
            Cipher::Aes256Gcm => 12,
        }
    }
}

/// Encrypt plaintext with a fresh random nonce.
///
/// Returns (ciphertext, nonce).
///
/// # Errors
///
/// Returns `CryptoError::EncryptionFailed` if encryption fails.
pub fn encrypt(
    key: &SecretKey,
    cipher: Cipher,
    plaintext: &[u8],
) -> Result<(Vec<u8>, Nonce), CryptoError> {
    let nonce = Nonce::generate(cipher);
    let ciphertext = match cipher {
        Cipher::XChaCha20Poly1305 => {
            use chacha20poly1305::aead::{Aead, KeyInit};
            use chacha20poly1305::{XChaCha20Poly1305, XNonce};

            XChaCha20Poly1305::new(key.as_bytes().into())
                .encrypt(XNonce::from_slice(nonce.as_bytes()), plaintext)
        }
        Cipher::Aes256Gcm => {
            use aes_gcm::aead::{Aead, KeyInit};
            use aes_gcm::Aes256Gcm;

            Aes256Gcm::new(key.as_bytes().into())
                .encrypt(aes_gcm::Nonce::from_slice(nonce.as_bytes()), plaintext)
        }
    }
    .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

    Ok((ciphertext, nonce))
}

/// Decrypt ciphertext.
///
/// # Errors
///
/// Returns `CryptoError::DecryptionFailed` if decryption fails (wrong key,
/// tampered data).
pub fn decrypt(
    key: &SecretKey,
    cipher: Cipher,
    ciphertext: &[u8],
    nonce: &Nonce,
) -> Result<Vec<u8>, CryptoError> {
    if nonce.as_bytes().len() != cipher.nonce_len() {
        return Err(CryptoError::InvalidNonceLength {
            expected: cipher.nonce_len(),
            actual: nonce.as_bytes().len(),
        });
    }

    let plaintext = match cipher {
        Cipher::XChaCha20Poly1305 => {
            use chacha20poly1305::aead::{Aead, KeyInit};
            use chacha20poly1305::{XChaCha20Poly1305, XNonce};

            XChaCha20Poly1305::new(key.as_bytes().into())
                .decrypt(XNonce::from_slice(nonce.as_bytes()), ciphertext)
        }
        Cipher::Aes256Gcm => {
            use aes_gcm::aead::{Aead, KeyInit};
            use aes_gcm::Aes256Gcm;

            Aes256Gcm::new(key.as_bytes().into())
                .decrypt(aes_gcm::Nonce::from_slice(nonce.as_bytes()), ciphertext)
        }
    };

    plaintext.map_err(|e| CryptoError::DecryptionFailed(e.to_string()))
}

/// Returns true if `text` is a non-empty run of hex digits.
pub fn is_hex(text: &str) -> bool {
    !text.is_empty() && text.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Encrypts and decrypts store values.
///
/// A value is serialized to JSON, encrypted, and stored as a hex string.
/// Decryption never fails: anything that is not a decryptable hex string is
/// returned as is, so "never encrypted" and "failed to decrypt" look the same.
#[derive(Clone)]
pub struct StorageCodec {
    key: SecretKey,
    cipher: Cipher,
}

impl StorageCodec {
    /// Create a codec from an explicit key.
    pub fn new(key: SecretKey, cipher: Cipher) -> Self {
        Self { key, cipher }
    }

    /// Create a codec from the pre-shared secret.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::MissingSecret` if the secret is absent or empty.
    pub fn from_secret(secret: Option<&str>) -> Result<Self, CryptoError> {
        match secret {
            Some(secret) if !secret.is_empty() => {
                Ok(Self::new(SecretKey::derive(secret), Cipher::default()))
            }
            _ => Err(CryptoError::MissingSecret {
                var: crate::SECRET_ENV_VAR,
            }),
        }
    }

    /// Switch the cipher used for new and existing values.
    #[must_use]
    pub fn with_cipher(mut self, cipher: Cipher) -> Self {
        self.cipher = cipher;
        self
    }

    /// The cipher in use.
    pub fn cipher(&self) -> Cipher {
        self.cipher
    }

    /// Serialize and encrypt a value into its hex wire form.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::Serialization` or `CryptoError::EncryptionFailed`.
    pub fn encrypt(&self, value: &Value) -> Result<String, CryptoError> {
        let plaintext =
            serde_json::to_vec(value).map_err(|e| CryptoError::Serialization(e.to_string()))?;
        let (ciphertext, nonce) = encrypt(&self.key, self.cipher, &plaintext)?;

        let mut wire = Vec::with_capacity(nonce.as_bytes().len() + ciphertext.len());
        wire.extend_from_slice(nonce.as_bytes());
        wire.extend_from_slice(&ciphertext);
        Ok(hex::encode(wire))
    }

    /// Decrypt a stored value, or return it unchanged.
    pub fn decrypt(&self, value: &Value) -> Value {
        let Value::String(text) = value else {
            return value.clone();
        };
        if !is_hex(text) {
            return value.clone();
        }

        match self.try_decrypt(text) {
            Ok(plain) => plain,
            Err(e) => {
                trace!(error = %e, "Value did not decrypt, returning it unchanged");
                value.clone()
            }
        }
    }

    fn try_decrypt(&self, text: &str) -> Result<Value, CryptoError> {
        let wire = hex::decode(text).map_err(|e| CryptoError::InvalidInput(e.to_string()))?;
        let nonce_len = self.cipher.nonce_len();
        if wire.len() <= nonce_len {
            return Err(CryptoError::InvalidInput(format!(
                "ciphertext of {} bytes is too short",
                wire.len()
            )));
        }

        let (nonce, ciphertext) = wire.split_at(nonce_len);
        let nonce = Nonce::from_bytes(self.cipher, nonce)?;
        let plaintext = decrypt(&self.key, self.cipher, ciphertext, &nonce)?;
        serde_json::from_slice(&plaintext).map_err(|e| CryptoError::Serialization(e.to_string()))
    }
}

impl std::fmt::Debug for StorageCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageCodec")
            .field("cipher", &self.cipher)
            .finish_non_exhaustive()
    }
}
