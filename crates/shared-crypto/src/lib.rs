//! # Shared Crypto - Value Encryption for Stores
//!
//! ## Components
//!
//! | Module | Purpose |
//! |--------|---------|
//! | `symmetric` | XChaCha20-Poly1305 / AES-256-GCM over serialized values |
//! | `config` | Pre-shared secret loading |
//!
//! ## Security Properties
//!
//! - **Fresh nonce per value**: the nonce is stored as the prefix of the hex
//!   ciphertext, so equal values never produce equal ciphertexts.
//! - **Authenticated**: a wrong secret or a tampered value fails to decrypt and
//!   the raw stored value is returned instead.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod errors;
pub mod symmetric;

// Re-exports
pub use config::{EncryptionConfig, SECRET_ENV_VAR};
pub use errors::CryptoError;
pub use symmetric::{decrypt, encrypt, is_hex, Cipher, Nonce, SecretKey, StorageCodec};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
