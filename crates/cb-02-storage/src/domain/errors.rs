//! # Storage Errors

use crate::domain::AreaName;
use shared_crypto::CryptoError;
use shared_types::SerializationError;
use thiserror::Error;

/// Errors raised by a storage area. Propagated unchanged, never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AreaError {
    #[error("Quota exceeded in '{area}' area: {required} bytes required, {quota} allowed")]
    QuotaExceeded {
        area: AreaName,
        required: usize,
        quota: usize,
    },

    #[error("Storage area '{0}' is read-only")]
    ReadOnly(AreaName),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Errors raised by a store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The key is not declared in the store's defaults.
    #[error("Store '{store}' has no key '{key}'")]
    UnknownKey { store: String, key: String },

    /// A store with this id already exists in the context.
    #[error("Store '{0}' is already declared")]
    DuplicateStore(String),

    /// An encrypted store was requested but no secret is configured.
    #[error("Store '{store}' is encrypted but encryption is unavailable: {source}")]
    EncryptionUnavailable {
        store: String,
        #[source]
        source: CryptoError,
    },

    /// The defaults do not serialize to an object.
    #[error("Defaults of store '{store}' must serialize to an object, got {found}")]
    InvalidDefaults { store: String, found: String },

    /// Encrypting a value failed.
    #[error("Encryption failed: {0}")]
    Crypto(#[from] CryptoError),

    #[error(transparent)]
    Area(#[from] AreaError),

    #[error(transparent)]
    Serialization(#[from] SerializationError),
}
