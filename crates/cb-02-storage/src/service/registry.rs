//! Store registry of one `StoreContext`.

use crate::domain::StoreError;
use std::collections::HashMap;
use tracing::warn;

/// Declared stores and the keys they own.
///
/// Key ownership is a debugging aid: it answers "which store wrote this
/// key?" when inspecting an area.
#[derive(Debug, Default)]
pub struct StoreRegistry {
    stores: HashMap<String, Vec<String>>,
    key_owners: HashMap<String, String>,
}

impl StoreRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record store `id` with `keys`.
    ///
    /// # Errors
    ///
    /// `StoreError::DuplicateStore` if `id` is already registered.
    pub fn register(&mut self, id: &str, keys: Vec<String>) -> Result<(), StoreError> {
        if self.stores.contains_key(id) {
            return Err(StoreError::DuplicateStore(id.to_string()));
        }

        for key in &keys {
            if let Some(previous) = self.key_owners.insert(key.clone(), id.to_string()) {
                warn!(key = %key, store = %id, previous = %previous, "Key declared by more than one store");
            }
        }
        self.stores.insert(id.to_string(), keys);
        Ok(())
    }

    /// The store that most recently declared `key`.
    pub fn store_for_key(&self, key: &str) -> Option<&str> {
        self.key_owners.get(key).map(String::as_str)
    }

    /// Keys declared by store `id`.
    pub fn keys_of(&self, id: &str) -> Option<&[String]> {
        self.stores.get(id).map(Vec::as_slice)
    }

    /// Registered store ids, sorted.
    pub fn store_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.stores.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.stores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
    }
}
