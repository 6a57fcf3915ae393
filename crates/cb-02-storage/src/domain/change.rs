//! Change events.

use crate::domain::AreaName;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Raw change of one key, as stored (possibly encrypted).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueChange {
    /// Absent when the key did not exist before.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_value: Option<Value>,
    /// Absent when the key was removed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_value: Option<Value>,
}

/// One batch of changes to one area.
///
/// Every backend write that changes at least one key produces exactly one
/// `StorageChange`, delivered to every subscriber regardless of store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageChange {
    pub area: AreaName,
    pub changes: HashMap<String, ValueChange>,
}

/// Typed change of one store key, delivered to observers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataChange<V> {
    /// Absent on the first write of a key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_value: Option<V>,
    /// Absent when the key was removed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_value: Option<V>,
}
