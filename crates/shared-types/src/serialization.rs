//! # Serialization Contract
//!
//! Defines what survives a trip across a context boundary.
//!
//! ## Reduction Rules
//!
//! | Source value | Wire form |
//! |--------------|-----------|
//! | primitive | unchanged |
//! | sequence | element-wise reduction |
//! | struct / map | field-wise reduction |
//! | function or opaque handle ([`Opaque`]) | field absent |
//! | unset optional field | field absent |
//! | date ([`Timestamp`]) | canonical string `YYYY-MM-DDTHH:MM:SS.sssZ` |
//! | error / pattern ([`ErrorValue`], [`Pattern`]) | `{}` |
//!
//! Nothing validates these rules beyond the encode/decode pass itself, so the
//! receiving side declares the *reduced* shape (for example `String` where the
//! sender had a [`Timestamp`], [`Empty`] where it had an [`ErrorValue`]).

use crate::errors::SerializationError;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;

/// Encode a value into its wire form.
///
/// # Errors
///
/// Returns `SerializationError::Encode` if the value has no JSON form (for
/// example a map with non-string keys).
pub fn to_wire<T: Serialize + ?Sized>(value: &T) -> Result<Value, SerializationError> {
    serde_json::to_value(value).map_err(|e| SerializationError::Encode(e.to_string()))
}

/// Decode a wire value into the receiver's shape.
///
/// # Errors
///
/// Returns `SerializationError::Decode` if the value does not match `U`.
pub fn from_wire<U: DeserializeOwned>(value: Value) -> Result<U, SerializationError> {
    serde_json::from_value(value).map_err(|e| SerializationError::Decode(e.to_string()))
}

/// Run `value` through the full boundary trip and decode it as `U`.
///
/// This is exactly what a handler or store reader on the other side observes.
///
/// # Errors
///
/// Returns the encode or decode failure of either half of the trip.
pub fn reduce<T, U>(value: &T) -> Result<U, SerializationError>
where
    T: Serialize + ?Sized,
    U: DeserializeOwned,
{
    let bytes = serde_json::to_vec(value).map_err(|e| SerializationError::Encode(e.to_string()))?;
    serde_json::from_slice(&bytes).map_err(|e| SerializationError::Decode(e.to_string()))
}

/// A value that never crosses the boundary: functions, handles, channels.
///
/// `Opaque` deliberately does not implement `Serialize`, so a struct field of
/// this type only compiles when marked `#[serde(skip)]`, which makes the field
/// absent from the wire form.
#[derive(Clone, Default)]
pub struct Opaque<T>(pub T);

impl<T> Opaque<T> {
    /// Wrap a local-only value.
    pub fn new(value: T) -> Self {
        Self(value)
    }

    /// Borrow the wrapped value.
    pub fn get(&self) -> &T {
        &self.0
    }
}

impl<T> fmt::Debug for Opaque<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Opaque(..)")
    }
}

/// A point in time that reduces to its canonical string form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(pub DateTime<Utc>);

impl Timestamp {
    /// Current time.
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// The canonical string form, millisecond precision, `Z` suffix.
    pub fn canonical(&self) -> String {
        self.0.to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(value: DateTime<Utc>) -> Self {
        Self(value)
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.canonical())
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| Timestamp(dt.with_timezone(&Utc)))
            .map_err(serde::de::Error::custom)
    }
}

/// An error object. Its wire form is an empty structure.
///
/// The message stays available locally through [`ErrorValue::message`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorValue {
    message: String,
}

impl ErrorValue {
    /// Capture an error for a payload field.
    pub fn from_error(error: &dyn std::error::Error) -> Self {
        Self {
            message: error.to_string(),
        }
    }

    /// Capture a plain message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The local message. Never serialized.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Serialize for ErrorValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_map(Some(0))?.end()
    }
}

/// A pattern (regular expression source). Its wire form is an empty structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern(pub String);

impl Serialize for Pattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_map(Some(0))?.end()
    }
}

/// The reduced shape of [`ErrorValue`] and [`Pattern`]: `{}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Empty {}
