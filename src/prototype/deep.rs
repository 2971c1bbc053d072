// Deep cloning through a serialize/deserialize round trip.
//
// The source is written into an in-memory byte buffer with bincode and a
// brand-new value is read back from it. Nothing in the copy can point into
// the source: every `Arc`, `Box` and `String` is freshly allocated during
// deserialization.
//
// Note: sharing *within* the source graph is not preserved. Two `Arc`s that
// point to the same value in the source become two separate values in the
// copy.

use std::any::type_name;
use std::fmt;
use std::ops::{Deref, DerefMut};

use bincode::Options;
use serde::de::DeserializeOwned;
use serde::{de, ser, Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CloneError;

const NOT_SERIALIZABLE: &str = "not serializable: ";

fn codec() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .reject_trailing_bytes()
}

pub trait DeepClone: Sized {
    fn deep_clone(&self) -> Result<Self, CloneError>;
}

impl<T: Serialize + DeserializeOwned> DeepClone for T {
    fn deep_clone(&self) -> Result<Self, CloneError> {
        Snapshot::capture(self)?.restore()
    }
}

/// Serialized state of a value, tagged with the type it was taken from.
///
/// The tag ignores references: `&T` serializes exactly like `T`, so a
/// snapshot captured from `&log` restores as the log's own type.
#[derive(Clone, PartialEq, Eq)]
pub struct Snapshot {
    type_name: &'static str,
    bytes: Vec<u8>,
}

impl Snapshot {
    pub fn capture<T: Serialize>(source: &T) -> Result<Self, CloneError> {
        let bytes = codec()
            .serialize(source)
            .map_err(|err| serialize_failure::<T>(*err))?;

        tracing::trace!(type_name = value_type_name::<T>(), len = bytes.len(), "captured snapshot");
        Ok(Self {
            type_name: value_type_name::<T>(),
            bytes,
        })
    }

    /// Wraps raw bytes claimed to hold a serialized `T`.
    pub fn from_bytes<T>(bytes: Vec<u8>) -> Self {
        Self {
            type_name: value_type_name::<T>(),
            bytes,
        }
    }

    pub fn restore<T: DeserializeOwned>(&self) -> Result<T, CloneError> {
        if self.type_name != value_type_name::<T>() {
            return Err(CloneError::serialization_corrupt::<T>(format!(
                "snapshot was taken from `{}`",
                self.type_name
            )));
        }

        codec()
            .deserialize(&self.bytes)
            .map_err(|err| CloneError::serialization_corrupt::<T>(err.to_string()))
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Snapshot")
            .field("type_name", &self.type_name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Type name of `T` with any leading `&` / `&mut ` removed.
fn value_type_name<T: ?Sized>() -> &'static str {
    let mut name = type_name::<T>();
    loop {
        if let Some(rest) = name.strip_prefix("&mut ") {
            name = rest;
        } else if let Some(rest) = name.strip_prefix('&') {
            name = rest;
        } else {
            return name;
        }
    }
}

// Only a refusal from the value itself means "not serializable". Anything
// else (a poisoned lock, a failing custom impl) keeps its own reason.
fn serialize_failure<T>(err: bincode::ErrorKind) -> CloneError {
    match err {
        bincode::ErrorKind::Custom(msg) => match msg.strip_prefix(NOT_SERIALIZABLE) {
            Some(offender) => CloneError::serialization_unsupported(offender),
            None => CloneError::serialization_corrupt::<T>(msg),
        },
        bincode::ErrorKind::SequenceMustHaveLength => {
            CloneError::serialization_unsupported(value_type_name::<T>())
        }
        other => CloneError::serialization_corrupt::<T>(other.to_string()),
    }
}

/// Field wrapper for sub-objects that must never be serialized, such as OS
/// handles or channel endpoints. Any deep clone that reaches it fails with
/// `SerializationUnsupported` naming `T`.
pub struct NotSerializable<T>(pub T);

impl<T> NotSerializable<T> {
    pub fn new(value: T) -> Self {
        Self(value)
    }

    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for NotSerializable<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T> DerefMut for NotSerializable<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.0
    }
}

impl<T: fmt::Debug> fmt::Debug for NotSerializable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("NotSerializable").field(&self.0).finish()
    }
}

impl<T> Serialize for NotSerializable<T> {
    fn serialize<S: Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
        Err(<S::Error as ser::Error>::custom(format!(
            "{NOT_SERIALIZABLE}{}",
            type_name::<T>()
        )))
    }
}

impl<'de, T> Deserialize<'de> for NotSerializable<T> {
    fn deserialize<D: Deserializer<'de>>(_deserializer: D) -> Result<Self, D::Error> {
        Err(<D::Error as de::Error>::custom(format!(
            "{NOT_SERIALIZABLE}{}",
            type_name::<T>()
        )))
    }
}
