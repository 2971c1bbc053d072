use thiserror::Error;

/// Failures of the prototype (clone) operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CloneError {
    #[error("clone not supported for type `{type_name}`")]
    CloneUnsupported { type_name: &'static str },

    #[error("type `{type_name}` is not serializable")]
    SerializationUnsupported { type_name: String },

    #[error("corrupt snapshot for type `{type_name}`: {reason}")]
    SerializationCorrupt { type_name: &'static str, reason: String },
}

impl CloneError {
    pub fn clone_unsupported<T: ?Sized>() -> Self {
        Self::CloneUnsupported {
            type_name: std::any::type_name::<T>(),
        }
    }

    pub fn serialization_unsupported(type_name: impl Into<String>) -> Self {
        Self::SerializationUnsupported {
            type_name: type_name.into(),
        }
    }

    pub fn serialization_corrupt<T: ?Sized>(reason: impl Into<String>) -> Self {
        Self::SerializationCorrupt {
            type_name: std::any::type_name::<T>(),
            reason: reason.into(),
        }
    }
}

/// Failure of a fallible singleton constructor.
///
/// Only the caller that triggered the construction sees this; the shared
/// state stays empty so the next caller tries again.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum InitError<E> {
    #[error("singleton construction failed: {0}")]
    Construction(E),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

impl ConfigError {
    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
