//! Error types for the versioned store.

use thiserror::Error;

/// Errors that can occur during store operations.
///
/// The store never logs; every failure is returned to the caller as one of
/// these variants.
#[derive(Error, Debug)]
pub enum KvError {
    /// Malformed key or attributes, e.g. a separator inside a segment.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The key has no current (live) value.
    #[error("Key not found: {0}")]
    NotFound(String),

    /// The storage medium failed or holds corrupted data.
    #[error("Storage error: {0}")]
    Storage(String),

    #[cfg(feature = "durable")]
    #[error("Fjall error: {0}")]
    Fjall(#[from] fjall::Error),
}

impl KvError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub(crate) fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Returns `true` for malformed keys or attributes.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }

    /// Returns `true` if the key had no live value.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Returns `true` for any failure of the underlying medium.
    pub fn is_storage(&self) -> bool {
        match self {
            Self::Storage(_) => true,
            #[cfg(feature = "durable")]
            Self::Fjall(_) => true,
            Self::InvalidArgument(_) | Self::NotFound(_) => false,
        }
    }
}

impl<T> From<std::sync::PoisonError<T>> for KvError {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        Self::storage("state index lock poisoned")
    }
}
