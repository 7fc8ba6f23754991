//! Unified error type for the chainstate library.
//!
//! This module provides a single [`Error`] type that encompasses all errors
//! that can occur in the library, making it easier to handle errors in
//! application code.

use thiserror::Error;

use crate::chaincode::ChaincodeError;
use crate::config::ConfigError;
use crate::kv::KvError;

/// Unified error type for all chainstate operations.
///
/// # Example
///
/// ```ignore
/// use chainstate::{Config, LedgerStore, Result};
///
/// fn open_from(path: &str) -> Result<LedgerStore> {
///     let config = Config::from_file(path)?;
///     Ok(LedgerStore::from_config(&config.store)?)
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// Error from store operations.
    #[error(transparent)]
    Kv(#[from] KvError),

    /// Error raised while running a chaincode function.
    #[error(transparent)]
    Chaincode(#[from] ChaincodeError),

    /// Error loading configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// A [`Result`] type alias using the unified [`Error`] type.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns `true` if this is a store error.
    pub fn is_kv(&self) -> bool {
        matches!(self, Self::Kv(_))
    }

    /// Returns `true` if this is a chaincode error.
    pub fn is_chaincode(&self) -> bool {
        matches!(self, Self::Chaincode(_))
    }

    /// Returns `true` if this is a configuration error.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}
