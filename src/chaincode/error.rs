//! Error types for chaincode functions.

use thiserror::Error;

use crate::kv::KvError;

use super::response::Status;

/// Errors a chaincode function can fail with.
///
/// Every variant is turned into a [`Response`](super::Response) in one
/// place: validation failures get [`Status::ValidationError`], everything
/// else [`Status::Error`].
#[derive(Error, Debug)]
pub enum ChaincodeError {
    /// Wrong argument count or a precondition on caller data failed.
    #[error("{0}")]
    Validation(String),

    #[error("not find function: {0}")]
    UnknownFunction(String),

    #[error("{context} error: {source}")]
    Store {
        context: &'static str,
        #[source]
        source: KvError,
    },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ChaincodeError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn status(&self) -> Status {
        match self {
            Self::Validation(_) => Status::ValidationError,
            Self::UnknownFunction(_) | Self::Store { .. } | Self::Json(_) => Status::Error,
        }
    }
}

/// Attach a short description of the failed step to store errors.
pub trait StoreContext<T> {
    fn context(self, context: &'static str) -> Result<T, ChaincodeError>;
}

impl<T> StoreContext<T> for Result<T, KvError> {
    fn context(self, context: &'static str) -> Result<T, ChaincodeError> {
        self.map_err(|source| ChaincodeError::Store { context, source })
    }
}

/// Fail with a validation error unless exactly `expected` arguments were given.
pub(crate) fn expect_args(args: &[String], expected: usize) -> Result<(), ChaincodeError> {
    if args.len() != expected {
        return Err(ChaincodeError::validation("no enough args"));
    }
    Ok(())
}
