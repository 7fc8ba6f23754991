//! Chaincode responses.

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::error::ChaincodeError;

/// Outcome class of a chaincode call, with the shim's numeric codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Status {
    /// 200
    Ok,
    /// 400: the caller supplied bad or insufficient arguments.
    ValidationError,
    /// 500
    Error,
}

impl Status {
    pub const OK: i32 = 200;
    pub const ERROR_THRESHOLD: i32 = 400;
    pub const ERROR: i32 = 500;

    pub fn code(self) -> i32 {
        match self {
            Self::Ok => Self::OK,
            Self::ValidationError => Self::ERROR_THRESHOLD,
            Self::Error => Self::ERROR,
        }
    }
}

/// Response returned by every chaincode function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Response {
    pub status: Status,
    pub message: String,
    pub payload: Vec<u8>,
}

impl Response {
    fn new(status: Status, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            payload: Vec::new(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(Status::Ok, message)
    }

    /// Attach a payload to the response.
    pub fn with_payload(mut self, payload: impl Into<Vec<u8>>) -> Self {
        self.payload = payload.into();
        self
    }

    /// Attach `value` serialized as JSON.
    pub fn with_json<T: Serialize>(self, value: &T) -> Result<Self, ChaincodeError> {
        Ok(self.with_payload(serde_json::to_vec(value)?))
    }

    /// Collapse a handler result into a response.
    pub fn from_result(result: Result<Response, ChaincodeError>) -> Self {
        result.unwrap_or_else(Self::from)
    }

    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok
    }

    /// Decode the payload as JSON.
    pub fn payload_json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.payload)
    }
}

impl From<ChaincodeError> for Response {
    fn from(err: ChaincodeError) -> Self {
        Self::new(err.status(), err.to_string())
    }
}
