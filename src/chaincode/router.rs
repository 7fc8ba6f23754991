//! Function-name dispatch.

use std::collections::HashMap;
use std::fmt;

use crate::logging::{debug, error, warn};

use super::error::ChaincodeError;
use super::response::Response;
use super::stub::ChaincodeStub;

/// A chaincode function: reads its parameters and the ledger through the
/// stub and produces a response.
pub type Handler = fn(&ChaincodeStub<'_>, &[String]) -> Result<Response, ChaincodeError>;

/// Table of callable chaincode functions.
///
/// # Example
///
/// ```ignore
/// use chainstate::chaincode::{Response, Router};
///
/// let router = Router::new()
///     .route("ping", |_stub, _args| Ok(Response::success("pong")));
/// let response = router.dispatch(&stub);
/// ```
#[derive(Clone, Default)]
pub struct Router {
    handlers: HashMap<&'static str, Handler>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` under `name`, replacing any previous handler.
    pub fn route(mut self, name: &'static str, handler: Handler) -> Self {
        self.handlers.insert(name, handler);
        self
    }

    /// Add every function of `other` to this table.
    pub fn merge(mut self, other: Router) -> Self {
        self.handlers.extend(other.handlers);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Registered function names, sorted.
    pub fn functions(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.handlers.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Run the function named by the stub's first argument.
    ///
    /// Unknown functions and handler failures become error responses; this
    /// never panics on caller input.
    pub fn dispatch(&self, stub: &ChaincodeStub<'_>) -> Response {
        let (function, params) = stub.function_and_parameters();
        debug!(function = function, tx_id = stub.tx_id(), params = params.len(), "invoking");

        let Some(handler) = self.handlers.get(function) else {
            warn!(function = function, tx_id = stub.tx_id(), "unknown chaincode function");
            return ChaincodeError::UnknownFunction(function.to_string()).into();
        };

        match handler(stub, params) {
            Ok(response) => {
                debug!(function = function, tx_id = stub.tx_id(), message = %response.message, "completed");
                response
            }
            Err(err) => {
                error!(function = function, tx_id = stub.tx_id(), error = %err, "chaincode function failed");
                err.into()
            }
        }
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("functions", &self.functions())
            .finish()
    }
}
