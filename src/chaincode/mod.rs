//! Chaincode dispatch on top of the versioned store.
//!
//! A [`Chaincode`] exposes named functions through a [`Router`]. Each call
//! gets a [`ChaincodeStub`] bound to one [`LedgerStore`](crate::kv::LedgerStore)
//! and one transaction id, and returns a [`Response`] whose status follows
//! the ledger shim codes (200, 400, 500).
//!
//! # Example
//!
//! ```ignore
//! use chainstate::chaincode::{MockStub, UserChaincode};
//!
//! let stub = MockStub::new("users", UserChaincode::new());
//! stub.mock_init("init", &[]);
//! let response = stub.mock_invoke("tx1", &["queryAllUser"]);
//! assert!(response.is_ok());
//! ```

mod error;
mod example;
mod mock;
mod response;
mod router;
mod stub;
mod user;

pub use error::{ChaincodeError, StoreContext};
pub use example::ExampleChaincode;
pub use mock::MockStub;
pub use response::{Response, Status};
pub use router::{Handler, Router};
pub use stub::ChaincodeStub;
pub use user::{UserChaincode, UserInfo};

/// A contract whose functions are invoked by name.
pub trait Chaincode {
    /// Seed the ledger when the chaincode is instantiated.
    fn init(&self, stub: &ChaincodeStub<'_>) -> Response;

    /// The callable functions of this chaincode.
    fn router(&self) -> &Router;

    /// Run the function named by the stub's first argument.
    fn invoke(&self, stub: &ChaincodeStub<'_>) -> Response {
        self.router().dispatch(stub)
    }
}
