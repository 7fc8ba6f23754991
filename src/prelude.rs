//! Convenient re-exports for common usage patterns.
//!
//! # Example
//!
//! ```ignore
//! use chainstate::prelude::*;
//!
//! let stub = MockStub::new("users", UserChaincode::new());
//! stub.mock_init("init", &[]);
//! let users: Vec<UserInfo> = stub.mock_invoke("tx1", &["queryAllUser"]).payload_json()?;
//! ```

// Unified error handling
pub use crate::error::{Error, Result};

// Configuration
pub use crate::config::{Config, PersistPolicy, StoreConfig};

// Store types
pub use crate::kv::{
    make_key, split_key, HistoryIterator, Key, KeyValue, KvError, LedgerStore, StateIterator,
    Version, VersionedEntry,
};

// Chaincode types
pub use crate::chaincode::{
    Chaincode, ChaincodeError, ChaincodeStub, ExampleChaincode, MockStub, Response, Router,
    Status, UserChaincode, UserInfo,
};
