//! In-process harness for driving a chaincode against its own store.

use crate::kv::LedgerStore;

use super::response::Response;
use super::stub::ChaincodeStub;
use super::Chaincode;

/// Runs a chaincode against a private in-memory store.
pub struct MockStub<C> {
    name: String,
    chaincode: C,
    store: LedgerStore,
}

impl<C: Chaincode> MockStub<C> {
    pub fn new(name: impl Into<String>, chaincode: C) -> Self {
        Self::with_store(name, chaincode, LedgerStore::new())
    }

    /// Use `store` instead of a fresh in-memory one.
    pub fn with_store(name: impl Into<String>, chaincode: C, store: LedgerStore) -> Self {
        Self {
            name: name.into(),
            chaincode,
            store,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn store(&self) -> &LedgerStore {
        &self.store
    }

    pub fn chaincode(&self) -> &C {
        &self.chaincode
    }

    pub fn mock_init(&self, tx_id: &str, args: &[&str]) -> Response {
        let stub = ChaincodeStub::new(&self.store, tx_id, to_args(args));
        self.chaincode.init(&stub)
    }

    /// Invoke the function named by `args[0]` with the remaining arguments.
    pub fn mock_invoke(&self, tx_id: &str, args: &[&str]) -> Response {
        let stub = ChaincodeStub::new(&self.store, tx_id, to_args(args));
        self.chaincode.invoke(&stub)
    }
}

fn to_args(args: &[&str]) -> Vec<String> {
    args.iter().map(|arg| arg.to_string()).collect()
}
