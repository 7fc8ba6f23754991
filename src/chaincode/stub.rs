//! Per-invocation view of the ledger.

use crate::kv::{
    make_key, split_key, HistoryIterator, Key, KvError, LedgerStore, StateIterator,
};

/// What a chaincode function sees of the ledger during one call.
///
/// The stub borrows an explicit [`LedgerStore`] and stamps every write with
/// the transaction id of the call. The first argument of the call is the
/// function name; the rest are its parameters.
pub struct ChaincodeStub<'a> {
    store: &'a LedgerStore,
    tx_id: String,
    function: String,
    params: Vec<String>,
}

impl<'a> ChaincodeStub<'a> {
    pub fn new(store: &'a LedgerStore, tx_id: impl Into<String>, args: Vec<String>) -> Self {
        let mut args = args.into_iter();
        let function = args.next().unwrap_or_default();
        Self {
            store,
            tx_id: tx_id.into(),
            function,
            params: args.collect(),
        }
    }

    pub fn tx_id(&self) -> &str {
        &self.tx_id
    }

    pub fn store(&self) -> &'a LedgerStore {
        self.store
    }

    /// The called function name and its parameters.
    pub fn function_and_parameters(&self) -> (&str, &[String]) {
        (&self.function, &self.params)
    }

    pub fn create_composite_key<S: AsRef<str>>(
        &self,
        object_type: &str,
        attributes: &[S],
    ) -> Result<Key, KvError> {
        make_key(object_type, attributes)
    }

    pub fn split_composite_key(&self, key: &Key) -> Result<(String, Vec<String>), KvError> {
        split_key(key)
    }

    /// Current value of `key`, or `None` if it has none.
    pub fn get_state(&self, key: &Key) -> Result<Option<Vec<u8>>, KvError> {
        match self.store.get(key) {
            Ok(value) => Ok(Some(value)),
            Err(KvError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn put_state(&self, key: &Key, value: impl Into<Vec<u8>>) -> Result<(), KvError> {
        self.store.put_tx(&self.tx_id, key, value)?;
        Ok(())
    }

    pub fn del_state(&self, key: &Key) -> Result<(), KvError> {
        self.store.delete_tx(&self.tx_id, key)?;
        Ok(())
    }

    pub fn get_state_by_range(&self, start: &Key, end: &Key) -> Result<StateIterator, KvError> {
        self.store.range(start, end)
    }

    pub fn get_state_by_partial_composite_key<S: AsRef<str>>(
        &self,
        object_type: &str,
        attributes: &[S],
    ) -> Result<StateIterator, KvError> {
        self.store.prefix(object_type, attributes)
    }

    pub fn get_history_for_key(&self, key: &Key) -> Result<HistoryIterator, KvError> {
        self.store.history(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_function_and_parameters() {
        let store = LedgerStore::new();
        let stub = ChaincodeStub::new(&store, "tx1", args(&["addUser", "{}"]));
        let (function, params) = stub.function_and_parameters();
        assert_eq!(function, "addUser");
        assert_eq!(params, ["{}".to_string()]);

        let stub = ChaincodeStub::new(&store, "tx2", Vec::new());
        assert_eq!(stub.function_and_parameters().0, "");
    }

    #[test]
    fn test_writes_carry_tx_id() {
        let store = LedgerStore::new();
        let stub = ChaincodeStub::new(&store, "tx-put", args(&["putState"]));
        let key = stub.create_composite_key("name", &["lzb5"]).unwrap();
        stub.put_state(&key, b"\"value\"".to_vec()).unwrap();

        let entry = stub.get_history_for_key(&key).unwrap().next().unwrap().unwrap();
        assert_eq!(entry.tx_id, "tx-put");
        assert_eq!(stub.get_state(&key).unwrap(), Some(b"\"value\"".to_vec()));

        stub.del_state(&key).unwrap();
        assert_eq!(stub.get_state(&key).unwrap(), None);
    }
}
