//! A chaincode exercising each ledger API once.

use serde::Serialize;

use crate::kv::{Key, KeyValue, KvError, VersionedEntry};
use crate::logging::info;

use super::error::{ChaincodeError, StoreContext};
use super::response::Response;
use super::router::Router;
use super::stub::ChaincodeStub;
use super::Chaincode;

const NAME_TYPE: &str = "name";

/// Seeds `name` keys and exposes the raw state, range, prefix and history
/// queries as chaincode functions.
#[derive(Debug, Clone)]
pub struct ExampleChaincode {
    router: Router,
}

impl ExampleChaincode {
    pub fn new() -> Self {
        let router = Router::new()
            .route("createCompositeKey", create_composite_key)
            .route("putState", put_state)
            .route("delState", del_state)
            .route("getState", get_state)
            .route("getStateByPartialCompositeKey", get_state_by_partial_composite_key)
            .route("getHistoryForKey", get_history_for_key)
            .route("getStateByRange", get_state_by_range);
        Self { router }
    }
}

impl Default for ExampleChaincode {
    fn default() -> Self {
        Self::new()
    }
}

impl Chaincode for ExampleChaincode {
    fn init(&self, stub: &ChaincodeStub<'_>) -> Response {
        Response::from_result(seed(stub))
    }

    fn router(&self) -> &Router {
        &self.router
    }
}

fn seed(stub: &ChaincodeStub<'_>) -> Result<Response, ChaincodeError> {
    for (name, value) in [("lzb", "value"), ("lzb1", "value1"), ("lzb2", "value2")] {
        let key = stub.create_composite_key(NAME_TYPE, &[name]).context("create name key")?;
        stub.put_state(&key, serde_json::to_vec(value)?)
            .context("put name key and info")?;
    }
    info!(chaincode = "example", tx_id = stub.tx_id(), "seeded name keys");
    Ok(Response::success("init success"))
}

/// A live key/value pair as returned by range and prefix queries.
#[derive(Serialize)]
struct StateRecord {
    key: Key,
    value: String,
}

impl From<KeyValue> for StateRecord {
    fn from(kv: KeyValue) -> Self {
        Self {
            key: kv.key,
            value: String::from_utf8_lossy(&kv.value).into_owned(),
        }
    }
}

#[derive(Serialize)]
struct HistoryRecord {
    tx_id: String,
    version: u64,
    value: String,
    is_delete: bool,
    timestamp: u64,
}

impl From<VersionedEntry> for HistoryRecord {
    fn from(entry: VersionedEntry) -> Self {
        Self {
            value: String::from_utf8_lossy(&entry.value).into_owned(),
            tx_id: entry.tx_id,
            version: entry.version,
            is_delete: entry.is_delete,
            timestamp: entry.timestamp,
        }
    }
}

/// `objectType` followed by any number of attributes.
fn split_object_args(args: &[String]) -> Result<(&str, &[String]), ChaincodeError> {
    match args.split_first() {
        Some((object_type, attributes)) => Ok((object_type.as_str(), attributes)),
        None => Err(ChaincodeError::validation("no enough args")),
    }
}

fn single_arg(args: &[String]) -> Result<&str, ChaincodeError> {
    match args {
        [arg] => Ok(arg.as_str()),
        _ => Err(ChaincodeError::validation("no enough args")),
    }
}

fn name_key(stub: &ChaincodeStub<'_>, name: &str) -> Result<Key, ChaincodeError> {
    stub.create_composite_key(NAME_TYPE, &[name]).context("create name key")
}

fn missing(context: &'static str, key: &Key) -> ChaincodeError {
    ChaincodeError::Store {
        context,
        source: KvError::NotFound(key.to_string()),
    }
}

fn create_composite_key(
    stub: &ChaincodeStub<'_>,
    args: &[String],
) -> Result<Response, ChaincodeError> {
    let (object_type, attributes) = split_object_args(args)?;
    let key = stub
        .create_composite_key(object_type, attributes)
        .context("create composite key")?;
    Ok(Response::success("createCompositeKey success").with_payload(key.into_string()))
}

fn put_state(stub: &ChaincodeStub<'_>, args: &[String]) -> Result<Response, ChaincodeError> {
    let [name, value] = args else {
        return Err(ChaincodeError::validation("no enough args"));
    };
    let key = name_key(stub, name)?;
    stub.put_state(&key, serde_json::to_vec(value)?).context("put state")?;

    let stored = stub
        .get_state(&key)
        .context("get name key state")?
        .ok_or_else(|| missing("get name key state", &key))?;
    Ok(Response::success("put state success").with_payload(stored))
}

fn del_state(stub: &ChaincodeStub<'_>, args: &[String]) -> Result<Response, ChaincodeError> {
    let key = name_key(stub, single_arg(args)?)?;
    stub.del_state(&key).context("delete state")?;
    Ok(Response::success("delete state success"))
}

fn get_state(stub: &ChaincodeStub<'_>, args: &[String]) -> Result<Response, ChaincodeError> {
    let key = name_key(stub, single_arg(args)?)?;
    let bytes = stub
        .get_state(&key)
        .context("get state")?
        .ok_or_else(|| missing("get state", &key))?;
    // Stored values are JSON strings.
    let _: String = serde_json::from_slice(&bytes)?;
    Ok(Response::success("get state success").with_payload(bytes))
}

fn get_state_by_partial_composite_key(
    stub: &ChaincodeStub<'_>,
    args: &[String],
) -> Result<Response, ChaincodeError> {
    let (object_type, attributes) = split_object_args(args)?;
    let records = stub
        .get_state_by_partial_composite_key(object_type, attributes)
        .context("get state by partial composite key")?
        .map(|kv| kv.map(StateRecord::from))
        .collect::<Result<Vec<_>, _>>()
        .context("get state by partial composite key")?;
    Response::success("get state by partial composite key success").with_json(&records)
}

fn get_history_for_key(
    stub: &ChaincodeStub<'_>,
    args: &[String],
) -> Result<Response, ChaincodeError> {
    let (object_type, attributes) = split_object_args(args)?;
    let key = stub
        .create_composite_key(object_type, attributes)
        .context("create composite key")?;
    let records = stub
        .get_history_for_key(&key)
        .context("get history for key")?
        .map(|entry| entry.map(HistoryRecord::from))
        .collect::<Result<Vec<_>, _>>()
        .context("history iterator")?;
    Response::success("get history state by key success").with_json(&records)
}

fn get_state_by_range(
    stub: &ChaincodeStub<'_>,
    args: &[String],
) -> Result<Response, ChaincodeError> {
    let [start, end] = args else {
        return Err(ChaincodeError::validation("no enough args"));
    };
    let records = stub
        .get_state_by_range(&Key::from(start.as_str()), &Key::from(end.as_str()))
        .context("get state by range")?
        .map(|kv| kv.map(StateRecord::from))
        .collect::<Result<Vec<_>, _>>()
        .context("get state by range")?;
    Response::success("get state by range success").with_json(&records)
}
