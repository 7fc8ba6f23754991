//! Common test utilities and fixtures.
//!
//! This module provides shared constants, helper functions, and test fixtures
//! to reduce duplication across the test suite.

#![allow(dead_code)]

use chainstate::{make_key, HistoryIterator, Key, LedgerStore, StateIterator, VersionedEntry};

// =============================================================================
// Fixtures
// =============================================================================

/// The two users seeded by the user chaincode.
pub const USER_1: &str = r#"{"id":"1","name":"lzb1","sex":"男"}"#;
pub const USER_2: &str = r#"{"id":"2","name":"lzb2","sex":"女"}"#;

/// JSON for a user record.
pub fn user_json(id: &str, name: &str, sex: &str) -> String {
    serde_json::json!({ "id": id, "name": name, "sex": sex }).to_string()
}

/// Composite key for `object_type` and `attributes`.
pub fn key(object_type: &str, attributes: &[&str]) -> anyhow::Result<Key> {
    Ok(make_key(object_type, attributes)?)
}

/// A store holding users 1 and 2 plus a `name` entry that shares no prefix
/// with them.
pub fn seeded_store() -> anyhow::Result<LedgerStore> {
    let store = LedgerStore::new();
    store.put(&key("user", &["1"])?, USER_1)?;
    store.put(&key("user", &["2"])?, USER_2)?;
    store.put(&key("name", &["lzb"])?, r#""value""#)?;
    Ok(store)
}

// =============================================================================
// Iterator Helpers
// =============================================================================

/// Drain a state iterator into its keys.
pub fn keys_of(iter: StateIterator) -> anyhow::Result<Vec<Key>> {
    let mut keys = Vec::new();
    for kv in iter {
        keys.push(kv?.key);
    }
    Ok(keys)
}

/// Drain a state iterator into `(key, value)` strings.
pub fn pairs_of(iter: StateIterator) -> anyhow::Result<Vec<(String, String)>> {
    let mut pairs = Vec::new();
    for kv in iter {
        let kv = kv?;
        pairs.push((kv.key.into_string(), String::from_utf8(kv.value)?));
    }
    Ok(pairs)
}

/// Drain a history iterator.
pub fn history_of(iter: HistoryIterator) -> anyhow::Result<Vec<VersionedEntry>> {
    Ok(iter.collect::<Result<Vec<_>, _>>()?)
}
