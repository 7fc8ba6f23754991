//! Data types for the versioned store.

use serde::Serialize;

use super::key::Key;

/// Per-key version counter. The first write to a key is version 1.
pub type Version = u64;

/// Store-wide commit sequence, stamped on every entry.
///
/// Readers use the latest sequence at call time as their snapshot watermark.
pub type Sequence = u64;

/// One immutable record in a key's history.
///
/// Every put or delete appends a new entry; entries are never rewritten or
/// removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionedEntry {
    pub key: Key,

    /// Empty for deletion markers.
    pub value: Vec<u8>,

    pub version: Version,

    pub sequence: Sequence,

    /// Identifier of the transaction that wrote this entry.
    pub tx_id: String,

    pub is_delete: bool,

    /// Unix timestamp in milliseconds.
    pub timestamp: u64,
}

impl VersionedEntry {
    /// Whether this entry carries a live value.
    pub fn is_live(&self) -> bool {
        !self.is_delete
    }
}

/// A key and its current value, as produced by range and prefix queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyValue {
    pub key: Key,
    pub value: Vec<u8>,
}

/// Current Unix time in milliseconds, or 0 if the clock is before the epoch.
pub(crate) fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}
