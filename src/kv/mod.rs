//! Versioned composite-key store.
//!
//! This module provides a key-value store that keeps every version of every
//! key. Composite keys built with [`make_key`] support prefix queries over an
//! object type and its leading attributes, and all queries read from a
//! point-in-time snapshot.

mod error;
#[cfg(feature = "durable")]
mod format;
mod iter;
#[cfg(feature = "durable")]
mod journal;
mod key;
mod store;
mod types;

pub use error::KvError;
pub use iter::{HistoryIterator, StateIterator};
pub use key::{make_key, split_key, Key, SEPARATOR};
pub use store::LedgerStore;
pub use types::{KeyValue, Sequence, Version, VersionedEntry};
