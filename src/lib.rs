//! Versioned composite-key state store with a chaincode dispatcher.
//!
//! The store keeps every version of every key, supports prefix queries over
//! composite keys, and answers range, prefix and history queries from a
//! point-in-time snapshot. A small dispatcher runs chaincode-style contracts
//! against it.
//!
//! # Quick Start
//!
//! ```ignore
//! use chainstate::prelude::*;
//!
//! let store = LedgerStore::new();
//! let key = make_key("user", &["1"])?;
//! store.put(&key, r#"{"id":"1","name":"lzb1","sex":"男"}"#)?;
//!
//! for kv in store.prefix::<&str>("user", &[])? {
//!     let kv = kv?;
//!     println!("{} => {}", kv.key, String::from_utf8_lossy(&kv.value));
//! }
//! ```
//!
//! # Modules
//!
//! - [`kv`] - Versioned store, composite keys and snapshot iterators
//! - [`chaincode`] - Stub, router and the bundled example/user chaincodes
//! - [`config`] - TOML configuration for opening a store
//!
//! # Feature Flags
//!
//! - `durable` - Journal writes to disk with fjall (enabled by default)
//! - `logging` - Enable library-level tracing (consumers provide their own subscriber)
//! - `full` - Enable all features

pub mod chaincode;
pub mod config;
mod error;
pub mod kv;
mod logging;
pub mod prelude;

// Re-export the unified error type
pub use error::{Error, Result};

pub use config::{Config, ConfigError, PersistPolicy, StoreConfig};

// Re-export store types at crate root for convenience
pub use kv::{
    make_key, split_key, HistoryIterator, Key, KeyValue, KvError, LedgerStore, Sequence,
    StateIterator, Version, VersionedEntry,
};
