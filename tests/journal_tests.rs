//! Integration tests for journaled stores.

#![cfg(feature = "durable")]

mod common;

use chainstate::{Config, Key, LedgerStore, PersistPolicy};
use common::{history_of, key, keys_of, USER_1, USER_2};
use tempfile::TempDir;

/// A journal directory that lives for the duration of a test.
struct TestJournal {
    dir: TempDir,
}

impl TestJournal {
    fn new() -> anyhow::Result<Self> {
        Ok(Self {
            dir: TempDir::new()?,
        })
    }

    fn open(&self) -> anyhow::Result<LedgerStore> {
        Ok(LedgerStore::open(self.dir.path().join("ledger"), PersistPolicy::SyncAll)?)
    }
}

#[test]
fn test_reopen_restores_state_and_history() -> anyhow::Result<()> {
    let journal = TestJournal::new()?;
    let k = key("name", &["lzb"])?;
    {
        let store = journal.open()?;
        assert!(store.is_durable());
        store.put(&key("user", &["1"])?, USER_1)?;
        store.put(&key("user", &["2"])?, USER_2)?;
        store.put_tx("tx-a", &k, "a")?;
        store.put(&k, "b")?;
        store.delete(&k)?;
        store.put(&k, "c")?;
    }

    let store = journal.open()?;
    assert_eq!(store.get(&k)?, b"c");
    assert_eq!(store.get(&key("user", &["2"])?)?, USER_2.as_bytes());
    assert_eq!(store.latest_sequence()?, 6);

    let history = history_of(store.history(&k)?)?;
    let seen: Vec<(u64, bool)> = history.iter().map(|e| (e.version, e.is_delete)).collect();
    assert_eq!(seen, vec![(1, false), (2, false), (3, true), (4, false)]);
    assert_eq!(history.first().map(|e| e.tx_id.as_str()), Some("tx-a"));

    let users = keys_of(store.prefix::<&str>("user", &[])?)?;
    assert_eq!(users, vec![key("user", &["1"])?, key("user", &["2"])?]);
    Ok(())
}

#[test]
fn test_versions_continue_after_reopen() -> anyhow::Result<()> {
    let journal = TestJournal::new()?;
    let k = Key::from("counter");
    {
        let store = journal.open()?;
        store.put(&k, "1")?;
        store.put(&k, "2")?;
    }
    let store = journal.open()?;
    assert_eq!(store.put(&k, "3")?, 3);
    assert_eq!(store.put(&Key::from("other"), "x")?, 1);
    assert_eq!(store.latest_sequence()?, 4);
    Ok(())
}

#[test]
fn test_from_config() -> anyhow::Result<()> {
    let journal = TestJournal::new()?;
    let path = journal.dir.path().join("configured");
    let config = Config::from_str(&format!(
        "[store]\npath = {:?}\npersist = \"sync-data\"\n",
        path.display().to_string()
    ))?;
    assert_eq!(config.store.persist, PersistPolicy::SyncData);

    {
        let store = LedgerStore::from_config(&config.store)?;
        assert!(store.is_durable());
        store.put(&Key::from("k"), "v")?;
    }
    let store = LedgerStore::from_config(&config.store)?;
    assert_eq!(store.get(&Key::from("k"))?, b"v");
    Ok(())
}
