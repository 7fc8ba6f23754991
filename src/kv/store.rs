//! Versioned store implementation.

use std::collections::BTreeMap;
use std::ops::Bound;
#[cfg(feature = "durable")]
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use crate::config::StoreConfig;
#[cfg(feature = "durable")]
use crate::config::PersistPolicy;

use super::error::KvError;
use super::iter::{HistoryIterator, Snapshot, StateIterator};
#[cfg(feature = "durable")]
use super::journal::Journal;
use super::key::{make_key, Key};
use super::types::{now_millis, Sequence, Version, VersionedEntry};

/// Append-only history of every key, plus the last commit sequence handed out.
#[derive(Default)]
pub(super) struct StateIndex {
    pub(super) entries: BTreeMap<Key, Vec<VersionedEntry>>,
    pub(super) last_sequence: Sequence,
}

impl StateIndex {
    fn insert(&mut self, entry: VersionedEntry) {
        self.last_sequence = self.last_sequence.max(entry.sequence);
        self.entries.entry(entry.key.clone()).or_default().push(entry);
    }
}

/// The newest entry of `history` that is visible at `watermark`.
pub(super) fn visible_at(history: &[VersionedEntry], watermark: Sequence) -> Option<&VersionedEntry> {
    history.iter().rev().find(|entry| entry.sequence <= watermark)
}

pub(super) struct Shared {
    pub(super) index: RwLock<StateIndex>,
    pub(super) open_snapshots: AtomicUsize,
    #[cfg(feature = "durable")]
    journal: Option<Journal>,
}

impl Shared {
    fn new(index: StateIndex) -> Self {
        Self {
            index: RwLock::new(index),
            open_snapshots: AtomicUsize::new(0),
            #[cfg(feature = "durable")]
            journal: None,
        }
    }
}

/// A versioned key-value store with composite-key indexing and history.
///
/// Every [`put`](Self::put) and [`delete`](Self::delete) appends an
/// immutable [`VersionedEntry`]; the current state of a key is its newest
/// entry unless that entry is a deletion marker. History is never discarded.
///
/// `LedgerStore` is a cheap handle: clones share the same underlying state,
/// so one instance can be handed to many threads.
///
/// # Example
///
/// ```ignore
/// use chainstate::kv::{make_key, LedgerStore};
///
/// let store = LedgerStore::new();
/// let key = make_key("user", &["1"])?;
/// store.put(&key, br#"{"id":"1","name":"lzb1"}"#.to_vec())?;
///
/// for kv in store.prefix::<&str>("user", &[])? {
///     let kv = kv?;
///     println!("{} = {:?}", kv.key, kv.value);
/// }
///
/// store.delete(&key)?;
/// assert!(store.get(&key).unwrap_err().is_not_found());
/// assert_eq!(store.history(&key)?.count(), 2);
/// ```
///
/// # Concurrency
///
/// Writers serialize on a store-wide lock, so versions of a key are assigned
/// without gaps or duplicates. Readers capture the latest commit sequence as
/// a watermark when the query starts and only take the read lock for the
/// duration of each iterator step.
///
/// # Durability
///
/// With the `durable` feature, [`open`](Self::open) backs the store with an
/// on-disk journal. Each entry is journaled before it becomes visible; a
/// failed journal write leaves the store unchanged.
#[derive(Clone)]
pub struct LedgerStore {
    shared: Arc<Shared>,
}

impl LedgerStore {
    /// Create an empty in-memory store.
    pub fn new() -> Self {
        Self::with_shared(Shared::new(StateIndex::default()))
    }

    /// Open a journaled store at `path`, replaying any existing history.
    ///
    /// # Example
    ///
    /// ```ignore
    /// use chainstate::{config::PersistPolicy, kv::LedgerStore};
    ///
    /// let store = LedgerStore::open("./ledger", PersistPolicy::SyncAll)?;
    /// ```
    #[cfg(feature = "durable")]
    pub fn open(path: impl AsRef<Path>, persist: PersistPolicy) -> Result<Self, KvError> {
        let (journal, replayed) = Journal::open(path.as_ref(), persist)?;
        let mut index = StateIndex::default();
        for entry in replayed {
            index.insert(entry);
        }
        let mut shared = Shared::new(index);
        shared.journal = Some(journal);
        Ok(Self::with_shared(shared))
    }

    /// Build a store as described by `config`.
    ///
    /// A configured `path` selects a journaled store; without one the store
    /// is in-memory.
    pub fn from_config(config: &StoreConfig) -> Result<Self, KvError> {
        match &config.path {
            None => Ok(Self::new()),
            #[cfg(feature = "durable")]
            Some(path) => Self::open(path, config.persist),
            #[cfg(not(feature = "durable"))]
            Some(path) => Err(KvError::invalid(format!(
                "cannot open '{}': built without the `durable` feature",
                path.display()
            ))),
        }
    }

    fn with_shared(shared: Shared) -> Self {
        Self {
            shared: Arc::new(shared),
        }
    }

    /// Whether writes go to an on-disk journal.
    pub fn is_durable(&self) -> bool {
        #[cfg(feature = "durable")]
        {
            self.shared.journal.is_some()
        }
        #[cfg(not(feature = "durable"))]
        {
            false
        }
    }

    /// Store `value` under `key`, returning the new version of the key.
    pub fn put(&self, key: &Key, value: impl Into<Vec<u8>>) -> Result<Version, KvError> {
        self.append(None, key, value.into(), false)
    }

    /// Like [`put`](Self::put), recording `tx_id` on the entry.
    pub fn put_tx(
        &self,
        tx_id: &str,
        key: &Key,
        value: impl Into<Vec<u8>>,
    ) -> Result<Version, KvError> {
        self.append(Some(tx_id), key, value.into(), false)
    }

    /// Current value of `key`.
    ///
    /// Fails with [`KvError::NotFound`] if the key was never written or its
    /// newest entry is a deletion marker.
    pub fn get(&self, key: &Key) -> Result<Vec<u8>, KvError> {
        check_key(key)?;
        let index = self.shared.index.read()?;
        index
            .entries
            .get(key)
            .and_then(|history| history.last())
            .filter(|entry| entry.is_live())
            .map(|entry| entry.value.clone())
            .ok_or_else(|| KvError::NotFound(key.to_string()))
    }

    /// Append a deletion marker for `key`.
    ///
    /// Deleting a key that has no value succeeds and still records a marker.
    pub fn delete(&self, key: &Key) -> Result<Version, KvError> {
        self.append(None, key, Vec::new(), true)
    }

    /// Like [`delete`](Self::delete), recording `tx_id` on the entry.
    pub fn delete_tx(&self, tx_id: &str, key: &Key) -> Result<Version, KvError> {
        self.append(Some(tx_id), key, Vec::new(), true)
    }

    /// Live entries with keys in `[start, end)`, as of now.
    ///
    /// An empty `end` leaves the range unbounded above.
    pub fn range(&self, start: &Key, end: &Key) -> Result<StateIterator, KvError> {
        let end = if end.is_empty() {
            Bound::Unbounded
        } else {
            Bound::Excluded(end.clone())
        };
        self.scan(Bound::Included(start.clone()), end)
    }

    /// Live entries whose composite key starts with `object_type` followed by
    /// `attributes`, in key order.
    pub fn prefix<S: AsRef<str>>(
        &self,
        object_type: &str,
        attributes: &[S],
    ) -> Result<StateIterator, KvError> {
        let start = make_key(object_type, attributes)?;
        let end = match start.prefix_successor() {
            Some(end) => Bound::Excluded(end),
            None => Bound::Unbounded,
        };
        self.scan(Bound::Included(start), end)
    }

    /// Every entry ever written for `key`, oldest first, including deletion
    /// markers.
    pub fn history(&self, key: &Key) -> Result<HistoryIterator, KvError> {
        check_key(key)?;
        let snapshot = Snapshot::acquire(Arc::clone(&self.shared))?;
        Ok(HistoryIterator::new(snapshot, key.clone()))
    }

    /// The commit sequence of the newest entry, or 0 for an empty store.
    pub fn latest_sequence(&self) -> Result<Sequence, KvError> {
        Ok(self.shared.index.read()?.last_sequence)
    }

    /// Number of distinct keys with at least one entry, live or deleted.
    pub fn key_count(&self) -> Result<usize, KvError> {
        Ok(self.shared.index.read()?.entries.len())
    }

    /// Number of iterators that have not been closed or dropped yet.
    pub fn open_snapshots(&self) -> usize {
        self.shared.open_snapshots.load(Ordering::Acquire)
    }

    fn scan(&self, start: Bound<Key>, end: Bound<Key>) -> Result<StateIterator, KvError> {
        let snapshot = Snapshot::acquire(Arc::clone(&self.shared))?;
        Ok(StateIterator::new(snapshot, start, end))
    }

    fn append(
        &self,
        tx_id: Option<&str>,
        key: &Key,
        value: Vec<u8>,
        is_delete: bool,
    ) -> Result<Version, KvError> {
        check_key(key)?;
        let mut index = self.shared.index.write()?;

        let sequence = index
            .last_sequence
            .checked_add(1)
            .ok_or_else(|| KvError::storage("commit sequence exhausted"))?;
        let version = index
            .entries
            .get(key)
            .and_then(|history| history.last())
            .map_or(0, |entry| entry.version)
            + 1;

        let entry = VersionedEntry {
            key: key.clone(),
            value,
            version,
            sequence,
            tx_id: tx_id.map_or_else(|| derived_tx_id(sequence), str::to_string),
            is_delete,
            timestamp: now_millis(),
        };

        #[cfg(feature = "durable")]
        if let Some(journal) = &self.shared.journal {
            journal.append(&entry)?;
        }

        index.insert(entry);
        Ok(version)
    }
}

impl Default for LedgerStore {
    fn default() -> Self {
        Self::new()
    }
}

fn check_key(key: &Key) -> Result<(), KvError> {
    if key.is_empty() {
        return Err(KvError::invalid("key must not be empty"));
    }
    Ok(())
}

fn derived_tx_id(sequence: Sequence) -> String {
    format!("tx-{sequence:016x}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_versions_start_at_one() {
        let store = LedgerStore::new();
        let key = Key::from("k");
        assert_eq!(store.put(&key, b"a".to_vec()).unwrap(), 1);
        assert_eq!(store.put(&key, b"b".to_vec()).unwrap(), 2);
        assert_eq!(store.delete(&key).unwrap(), 3);
        assert_eq!(store.latest_sequence().unwrap(), 3);
    }

    #[test]
    fn test_sequence_is_store_wide() {
        let store = LedgerStore::new();
        store.put(&Key::from("a"), b"1".to_vec()).unwrap();
        store.put(&Key::from("b"), b"2".to_vec()).unwrap();
        let history: Vec<_> = store
            .history(&Key::from("b"))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history.first().unwrap().version, 1);
        assert_eq!(history.first().unwrap().sequence, 2);
    }

    #[test]
    fn test_tx_ids() {
        let store = LedgerStore::new();
        let key = Key::from("k");
        store.put_tx("tx-abc", &key, b"a".to_vec()).unwrap();
        store.put(&key, b"b".to_vec()).unwrap();
        let ids: Vec<String> = store
            .history(&key)
            .unwrap()
            .map(|e| e.unwrap().tx_id)
            .collect();
        assert_eq!(ids, vec!["tx-abc".to_string(), derived_tx_id(2)]);
    }

    #[test]
    fn test_empty_key_rejected() {
        let store = LedgerStore::new();
        let empty = Key::default();
        assert!(store.put(&empty, b"x".to_vec()).unwrap_err().is_invalid_argument());
        assert!(store.delete(&empty).unwrap_err().is_invalid_argument());
        assert!(store.get(&empty).unwrap_err().is_invalid_argument());
        assert_eq!(store.latest_sequence().unwrap(), 0);
    }

    #[test]
    fn test_visible_at() {
        let entry = |version, sequence| VersionedEntry {
            key: Key::from("k"),
            value: Vec::new(),
            version,
            sequence,
            tx_id: String::new(),
            is_delete: false,
            timestamp: 0,
        };
        let history = vec![entry(1, 2), entry(2, 5), entry(3, 9)];
        assert_eq!(visible_at(&history, 1), None);
        assert_eq!(visible_at(&history, 5).map(|e| e.version), Some(2));
        assert_eq!(visible_at(&history, 100).map(|e| e.version), Some(3));
    }

    /// Panic in another thread while it holds the index write lock.
    fn poison_index(store: &LedgerStore) {
        let shared = Arc::clone(&store.shared);
        let result = std::thread::spawn(move || {
            let _guard = shared.index.write();
            panic!("writer died holding the index lock");
        })
        .join();
        assert!(result.is_err());
    }

    #[test]
    fn test_poisoned_index_fails_reads_and_writes() {
        let store = LedgerStore::new();
        let key = Key::from("k");
        store.put(&key, b"v".to_vec()).unwrap();
        poison_index(&store);

        assert!(store.get(&key).unwrap_err().is_storage());
        assert!(store.put(&key, b"w".to_vec()).unwrap_err().is_storage());
        assert!(store.latest_sequence().unwrap_err().is_storage());
        assert!(store.history(&key).err().unwrap().is_storage());
        assert_eq!(store.open_snapshots(), 0);
    }

    #[test]
    fn test_iterator_step_fails_on_poisoned_index() {
        let store = LedgerStore::new();
        store.put(&Key::from("a"), b"1".to_vec()).unwrap();
        store.put(&Key::from("b"), b"2".to_vec()).unwrap();

        let mut range = store.range(&Key::from("a"), &Key::default()).unwrap();
        let mut history = store.history(&Key::from("a")).unwrap();
        assert_eq!(range.next().unwrap().unwrap().key, Key::from("a"));
        poison_index(&store);

        for _ in 0..2 {
            assert!(range.next().unwrap().unwrap_err().is_storage());
            assert!(history.next().unwrap().unwrap_err().is_storage());
        }
        assert_eq!(store.open_snapshots(), 2);
        drop(range);
        drop(history);
        assert_eq!(store.open_snapshots(), 0);
    }

    #[test]
    fn test_key_count() {
        let store = LedgerStore::new();
        assert_eq!(store.key_count().unwrap(), 0);
        store.put(&Key::from("a"), b"1".to_vec()).unwrap();
        store.put(&Key::from("a"), b"2".to_vec()).unwrap();
        store.delete(&Key::from("b")).unwrap();
        assert_eq!(store.key_count().unwrap(), 2);
    }

    #[cfg(feature = "durable")]
    #[test]
    fn test_failed_journal_write_changes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let key = Key::from("k");
        {
            let store = LedgerStore::open(dir.path(), PersistPolicy::SyncAll).unwrap();
            store.put(&key, b"a".to_vec()).unwrap();

            let journal = store.shared.journal.as_ref().unwrap();
            journal.set_fail_persist(true);
            assert!(store.put(&key, b"b".to_vec()).unwrap_err().is_storage());
            assert_eq!(store.get(&key).unwrap(), b"a");
            assert_eq!(store.latest_sequence().unwrap(), 1);

            journal.set_fail_persist(false);
            assert_eq!(store.put(&key, b"c".to_vec()).unwrap(), 2);
        }
        let store = LedgerStore::open(dir.path(), PersistPolicy::SyncAll).unwrap();
        let values: Vec<Vec<u8>> = store
            .history(&key)
            .unwrap()
            .map(|e| e.unwrap().value)
            .collect();
        assert_eq!(values, vec![b"a".to_vec(), b"c".to_vec()]);
    }

    #[test]
    fn test_in_memory_from_config() {
        let store = LedgerStore::from_config(&StoreConfig::default()).unwrap();
        assert!(!store.is_durable());
    }
}
