//! Snapshot iterators over the versioned store.
//!
//! Iterators never hold the index lock between steps. Instead each one owns a
//! [`Snapshot`]: the commit sequence observed when the query started. Entries
//! stamped with a later sequence are invisible to the iterator, so it sees a
//! consistent point-in-time view while writers keep appending.
//!
//! The snapshot handle is released exactly once: by [`StateIterator::close`]
//! / [`HistoryIterator::close`], on exhaustion, or on drop.

use std::iter::FusedIterator;
use std::ops::Bound;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use super::error::KvError;
use super::key::Key;
use super::store::{visible_at, Shared};
use super::types::{KeyValue, Sequence, VersionedEntry};

/// A registered read snapshot of the store.
pub(super) struct Snapshot {
    shared: Arc<Shared>,
    watermark: Sequence,
    released: bool,
}

impl Snapshot {
    pub(super) fn acquire(shared: Arc<Shared>) -> Result<Self, KvError> {
        let watermark = shared.index.read()?.last_sequence;
        shared.open_snapshots.fetch_add(1, Ordering::AcqRel);
        Ok(Self {
            shared,
            watermark,
            released: false,
        })
    }

    fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.shared.open_snapshots.fetch_sub(1, Ordering::AcqRel);
        }
    }
}

impl Drop for Snapshot {
    fn drop(&mut self) {
        self.release();
    }
}

/// Live key/value pairs of a range or prefix query, in ascending key order.
///
/// Yields `Err` if a step cannot read the index because a writer panicked
/// while holding its lock. The cursor does not move and the snapshot stays
/// registered until the iterator is dropped.
pub struct StateIterator {
    snapshot: Snapshot,
    cursor: Bound<Key>,
    end: Bound<Key>,
    done: bool,
}

impl StateIterator {
    pub(super) fn new(snapshot: Snapshot, start: Bound<Key>, end: Bound<Key>) -> Self {
        Self {
            snapshot,
            cursor: start,
            end,
            done: false,
        }
    }

    /// The commit sequence this iterator reads at.
    pub fn watermark(&self) -> Sequence {
        self.snapshot.watermark
    }

    /// Release the snapshot without reading the remaining entries.
    pub fn close(mut self) {
        self.finish();
    }

    fn finish(&mut self) {
        self.done = true;
        self.snapshot.release();
    }

    fn step(&mut self) -> Result<Option<KeyValue>, KvError> {
        if bounds_empty(&self.cursor, &self.end) {
            return Ok(None);
        }
        let watermark = self.snapshot.watermark;
        let index = self.snapshot.shared.index.read()?;
        let range = (self.cursor.clone(), self.end.clone());
        for (key, history) in index.entries.range(range) {
            self.cursor = Bound::Excluded(key.clone());
            if let Some(entry) = visible_at(history, watermark)
                && entry.is_live()
            {
                return Ok(Some(KeyValue {
                    key: key.clone(),
                    value: entry.value.clone(),
                }));
            }
        }
        Ok(None)
    }
}

impl Iterator for StateIterator {
    type Item = Result<KeyValue, KvError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.step() {
            Ok(Some(kv)) => Some(Ok(kv)),
            Ok(None) => {
                self.finish();
                None
            }
            Err(e) => Some(Err(e)),
        }
    }
}

impl FusedIterator for StateIterator {}

/// Every entry of one key, oldest version first, including deletion markers.
pub struct HistoryIterator {
    snapshot: Snapshot,
    key: Key,
    position: usize,
    done: bool,
}

impl HistoryIterator {
    pub(super) fn new(snapshot: Snapshot, key: Key) -> Self {
        Self {
            snapshot,
            key,
            position: 0,
            done: false,
        }
    }

    /// The commit sequence this iterator reads at.
    pub fn watermark(&self) -> Sequence {
        self.snapshot.watermark
    }

    /// Release the snapshot without reading the remaining entries.
    pub fn close(mut self) {
        self.finish();
    }

    fn finish(&mut self) {
        self.done = true;
        self.snapshot.release();
    }

    fn step(&mut self) -> Result<Option<VersionedEntry>, KvError> {
        let watermark = self.snapshot.watermark;
        let index = self.snapshot.shared.index.read()?;
        let entry = index
            .entries
            .get(&self.key)
            .and_then(|history| history.get(self.position))
            .filter(|entry| entry.sequence <= watermark)
            .cloned();
        if entry.is_some() {
            self.position += 1;
        }
        Ok(entry)
    }
}

impl Iterator for HistoryIterator {
    type Item = Result<VersionedEntry, KvError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.step() {
            Ok(Some(entry)) => Some(Ok(entry)),
            Ok(None) => {
                self.finish();
                None
            }
            Err(e) => Some(Err(e)),
        }
    }
}

impl FusedIterator for HistoryIterator {}

/// Whether `(start, end)` selects no keys. `BTreeMap::range` panics on
/// inverted bounds, so those are filtered here.
fn bounds_empty(start: &Bound<Key>, end: &Bound<Key>) -> bool {
    match (start, end) {
        (Bound::Included(s), Bound::Excluded(e)) => s >= e,
        (Bound::Excluded(s), Bound::Excluded(e)) => s >= e,
        (Bound::Included(s), Bound::Included(e)) => s > e,
        (Bound::Excluded(s), Bound::Included(e)) => s >= e,
        (Bound::Unbounded, _) | (_, Bound::Unbounded) => false,
    }
}
