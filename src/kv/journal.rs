//! On-disk journal backed by fjall.
//!
//! Entries are stored in a single keyspace keyed by their big-endian commit
//! sequence, so a plain forward scan replays them in commit order.

use std::collections::HashMap;
use std::path::Path;
#[cfg(test)]
use std::sync::atomic::{AtomicBool, Ordering};

use fjall::{Keyspace, KeyspaceCreateOptions, PersistMode};

use crate::config::PersistPolicy;

use super::error::KvError;
use super::format::{decode_entry, encode_entry};
use super::key::Key;
use super::types::{Version, VersionedEntry};

const JOURNAL_KEYSPACE: &str = "ledger_journal";

pub(crate) struct Journal {
    db: fjall::Database,
    records: Keyspace,
    persist: PersistMode,
    /// Makes the next persist calls fail.
    #[cfg(test)]
    fail_persist: AtomicBool,
}

impl Journal {
    /// Open (or create) the journal at `path` and read back every entry.
    pub(crate) fn open(
        path: &Path,
        policy: PersistPolicy,
    ) -> Result<(Self, Vec<VersionedEntry>), KvError> {
        let db = fjall::Database::builder(path).open()?;
        let records = db.keyspace(JOURNAL_KEYSPACE, KeyspaceCreateOptions::default)?;
        let journal = Self {
            db,
            records,
            persist: persist_mode(policy),
            #[cfg(test)]
            fail_persist: AtomicBool::new(false),
        };
        let entries = journal.replay()?;
        Ok((journal, entries))
    }

    /// Durably record `entry` before it becomes visible.
    ///
    /// A record that cannot be persisted is removed again, so a failed
    /// append never shows up on replay.
    pub(crate) fn append(&self, entry: &VersionedEntry) -> Result<(), KvError> {
        let record = encode_entry(entry)?;
        let key = entry.sequence.to_be_bytes();
        self.records.insert(key, record.as_slice())?;
        if let Err(err) = self.persist() {
            if let Err(rollback) = self.records.remove(key) {
                return Err(KvError::storage(format!(
                    "sequence {}: {err}; removing the unpersisted record failed: {rollback}",
                    entry.sequence
                )));
            }
            return Err(err);
        }
        Ok(())
    }

    fn persist(&self) -> Result<(), KvError> {
        #[cfg(test)]
        if self.fail_persist.load(Ordering::Acquire) {
            return Err(KvError::storage("persist failed"));
        }
        self.db.persist(self.persist)?;
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn set_fail_persist(&self, fail: bool) {
        self.fail_persist.store(fail, Ordering::Release);
    }

    fn replay(&self) -> Result<Vec<VersionedEntry>, KvError> {
        let mut entries = Vec::new();
        let mut versions: HashMap<Key, Version> = HashMap::new();

        for kv in self.records.iter() {
            let (key_bytes, record) = kv
                .into_inner()
                .map_err(|e| KvError::storage(format!("failed to read journal record: {e}")))?;
            let sequence = u64::from_be_bytes(<[u8; 8]>::try_from(&*key_bytes).map_err(|_| {
                KvError::storage(format!("journal key has {} bytes, expected 8", key_bytes.len()))
            })?);

            let entry = decode_entry(record.as_ref())
                .map_err(|e| KvError::storage(format!("sequence {sequence}: {e}")))?;
            if entry.sequence != sequence {
                return Err(KvError::storage(format!(
                    "sequence {sequence}: record claims sequence {}",
                    entry.sequence
                )));
            }

            let expected = versions.get(&entry.key).copied().unwrap_or(0) + 1;
            if entry.version != expected {
                return Err(KvError::storage(format!(
                    "sequence {sequence}: key '{}' jumps to version {}, expected {expected}",
                    entry.key, entry.version
                )));
            }
            versions.insert(entry.key.clone(), entry.version);
            entries.push(entry);
        }

        Ok(entries)
    }

    /// Overwrite the raw record stored at `sequence`.
    #[cfg(test)]
    pub(crate) fn write_raw(&self, sequence: u64, record: &[u8]) -> Result<(), KvError> {
        self.records.insert(sequence.to_be_bytes(), record)?;
        self.db.persist(PersistMode::SyncAll)?;
        Ok(())
    }
}

fn persist_mode(policy: PersistPolicy) -> PersistMode {
    match policy {
        PersistPolicy::Buffer => PersistMode::Buffer,
        PersistPolicy::SyncData => PersistMode::SyncData,
        PersistPolicy::SyncAll => PersistMode::SyncAll,
    }
}
