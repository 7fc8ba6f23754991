//! Concurrent writers and readers sharing one store.

mod common;

use std::sync::{Arc, Barrier};
use std::thread;

use chainstate::{Key, LedgerStore};
use common::{history_of, key, keys_of};

#[test]
fn test_concurrent_puts_to_one_key() -> anyhow::Result<()> {
    const THREADS: usize = 8;
    const PUTS: usize = 50;

    let store = LedgerStore::new();
    let k = key("counter", &["shared"])?;
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let store = store.clone();
            let k = k.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                let mut versions = Vec::with_capacity(PUTS);
                for i in 0..PUTS {
                    versions.push(store.put(&k, format!("{t}-{i}")).unwrap());
                }
                versions
            })
        })
        .collect();

    let mut versions: Vec<u64> = Vec::new();
    for handle in handles {
        versions.extend(handle.join().unwrap());
    }
    versions.sort_unstable();

    let total = (THREADS * PUTS) as u64;
    assert_eq!(versions, (1..=total).collect::<Vec<_>>());

    let history = history_of(store.history(&k)?)?;
    let recorded: Vec<u64> = history.iter().map(|e| e.version).collect();
    assert_eq!(recorded, (1..=total).collect::<Vec<_>>());
    assert!(history.windows(2).all(|w| matches!(w, [a, b] if a.sequence < b.sequence)));
    Ok(())
}

#[test]
fn test_sequences_unique_across_keys() -> anyhow::Result<()> {
    const THREADS: usize = 6;
    const PUTS: usize = 40;

    let store = LedgerStore::new();
    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let store = store.clone();
            thread::spawn(move || {
                for i in 0..PUTS {
                    let k = Key::from(format!("k{}", i % 5));
                    store.put(&k, format!("{t}")).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(store.latest_sequence()?, (THREADS * PUTS) as u64);
    let mut sequences = Vec::new();
    for i in 0..5 {
        let history = history_of(store.history(&Key::from(format!("k{i}")))?)?;
        let versions: Vec<u64> = history.iter().map(|e| e.version).collect();
        assert_eq!(versions, (1..=history.len() as u64).collect::<Vec<_>>());
        sequences.extend(history.iter().map(|e| e.sequence));
    }
    sequences.sort_unstable();
    sequences.dedup();
    assert_eq!(sequences.len(), THREADS * PUTS);
    Ok(())
}

#[test]
fn test_readers_see_consistent_snapshots() -> anyhow::Result<()> {
    let store = LedgerStore::new();
    for i in 0..20 {
        store.put(&key("user", &[&format!("{i:03}")])?, "seed")?;
    }

    let writer = {
        let store = store.clone();
        thread::spawn(move || {
            for i in 20..200 {
                let k = chainstate::make_key("user", &[format!("{i:03}")]).unwrap();
                store.put(&k, "late").unwrap();
            }
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let store = store.clone();
            thread::spawn(move || {
                for _ in 0..20 {
                    let iter = store.prefix::<&str>("user", &[]).unwrap();
                    let watermark = iter.watermark();
                    let keys = keys_of(iter).unwrap();
                    // Every user key was written by a distinct commit.
                    assert_eq!(keys.len() as u64, watermark);
                    assert!(keys.windows(2).all(|w| matches!(w, [a, b] if a < b)));
                }
            })
        })
        .collect();

    writer.join().unwrap();
    for reader in readers {
        reader.join().unwrap();
    }

    assert_eq!(keys_of(store.prefix::<&str>("user", &[])?)?.len(), 200);
    assert_eq!(store.open_snapshots(), 0);
    Ok(())
}
