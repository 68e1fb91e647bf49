//! A bounded-capacity Space-Saving counter table with an auxiliary index map
//! for O(1) amortized lookup.
//!
//! Every Space-Saving-style table in this crate ([`crate::global_hh::GlobalHh`]'s
//! table and both of [`crate::csschh::CssChh`]'s SS1/SS2 tables) needs the same
//! discipline: a flat arena of `(key, count)` entries, a `HashMap<K, usize>`
//! pointing at each key's slot, increment-on-hit, append-while-there's-room,
//! and replace-the-minimum once full. Sharing the discipline here keeps the
//! three call sites from hand-rolling the same arena+index bookkeeping three
//! times over.
//!
//! The index is a cache, not a source of truth: if it ever disagrees with the
//! arena (which should not happen, but is cheap to guard against) a linear
//! rescan repairs it rather than panicking or corrupting counts.

use std::collections::HashMap;
use std::hash::Hash;

#[derive(Debug, Clone, Copy)]
struct Entry<K> {
    key: K,
    count: u32,
}

/// Arena-backed Space-Saving table over keys of type `K`.
#[derive(Debug, Clone)]
pub struct IndexedSpaceSaving<K: Copy + Eq + Hash> {
    entries: Vec<Entry<K>>,
    index: HashMap<K, usize>,
    capacity: usize,
    repairs: u64,
}

impl<K: Copy + Eq + Hash> IndexedSpaceSaving<K> {
    /// Creates a table with room for `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
            capacity,
            repairs: 0,
        }
    }

    /// Number of entries currently stored.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of entries this table can hold.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of times the index map was found stale and repaired by a
    /// linear rescan. Always zero in ordinary operation; exposed as a
    /// diagnostic rather than surfaced as an error, since the table's own
    /// repair keeps results correct.
    pub fn repairs(&self) -> u64 {
        self.repairs
    }

    /// Counter associated with `key`, if tracked.
    pub fn count(&self, key: &K) -> Option<u32> {
        self.index
            .get(key)
            .and_then(|&i| self.entries.get(i))
            .filter(|e| e.key == *key)
            .map(|e| e.count)
    }

    /// Iterates over every tracked `(key, count)` pair.
    pub fn iter(&self) -> impl Iterator<Item = (K, u32)> + '_ {
        self.entries.iter().map(|e| (e.key, e.count))
    }

    /// Records one occurrence of `key`: increments it if tracked, inserts it
    /// with count 1 if there's room, otherwise replaces the minimum-count
    /// entry with `count = min + 1`.
    pub fn update(&mut self, key: K) {
        if let Some(&i) = self.index.get(&key) {
            if let Some(entry) = self.entries.get_mut(i) {
                if entry.key == key {
                    entry.count += 1;
                    return;
                }
            }
            self.repair_and_retry(key);
            return;
        }

        if self.entries.len() < self.capacity {
            self.index.insert(key, self.entries.len());
            self.entries.push(Entry { key, count: 1 });
            return;
        }

        self.replace_min(key);
    }

    /// The index map disagreed with the arena at slot `i`; fall back to a
    /// linear scan, repair the map entry if found, and insert as new
    /// otherwise. This should never trigger in practice.
    fn repair_and_retry(&mut self, key: K) {
        self.repairs += 1;
        for (i, entry) in self.entries.iter_mut().enumerate() {
            if entry.key == key {
                entry.count += 1;
                self.index.insert(key, i);
                return;
            }
        }
        if self.entries.len() < self.capacity {
            self.index.insert(key, self.entries.len());
            self.entries.push(Entry { key, count: 1 });
        } else {
            self.replace_min(key);
        }
    }

    fn replace_min(&mut self, new_key: K) {
        if self.entries.is_empty() {
            self.index.insert(new_key, 0);
            self.entries.push(Entry {
                key: new_key,
                count: 1,
            });
            return;
        }

        let (min_index, min_count) = self
            .entries
            .iter()
            .enumerate()
            .min_by_key(|(_, e)| e.count)
            .map(|(i, e)| (i, e.count))
            .expect("entries is non-empty");

        self.index.remove(&self.entries[min_index].key);
        self.entries[min_index] = Entry {
            key: new_key,
            count: min_count + 1,
        };
        self.index.insert(new_key, min_index);
    }
}
