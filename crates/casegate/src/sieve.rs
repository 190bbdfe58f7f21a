//! SIEVE eviction cache.
//!
//! - On access (hit): set the entry's `visited` bit.
//! - On insert (miss + full): scan from the `hand`:
//!   - `visited` → clear it, advance the hand.
//!   - not `visited` → evict, insert the new entry in its slot.
//!
//! Slots live in a `Vec` used as a circular buffer; a `HashMap` indexes them.

use std::collections::HashMap;
use std::hash::Hash;
use std::num::NonZeroUsize;

/// A bounded cache using the SIEVE eviction algorithm.
#[derive(Debug)]
pub(crate) struct SieveCache<K, V> {
    entries: Vec<Option<Entry<K, V>>>,
    index: HashMap<K, usize>,
    hand: usize,
    capacity: usize,
    len: usize,
}

#[derive(Debug, Clone)]
struct Entry<K, V> {
    key: K,
    value: V,
    visited: bool,
}

impl<K, V> SieveCache<K, V>
where
    K: Eq + Hash + Clone,
{
    pub(crate) fn new(capacity: NonZeroUsize) -> Self {
        let capacity = capacity.get();
        Self {
            entries: (0..capacity).map(|_| None).collect(),
            index: HashMap::with_capacity(capacity),
            hand: 0,
            capacity,
            len: 0,
        }
    }

    /// Returns the value for `key`, marking it as recently used.
    pub(crate) fn get(&mut self, key: &K) -> Option<&V> {
        let &idx = self.index.get(key)?;
        let entry = self.entries[idx].as_mut()?;
        entry.visited = true;
        Some(&entry.value)
    }

    /// Inserts a key-value pair, evicting if at capacity.
    pub(crate) fn insert(&mut self, key: K, value: V) {
        if let Some(&idx) = self.index.get(&key) {
            if let Some(entry) = &mut self.entries[idx] {
                entry.value = value;
                entry.visited = true;
                return;
            }
        }

        let slot = if self.len < self.capacity {
            self.entries.iter().position(Option::is_none)
        } else {
            None
        };

        let idx = match slot {
            Some(idx) => {
                self.len += 1;
                idx
            }
            None => {
                let idx = self.find_eviction_target();
                if let Some(old) = self.entries[idx].take() {
                    self.index.remove(&old.key);
                }
                idx
            }
        };

        self.entries[idx] = Some(Entry {
            key: key.clone(),
            value,
            visited: false,
        });
        self.index.insert(key, idx);
    }

    pub(crate) fn remove(&mut self, key: &K) -> Option<V> {
        let idx = self.index.remove(key)?;
        let entry = self.entries[idx].take()?;
        self.len -= 1;
        Some(entry.value)
    }

    pub(crate) fn clear(&mut self) {
        self.entries.iter_mut().for_each(|slot| *slot = None);
        self.index.clear();
        self.hand = 0;
        self.len = 0;
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Scans from `hand` for an entry with `visited == false`, clearing
    /// `visited` bits along the way. At most two passes.
    fn find_eviction_target(&mut self) -> usize {
        for _ in 0..self.capacity * 2 {
            let current = self.hand;
            self.hand = (self.hand + 1) % self.capacity;
            match &mut self.entries[current] {
                Some(entry) if entry.visited => entry.visited = false,
                _ => return current,
            }
        }

        let target = self.hand;
        self.hand = (self.hand + 1) % self.capacity;
        target
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache<V>(capacity: usize) -> SieveCache<&'static str, V> {
        SieveCache::new(NonZeroUsize::new(capacity).unwrap())
    }

    #[test]
    fn basic_insert_and_get() {
        let mut cache = cache(3);
        cache.insert("a", 1);
        cache.insert("b", 2);

        assert_eq!(cache.get(&"a"), Some(&1));
        assert_eq!(cache.get(&"b"), Some(&2));
        assert_eq!(cache.get(&"c"), None);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn eviction_prefers_unvisited() {
        let mut cache = cache(3);
        cache.insert("a", 1);
        cache.insert("b", 2);
        cache.insert("c", 3);

        cache.get(&"a");
        cache.get(&"c");

        cache.insert("d", 4);

        assert_eq!(cache.get(&"a"), Some(&1));
        assert_eq!(cache.get(&"b"), None);
        assert_eq!(cache.get(&"c"), Some(&3));
        assert_eq!(cache.get(&"d"), Some(&4));
    }

    #[test]
    fn update_existing_key() {
        let mut cache = cache(2);
        cache.insert("a", 1);
        cache.insert("a", 10);

        assert_eq!(cache.get(&"a"), Some(&10));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn remove_frees_slot() {
        let mut cache = cache(2);
        cache.insert("a", 1);
        cache.insert("b", 2);

        assert_eq!(cache.remove(&"a"), Some(1));
        assert_eq!(cache.remove(&"a"), None);
        cache.insert("c", 3);

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&"b"), Some(&2));
        assert_eq!(cache.get(&"c"), Some(&3));
    }

    #[test]
    fn clear_empties() {
        let mut cache = cache(2);
        cache.insert("a", 1);
        cache.insert("b", 2);
        cache.clear();

        assert_eq!(cache.len(), 0);
        assert_eq!(cache.get(&"a"), None);
        cache.insert("c", 3);
        assert_eq!(cache.get(&"c"), Some(&3));
    }

    #[test]
    fn capacity_one() {
        let mut cache = cache(1);
        cache.insert("a", 1);
        cache.insert("b", 2);
        assert_eq!(cache.get(&"a"), None);
        assert_eq!(cache.get(&"b"), Some(&2));
    }

    #[test]
    fn eviction_wraps_around() {
        let mut cache = cache(4);
        for (k, v) in [("a", 1), ("b", 2), ("c", 3), ("d", 4)] {
            cache.insert(k, v);
            cache.get(&k);
        }

        cache.insert("e", 5);

        assert_eq!(cache.len(), 4);
        assert_eq!(cache.get(&"e"), Some(&5));
    }
}
