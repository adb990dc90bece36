//! Explicit least-recently-used index
//!
//! Entries live in an arena of slots linked into a doubly-linked recency
//! list by index; a hash map resolves keys to slots and freed slots are
//! recycled. The index never evicts on its own: the owner decides which
//! entries may go via [`LruIndex::evict_lru_where`].

use std::collections::HashMap;
use std::hash::Hash;

#[derive(Debug)]
struct Slot<K, V> {
    entry: Option<(K, V)>,
    prev: Option<usize>,
    next: Option<usize>,
}

/// Arena-backed LRU map with a soft capacity
#[derive(Debug)]
pub struct LruIndex<K, V> {
    slots: Vec<Slot<K, V>>,
    index: HashMap<K, usize>,
    /// Most recently used
    head: Option<usize>,
    /// Least recently used
    tail: Option<usize>,
    free: Vec<usize>,
    capacity: usize,
}

impl<K: Hash + Eq + Clone, V> LruIndex<K, V> {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: Vec::new(),
            index: HashMap::new(),
            head: None,
            tail: None,
            free: Vec::new(),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Whether more entries are held than the capacity allows
    pub fn is_over_capacity(&self) -> bool {
        self.len() > self.capacity
    }

    /// Look up and mark as most recently used
    pub fn get(&mut self, key: &K) -> Option<&V> {
        let slot = *self.index.get(key)?;
        self.move_to_front(slot);
        self.slots[slot].entry.as_ref().map(|(_, value)| value)
    }

    /// Insert or replace, marking the entry most recently used
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        if let Some(&slot) = self.index.get(&key) {
            self.move_to_front(slot);
            let entry = self.slots[slot].entry.replace((key, value));
            return entry.map(|(_, old)| old);
        }

        let slot = match self.free.pop() {
            Some(slot) => {
                self.slots[slot].entry = Some((key.clone(), value));
                slot
            }
            None => {
                self.slots.push(Slot {
                    entry: Some((key.clone(), value)),
                    prev: None,
                    next: None,
                });
                self.slots.len() - 1
            }
        };
        self.index.insert(key, slot);
        self.push_front(slot);
        None
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        let slot = self.index.remove(key)?;
        self.unlink(slot);
        self.free.push(slot);
        self.slots[slot].entry.take().map(|(_, value)| value)
    }

    /// Remove the least recently used entry accepted by `evictable`
    pub fn evict_lru_where<F>(&mut self, mut evictable: F) -> Option<(K, V)>
    where
        F: FnMut(&K, &V) -> bool,
    {
        let mut cursor = self.tail;
        while let Some(slot) = cursor {
            let candidate = match self.slots[slot].entry {
                Some((ref key, ref value)) if evictable(key, value) => Some(key.clone()),
                _ => None,
            };
            if let Some(key) = candidate {
                let value = self.remove(&key)?;
                return Some((key, value));
            }
            cursor = self.slots[slot].prev;
        }
        None
    }

    fn move_to_front(&mut self, slot: usize) {
        if self.head == Some(slot) {
            return;
        }
        self.unlink(slot);
        self.push_front(slot);
    }

    fn push_front(&mut self, slot: usize) {
        self.slots[slot].prev = None;
        self.slots[slot].next = self.head;
        if let Some(old_head) = self.head {
            self.slots[old_head].prev = Some(slot);
        }
        self.head = Some(slot);
        if self.tail.is_none() {
            self.tail = Some(slot);
        }
    }

    fn unlink(&mut self, slot: usize) {
        let (prev, next) = (self.slots[slot].prev, self.slots[slot].next);
        match prev {
            Some(prev) => self.slots[prev].next = next,
            None => self.head = next,
        }
        match next {
            Some(next) => self.slots[next].prev = prev,
            None => self.tail = prev,
        }
        self.slots[slot].prev = None;
        self.slots[slot].next = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    impl<K: Hash + Eq + Clone, V> LruIndex<K, V> {
        /// Keys from most to least recently used
        fn keys(&self) -> Vec<K> {
            let mut keys = Vec::with_capacity(self.len());
            let mut cursor = self.head;
            while let Some(slot) = cursor {
                if let Some((ref key, _)) = self.slots[slot].entry {
                    keys.push(key.clone());
                }
                cursor = self.slots[slot].next;
            }
            keys
        }

        fn contains(&self, key: &K) -> bool {
            self.index.contains_key(key)
        }
    }

    #[test]
    fn test_recency_order() {
        let mut lru = LruIndex::new(3);
        lru.insert("a", 1);
        lru.insert("b", 2);
        lru.insert("c", 3);
        assert_eq!(lru.keys(), vec!["c", "b", "a"]);

        assert_eq!(lru.get(&"a"), Some(&1));
        assert_eq!(lru.keys(), vec!["a", "c", "b"]);
    }

    #[test]
    fn test_evicts_least_recent_first() {
        let mut lru = LruIndex::new(2);
        lru.insert("a", 1);
        lru.insert("b", 2);
        lru.get(&"a");
        lru.insert("c", 3);
        assert!(lru.is_over_capacity());

        assert_eq!(lru.evict_lru_where(|_, _| true), Some(("b", 2)));
        assert!(!lru.is_over_capacity());
        assert_eq!(lru.keys(), vec!["c", "a"]);
    }

    #[test]
    fn test_eviction_skips_pinned_entries() {
        let mut lru = LruIndex::new(1);
        lru.insert("pinned", 1);
        lru.insert("free", 2);

        let evicted = lru.evict_lru_where(|key, _| *key != "pinned");
        assert_eq!(evicted, Some(("free", 2)));
        assert_eq!(lru.evict_lru_where(|key, _| *key != "pinned"), None);
        assert_eq!(lru.len(), 1);
    }

    #[test]
    fn test_replace_and_slot_reuse() {
        let mut lru = LruIndex::new(4);
        lru.insert("a", 1);
        assert_eq!(lru.insert("a", 10), Some(1));
        assert_eq!(lru.len(), 1);

        lru.insert("b", 2);
        assert_eq!(lru.remove(&"a"), Some(10));
        lru.insert("c", 3);

        assert_eq!(lru.slots.len(), 2);
        assert_eq!(lru.keys(), vec!["c", "b"]);
        assert!(lru.contains(&"c"));
        assert!(!lru.contains(&"a"));
    }

    #[test]
    fn test_remove_only_entry_resets_list() {
        let mut lru = LruIndex::new(1);
        lru.insert("a", 1);
        lru.remove(&"a");
        assert!(lru.is_empty());
        assert!(lru.keys().is_empty());

        lru.insert("b", 2);
        assert_eq!(lru.keys(), vec!["b"]);
    }
}
