use std::collections::{HashMap, VecDeque};
use std::hash::Hash;

/// Bounded map that evicts the oldest inserted key when full.
///
/// Lookups do not refresh an entry's age.
#[derive(Debug)]
pub struct FifoCache<K, V> {
    capacity: usize,
    entries: HashMap<K, V>,
    order: VecDeque<K>,
}

impl<K: Eq + Hash + Clone, V: Clone> FifoCache<K, V> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: HashMap::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
        }
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.entries.get(key).cloned()
    }

    pub fn insert(&mut self, key: K, value: V) {
        if self.capacity == 0 {
            return;
        }
        if let Some(existing) = self.entries.get_mut(&key) {
            *existing = value;
            return;
        }
        while self.entries.len() >= self.capacity {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            self.entries.remove(&oldest);
        }
        self.order.push_back(key.clone());
        self.entries.insert(key, value);
    }

    /// Drops `key` only while `should_remove` holds for its current value.
    pub fn remove_if<F>(&mut self, key: &K, should_remove: F)
    where
        F: FnOnce(&V) -> bool,
    {
        if !self.entries.get(key).is_some_and(should_remove) {
            return;
        }
        self.entries.remove(key);
        self.order.retain(|k| k != key);
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evicts_oldest_when_full() {
        let mut cache = FifoCache::new(2);
        cache.insert(1, "a");
        cache.insert(2, "b");
        // A read does not make 1 younger
        assert_eq!(cache.get(&1), Some("a"));
        cache.insert(3, "c");
        assert_eq!(cache.get(&1), None);
        assert_eq!(cache.get(&2), Some("b"));
        assert_eq!(cache.get(&3), Some("c"));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_reinsert_replaces_without_eviction() {
        let mut cache = FifoCache::new(2);
        cache.insert(1, "a");
        cache.insert(2, "b");
        cache.insert(1, "z");
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&1), Some("z"));
        assert_eq!(cache.get(&2), Some("b"));
    }

    #[test]
    fn test_zero_capacity_stores_nothing() {
        let mut cache = FifoCache::new(0);
        cache.insert(1, "a");
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_remove_if_checks_current_value() {
        let mut cache = FifoCache::new(2);
        cache.insert(1, "a");
        cache.remove_if(&1, |v| *v == "stale");
        assert_eq!(cache.get(&1), Some("a"));

        cache.remove_if(&1, |v| *v == "a");
        assert_eq!(cache.get(&1), None);

        // The freed slot is not held by a dangling order entry
        cache.insert(2, "b");
        cache.insert(3, "c");
        assert_eq!(cache.get(&2), Some("b"));
        assert_eq!(cache.get(&3), Some("c"));
    }
}
