use std::collections::{HashSet, VecDeque};

use roomlink_core::DedupeKey;

/// Bounded set of recently seen message keys.
///
/// Eviction is strictly first-in-first-out by first sighting; a repeated key is
/// rejected without touching its position. Capacity 0 disables the cache.
#[derive(Debug)]
pub struct DedupeCache {
    capacity: usize,
    order: VecDeque<DedupeKey>,
    seen: HashSet<DedupeKey>,
}

impl DedupeCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            order: VecDeque::with_capacity(capacity.min(4096)),
            seen: HashSet::with_capacity(capacity.min(4096)),
        }
    }

    /// Record `key`. Returns false if it is already remembered.
    pub fn try_mark_seen(&mut self, key: &DedupeKey) -> bool {
        if self.capacity == 0 {
            return true;
        }
        if self.seen.contains(key) {
            return false;
        }

        self.seen.insert(key.clone());
        self.order.push_back(key.clone());

        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.seen.remove(&oldest);
            }
        }
        true
    }

    pub fn contains(&self, key: &DedupeKey) -> bool {
        self.seen.contains(key)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl Default for DedupeCache {
    fn default() -> Self {
        Self::new(2000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn k(s: &str) -> DedupeKey {
        DedupeKey::from(s)
    }

    #[test]
    fn reports_each_key_once() {
        let mut c = DedupeCache::new(10);
        assert!(c.try_mark_seen(&k("a")));
        assert!(!c.try_mark_seen(&k("a")));
        assert!(c.try_mark_seen(&k("b")));
        assert_eq!(c.len(), 2);
    }

    #[test]
    fn evicts_oldest_first_seen_key() {
        let mut c = DedupeCache::new(3);
        for key in ["a", "b", "c"] {
            assert!(c.try_mark_seen(&k(key)));
        }
        // re-seeing "a" must not refresh it
        assert!(!c.try_mark_seen(&k("a")));
        assert!(c.try_mark_seen(&k("d")));

        assert!(!c.contains(&k("a")));
        assert!(c.contains(&k("b")));
        assert_eq!(c.len(), 3);
        assert!(c.try_mark_seen(&k("a")));
        assert!(!c.contains(&k("b")));
    }

    #[test]
    fn capacity_plus_one_forgets_first() {
        let cap = 2000;
        let mut c = DedupeCache::new(cap);
        for i in 0..=cap {
            assert!(c.try_mark_seen(&k(&format!("key-{i}"))));
        }
        assert_eq!(c.len(), cap);
        assert!(c.try_mark_seen(&k("key-0")));
        assert!(!c.try_mark_seen(&k(&format!("key-{cap}"))));
    }

    #[test]
    fn zero_capacity_never_remembers() {
        let mut c = DedupeCache::new(0);
        assert!(c.try_mark_seen(&k("a")));
        assert!(c.try_mark_seen(&k("a")));
        assert!(c.is_empty());
    }
}
