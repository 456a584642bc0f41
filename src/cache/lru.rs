use crate::cache::{Clock, SystemClock};
use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};
use tracing::trace;

/// TTL applied by [`LruCache::put`] unless the cache was built with another default.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug)]
struct Entry<K, V> {
    key: K,
    value: V,
    /// `None` when the TTL reaches past what `Instant` can represent.
    expires_at: Option<Instant>,
    /// Towards the most recently used end.
    prev: Option<usize>,
    /// Towards the least recently used end.
    next: Option<usize>,
}

/// A capacity-bounded cache that evicts the least recently used entry and expires entries after a
/// time-to-live.
///
/// Entries live in a slab and are threaded into a doubly linked recency list by index, so `get`
/// and `put` are O(1). Expiry is lazy: an expired entry stays in the cache until it is read,
/// evicted, or swept by [`LruCache::clear_expired`], which means [`LruCache::len`] may count
/// entries that `get` would no longer return.
#[derive(Debug)]
pub struct LruCache<K, V, C = SystemClock> {
    map: HashMap<K, usize>,
    slots: Vec<Option<Entry<K, V>>>,
    free: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    capacity: usize,
    default_ttl: Duration,
    clock: C,
}

impl<K, V> LruCache<K, V, SystemClock>
where
    K: Hash + Eq + Clone,
{
    /// Creates a cache holding at most `capacity` entries. A capacity of zero is treated as one.
    pub fn new(capacity: usize, default_ttl: Duration) -> Self {
        Self::with_clock(capacity, default_ttl, SystemClock)
    }
}

impl<K, V, C> LruCache<K, V, C>
where
    K: Hash + Eq + Clone,
    C: Clock,
{
    pub fn with_clock(capacity: usize, default_ttl: Duration, clock: C) -> Self {
        let capacity = capacity.max(1);
        Self {
            map: HashMap::with_capacity(capacity),
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            head: None,
            tail: None,
            capacity,
            default_ttl,
            clock,
        }
    }

    /// Returns the value for `key` and marks it most recently used. An expired entry is removed
    /// and reported as a miss.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        let idx = *self.map.get(key)?;
        let now = self.clock.now();
        if self.slots[idx].as_ref().is_some_and(|e| is_expired(e.expires_at, now)) {
            trace!("Cache entry expired on read");
            self.remove_index(idx);
            return None;
        }
        self.unlink(idx);
        self.push_front(idx);
        self.slots[idx].as_ref().map(|e| &e.value)
    }

    /// Inserts `value` with the cache's default TTL.
    pub fn put(&mut self, key: K, value: V) {
        self.put_with_ttl(key, value, self.default_ttl);
    }

    /// Inserts `value`, expiring `ttl` from now. Replaces any existing entry for `key`. When the
    /// cache is full, the least recently used entry is evicted first.
    pub fn put_with_ttl(&mut self, key: K, value: V, ttl: Duration) {
        let expires_at = self.clock.now().checked_add(ttl);

        if let Some(&idx) = self.map.get(&key) {
            if let Some(entry) = self.slots[idx].as_mut() {
                entry.value = value;
                entry.expires_at = expires_at;
            }
            self.unlink(idx);
            self.push_front(idx);
            return;
        }

        if self.map.len() >= self.capacity {
            if let Some(lru) = self.tail {
                trace!("Cache full at {} entries, evicting the least recently used", self.capacity);
                self.remove_index(lru);
            }
        }

        let entry = Entry {
            key: key.clone(),
            value,
            expires_at,
            prev: None,
            next: None,
        };
        let idx = match self.free.pop() {
            Some(idx) => {
                self.slots[idx] = Some(entry);
                idx
            }
            None => {
                self.slots.push(Some(entry));
                self.slots.len() - 1
            }
        };
        self.map.insert(key, idx);
        self.push_front(idx);
    }

    /// Removes `key`, returning its value whether or not it had expired.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let idx = *self.map.get(key)?;
        self.remove_index(idx).map(|e| e.value)
    }

    /// Drops every expired entry and returns how many were dropped.
    pub fn clear_expired(&mut self) -> usize {
        let now = self.clock.now();
        let expired: Vec<usize> = self
            .slots
            .iter()
            .enumerate()
            .filter_map(|(idx, slot)| match slot {
                Some(e) if is_expired(e.expires_at, now) => Some(idx),
                _ => None,
            })
            .collect();
        for &idx in &expired {
            self.remove_index(idx);
        }
        expired.len()
    }

    pub fn clear(&mut self) {
        self.map.clear();
        self.slots.clear();
        self.free.clear();
        self.head = None;
        self.tail = None;
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn remove_index(&mut self, idx: usize) -> Option<Entry<K, V>> {
        self.unlink(idx);
        let entry = self.slots[idx].take()?;
        self.map.remove(&entry.key);
        self.free.push(idx);
        Some(entry)
    }

    fn unlink(&mut self, idx: usize) {
        let Some((prev, next)) = self.slots[idx].as_ref().map(|e| (e.prev, e.next)) else {
            return;
        };
        match prev {
            Some(p) => {
                if let Some(e) = self.slots[p].as_mut() {
                    e.next = next;
                }
            }
            None => self.head = next,
        }
        match next {
            Some(n) => {
                if let Some(e) = self.slots[n].as_mut() {
                    e.prev = prev;
                }
            }
            None => self.tail = prev,
        }
        if let Some(e) = self.slots[idx].as_mut() {
            e.prev = None;
            e.next = None;
        }
    }

    fn push_front(&mut self, idx: usize) {
        let old_head = self.head;
        if let Some(e) = self.slots[idx].as_mut() {
            e.prev = None;
            e.next = old_head;
        }
        match old_head {
            Some(h) => {
                if let Some(e) = self.slots[h].as_mut() {
                    e.prev = Some(idx);
                }
            }
            None => self.tail = Some(idx),
        }
        self.head = Some(idx);
    }
}

fn is_expired(expires_at: Option<Instant>, now: Instant) -> bool {
    expires_at.is_some_and(|t| t <= now)
}
