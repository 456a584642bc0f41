use crate::cache::{Clock, SystemClock};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

/// Memoizes computed values by key for a fixed time-to-live. There is no capacity bound; stale
/// entries are recomputed on access or dropped by [`TtlMemo::cleanup_expired`].
#[derive(Debug)]
pub struct TtlMemo<K, V, C = SystemClock> {
    /// Expiry is `None` when the TTL reaches past what `Instant` can represent.
    entries: HashMap<K, (V, Option<Instant>)>,
    ttl: Duration,
    clock: C,
}

impl<K, V> TtlMemo<K, V, SystemClock>
where
    K: Hash + Eq,
{
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, SystemClock)
    }
}

impl<K, V, C> TtlMemo<K, V, C>
where
    K: Hash + Eq,
    C: Clock,
{
    pub fn with_clock(ttl: Duration, clock: C) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
            clock,
        }
    }

    /// Returns the memoized value for `key`, calling `f` to compute it when it is missing or
    /// stale.
    pub fn get_or_insert_with<F>(&mut self, key: K, f: F) -> &V
    where
        F: FnOnce() -> V,
    {
        let now = self.clock.now();
        let expires_at = now.checked_add(self.ttl);
        match self.entries.entry(key) {
            Entry::Occupied(mut occupied) => {
                if !is_live(occupied.get().1, now) {
                    occupied.insert((f(), expires_at));
                }
                &occupied.into_mut().0
            }
            Entry::Vacant(vacant) => &vacant.insert((f(), expires_at)).0,
        }
    }

    /// Returns the memoized value if it has not expired.
    pub fn get(&self, key: &K) -> Option<&V> {
        let now = self.clock.now();
        self.entries
            .get(key)
            .filter(|(_, expires_at)| is_live(*expires_at, now))
            .map(|(value, _)| value)
    }

    /// Drops stale entries and returns how many were dropped.
    pub fn cleanup_expired(&mut self) -> usize {
        let now = self.clock.now();
        let before = self.entries.len();
        self.entries
            .retain(|_, (_, expires_at)| is_live(*expires_at, now));
        before - self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn is_live(expires_at: Option<Instant>, now: Instant) -> bool {
    expires_at.map_or(true, |t| t > now)
}
