//! Bounded registry of mints already evaluated

use std::collections::{HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Default)]
struct Seen {
    members: HashSet<String>,
    order: VecDeque<String>,
}

/// Remembers up to `capacity` mints; the oldest insertion is evicted first
pub struct DedupeRegistry {
    capacity: usize,
    seen: Mutex<Seen>,
}

impl DedupeRegistry {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            seen: Mutex::new(Seen::default()),
        }
    }

    pub fn has_seen(&self, mint: &str) -> bool {
        self.lock().members.contains(mint)
    }

    pub fn mark_seen(&self, mint: &str) {
        self.check_and_mark(mint);
    }

    /// Mark `mint` as seen; true only the first time
    pub fn check_and_mark(&self, mint: &str) -> bool {
        let mut seen = self.lock();
        if !seen.members.insert(mint.to_string()) {
            return false;
        }
        seen.order.push_back(mint.to_string());

        while seen.order.len() > self.capacity {
            if let Some(evicted) = seen.order.pop_front() {
                seen.members.remove(&evicted);
            }
        }
        true
    }

    pub fn len(&self) -> usize {
        self.lock().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn lock(&self) -> MutexGuard<'_, Seen> {
        // The set stays consistent even if a holder panicked mid-insert
        self.seen.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
