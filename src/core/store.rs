//! Ordered task store.
//!
//! Pending entries live in a `BTreeMap` keyed by [`DueKey`], i.e. by absolute
//! due time with a per-insert sequence number to keep keys unique. Every entry
//! carries a shared [`Locator`] recording its current key, which is what a
//! cancellation token resolves to find the entry again after re-arms.
//!
//! Nothing in here locks: the store is always owned by the timer's task mutex
//! and all methods assume that lock is held.

use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use super::types::TaskId;

/// Upper bound applied when `now + delay` does not fit in an `Instant`.
const MAX_DELAY: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Callback shared between the store and an in-flight firing batch.
pub(crate) type Callback = Arc<Mutex<Box<dyn FnMut() + Send>>>;

/// Compute `now + delay`, saturating to a far-future deadline on overflow.
pub(crate) fn deadline_after(now: Instant, delay: Duration) -> Instant {
    now.checked_add(delay)
        .or_else(|| now.checked_add(MAX_DELAY))
        .unwrap_or(now)
}

/// Position of an entry in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct DueKey {
    due: Instant,
    seq: u64,
}

impl DueKey {
    /// Absolute due time of the entry at this position.
    pub(crate) fn due(&self) -> Instant {
        self.due
    }
}

/// Cross-reference from a token to an entry's current position.
///
/// The position is only meaningful while the store lock is held; the entry
/// rewrites it on every insert. Once the entry leaves the store for good the
/// locator is invalidated before the entry drops its strong reference.
#[derive(Debug)]
pub(crate) struct Locator {
    position: Mutex<DueKey>,
    valid: AtomicBool,
}

impl Locator {
    fn new(position: DueKey) -> Self {
        Self {
            position: Mutex::new(position),
            valid: AtomicBool::new(true),
        }
    }

    pub(crate) fn position(&self) -> DueKey {
        *self.position.lock()
    }

    fn set_position(&self, position: DueKey) {
        *self.position.lock() = position;
    }

    pub(crate) fn is_valid(&self) -> bool {
        self.valid.load(Ordering::Acquire)
    }

    pub(crate) fn invalidate(&self) {
        self.valid.store(false, Ordering::Release);
    }
}

/// One pending activation.
pub(crate) struct Entry {
    id: TaskId,
    callback: Callback,
    repeat_interval: Duration,
    locator: Option<Arc<Locator>>,
}

impl Entry {
    pub(crate) fn new<F>(id: TaskId, callback: F, repeat_interval: Duration) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        let callback: Box<dyn FnMut() + Send> = Box::new(callback);
        Self {
            id,
            callback: Arc::new(Mutex::new(callback)),
            repeat_interval,
            locator: None,
        }
    }

    pub(crate) fn id(&self) -> TaskId {
        self.id
    }

    pub(crate) fn repeat_interval(&self) -> Duration {
        self.repeat_interval
    }

    pub(crate) fn is_repeating(&self) -> bool {
        !self.repeat_interval.is_zero()
    }

    pub(crate) fn callback(&self) -> Callback {
        Arc::clone(&self.callback)
    }

    /// Point the locator at `position`, creating it on first insert.
    fn link_locator(&mut self, position: DueKey) -> Weak<Locator> {
        match &self.locator {
            Some(locator) => {
                locator.set_position(position);
                Arc::downgrade(locator)
            }
            None => {
                let locator = Arc::new(Locator::new(position));
                let weak = Arc::downgrade(&locator);
                self.locator = Some(locator);
                weak
            }
        }
    }

    /// Invalidate and release the locator. Outstanding tokens expire.
    pub(crate) fn detach_locator(&mut self) {
        if let Some(locator) = self.locator.take() {
            locator.invalidate();
        }
    }
}

/// Result of inserting an entry.
pub(crate) struct Inserted {
    pub(crate) locator: Weak<Locator>,
    /// The new entry became the earliest one; the loop must be woken.
    pub(crate) is_earliest: bool,
}

/// Ordered multi-map from due time to entry.
#[derive(Default)]
pub(crate) struct TaskStore {
    entries: BTreeMap<DueKey, Entry>,
    next_seq: u64,
    next_id: u64,
}

impl TaskStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Allocate the id for a new registration.
    pub(crate) fn next_task_id(&mut self) -> TaskId {
        self.next_id += 1;
        TaskId::new(self.next_id)
    }

    /// Insert `entry` at `due` and rebind its locator to the new position.
    pub(crate) fn insert(&mut self, due: Instant, mut entry: Entry) -> Inserted {
        self.next_seq += 1;
        let key = DueKey {
            due,
            seq: self.next_seq,
        };

        let locator = entry.link_locator(key);
        self.entries.insert(key, entry);

        Inserted {
            locator,
            is_earliest: self.first_key() == Some(key),
        }
    }

    /// Remove the entry at `key`, reporting whether it was the earliest.
    pub(crate) fn remove(&mut self, key: DueKey) -> Option<(Entry, bool)> {
        let was_earliest = self.first_key() == Some(key);
        self.entries
            .remove(&key)
            .map(|entry| (entry, was_earliest))
    }

    /// Extract every entry due exactly at `due`.
    ///
    /// `due` is expected to be the earliest due time, so the batch is the run
    /// of entries at the front of the map.
    pub(crate) fn drain_due(&mut self, due: Instant) -> Vec<Entry> {
        let mut batch = Vec::new();
        while let Some(slot) = self.entries.first_entry().filter(|e| e.key().due == due) {
            batch.push(slot.remove());
        }
        batch
    }

    /// Due time of the earliest entry.
    pub(crate) fn earliest(&self) -> Option<Instant> {
        self.first_key().map(|key| key.due())
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn first_key(&self) -> Option<DueKey> {
        self.entries.first_key_value().map(|(key, _)| *key)
    }
}
