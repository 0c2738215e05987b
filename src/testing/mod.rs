//! Testing utilities for users of the timer.
//!
//! This module provides helpers for observing scheduled callbacks from test
//! threads:
//!
//! - [`DataChannel`]: A many-writer, many-reader sequence that can be waited on

use parking_lot::{Condvar, Mutex};
use std::time::Duration;

/// Append-only sequence that readers can block on.
///
/// Callbacks post values (typically fire timestamps or labels) and the test
/// thread waits until enough values arrived or a timeout passed.
///
/// # Example
///
/// ```
/// use petit_timer::testing::DataChannel;
/// use std::time::Duration;
///
/// let ch = DataChannel::new();
/// ch.post("tick");
///
/// let (ok, seen) = ch.wait_until_data(1, Duration::from_millis(10));
/// assert!(ok);
/// assert_eq!(seen, vec!["tick"]);
/// ```
pub struct DataChannel<T> {
    data: Mutex<Vec<T>>,
    cv: Condvar,
}

impl<T: Clone> DataChannel<T> {
    /// Create an empty channel.
    pub fn new() -> Self {
        Self {
            data: Mutex::new(Vec::new()),
            cv: Condvar::new(),
        }
    }

    /// Append a value and wake all waiters.
    pub fn post(&self, value: T) {
        self.data.lock().push(value);
        self.cv.notify_all();
    }

    /// Wait until at least `threshold` values were posted, or `timeout` passed.
    ///
    /// Returns whether the threshold was reached, together with a copy of
    /// everything posted so far.
    pub fn wait_until_data(&self, threshold: usize, timeout: Duration) -> (bool, Vec<T>) {
        let mut data = self.data.lock();
        self.cv
            .wait_while_for(&mut data, |data| data.len() < threshold, timeout);
        (data.len() >= threshold, data.clone())
    }

    /// Copy of everything posted so far.
    pub fn snapshot(&self) -> Vec<T> {
        self.data.lock().clone()
    }

    /// Number of values posted so far.
    pub fn len(&self) -> usize {
        self.data.lock().len()
    }

    /// Whether nothing was posted yet.
    pub fn is_empty(&self) -> bool {
        self.data.lock().is_empty()
    }
}

impl<T: Clone> Default for DataChannel<T> {
    fn default() -> Self {
        Self::new()
    }
}
