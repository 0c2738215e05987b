//! Timer engine implementation.
//!
//! The timer is responsible for:
//! - Keeping pending tasks ordered by due time
//! - Waiting for the earliest due time, or for an earlier arrival
//! - Firing due tasks sequentially with no lock held
//! - Re-arming repeating tasks before their callbacks run
//! - Publishing run-state transitions to waiters

use parking_lot::{Condvar, Mutex};
use std::any::Any;
use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

use crate::config::TimerConfig;
use crate::core::guard::ScopedAction;
use crate::core::store::{Callback, Entry, Locator, TaskStore, deadline_after};
use crate::core::types::TaskId;

use super::handle::TimerHandle;
use super::token::Token;
use super::types::TimerError;

/// State shared between the loop, every handle, and (weakly) every token.
///
/// Two independent lock/condvar pairs: `tasks`/`tasks_cv` drive scheduling,
/// `run_state`/`run_cv` publish run-state transitions. They are never held
/// at the same time.
pub(crate) struct Shared {
    tasks: Mutex<TaskStore>,
    tasks_cv: Condvar,
    stop_requested: AtomicBool,

    run_state: Mutex<bool>,
    run_cv: Condvar,
    running: AtomicBool,

    /// Set while some thread is inside `Timer::run`.
    in_run: AtomicBool,
}

/// One callback pulled out of the store for the current batch.
struct Firing {
    id: TaskId,
    callback: Callback,
}

impl Firing {
    fn invoke(self) {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            let mut guard = self.callback.lock();
            let callback = &mut *guard;
            callback();
        }));

        if let Err(payload) = outcome {
            warn!(
                task_id = %self.id,
                panic = panic_message(&*payload),
                "Scheduled callback panicked"
            );
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

impl Shared {
    fn new() -> Self {
        Self {
            tasks: Mutex::new(TaskStore::new()),
            tasks_cv: Condvar::new(),
            stop_requested: AtomicBool::new(false),
            run_state: Mutex::new(false),
            run_cv: Condvar::new(),
            running: AtomicBool::new(false),
            in_run: AtomicBool::new(false),
        }
    }

    pub(crate) fn schedule<F>(
        self: &Arc<Self>,
        delay: Duration,
        interval: Duration,
        callback: F,
    ) -> Token
    where
        F: FnMut() + Send + 'static,
    {
        let mut tasks = self.tasks.lock();
        let id = tasks.next_task_id();
        let due = deadline_after(Instant::now(), delay);
        let inserted = tasks.insert(due, Entry::new(id, callback, interval));
        drop(tasks);

        trace!(
            task_id = %id,
            delay_ms = delay.as_millis() as u64,
            repeat_ms = interval.as_millis() as u64,
            "Task scheduled"
        );

        if inserted.is_earliest {
            self.tasks_cv.notify_one();
        }

        Token::new(id, Arc::downgrade(self), inserted.locator)
    }

    pub(crate) fn schedule_once<F>(self: &Arc<Self>, delay: Duration, callback: F) -> Token
    where
        F: FnOnce() + Send + 'static,
    {
        let mut callback = Some(callback);
        self.schedule(delay, Duration::ZERO, move || {
            if let Some(callback) = callback.take() {
                callback();
            }
        })
    }

    /// Remove the entry `locator` points at, if it is still pending.
    pub(crate) fn cancel_by(&self, locator: &Locator) -> bool {
        let mut tasks = self.tasks.lock();
        if !locator.is_valid() {
            return false;
        }

        let removed = tasks.remove(locator.position());
        locator.invalidate();
        drop(tasks);

        // The entry (and its callback) is dropped here, outside the lock,
        // since a callback may own tokens whose drop re-enters `cancel_by`.
        match removed {
            Some((entry, was_earliest)) => {
                trace!(task_id = %entry.id(), "Task cancelled");
                if was_earliest {
                    self.tasks_cv.notify_one();
                }
                true
            }
            None => false,
        }
    }

    pub(crate) fn request_stop(&self) {
        let tasks = self.tasks.lock();
        self.stop_requested.store(true, Ordering::Release);
        drop(tasks);

        debug!("Timer stop requested");
        self.tasks_cv.notify_one();
    }

    pub(crate) fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    pub(crate) fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub(crate) fn wait_until_running(&self, timeout: Duration) -> bool {
        self.wait_run_state(true, timeout)
    }

    pub(crate) fn wait_until_stopped(&self, timeout: Duration) -> bool {
        self.wait_run_state(false, timeout)
    }

    pub(crate) fn task_count(&self) -> usize {
        self.tasks.lock().len()
    }

    fn wait_run_state(&self, target: bool, timeout: Duration) -> bool {
        let mut state = self.run_state.lock();
        self.run_cv
            .wait_while_for(&mut state, |running| *running != target, timeout);
        *state == target
    }

    fn set_running(&self, running: bool) {
        let mut state = self.run_state.lock();
        *state = running;
        self.running.store(running, Ordering::Release);
        drop(state);

        self.run_cv.notify_all();
    }

    /// Publish the terminal stop and release the run claim together, so a
    /// thread that claims the timer next never sees a stale flip from the
    /// previous loop.
    fn set_stopped(&self) {
        let mut state = self.run_state.lock();
        *state = false;
        self.running.store(false, Ordering::Release);
        self.in_run.store(false, Ordering::Release);
        drop(state);

        self.run_cv.notify_all();
    }

    /// Block until a batch is due, or return `None` once a stop is requested.
    ///
    /// Repeating entries are re-armed and one-shot entries lose their locator
    /// before the store lock is released, so a concurrent cancel either
    /// precedes the drain or sees the post-drain state.
    fn next_batch(&self) -> Option<Vec<Firing>> {
        let mut tasks = self.tasks.lock();

        loop {
            self.tasks_cv.wait_while(&mut tasks, |tasks| {
                !self.stop_requested.load(Ordering::Acquire) && tasks.is_empty()
            });

            // consume the request so the timer can be run again
            if self.stop_requested.swap(false, Ordering::AcqRel) {
                return None;
            }

            let Some(due) = tasks.earliest() else {
                continue;
            };

            if !self.tasks_cv.wait_until(&mut tasks, due).timed_out() {
                // woken early: the earliest entry may have changed
                continue;
            }

            let now = Instant::now();
            let drained = tasks.drain_due(due);
            let mut batch = Vec::with_capacity(drained.len());

            for mut entry in drained {
                batch.push(Firing {
                    id: entry.id(),
                    callback: entry.callback(),
                });

                if entry.is_repeating() {
                    let next = deadline_after(now, entry.repeat_interval());
                    trace!(
                        task_id = %entry.id(),
                        due_in_ms = next.saturating_duration_since(now).as_millis() as u64,
                        "Task re-armed"
                    );
                    tasks.insert(next, entry);
                } else {
                    entry.detach_locator();
                }
            }

            return Some(batch);
        }
    }

    fn fire(&self, batch: Vec<Firing>) {
        trace!(batch = batch.len(), "Firing due tasks");
        for firing in batch {
            firing.invoke();
        }
    }
}

/// Deferred and repeating task timer.
///
/// A `Timer` owns the scheduling loop. Exactly one thread runs it, either by
/// calling [`Timer::run`] or through [`Timer::spawn`]; any number of threads
/// schedule and cancel tasks through [`TimerHandle`]s or a shared `&Timer`.
///
/// Callbacks run one at a time on the loop thread, never while the task lock
/// is held, so they may freely schedule or cancel other tasks. A callback
/// that captures a [`TimerHandle`] keeps the timer alive for as long as the
/// callback stays registered.
///
/// # Example
///
/// ```no_run
/// use petit_timer::Timer;
/// use std::time::Duration;
///
/// let (handle, thread) = Timer::new().spawn().unwrap();
/// let token = handle.schedule(Duration::from_millis(100), || println!("fired"));
///
/// std::thread::sleep(Duration::from_millis(200));
/// assert!(token.expired());
///
/// handle.request_stop();
/// thread.join().unwrap();
/// ```
pub struct Timer {
    shared: Arc<Shared>,
    config: TimerConfig,
}

impl Timer {
    /// Create a timer with the default configuration.
    pub fn new() -> Self {
        Self::with_config(TimerConfig::default())
    }

    /// Create a timer with the given configuration.
    pub fn with_config(config: TimerConfig) -> Self {
        Self {
            shared: Arc::new(Shared::new()),
            config,
        }
    }

    /// Get the configuration.
    pub fn config(&self) -> &TimerConfig {
        &self.config
    }

    /// Get a cloneable handle for scheduling from other threads.
    pub fn handle(&self) -> TimerHandle {
        TimerHandle::new(Arc::clone(&self.shared))
    }

    /// Schedule a one-shot task. See [`TimerHandle::schedule`].
    pub fn schedule<F>(&self, delay: Duration, callback: F) -> Token
    where
        F: FnOnce() + Send + 'static,
    {
        self.shared.schedule_once(delay, callback)
    }

    /// Schedule a repeating task. See [`TimerHandle::schedule_repeating`].
    pub fn schedule_repeating<F>(&self, delay: Duration, interval: Duration, callback: F) -> Token
    where
        F: FnMut() + Send + 'static,
    {
        self.shared.schedule(delay, interval, callback)
    }

    /// Ask the loop to exit. Idempotent; safe before `run` starts.
    pub fn request_stop(&self) {
        self.shared.request_stop();
    }

    /// Whether a stop has been requested and not yet consumed by the loop.
    pub fn is_stop_requested(&self) -> bool {
        self.shared.is_stop_requested()
    }

    /// Whether the loop is currently running.
    pub fn is_running(&self) -> bool {
        self.shared.is_running()
    }

    /// Wait up to `timeout` for the loop to start. Returns `false` on timeout.
    pub fn wait_until_running(&self, timeout: Duration) -> bool {
        self.shared.wait_until_running(timeout)
    }

    /// Wait up to `timeout` for the loop to stop. Returns `false` on timeout.
    pub fn wait_until_stopped(&self, timeout: Duration) -> bool {
        self.shared.wait_until_stopped(timeout)
    }

    /// Number of pending tasks. Advisory only.
    pub fn task_count(&self) -> usize {
        self.shared.task_count()
    }

    /// Run the scheduling loop on the calling thread until a stop is requested.
    ///
    /// The run state flips to running at the start of every loop iteration
    /// and back when the iteration ends, so `is_running` may briefly read
    /// `false` between two batches. Tasks still pending when the loop stops
    /// are left in place and are not fired.
    ///
    /// # Panics
    ///
    /// Panics if another thread is already running this timer.
    pub fn run(&self) {
        let shared = &*self.shared;

        if shared
            .in_run
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            panic!("Timer::run called while the timer is already running on another thread");
        }

        debug!(pending = shared.task_count(), "Timer loop started");

        loop {
            // left unset on the stop path and while unwinding
            let resumed = Cell::new(false);
            let _flip = ScopedAction::new(|| shared.set_running(true), || {
                if resumed.get() {
                    shared.set_running(false);
                } else {
                    shared.set_stopped();
                }
            });

            match shared.next_batch() {
                Some(batch) => {
                    shared.fire(batch);
                    resumed.set(true);
                }
                None => {
                    debug!(pending = shared.task_count(), "Timer loop stopped");
                    return;
                }
            }
        }
    }

    /// Run the loop on a dedicated thread named after the configuration.
    pub fn spawn(self) -> Result<(TimerHandle, JoinHandle<()>), TimerError> {
        let handle = self.handle();
        let thread_name = self.config.thread_name.clone();

        let mut builder = thread::Builder::new().name(thread_name.clone());
        if let Some(stack_size) = self.config.stack_size {
            builder = builder.stack_size(stack_size);
        }

        let thread = builder
            .spawn(move || self.run())
            .map_err(|source| TimerError::Spawn {
                thread_name,
                source,
            })?;

        Ok((handle, thread))
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Timer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Timer")
            .field("config", &self.config)
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}
