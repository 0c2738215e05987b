//! One-shot lifecycle and shutdown integration tests.
//!
//! Tests that verify a one-shot task stays pending until its due time,
//! fires exactly once, and that stopping the timer abandons pending work.

use petit_timer::testing::DataChannel;
use petit_timer::{Timer, TimerConfig};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use crate::common::{RunningTimer, STATE_WAIT, wait_expired};

const INITIAL_DELAY: Duration = Duration::from_millis(600);
const WAIT_MIDWAY: Duration = Duration::from_millis(300);
const WAIT_FIRE: Duration = Duration::from_secs(1);

/// Test: a one-shot task is pending midway and gone once it fired.
#[test]
fn test_one_shot_fires_exactly_once() {
    let timer = RunningTimer::start();
    let ch = Arc::new(DataChannel::new());

    let start = Instant::now();
    let sink = Arc::clone(&ch);
    let token = timer
        .handle
        .schedule(INITIAL_DELAY, move || sink.post(Instant::now()));

    assert!(!token.expired());
    assert_eq!(timer.handle.task_count(), 1);

    let (got_data, fired) = ch.wait_until_data(1, WAIT_MIDWAY);
    assert!(!got_data);
    assert!(fired.is_empty());
    assert_eq!(timer.handle.task_count(), 1);
    assert!(!token.expired());

    let (got_data, fired) = ch.wait_until_data(1, WAIT_FIRE);
    assert!(got_data);
    assert_eq!(fired.len(), 1);
    assert!(fired[0] - start >= INITIAL_DELAY);

    assert!(wait_expired(&token, STATE_WAIT));
    assert_eq!(timer.handle.task_count(), 0);

    // nothing fires a second time
    let (_, fired) = ch.wait_until_data(2, Duration::from_millis(200));
    assert_eq!(fired.len(), 1);
    assert!(!token.cancel());

    timer.stop();
}

/// Test: a zero delay fires on the next poll.
#[test]
fn test_zero_delay_fires_promptly() {
    let timer = RunningTimer::start();
    let ch = Arc::new(DataChannel::new());

    let sink = Arc::clone(&ch);
    let _token = timer.handle.schedule(Duration::ZERO, move || sink.post(()));

    let (got_data, _) = ch.wait_until_data(1, STATE_WAIT);
    assert!(got_data);
}

/// Test: tasks still pending at stop are never fired.
#[test]
fn test_stop_abandons_pending_tasks() {
    let fired = Arc::new(AtomicUsize::new(0));
    let timer = RunningTimer::start();

    let counter = Arc::clone(&fired);
    let token = timer
        .handle
        .schedule(Duration::from_millis(300), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

    let handle = timer.handle.clone();
    timer.stop();

    assert!(!handle.is_running());
    assert_eq!(handle.task_count(), 1);
    assert!(!token.expired());

    thread::sleep(Duration::from_millis(500));
    assert_eq!(fired.load(Ordering::SeqCst), 0);

    // the abandoned entry can still be cancelled while the timer exists
    assert!(token.cancel());
    assert_eq!(handle.task_count(), 0);
}

/// Test: a stop interrupts a wait for a distant due time.
#[test]
fn test_stop_preempts_distant_deadline() {
    let timer = Timer::new();
    let _token = timer.schedule(Duration::from_secs(3600), || {});

    thread::scope(|s| {
        let runner = s.spawn(|| timer.run());
        assert!(timer.wait_until_running(STATE_WAIT));

        // let the loop settle into its deadline wait
        thread::sleep(Duration::from_millis(50));

        let requested = Instant::now();
        timer.request_stop();
        timer.request_stop();

        assert!(timer.wait_until_stopped(STATE_WAIT));
        runner.join().unwrap();
        assert!(requested.elapsed() < Duration::from_secs(1));
    });

    assert!(!timer.is_running());
    assert_eq!(timer.task_count(), 1);
}

/// Test: run state is observable from several waiting threads at once.
#[test]
fn test_run_state_waiters_all_wake() {
    let timer = Timer::with_config(TimerConfig::default().with_thread_name("waiters"));

    thread::scope(|s| {
        let waiters: Vec<_> = (0..4)
            .map(|_| s.spawn(|| timer.wait_until_running(STATE_WAIT)))
            .collect();

        thread::sleep(Duration::from_millis(20));
        s.spawn(|| timer.run());

        for waiter in waiters {
            assert!(waiter.join().unwrap());
        }

        timer.request_stop();
        assert!(timer.wait_until_stopped(STATE_WAIT));
    });
}

/// Test: callbacks run on the timer's own thread.
#[test]
fn test_callbacks_run_on_timer_thread() {
    let timer = RunningTimer::start_with(TimerConfig::default().with_thread_name("fire-thread"));
    let ch = Arc::new(DataChannel::new());

    let sink = Arc::clone(&ch);
    let _token = timer.handle.schedule(Duration::from_millis(10), move || {
        sink.post(thread::current().name().map(str::to_string));
    });

    let (got_data, names) = ch.wait_until_data(1, STATE_WAIT);
    assert!(got_data);
    assert_eq!(names[0].as_deref(), Some("fire-thread"));
}
