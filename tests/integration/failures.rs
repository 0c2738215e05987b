//! Callback failure integration tests.
//!
//! Tests that verify a panicking callback does not take down the loop,
//! its batch, or future firings.

use petit_timer::testing::DataChannel;
use std::sync::Arc;
use std::time::Duration;

use crate::common::{RunningTimer, STATE_WAIT};

/// Test: a panicking task does not stop later tasks from firing.
#[test]
fn test_panicking_callback_does_not_stop_loop() {
    let timer = RunningTimer::start();
    let ch = Arc::new(DataChannel::new());

    let _bad = timer
        .handle
        .schedule(Duration::from_millis(10), || panic!("callback failure"));
    let sink = Arc::clone(&ch);
    let _good = timer
        .handle
        .schedule(Duration::from_millis(50), move || sink.post("good"));

    let (got_data, data) = ch.wait_until_data(1, STATE_WAIT);
    assert!(got_data);
    assert_eq!(data, vec!["good"]);
    assert!(timer.handle.is_running());
}

/// Test: a panicking repeating task keeps being re-armed.
#[test]
fn test_panicking_repeating_task_keeps_firing() {
    let timer = RunningTimer::start();
    let ch = Arc::new(DataChannel::new());

    let sink = Arc::clone(&ch);
    let mut fired = 0_u32;
    let token = timer.handle.schedule_repeating(
        Duration::from_millis(5),
        Duration::from_millis(10),
        move || {
            fired += 1;
            sink.post(fired);
            if fired % 2 == 1 {
                panic!("odd firing {}", fired);
            }
        },
    );

    let (got_data, data) = ch.wait_until_data(4, STATE_WAIT);
    assert!(got_data);
    assert_eq!(&data[..4], &[1, 2, 3, 4]);
    assert!(!token.expired());
    assert_eq!(timer.handle.task_count(), 1);
}
