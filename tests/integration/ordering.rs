//! Firing order integration tests.
//!
//! Tests that verify tasks never fire early, shorter delays fire first,
//! and a newly scheduled earliest task wakes the loop.

use petit_timer::testing::DataChannel;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::common::{RunningTimer, STATE_WAIT};

/// Test: the shorter delay fires first even when scheduled second.
#[test]
fn test_small_delay_fires_before_big_delay() {
    const BIG_DELAY: Duration = Duration::from_millis(600);
    const SMALL_DELAY: Duration = Duration::from_millis(200);

    let timer = RunningTimer::start();
    let ch = Arc::new(DataChannel::new());
    let start = Instant::now();

    let sink = Arc::clone(&ch);
    let _t1 = timer
        .handle
        .schedule(BIG_DELAY, move || sink.post(("T1", Instant::now())));
    let sink = Arc::clone(&ch);
    let _t2 = timer
        .handle
        .schedule(SMALL_DELAY, move || sink.post(("T2", Instant::now())));

    let (got_data, data) = ch.wait_until_data(2, Duration::from_secs(15));
    assert!(got_data);
    assert_eq!(data.len(), 2);
    assert_eq!(data[0].0, "T2");
    assert!(data[0].1 - start >= SMALL_DELAY);
    assert_eq!(data[1].0, "T1");
    assert!(data[1].1 - start >= BIG_DELAY);
}

/// Test: a new earliest task interrupts a wait for a distant one.
#[test]
fn test_new_earliest_task_wakes_loop() {
    let timer = RunningTimer::start();
    let ch = Arc::new(DataChannel::new());

    let sink = Arc::clone(&ch);
    let _distant = timer
        .handle
        .schedule(Duration::from_secs(3600), move || sink.post("distant"));

    // let the loop settle into its deadline wait
    std::thread::sleep(Duration::from_millis(50));

    let sink = Arc::clone(&ch);
    let start = Instant::now();
    let _soon = timer
        .handle
        .schedule(Duration::from_millis(50), move || sink.post("soon"));

    let (got_data, data) = ch.wait_until_data(1, Duration::from_secs(2));
    assert!(got_data);
    assert_eq!(data, vec!["soon"]);
    assert!(start.elapsed() >= Duration::from_millis(50));
    assert_eq!(timer.handle.task_count(), 1);
}

/// Test: no task fires before its due time.
#[test]
fn test_no_premature_firing() {
    let timer = RunningTimer::start();
    let ch = Arc::new(DataChannel::new());

    let delays: Vec<Duration> = (0..20)
        .map(|i| Duration::from_millis((i * 37) % 250))
        .collect();

    let tokens: Vec<_> = delays
        .iter()
        .enumerate()
        .map(|(i, delay)| {
            let sink = Arc::clone(&ch);
            let scheduled = Instant::now();
            let delay = *delay;
            timer.handle.schedule(delay, move || {
                sink.post((i, scheduled.elapsed() >= delay));
            })
        })
        .collect();

    let (got_data, data) = ch.wait_until_data(delays.len(), STATE_WAIT);
    assert!(got_data);
    assert!(data.iter().all(|(_, on_time)| *on_time));
    assert!(tokens.iter().all(|t| t.expired()));
}

/// Test: distinct delays fire in delay order.
#[test]
fn test_distinct_delays_fire_in_delay_order() {
    let timer = RunningTimer::start();
    let ch = Arc::new(DataChannel::new());

    let mut tokens = Vec::new();
    for ms in [250_u64, 50, 200, 100, 150] {
        let sink = Arc::clone(&ch);
        tokens.push(
            timer
                .handle
                .schedule(Duration::from_millis(ms), move || sink.post(ms)),
        );
    }

    let (got_data, data) = ch.wait_until_data(5, STATE_WAIT);
    assert!(got_data);
    assert_eq!(data, vec![50, 100, 150, 200, 250]);
}
