//! petit-timer - a thread-safe deferred and repeating task timer.
//!
//! A single loop thread waits for the earliest due task, fires due tasks one
//! at a time with no lock held, and re-arms repeating ones. Any thread may
//! schedule, cancel, and query concurrently.
//!
//! ```no_run
//! use petit_timer::Timer;
//! use std::time::Duration;
//!
//! let (handle, thread) = Timer::new().spawn()?;
//!
//! let heartbeat = handle.schedule_repeating(
//!     Duration::from_millis(500),
//!     Duration::from_secs(1),
//!     || println!("still here"),
//! );
//!
//! std::thread::sleep(Duration::from_secs(3));
//! heartbeat.cancel();
//!
//! handle.request_stop();
//! thread.join().expect("timer thread panicked");
//! # Ok::<(), petit_timer::TimerError>(())
//! ```

pub mod config;
pub mod core;
pub mod scheduler;
pub mod testing;

pub use config::{ConfigError, PlanConfig, PlannedTask, TimerConfig, YamlLoader};
pub use crate::core::guard::ScopedAction;
pub use crate::core::types::TaskId;
pub use scheduler::{Timer, TimerError, TimerHandle, Token};
