//! Time-related primitives.
//!
//! Re-exports `tokio::time` so that paused-clock tests (`start_paused`) drive
//! every sleep and ticker in the engine, including the rate-limit waits and
//! the progress cadence.
//!
//! # Examples
//!
//! ```rust
//! use core_async::time::{interval_at, Duration, Instant, MissedTickBehavior};
//!
//! async fn example() {
//!     let period = Duration::from_millis(550);
//!     let mut ticker = interval_at(Instant::now() + period, period);
//!     ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
//!     ticker.tick().await;
//! }
//! ```

pub use tokio::time::{
    interval, interval_at, sleep, sleep_until, timeout, Instant, Interval, MissedTickBehavior,
    Sleep, Timeout,
};

pub use std::time::{Duration, SystemTime, UNIX_EPOCH};
