//! # Smoothed Progress Reporting
//!
//! Completion events arrive in bursts; the host wants a steady cadence.
//! Producers write into a [`ProgressCell`] whenever work completes, and a
//! [`ProgressEmitter`] samples the cell on a fixed interval and hands the
//! value to a sink.
//!
//! ```text
//!  artist done ──set──> ProgressCell <──get── ProgressEmitter ──tick──> sink
//! ```
//!
//! The emitter never stops on its own. Stopping it (explicitly or by
//! dropping it) performs exactly one final emit with the value at that
//! moment, so the host always sees the true end state even when the last
//! tick was skipped.

use core_async::sync::{watch, CancellationToken};
use core_async::task::JoinHandle;
use core_async::time::{interval_at, Duration, Instant, MissedTickBehavior};
use std::sync::Arc;
use tracing::{debug, warn};

/// Shared progress value in `[0, 100]` that never moves backwards.
#[derive(Debug, Clone)]
pub struct ProgressCell {
    value: Arc<watch::Sender<f64>>,
}

impl ProgressCell {
    pub fn new() -> Self {
        let (value, _) = watch::channel(0.0);
        Self {
            value: Arc::new(value),
        }
    }

    pub fn get(&self) -> f64 {
        *self.value.borrow()
    }

    /// Raises the value to `percent`, clamped to `[0, 100]`. Lower values
    /// and NaN are ignored.
    pub fn set(&self, percent: f64) {
        if percent.is_nan() {
            return;
        }
        let percent = percent.clamp(0.0, 100.0);
        self.value.send_if_modified(|current| {
            if percent > *current {
                *current = percent;
                true
            } else {
                false
            }
        });
    }

    /// Sets `completed / total * 100`. A zero total counts as done.
    pub fn set_fraction(&self, completed: usize, total: usize) {
        if total == 0 {
            self.set(100.0);
        } else {
            self.set(completed as f64 / total as f64 * 100.0);
        }
    }

    /// Observe changes without polling.
    pub fn subscribe(&self) -> watch::Receiver<f64> {
        self.value.subscribe()
    }
}

impl Default for ProgressCell {
    fn default() -> Self {
        Self::new()
    }
}

/// Background ticker that reports a [`ProgressCell`] to a sink.
pub struct ProgressEmitter {
    token: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl ProgressEmitter {
    /// Starts ticking. The first emit happens one `period` from now.
    pub fn spawn<F>(cell: ProgressCell, period: Duration, sink: F) -> Self
    where
        F: Fn(f64) + Send + 'static,
    {
        let token = CancellationToken::new();
        let cancelled = token.clone();

        let handle = core_async::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                core_async::select! {
                    biased;
                    _ = cancelled.cancelled() => {
                        let percent = cell.get();
                        debug!(percent, "Progress emitter stopped");
                        sink(percent);
                        break;
                    }
                    _ = ticker.tick() => sink(cell.get()),
                }
            }
        });

        Self {
            token,
            handle: Some(handle),
        }
    }

    /// Stops ticking and waits for the final emit to be delivered.
    pub async fn stop(mut self) {
        self.token.cancel();
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                warn!("Progress emitter task ended abnormally: {}", e);
            }
        }
    }
}

impl Drop for ProgressEmitter {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
