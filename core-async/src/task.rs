//! Spawning onto the ambient runtime.
//!
//! ```rust
//! use core_async::task;
//!
//! async fn answer() -> u32 {
//!     task::spawn(async { 6 * 7 }).await.unwrap_or_default()
//! }
//! ```

use std::future::Future;

pub use tokio::task::{yield_now, JoinError, JoinHandle};

/// Runs `future` as an independent task.
///
/// The task keeps running when the handle is dropped; cancel it through a
/// token or [`JoinHandle::abort`].
pub fn spawn<F>(future: F) -> JoinHandle<F::Output>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    tokio::spawn(future)
}
