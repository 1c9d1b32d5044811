//! Runtime abstraction layer for the release sync engine.
//!
//! Every `core-*` and `provider-*` crate reaches the async runtime through
//! this crate instead of depending on Tokio directly. Swapping or tuning the
//! executor then only touches one place.
//!
//! # Modules
//!
//! - `task`: task spawning and join handles
//! - `time`: sleeps, tickers and timeouts
//! - `sync`: locks, channels and cancellation tokens
//! - `runtime`: blocking bridge for synchronous call sites
//!
//! # Examples
//!
//! ```rust
//! use core_async::sync::CancellationToken;
//! use core_async::task;
//! use core_async::time::{sleep, Duration};
//!
//! async fn example() {
//!     let token = CancellationToken::new();
//!     let child = token.child_token();
//!
//!     let handle = task::spawn(async move {
//!         core_async::select! {
//!             _ = child.cancelled() => 0,
//!             _ = sleep(Duration::from_secs(60)) => 1,
//!         }
//!     });
//!
//!     token.cancel();
//!     assert_eq!(handle.await.unwrap(), 0);
//! }
//! ```

pub mod runtime;
pub mod sync;
pub mod task;
pub mod time;

pub use task::spawn;
pub use tokio::select;
pub use time::{sleep, Duration, Instant};
