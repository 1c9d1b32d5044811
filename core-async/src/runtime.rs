//! Executor handles and a blocking entry point for synchronous callers.

pub use tokio::runtime::{Builder, Handle, Runtime};

/// Drives `future` to completion on a fresh current-thread runtime.
///
/// Meant for synchronous call sites with no runtime of their own (a log
/// sink invoked outside async code). Calling it from inside a runtime
/// panics in Tokio.
///
/// # Errors
///
/// Fails when the runtime cannot be built, e.g. when the process is out of
/// file descriptors.
pub fn block_on<F>(future: F) -> std::io::Result<F::Output>
where
    F: std::future::Future,
{
    let runtime = Builder::new_current_thread().enable_all().build()?;
    Ok(runtime.block_on(future))
}
