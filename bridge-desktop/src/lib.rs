//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop hosts
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! - `HttpClient` using `reqwest` with rustls
//!
//! Time comes from [`bridge_traits::time::SystemClock`]; nothing
//! desktop-specific is needed for it.
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::ReqwestHttpClient;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let http_client = Arc::new(ReqwestHttpClient::new()?);
//!     // hand it to CoreConfig::builder().http_client(http_client)
//!     Ok(())
//! }
//! ```

mod http;

pub use http::ReqwestHttpClient;
