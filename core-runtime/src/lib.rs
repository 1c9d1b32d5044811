//! # Core Runtime Module
//!
//! Runtime infrastructure shared by the release sync engine:
//! - Logging and tracing setup
//! - Configuration (`CoreConfig`, `SyncSettings`, `EngineLimits`)
//! - Event bus carrying sync and playlist notifications
//!
//! ## Overview
//!
//! Orchestrators in `core-sync` publish [`events::CoreEvent`]s through an
//! [`events::EventBus`] and read their tunables from [`config::CoreConfig`].
//! Nothing in this crate performs network I/O.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
