//! Workspace placeholder crate.
//!
//! Exposes the feature flags that map onto the individual workspace crates so
//! a host application can depend on `release-sync-workspace` and get the
//! wired-up engine without naming each crate.

#[cfg(feature = "desktop-shims")]
pub use core_service::*;
