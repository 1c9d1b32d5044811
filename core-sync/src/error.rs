use bridge_traits::error::BridgeError;
use thiserror::Error;

use crate::worker_pool::WorkPanic;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    #[error("Catalog error: {0}")]
    Catalog(#[from] BridgeError),

    #[error("Run cancelled")]
    Cancelled,

    #[error("Invalid phase transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Worker panicked: {0}")]
    WorkerPanic(String),

    #[error("Selected releases contain no tracks")]
    NoTracks,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl SyncError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, SyncError::Cancelled)
    }
}

impl From<WorkPanic> for SyncError {
    fn from(panic: WorkPanic) -> Self {
        SyncError::WorkerPanic(panic.0)
    }
}

impl From<core_runtime::Error> for SyncError {
    fn from(error: core_runtime::Error) -> Self {
        SyncError::Config(error.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
