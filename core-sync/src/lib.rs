//! # Sync & Playlist Orchestration
//!
//! Drives the two long-running operations of the engine: syncing recent
//! releases of every followed artist, and turning a selection of releases
//! into playlists.
//!
//! ## Overview
//!
//! Both operations talk to the remote catalog only through
//! [`CatalogProvider`](bridge_traits::CatalogProvider) and report to the host
//! only through the [`EventBus`](core_runtime::events::EventBus). A
//! [`TaskSupervisor`] keeps at most one run of each kind alive.
//!
//! ## Components
//!
//! - **Chunker** (`chunk`): Order-preserving batching
//! - **Progress** (`progress`): Monotonic progress cell and the interval emitter
//! - **Worker Pool** (`worker_pool`): Fixed set of workers with tagged results
//! - **Run Lifecycle** (`job`): Run ids, the sync phase machine, cancellation
//! - **Releases** (`releases`): Deduplicated release set and date windows
//! - **Sync Orchestrator** (`sync_orchestrator`): Identity, artists, fan-out
//! - **Playlist Orchestrator** (`playlist`): Track resolution and playlist writes
//! - **Task Supervisor** (`supervisor`): Single-flight runs per kind

pub mod chunk;
pub mod error;
pub mod job;
pub mod playlist;
pub mod progress;
pub mod releases;
pub mod supervisor;
pub mod sync_orchestrator;
pub mod worker_pool;

pub use chunk::chunks;
pub use error::{Result, SyncError};
pub use job::{cancellable, PhaseTracker, RunId, SyncPhase};
pub use playlist::{part_name, PlaylistOrchestrator, PlaylistOutcome, PlaylistRequest};
pub use progress::{ProgressCell, ProgressEmitter};
pub use releases::{parse_release_date, playlist_name, Release, ReleaseSet};
pub use supervisor::{TaskKind, TaskSupervisor};
pub use sync_orchestrator::{SyncOrchestrator, SyncOutcome};
pub use worker_pool::{PoolClosed, WorkItem, WorkPanic, WorkResult, WorkerPool};
