//! # Run Lifecycle
//!
//! Identifiers and the validated phase machine of a sync run.
//!
//! ## State Machine
//!
//! ```text
//! Idle → FetchingIdentity → FetchingArtists → Syncing(n/m) → Finalizing → Done
//!              ↓                  ↓                ↓
//!              └──────────────→ Failed ←───────────┘
//!
//! any non-terminal phase ──────→ Cancelled
//! ```
//!
//! `Syncing` may repeat with a growing `completed` count; it only moves on to
//! `Finalizing` once every artist is accounted for.

use crate::{Result, SyncError};
use core_async::sync::{watch, CancellationToken};
use serde::{Deserialize, Serialize};
use std::future::Future;
use uuid::Uuid;

// ============================================================================
// ID Types
// ============================================================================

/// Unique identifier for one started run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(Uuid);

impl RunId {
    /// Create a new random run ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a run ID from a string
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not a valid UUID
    pub fn from_string(s: &str) -> Result<Self> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| SyncError::InvalidInput(format!("Invalid run id: {}", e)))
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for RunId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

// ============================================================================
// Phases
// ============================================================================

/// Where a sync run currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum SyncPhase {
    Idle,
    FetchingIdentity,
    FetchingArtists,
    Syncing { completed: usize, total: usize },
    Finalizing,
    Done,
    Failed,
    Cancelled,
}

impl SyncPhase {
    /// Check if this phase ends the run
    pub fn is_terminal(&self) -> bool {
        matches!(self, SyncPhase::Done | SyncPhase::Failed | SyncPhase::Cancelled)
    }

    /// Check if the run is doing work
    pub fn is_active(&self) -> bool {
        !self.is_terminal() && *self != SyncPhase::Idle
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SyncPhase::Idle => "idle",
            SyncPhase::FetchingIdentity => "fetching_identity",
            SyncPhase::FetchingArtists => "fetching_artists",
            SyncPhase::Syncing { .. } => "syncing",
            SyncPhase::Finalizing => "finalizing",
            SyncPhase::Done => "done",
            SyncPhase::Failed => "failed",
            SyncPhase::Cancelled => "cancelled",
        }
    }

    /// Whether `self → next` is a legal step.
    pub fn can_transition_to(&self, next: &SyncPhase) -> bool {
        use SyncPhase::*;

        match (*self, *next) {
            (from, Cancelled) => !from.is_terminal(),

            (Idle, FetchingIdentity) => true,
            (FetchingIdentity, FetchingArtists) => true,
            (FetchingArtists, Syncing { completed: 0, .. }) => true,
            (
                Syncing {
                    completed: before,
                    total,
                },
                Syncing {
                    completed: after,
                    total: next_total,
                },
            ) => total == next_total && before <= after && after <= total,
            (Syncing { completed, total }, Finalizing) => completed == total,
            (Finalizing, Done) => true,

            (FetchingIdentity | FetchingArtists | Syncing { .. }, Failed) => true,

            _ => false,
        }
    }
}

impl std::fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncPhase::Syncing { completed, total } => {
                write!(f, "syncing ({}/{})", completed, total)
            }
            other => f.write_str(other.as_str()),
        }
    }
}

/// Publishes the current [`SyncPhase`] of one run and rejects illegal
/// steps.
#[derive(Debug)]
pub struct PhaseTracker {
    phase: watch::Sender<SyncPhase>,
}

impl PhaseTracker {
    pub fn new() -> Self {
        let (phase, _) = watch::channel(SyncPhase::Idle);
        Self { phase }
    }

    pub fn current(&self) -> SyncPhase {
        *self.phase.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<SyncPhase> {
        self.phase.subscribe()
    }

    /// Moves to `next`.
    ///
    /// # Errors
    ///
    /// `SyncError::InvalidStateTransition` if the step is not allowed; the
    /// phase is left unchanged.
    pub fn advance(&self, next: SyncPhase) -> Result<()> {
        let mut outcome = Ok(());
        self.phase.send_if_modified(|current| {
            if current.can_transition_to(&next) {
                *current = next;
                true
            } else {
                outcome = Err(SyncError::InvalidStateTransition {
                    from: current.to_string(),
                    to: next.to_string(),
                });
                false
            }
        });
        outcome
    }
}

impl Default for PhaseTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs one remote call under `token`.
///
/// A call is never started once `token` has fired, and a started call is
/// always driven to completion; the token is observed after it returns, so
/// a write that was sent has also landed (or failed) by the time this
/// yields `Cancelled`.
pub async fn cancellable<T, E, F>(token: &CancellationToken, future: F) -> Result<T>
where
    F: Future<Output = std::result::Result<T, E>>,
    SyncError: From<E>,
{
    if token.is_cancelled() {
        return Err(SyncError::Cancelled);
    }

    let result = future.await;

    if token.is_cancelled() {
        return Err(SyncError::Cancelled);
    }
    result.map_err(SyncError::from)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::error::BridgeError;

    #[test]
    fn test_run_id_new() {
        assert_ne!(RunId::new(), RunId::new());
    }

    #[test]
    fn test_run_id_from_string() {
        let uuid_str = "550e8400-e29b-41d4-a716-446655440000";
        let id = RunId::from_string(uuid_str).unwrap();
        assert_eq!(id.to_string(), uuid_str);
        assert!(RunId::from_string("not-a-uuid").is_err());
    }

    #[test]
    fn test_phase_is_terminal() {
        assert!(!SyncPhase::Idle.is_terminal());
        assert!(!SyncPhase::Syncing {
            completed: 1,
            total: 2
        }
        .is_terminal());
        assert!(SyncPhase::Done.is_terminal());
        assert!(SyncPhase::Failed.is_terminal());
        assert!(SyncPhase::Cancelled.is_terminal());
    }

    #[test]
    fn test_happy_path_transitions() {
        let tracker = PhaseTracker::new();

        tracker.advance(SyncPhase::FetchingIdentity).unwrap();
        tracker.advance(SyncPhase::FetchingArtists).unwrap();
        tracker
            .advance(SyncPhase::Syncing {
                completed: 0,
                total: 2,
            })
            .unwrap();
        tracker
            .advance(SyncPhase::Syncing {
                completed: 1,
                total: 2,
            })
            .unwrap();
        tracker
            .advance(SyncPhase::Syncing {
                completed: 2,
                total: 2,
            })
            .unwrap();
        tracker.advance(SyncPhase::Finalizing).unwrap();
        tracker.advance(SyncPhase::Done).unwrap();

        assert_eq!(tracker.current(), SyncPhase::Done);
    }

    #[test]
    fn test_cannot_finalize_with_pending_artists() {
        let tracker = PhaseTracker::new();
        tracker.advance(SyncPhase::FetchingIdentity).unwrap();
        tracker.advance(SyncPhase::FetchingArtists).unwrap();
        tracker
            .advance(SyncPhase::Syncing {
                completed: 0,
                total: 3,
            })
            .unwrap();

        let result = tracker.advance(SyncPhase::Finalizing);

        assert!(matches!(
            result,
            Err(SyncError::InvalidStateTransition { .. })
        ));
        assert_eq!(
            tracker.current(),
            SyncPhase::Syncing {
                completed: 0,
                total: 3
            }
        );
    }

    #[test]
    fn test_progress_cannot_go_backwards() {
        let from = SyncPhase::Syncing {
            completed: 2,
            total: 3,
        };
        assert!(!from.can_transition_to(&SyncPhase::Syncing {
            completed: 1,
            total: 3
        }));
        assert!(!from.can_transition_to(&SyncPhase::Syncing {
            completed: 4,
            total: 3
        }));
    }

    #[test]
    fn test_terminal_phases_are_final() {
        for terminal in [SyncPhase::Done, SyncPhase::Failed, SyncPhase::Cancelled] {
            assert!(!terminal.can_transition_to(&SyncPhase::Cancelled));
            assert!(!terminal.can_transition_to(&SyncPhase::FetchingIdentity));
        }
    }

    #[test]
    fn test_cancel_from_any_active_phase() {
        for phase in [
            SyncPhase::Idle,
            SyncPhase::FetchingIdentity,
            SyncPhase::FetchingArtists,
            SyncPhase::Syncing {
                completed: 0,
                total: 1,
            },
            SyncPhase::Finalizing,
        ] {
            assert!(phase.can_transition_to(&SyncPhase::Cancelled), "{phase}");
        }
    }

    #[test]
    fn test_finalizing_cannot_fail() {
        assert!(!SyncPhase::Finalizing.can_transition_to(&SyncPhase::Failed));
        assert!(!SyncPhase::Idle.can_transition_to(&SyncPhase::Failed));
    }

    #[tokio::test]
    async fn test_phase_subscribers_see_updates() {
        let tracker = PhaseTracker::new();
        let mut rx = tracker.subscribe();

        tracker.advance(SyncPhase::FetchingIdentity).unwrap();
        rx.changed().await.unwrap();

        assert_eq!(*rx.borrow(), SyncPhase::FetchingIdentity);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellable_lets_started_call_finish() {
        use core_async::time::{sleep, Duration};
        use std::sync::atomic::{AtomicBool, Ordering};
        use std::sync::Arc;

        let token = CancellationToken::new();
        let finished = Arc::new(AtomicBool::new(false));

        let canceller = {
            let token = token.clone();
            core_async::spawn(async move {
                sleep(Duration::from_millis(100)).await;
                token.cancel();
            })
        };

        let call_finished = Arc::clone(&finished);
        let result = cancellable(&token, async move {
            sleep(Duration::from_secs(1)).await;
            call_finished.store(true, Ordering::SeqCst);
            Ok::<_, SyncError>(())
        })
        .await;
        canceller.await.unwrap();

        assert_eq!(result, Err(SyncError::Cancelled));
        assert!(finished.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_cancellable_skips_call_once_cancelled() {
        let token = CancellationToken::new();
        token.cancel();

        let result: Result<()> = cancellable(&token, async {
            Err::<(), _>(BridgeError::OperationFailed("must not run".to_string()))
        })
        .await;

        assert_eq!(result, Err(SyncError::Cancelled));
    }

    #[tokio::test]
    async fn test_cancellable_maps_errors() {
        let token = CancellationToken::new();

        let result: Result<()> = cancellable(&token, async {
            Err::<(), _>(BridgeError::Network("reset".to_string()))
        })
        .await;

        assert_eq!(
            result,
            Err(SyncError::Catalog(BridgeError::Network("reset".to_string())))
        );
    }
}
