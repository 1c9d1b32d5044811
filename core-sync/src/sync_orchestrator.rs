//! # Sync Orchestrator
//!
//! Runs one library sync: resolves the account and its followed artists,
//! fans one release lookup per artist out to a [`WorkerPool`], folds the
//! results into a [`ReleaseSet`] as they complete and reports everything to
//! the host through the [`EventBus`].
//!
//! ## Workflow
//!
//! 1. Fetch the current user, emit `UserResolved`
//! 2. Fetch every followed artist, emit `ArtistsResolved`
//! 3. Submit one job per artist; each completed job emits `AlbumsAppended`
//!    while a [`ProgressEmitter`] reports `ProgressUpdated` on its own cadence
//! 4. Stop the emitter (final emit), let the host animation settle for one
//!    tick interval, emit `Finished`
//!
//! A failing artist is logged, skipped and still counted. A failure in steps
//! 1 or 2 ends the run with `ErrorMessageRequested` followed by `Failed`.
//! Cancellation ends the run silently.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use core_sync::SyncOrchestrator;
//!
//! let orchestrator = SyncOrchestrator::new(catalog, event_bus, clock, settings, limits);
//! let outcome = orchestrator.run(CancellationToken::new()).await?;
//! println!("{} releases since {}", outcome.releases.len(), outcome.min_date);
//! ```

use crate::{
    job::{cancellable, PhaseTracker, SyncPhase},
    progress::{ProgressCell, ProgressEmitter},
    releases::ReleaseSet,
    worker_pool::{WorkItem, WorkResult, WorkerPool},
    Result, SyncError,
};
use bridge_traits::{Album, AlbumGroup, Artist, CatalogProvider, CatalogUser, Clock};
use chrono::{Days, NaiveDate};
use core_async::sync::{watch, CancellationToken};
use core_async::time::Duration;
use core_runtime::config::{EngineLimits, SyncSettings};
use core_runtime::events::{CoreEvent, EventBus, SyncEvent};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// Everything a completed sync produced.
#[derive(Debug, Clone)]
pub struct SyncOutcome {
    pub user: CatalogUser,
    pub artists: Vec<Artist>,
    /// Cutoff the releases were fetched against (`YYYY-MM-DD`).
    pub min_date: String,
    pub releases: ReleaseSet,
    /// Artists whose release lookup failed and were skipped.
    pub failed_artists: usize,
}

struct FanOut {
    releases: ReleaseSet,
    failed: usize,
}

/// Single-use driver for one sync run.
pub struct SyncOrchestrator {
    catalog: Arc<dyn CatalogProvider>,
    event_bus: Arc<EventBus>,
    clock: Arc<dyn Clock>,
    settings: SyncSettings,
    limits: EngineLimits,
    phase: PhaseTracker,
    progress: ProgressCell,
}

impl SyncOrchestrator {
    pub fn new(
        catalog: Arc<dyn CatalogProvider>,
        event_bus: Arc<EventBus>,
        clock: Arc<dyn Clock>,
        settings: SyncSettings,
        limits: EngineLimits,
    ) -> Self {
        Self {
            catalog,
            event_bus,
            clock,
            settings,
            limits,
            phase: PhaseTracker::new(),
            progress: ProgressCell::new(),
        }
    }

    pub fn phase(&self) -> SyncPhase {
        self.phase.current()
    }

    pub fn subscribe_phase(&self) -> watch::Receiver<SyncPhase> {
        self.phase.subscribe()
    }

    /// Current progress in `[0, 100]`.
    pub fn progress(&self) -> f64 {
        self.progress.get()
    }

    /// Oldest release date still counted: today (UTC) minus the lookback
    /// window.
    pub fn min_date(&self) -> String {
        self.clock
            .today()
            .checked_sub_days(Days::new(u64::from(self.settings.lookback_days)))
            .unwrap_or(NaiveDate::MIN)
            .format("%Y-%m-%d")
            .to_string()
    }

    /// Runs the sync to completion.
    ///
    /// # Errors
    ///
    /// `SyncError::Cancelled` when `token` fires (no failure notifications
    /// are emitted), otherwise the error that aborted the run after
    /// `ErrorMessageRequested` and `Failed` were emitted.
    #[instrument(skip(self, token))]
    pub async fn run(&self, token: CancellationToken) -> Result<SyncOutcome> {
        match self.execute(&token).await {
            Ok(outcome) => Ok(outcome),
            Err(e) if e.is_cancelled() || token.is_cancelled() => {
                self.phase.advance(SyncPhase::Cancelled).ok();
                info!("Sync cancelled");
                Err(SyncError::Cancelled)
            }
            Err(e) => {
                error!("Sync failed: {}", e);
                self.phase.advance(SyncPhase::Failed).ok();
                self.event_bus.emit(CoreEvent::ErrorMessageRequested).ok();
                self.emit(SyncEvent::Failed);
                Err(e)
            }
        }
    }

    async fn execute(&self, token: &CancellationToken) -> Result<SyncOutcome> {
        info!("Phase 1: Resolving current user");
        self.phase.advance(SyncPhase::FetchingIdentity)?;
        let user = cancellable(token, self.catalog.current_user()).await?;
        self.emit(SyncEvent::UserResolved { user: user.clone() });

        info!("Phase 2: Listing followed artists");
        self.phase.advance(SyncPhase::FetchingArtists)?;
        let artists = cancellable(token, self.catalog.followed_artists()).await?;
        self.emit(SyncEvent::ArtistsResolved {
            artists: artists.clone(),
        });

        let min_date = self.min_date();
        info!(
            artists = artists.len(),
            min_date = %min_date,
            "Phase 3: Fetching releases"
        );
        self.phase.advance(SyncPhase::Syncing {
            completed: 0,
            total: artists.len(),
        })?;
        let fan_out = self.fan_out(&artists, &min_date, token).await?;

        info!("Phase 4: Finalizing");
        self.phase.advance(SyncPhase::Finalizing)?;
        core_async::select! {
            biased;
            _ = token.cancelled() => return Err(SyncError::Cancelled),
            _ = core_async::sleep(self.tick_interval()) => {}
        }

        self.phase.advance(SyncPhase::Done)?;
        self.emit(SyncEvent::Finished);
        info!(
            releases = fan_out.releases.len(),
            failed_artists = fan_out.failed,
            "Sync finished"
        );

        Ok(SyncOutcome {
            user,
            artists,
            min_date,
            releases: fan_out.releases,
            failed_artists: fan_out.failed,
        })
    }

    /// Runs the per-artist jobs. The pool and emitter are stopped before
    /// this returns, whatever the outcome.
    async fn fan_out(
        &self,
        artists: &[Artist],
        min_date: &str,
        token: &CancellationToken,
    ) -> Result<FanOut> {
        let mut pool: WorkerPool<Vec<Album>, SyncError> =
            WorkerPool::spawn(self.limits.worker_count, token.child_token());

        let bus = Arc::clone(&self.event_bus);
        let emitter = ProgressEmitter::spawn(
            self.progress.clone(),
            self.tick_interval(),
            move |percent| {
                bus.emit(CoreEvent::Sync(SyncEvent::ProgressUpdated { percent }))
                    .ok();
            },
        );

        let collected = self.collect(&mut pool, artists, min_date, token).await;

        emitter.stop().await;
        pool.shutdown().await;
        collected
    }

    async fn collect(
        &self,
        pool: &mut WorkerPool<Vec<Album>, SyncError>,
        artists: &[Artist],
        min_date: &str,
        token: &CancellationToken,
    ) -> Result<FanOut> {
        let groups: Arc<[AlbumGroup]> = self.settings.groups.clone().into();
        let market = self.settings.effective_market();

        for artist in artists {
            let catalog = Arc::clone(&self.catalog);
            let groups = Arc::clone(&groups);
            let market = market.clone();
            let min_date = min_date.to_string();
            let artist_id = artist.id.clone();

            pool.submit(WorkItem::new(move || async move {
                catalog
                    .artist_albums(&artist_id, &groups, &market, &min_date)
                    .await
                    .map_err(SyncError::from)
            }))
            .map_err(|_| SyncError::Cancelled)?;
        }

        let total = artists.len();
        let mut completed = 0;
        let mut releases = ReleaseSet::new();
        let mut failed = 0;

        while completed < total {
            let result = core_async::select! {
                biased;
                _ = token.cancelled() => return Err(SyncError::Cancelled),
                result = pool.next_result() => result,
            };
            let Some(result) = result else {
                return Err(SyncError::Cancelled);
            };
            completed += 1;

            match result {
                WorkResult::Ok(albums) => {
                    debug!(albums = albums.len(), "Artist releases fetched");
                    releases.merge(albums.iter().cloned(), min_date);
                    self.emit(SyncEvent::AlbumsAppended {
                        albums,
                        min_date: min_date.to_string(),
                    });
                }
                WorkResult::Error(e) => {
                    failed += 1;
                    warn!("Skipping artist after failed release lookup: {}", e);
                }
            }

            self.progress.set_fraction(completed, total);
            self.phase.advance(SyncPhase::Syncing { completed, total })?;
        }

        self.progress.set_fraction(completed, total);
        Ok(FanOut { releases, failed })
    }

    fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.limits.progress_interval_ms)
    }

    fn emit(&self, event: SyncEvent) {
        self.event_bus.emit(CoreEvent::Sync(event)).ok();
    }
}
