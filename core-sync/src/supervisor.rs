//! # Task Supervisor
//!
//! Keeps at most one run of each [`TaskKind`] alive. Starting a kind that is
//! already running cancels the old run and waits for it to unwind before the
//! new one is spawned, so the host never sees events from a superseded run
//! after the new run's first event.
//!
//! ```text
//! start_sync ──> cancel previous token ──> await previous task ──> spawn
//! ```
//!
//! The supervisor also remembers the outcome of the latest successful sync;
//! playlist creation uses its identity as the playlist owner.

use crate::{
    job::RunId,
    playlist::{PlaylistOrchestrator, PlaylistRequest},
    sync_orchestrator::{SyncOrchestrator, SyncOutcome},
    Result,
};
use bridge_traits::{CatalogProvider, CatalogUser, Clock};
use core_async::sync::{watch, CancellationToken, Mutex, RwLock};
use core_async::task::JoinHandle;
use core_runtime::config::{EngineLimits, SyncSettings};
use core_runtime::events::EventBus;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    Sync,
    PlaylistCreation,
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskKind::Sync => f.write_str("sync"),
            TaskKind::PlaylistCreation => f.write_str("playlist creation"),
        }
    }
}

struct ActiveTask {
    run_id: RunId,
    token: CancellationToken,
    handle: JoinHandle<()>,
    done: watch::Receiver<bool>,
}

impl ActiveTask {
    fn is_running(&self) -> bool {
        !*self.done.borrow()
    }

    /// Cancels the run and waits until it has unwound.
    async fn stop(self, kind: TaskKind) {
        self.token.cancel();
        if let Err(e) = self.handle.await {
            warn!(run_id = %self.run_id, "{} task ended abnormally: {}", kind, e);
        }
    }
}

/// Single-flight registry of running orchestrators.
pub struct TaskSupervisor {
    catalog: Arc<dyn CatalogProvider>,
    event_bus: Arc<EventBus>,
    clock: Arc<dyn Clock>,
    limits: EngineLimits,
    settings: RwLock<SyncSettings>,
    last_sync: Arc<RwLock<Option<Arc<SyncOutcome>>>>,
    active: Mutex<HashMap<TaskKind, ActiveTask>>,
    root: CancellationToken,
}

impl TaskSupervisor {
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
            limits,
            settings: RwLock::new(settings),
            last_sync: Arc::new(RwLock::new(None)),
            active: Mutex::new(HashMap::new()),
            root: CancellationToken::new(),
        }
    }

    /// Starts a sync, superseding any sync in progress.
    pub async fn start_sync(&self) -> RunId {
        let settings = self.settings.read().await.clone();
        let orchestrator = SyncOrchestrator::new(
            Arc::clone(&self.catalog),
            Arc::clone(&self.event_bus),
            Arc::clone(&self.clock),
            settings,
            self.limits,
        );
        let last_sync = Arc::clone(&self.last_sync);

        self.launch(TaskKind::Sync, move |token| async move {
            if let Ok(outcome) = orchestrator.run(token).await {
                *last_sync.write().await = Some(Arc::new(outcome));
            }
        })
        .await
    }

    /// Starts a playlist creation, superseding any creation in progress.
    pub async fn start_playlist_creation(&self, request: PlaylistRequest) -> RunId {
        let owner_id = self.current_user().await.map(|user| user.id);
        let market = self.settings.read().await.effective_market();
        let orchestrator = PlaylistOrchestrator::new(
            Arc::clone(&self.catalog),
            Arc::clone(&self.event_bus),
            market,
            self.limits,
        );

        self.launch(TaskKind::PlaylistCreation, move |token| async move {
            if let Err(e) = orchestrator.run(owner_id, request, token).await {
                debug!("Playlist run ended without a playlist: {}", e);
            }
        })
        .await
    }

    /// Cancels the running task of `kind` and waits for it to unwind.
    /// Returns `false` (and does nothing) when nothing is running.
    pub async fn cancel(&self, kind: TaskKind) -> bool {
        let mut active = self.active.lock().await;
        match active.remove(&kind) {
            Some(task) if task.is_running() => {
                info!(run_id = %task.run_id, "Cancelling {}", kind);
                task.stop(kind).await;
                true
            }
            _ => false,
        }
    }

    pub async fn cancel_playlist_creation(&self) -> bool {
        self.cancel(TaskKind::PlaylistCreation).await
    }

    pub async fn is_running(&self, kind: TaskKind) -> bool {
        self.active
            .lock()
            .await
            .get(&kind)
            .is_some_and(ActiveTask::is_running)
    }

    /// Id of the latest run of `kind`, finished or not.
    pub async fn current_run(&self, kind: TaskKind) -> Option<RunId> {
        self.active.lock().await.get(&kind).map(|task| task.run_id)
    }

    /// Waits until the latest run of `kind` has ended. Returns at once when
    /// none was started.
    pub async fn wait(&self, kind: TaskKind) {
        let done = self
            .active
            .lock()
            .await
            .get(&kind)
            .map(|task| task.done.clone());

        if let Some(mut done) = done {
            // A dropped sender means the task is gone as well.
            done.wait_for(|finished| *finished).await.ok();
        }
    }

    /// Replaces the settings used by runs started from now on.
    ///
    /// # Errors
    ///
    /// `SyncError::Config` if the settings are invalid; the previous settings
    /// stay in effect.
    pub async fn update_settings(&self, settings: SyncSettings) -> Result<()> {
        settings.validate()?;
        *self.settings.write().await = settings;
        info!("Sync settings updated");
        Ok(())
    }

    pub async fn settings(&self) -> SyncSettings {
        self.settings.read().await.clone()
    }

    /// Identity resolved by the latest successful sync.
    pub async fn current_user(&self) -> Option<CatalogUser> {
        self.last_sync
            .read()
            .await
            .as_ref()
            .map(|outcome| outcome.user.clone())
    }

    pub async fn last_sync(&self) -> Option<Arc<SyncOutcome>> {
        self.last_sync.read().await.clone()
    }

    /// Cancels every run and waits for all of them to unwind.
    pub async fn shutdown(&self) {
        self.root.cancel();
        let tasks: Vec<_> = self.active.lock().await.drain().collect();
        for (kind, task) in tasks {
            task.stop(kind).await;
        }
        debug!("Task supervisor stopped");
    }

    async fn launch<F, Fut>(&self, kind: TaskKind, make: F) -> RunId
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut active = self.active.lock().await;

        if let Some(previous) = active.remove(&kind) {
            if previous.is_running() {
                info!(run_id = %previous.run_id, "Superseding running {}", kind);
            }
            previous.stop(kind).await;
        }

        let run_id = RunId::new();
        let token = self.root.child_token();
        let (done_tx, done) = watch::channel(false);
        let run = make(token.clone());

        let handle = core_async::spawn(async move {
            run.await;
            done_tx.send_replace(true);
        });

        active.insert(
            kind,
            ActiveTask {
                run_id,
                token,
                handle,
                done,
            },
        );
        info!(run_id = %run_id, "Started {}", kind);
        run_id
    }
}

impl Drop for TaskSupervisor {
    fn drop(&mut self) {
        self.root.cancel();
    }
}

impl fmt::Debug for TaskSupervisor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskSupervisor")
            .field("limits", &self.limits)
            .finish_non_exhaustive()
    }
}
