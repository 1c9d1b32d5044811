//! # Playlist Orchestrator
//!
//! Turns a selection of releases into one or more playlists.
//!
//! Album ids are resolved to track ids in batches the catalog accepts, the
//! tracks are split into parts that fit one playlist, and each part is
//! created and then filled with sequential append calls so track order is
//! preserved. Parts after the first are named `"<name> (<part>)"`.
//!
//! Writes are not transactional: when a step fails, playlists and tracks
//! written so far stay in place.

use crate::{chunk::chunks, job::cancellable, Result, SyncError};
use bridge_traits::{CatalogProvider, Market, PlaylistDetails, PlaylistHandle};
use core_async::sync::CancellationToken;
use core_runtime::config::EngineLimits;
use core_runtime::events::{CoreEvent, EventBus, PlaylistEvent};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info, instrument};

/// What the host asked for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistRequest {
    /// Selected release ids, in the order their tracks should appear.
    pub album_ids: Vec<String>,
    pub details: PlaylistDetails,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistOutcome {
    /// Created playlists in part order. Never empty.
    pub playlists: Vec<PlaylistHandle>,
    pub track_count: usize,
}

impl PlaylistOutcome {
    /// Id reported to the host: the first part's.
    pub fn playlist_id(&self) -> Option<&str> {
        self.playlists.first().map(|playlist| playlist.id.as_str())
    }
}

/// Name of the `part`-th (1-based) playlist.
pub fn part_name(base: &str, part: usize) -> String {
    if part <= 1 {
        base.to_string()
    } else {
        format!("{} ({})", base, part)
    }
}

pub struct PlaylistOrchestrator {
    catalog: Arc<dyn CatalogProvider>,
    event_bus: Arc<EventBus>,
    market: Market,
    limits: EngineLimits,
}

impl PlaylistOrchestrator {
    pub fn new(
        catalog: Arc<dyn CatalogProvider>,
        event_bus: Arc<EventBus>,
        market: Market,
        limits: EngineLimits,
    ) -> Self {
        Self {
            catalog,
            event_bus,
            market,
            limits,
        }
    }

    /// Creates the playlists for `request`, owned by `owner_id` or, when
    /// unknown, by the account behind the credential.
    ///
    /// Emits `Created` with the first playlist's id on success. Any failure
    /// other than cancellation emits `ErrorMessageRequested` and `Failed`.
    #[instrument(skip(self, owner_id, request, token), fields(albums = request.album_ids.len()))]
    pub async fn run(
        &self,
        owner_id: Option<String>,
        request: PlaylistRequest,
        token: CancellationToken,
    ) -> Result<PlaylistOutcome> {
        match self.execute(owner_id, &request, &token).await {
            Ok(outcome) => {
                if let Some(id) = outcome.playlist_id() {
                    self.emit(PlaylistEvent::Created {
                        playlist_id: id.to_string(),
                    });
                }
                info!(
                    playlists = outcome.playlists.len(),
                    tracks = outcome.track_count,
                    "Playlist creation finished"
                );
                Ok(outcome)
            }
            Err(e) if e.is_cancelled() || token.is_cancelled() => {
                info!("Playlist creation cancelled");
                Err(SyncError::Cancelled)
            }
            Err(e) => {
                error!("Playlist creation failed: {}", e);
                self.event_bus.emit(CoreEvent::ErrorMessageRequested).ok();
                self.emit(PlaylistEvent::Failed);
                Err(e)
            }
        }
    }

    async fn execute(
        &self,
        owner_id: Option<String>,
        request: &PlaylistRequest,
        token: &CancellationToken,
    ) -> Result<PlaylistOutcome> {
        let owner_id = match owner_id {
            Some(id) => id,
            None => cancellable(token, self.catalog.current_user()).await?.id,
        };

        let track_ids = self.resolve_tracks(&request.album_ids, token).await?;
        if track_ids.is_empty() {
            return Err(SyncError::NoTracks);
        }

        let uris: Vec<String> = track_ids
            .iter()
            .map(|id| self.catalog.track_uri(id))
            .collect();

        let mut playlists = Vec::new();
        for (index, part) in chunks(&uris, self.limits.playlist_capacity)
            .into_iter()
            .enumerate()
        {
            let details = PlaylistDetails {
                name: part_name(&request.details.name, index + 1),
                ..request.details.clone()
            };

            let playlist =
                cancellable(token, self.catalog.create_playlist(&owner_id, &details)).await?;
            debug!(playlist_id = %playlist.id, tracks = part.len(), "Playlist part created");

            for batch in chunks(&part, self.limits.append_batch_size) {
                cancellable(token, self.catalog.add_tracks(&playlist.id, &batch)).await?;
            }

            playlists.push(playlist);
        }

        Ok(PlaylistOutcome {
            playlists,
            track_count: uris.len(),
        })
    }

    /// Track ids of `album_ids`, batch by batch, album by album.
    async fn resolve_tracks(
        &self,
        album_ids: &[String],
        token: &CancellationToken,
    ) -> Result<Vec<String>> {
        let mut track_ids = Vec::new();
        for batch in chunks(album_ids, self.limits.album_batch_size) {
            let ids =
                cancellable(token, self.catalog.album_track_ids(&batch, &self.market)).await?;
            track_ids.extend(ids);
        }
        debug!(tracks = track_ids.len(), "Resolved selected tracks");
        Ok(track_ids)
    }

    fn emit(&self, event: PlaylistEvent) {
        self.event_bus.emit(CoreEvent::Playlist(event)).ok();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_part_name() {
        assert_eq!(part_name("Weekly", 1), "Weekly");
        assert_eq!(part_name("Weekly", 2), "Weekly (2)");
        assert_eq!(part_name("Weekly", 11), "Weekly (11)");
    }

    #[test]
    fn test_outcome_reports_first_playlist() {
        let outcome = PlaylistOutcome {
            playlists: vec![
                PlaylistHandle {
                    id: "p1".into(),
                    name: "Mix".into(),
                },
                PlaylistHandle {
                    id: "p2".into(),
                    name: "Mix (2)".into(),
                },
            ],
            track_count: 9600,
        };

        assert_eq!(outcome.playlist_id(), Some("p1"));
    }
}
