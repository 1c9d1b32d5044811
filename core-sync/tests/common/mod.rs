//! Shared fakes for orchestration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    Album, AlbumGroup, Artist, CatalogProvider, CatalogUser, Clock, Market, PlaylistDetails,
    PlaylistHandle,
};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use core_runtime::events::{CoreEvent, SyncEvent};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::broadcast;

pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    pub fn on(year: i32, month: u32, day: u32) -> Self {
        Self(Utc.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

pub fn artist(id: &str) -> Artist {
    Artist {
        id: id.to_string(),
        name: format!("Artist {id}"),
    }
}

pub fn album(id: &str, date: &str, group: AlbumGroup, artist_id: &str) -> Album {
    Album {
        id: id.to_string(),
        name: format!("Album {id}"),
        image: None,
        artists: vec![artist(artist_id)],
        release_date: date.to_string(),
        group,
        artist_id: artist_id.to_string(),
    }
}

pub fn server_error() -> BridgeError {
    BridgeError::Http {
        status: 500,
        status_text: "Internal Server Error".to_string(),
        message: None,
    }
}

/// Everything the fake was asked to do, in call order.
#[derive(Debug, Default, Clone)]
pub struct Calls {
    pub current_user: usize,
    pub artist_lookups: Vec<(String, Vec<AlbumGroup>, String)>,
    pub album_batches: Vec<Vec<String>>,
    pub created: Vec<(String, PlaylistDetails)>,
    pub appended: Vec<(String, Vec<String>)>,
}

/// In-memory catalog with scripted answers and failures.
#[derive(Default)]
pub struct FakeCatalog {
    user_error: Option<BridgeError>,
    artists_error: Option<BridgeError>,
    artists: Vec<Artist>,
    albums: HashMap<String, Vec<Album>>,
    failing_artists: HashSet<String>,
    read_delay: Duration,
    write_delay: Duration,
    tracks: HashMap<String, Vec<String>>,
    failing_append: Option<usize>,
    calls: Mutex<Calls>,
}

impl FakeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_artists(mut self, artists: Vec<Artist>) -> Self {
        self.artists = artists;
        self
    }

    pub fn with_albums(mut self, artist_id: &str, albums: Vec<Album>) -> Self {
        self.albums.insert(artist_id.to_string(), albums);
        self
    }

    pub fn with_failing_artist(mut self, artist_id: &str) -> Self {
        self.failing_artists.insert(artist_id.to_string());
        self
    }

    pub fn with_failing_user(mut self) -> Self {
        self.user_error = Some(server_error());
        self
    }

    pub fn with_failing_artist_list(mut self) -> Self {
        self.artists_error = Some(server_error());
        self
    }

    /// Artist and album lookups take `delay` of (virtual) time.
    pub fn with_read_delay(mut self, delay: Duration) -> Self {
        self.read_delay = delay;
        self
    }

    /// Track appends take `delay` of (virtual) time before they land.
    pub fn with_write_delay(mut self, delay: Duration) -> Self {
        self.write_delay = delay;
        self
    }

    /// Gives `album_id` `count` tracks named `<album_id>-t<n>`.
    pub fn with_tracks(mut self, album_id: &str, count: usize) -> Self {
        let tracks = (0..count).map(|n| format!("{album_id}-t{n}")).collect();
        self.tracks.insert(album_id.to_string(), tracks);
        self
    }

    /// The `call`-th append (0-based) fails.
    pub fn with_failing_append(mut self, call: usize) -> Self {
        self.failing_append = Some(call);
        self
    }

    pub fn calls(&self) -> Calls {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CatalogProvider for FakeCatalog {
    async fn current_user(&self) -> Result<CatalogUser> {
        self.calls.lock().unwrap().current_user += 1;
        match &self.user_error {
            Some(e) => Err(e.clone()),
            None => Ok(CatalogUser {
                id: "listener".to_string(),
                name: "Listener".to_string(),
                image: None,
            }),
        }
    }

    async fn followed_artists(&self) -> Result<Vec<Artist>> {
        match &self.artists_error {
            Some(e) => Err(e.clone()),
            None => Ok(self.artists.clone()),
        }
    }

    async fn artist_albums(
        &self,
        artist_id: &str,
        groups: &[AlbumGroup],
        market: &Market,
        _min_date: &str,
    ) -> Result<Vec<Album>> {
        self.calls.lock().unwrap().artist_lookups.push((
            artist_id.to_string(),
            groups.to_vec(),
            market.to_string(),
        ));

        if !self.read_delay.is_zero() {
            tokio::time::sleep(self.read_delay).await;
        }

        if self.failing_artists.contains(artist_id) {
            return Err(server_error());
        }
        Ok(self.albums.get(artist_id).cloned().unwrap_or_default())
    }

    async fn album_track_ids(&self, album_ids: &[String], _market: &Market) -> Result<Vec<String>> {
        self.calls
            .lock()
            .unwrap()
            .album_batches
            .push(album_ids.to_vec());

        if !self.read_delay.is_zero() {
            tokio::time::sleep(self.read_delay).await;
        }

        Ok(album_ids
            .iter()
            .flat_map(|id| self.tracks.get(id).cloned().unwrap_or_default())
            .collect())
    }

    async fn create_playlist(
        &self,
        owner_id: &str,
        details: &PlaylistDetails,
    ) -> Result<PlaylistHandle> {
        let mut calls = self.calls.lock().unwrap();
        calls.created.push((owner_id.to_string(), details.clone()));
        Ok(PlaylistHandle {
            id: format!("pl-{}", calls.created.len()),
            name: details.name.clone(),
        })
    }

    async fn add_tracks(&self, playlist_id: &str, track_uris: &[String]) -> Result<()> {
        if !self.write_delay.is_zero() {
            tokio::time::sleep(self.write_delay).await;
        }

        let mut calls = self.calls.lock().unwrap();
        if self.failing_append == Some(calls.appended.len()) {
            return Err(server_error());
        }
        calls
            .appended
            .push((playlist_id.to_string(), track_uris.to_vec()));
        Ok(())
    }

    fn track_uri(&self, track_id: &str) -> String {
        format!("spotify:track:{track_id}")
    }
}

/// Everything currently buffered on `rx`.
pub fn drain(rx: &mut broadcast::Receiver<CoreEvent>) -> Vec<CoreEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

pub fn progress_values(events: &[CoreEvent]) -> Vec<f64> {
    events
        .iter()
        .filter_map(|event| match event {
            CoreEvent::Sync(SyncEvent::ProgressUpdated { percent }) => Some(*percent),
            _ => None,
        })
        .collect()
}
