//! Music Catalog Abstraction
//!
//! Domain types and the provider contract the orchestrators are written
//! against. A provider owns the wire format, authentication and paging of
//! one remote catalog; the orchestrators only see the types below.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{BridgeError, Result};

/// Release group of an album. Declaration order is the default precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlbumGroup {
    Album,
    Single,
    Compilation,
    AppearsOn,
}

impl AlbumGroup {
    pub const ALL: [AlbumGroup; 4] = [
        AlbumGroup::Album,
        AlbumGroup::Single,
        AlbumGroup::Compilation,
        AlbumGroup::AppearsOn,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AlbumGroup::Album => "album",
            AlbumGroup::Single => "single",
            AlbumGroup::Compilation => "compilation",
            AlbumGroup::AppearsOn => "appears_on",
        }
    }
}

impl fmt::Display for AlbumGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlbumGroup {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "album" => Ok(AlbumGroup::Album),
            "single" => Ok(AlbumGroup::Single),
            "compilation" => Ok(AlbumGroup::Compilation),
            "appears_on" => Ok(AlbumGroup::AppearsOn),
            other => Err(BridgeError::Decode(format!("unknown album group: {other}"))),
        }
    }
}

/// Catalog market. `from_token` lets the remote side infer it from the
/// account behind the credential.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Market(String);

impl Market {
    pub const FROM_TOKEN: &'static str = "from_token";

    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn from_token() -> Self {
        Self(Self::FROM_TOKEN.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Market {
    fn default() -> Self {
        Self::from_token()
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The account behind the access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogUser {
    pub id: String,
    pub name: String,
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Artist {
    pub id: String,
    pub name: String,
}

/// A release as seen from one followed artist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Album {
    pub id: String,
    pub name: String,
    pub image: Option<String>,
    /// Contributing artists in catalog order.
    pub artists: Vec<Artist>,
    /// ISO date, possibly truncated to `YYYY-MM` or `YYYY`. Compared
    /// lexicographically.
    pub release_date: String,
    pub group: AlbumGroup,
    /// Followed artist whose listing produced this album.
    pub artist_id: String,
}

/// Attributes shared by every playlist created for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistDetails {
    pub name: String,
    pub description: String,
    pub is_private: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistHandle {
    pub id: String,
    pub name: String,
}

/// Remote music catalog.
///
/// Calls are independent and may run concurrently from several workers.
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    /// Identity of the account behind the credential.
    async fn current_user(&self) -> Result<CatalogUser>;

    /// Every artist the account follows, across all pages.
    async fn followed_artists(&self) -> Result<Vec<Artist>>;

    /// Albums of one artist in the given groups, newest first per group.
    ///
    /// Paging stops at the first page whose last album is released on or
    /// before `min_date`; that page is still returned in full.
    async fn artist_albums(
        &self,
        artist_id: &str,
        groups: &[AlbumGroup],
        market: &Market,
        min_date: &str,
    ) -> Result<Vec<Album>>;

    /// Track ids of the given albums, album by album, each album's tracks in
    /// disc order.
    async fn album_track_ids(&self, album_ids: &[String], market: &Market) -> Result<Vec<String>>;

    async fn create_playlist(
        &self,
        owner_id: &str,
        details: &PlaylistDetails,
    ) -> Result<PlaylistHandle>;

    /// Appends tracks to the end of a playlist, preserving order.
    async fn add_tracks(&self, playlist_id: &str, track_uris: &[String]) -> Result<()>;

    /// Playlist-entry reference for a track id.
    fn track_uri(&self, track_id: &str) -> String;
}
