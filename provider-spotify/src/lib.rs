//! # Spotify Provider
//!
//! Implements the `CatalogProvider` trait for the Spotify Web API.
//!
//! ## Overview
//!
//! This module provides:
//! - [`FetchClient`]: bearer-authenticated GET/POST with transparent 429
//!   handling and `next`-link pagination
//! - [`SpotifyConnector`]: identity, followed artists, artist releases with
//!   the release-date cutoff, album tracks and playlist writes
//! - URI and image helpers shared by callers

pub mod client;
pub mod connector;
pub mod error;
pub mod types;

pub use client::{FetchClient, SPOTIFY_API_BASE};
pub use connector::SpotifyConnector;
pub use error::{Result, SpotifyError};

use types::SpotifyImage;

/// Catalog URI, e.g. `spotify:track:6rqhFgbbKwnb9MLmUQDhG6`.
pub fn spotify_uri(id: &str, entity: &str) -> String {
    format!("spotify:{}:{}", entity, id)
}

/// Web player URL for an entity.
pub fn spotify_url(id: &str, entity: &str) -> String {
    format!("https://open.spotify.com/{}/{}", entity, id)
}

/// The 300px image when present, otherwise the first one.
pub fn pick_image(images: &[SpotifyImage]) -> Option<String> {
    images
        .iter()
        .find(|image| image.width == Some(300))
        .or_else(|| images.first())
        .map(|image| image.url.clone())
}
