//! Spotify Web API response types
//!
//! Data structures for deserializing Web API responses. Only the fields the
//! engine reads are modelled; everything else is ignored by serde.

use bridge_traits::catalog::AlbumGroup;
use serde::{Deserialize, Serialize};

/// Paging object wrapping every list endpoint.
///
/// See: https://developer.spotify.com/documentation/web-api/concepts/api-calls
#[derive(Debug, Clone, Deserialize)]
pub struct Paged<T> {
    pub items: Vec<T>,

    /// Absolute URL of the next page, `null` on the last one.
    #[serde(default)]
    pub next: Option<String>,
}

/// `GET /me/following` wraps its paging object in an `artists` field.
#[derive(Debug, Deserialize)]
pub struct FollowedArtistsResponse {
    pub artists: Paged<SpotifyArtist>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyImage {
    pub url: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

/// `GET /me`
#[derive(Debug, Deserialize)]
pub struct SpotifyUser {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub images: Vec<SpotifyImage>,
}

/// Simplified artist object.
#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyArtist {
    pub id: String,
    pub name: String,
}

/// Simplified album object as listed by `GET /artists/{id}/albums`.
#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyAlbum {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub images: Vec<SpotifyImage>,
    #[serde(default)]
    pub artists: Vec<SpotifyArtist>,
    pub release_date: String,
    pub album_group: AlbumGroup,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyTrack {
    pub id: String,
}

/// Full album object; only the nested track page is read.
#[derive(Debug, Deserialize)]
pub struct AlbumWithTracks {
    pub id: String,
    pub tracks: Paged<SpotifyTrack>,
}

/// `GET /albums?ids=...`. Unknown ids come back as `null` entries.
#[derive(Debug, Deserialize)]
pub struct SeveralAlbumsResponse {
    pub albums: Vec<Option<AlbumWithTracks>>,
}

/// Body of `POST /users/{id}/playlists`.
#[derive(Debug, Serialize)]
pub struct CreatePlaylistBody<'a> {
    pub name: &'a str,
    pub description: &'a str,
    pub public: bool,
}

/// Body of `POST /playlists/{id}/tracks`.
#[derive(Debug, Serialize)]
pub struct AddTracksBody<'a> {
    pub uris: &'a [String],
}

#[derive(Debug, Deserialize)]
pub struct SpotifyPlaylist {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct PlaylistSnapshot {
    pub snapshot_id: String,
}

/// Error envelope of every non-success response.
///
/// See: https://developer.spotify.com/documentation/web-api/concepts/api-calls#response-status-codes
#[derive(Debug, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub status: Option<u16>,
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_followed_artists_page() {
        let json = r#"{
            "artists": {
                "items": [
                    { "id": "0OdUWJ0sBjDrqHygGUXeCF", "name": "Band of Horses", "genres": [] }
                ],
                "next": "https://api.spotify.com/v1/me/following?type=artist&after=0OdUWJ0sBjDrqHygGUXeCF&limit=50",
                "total": 2,
                "cursors": { "after": "0OdUWJ0sBjDrqHygGUXeCF" }
            }
        }"#;

        let response: FollowedArtistsResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.artists.items.len(), 1);
        assert_eq!(response.artists.items[0].name, "Band of Horses");
        assert!(response.artists.next.is_some());
    }

    #[test]
    fn test_deserialize_artist_album() {
        let json = r#"{
            "id": "4aawyAB9vmqN3uQ7FjRGTy",
            "name": "Global Warming",
            "album_group": "appears_on",
            "album_type": "album",
            "release_date": "2012-11-16",
            "images": [
                { "url": "https://i.scdn.co/image/640", "width": 640, "height": 640 },
                { "url": "https://i.scdn.co/image/300", "width": 300, "height": 300 }
            ],
            "artists": [ { "id": "0TnOYISbd1XYRBk9myaseg", "name": "Pitbull" } ]
        }"#;

        let album: SpotifyAlbum = serde_json::from_str(json).unwrap();
        assert_eq!(album.album_group, AlbumGroup::AppearsOn);
        assert_eq!(album.images.len(), 2);
        assert_eq!(album.artists[0].name, "Pitbull");
    }

    #[test]
    fn test_deserialize_several_albums_with_null_entry() {
        let json = r#"{
            "albums": [
                { "id": "a1", "tracks": { "items": [ { "id": "t1" } ], "next": null } },
                null
            ]
        }"#;

        let response: SeveralAlbumsResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.albums.len(), 2);
        assert!(response.albums[1].is_none());
    }

    #[test]
    fn test_deserialize_error_envelope() {
        let json = r#"{ "error": { "status": 400, "message": "invalid id" } }"#;

        let envelope: ErrorEnvelope = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.error.message.as_deref(), Some("invalid id"));
    }

    #[test]
    fn test_serialize_create_playlist_body() {
        let body = CreatePlaylistBody {
            name: "Apr 12 Releases",
            description: "",
            public: false,
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["public"], false);
        assert_eq!(json["name"], "Apr 12 Releases");
    }
}
