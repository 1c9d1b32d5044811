//! Spotify Web API connector implementation
//!
//! Implements the `CatalogProvider` trait on top of [`FetchClient`].

use async_trait::async_trait;
use bridge_traits::catalog::{
    Album, AlbumGroup, Artist, CatalogProvider, CatalogUser, Market, PlaylistDetails,
    PlaylistHandle,
};
use bridge_traits::error::Result;
use bridge_traits::http::HttpClient;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::client::FetchClient;
use crate::error::SpotifyError;
use crate::types::{
    AddTracksBody, CreatePlaylistBody, FollowedArtistsResponse, Paged, PlaylistSnapshot,
    SeveralAlbumsResponse, SpotifyAlbum, SpotifyArtist, SpotifyPlaylist, SpotifyTrack,
    SpotifyUser,
};
use crate::{pick_image, spotify_uri};

/// Maximum items per page (Web API limit)
pub const MAX_PAGE_SIZE: usize = 50;

/// Maximum album ids per `GET /albums` call
pub const MAX_ALBUM_IDS: usize = 20;

/// Maximum URIs per `POST /playlists/{id}/tracks` call
pub const MAX_TRACK_URIS: usize = 100;

/// Spotify Web API connector
///
/// # Example
///
/// ```ignore
/// use provider_spotify::SpotifyConnector;
/// use bridge_traits::catalog::CatalogProvider;
///
/// let connector = SpotifyConnector::new(http_client, access_token);
/// let artists = connector.followed_artists().await?;
/// ```
#[derive(Debug)]
pub struct SpotifyConnector {
    client: FetchClient,
    page_size: usize,
}

impl SpotifyConnector {
    /// Create a new connector against the public Web API.
    ///
    /// # Arguments
    ///
    /// * `http_client` - HTTP client implementation
    /// * `access_token` - OAuth access token with `user-follow-read` and
    ///   `playlist-modify-*` scopes
    pub fn new(http_client: Arc<dyn HttpClient>, access_token: impl Into<String>) -> Self {
        Self::from_client(FetchClient::new(http_client, access_token))
    }

    pub fn from_client(client: FetchClient) -> Self {
        Self {
            client,
            page_size: MAX_PAGE_SIZE,
        }
    }

    /// Page size for list endpoints, clamped to `1..=50`.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        self
    }

    pub fn client(&self) -> &FetchClient {
        &self.client
    }

    fn convert_user(user: SpotifyUser) -> CatalogUser {
        CatalogUser {
            image: pick_image(&user.images),
            name: user.display_name.unwrap_or_default(),
            id: user.id,
        }
    }

    fn convert_artist(artist: SpotifyArtist) -> Artist {
        Artist {
            id: artist.id,
            name: artist.name,
        }
    }

    fn convert_album(album: SpotifyAlbum, artist_id: &str) -> Album {
        Album {
            image: pick_image(&album.images),
            artists: album.artists.into_iter().map(Self::convert_artist).collect(),
            id: album.id,
            name: album.name,
            release_date: album.release_date,
            group: album.album_group,
            artist_id: artist_id.to_string(),
        }
    }

    /// One listing over `groups`, newest first within each group. Stops
    /// paging once the last collected album is not newer than `min_date`.
    async fn albums_in_groups(
        &self,
        artist_id: &str,
        groups: &[AlbumGroup],
        market: &Market,
        min_date: &str,
    ) -> std::result::Result<Vec<Album>, SpotifyError> {
        let include_groups = groups
            .iter()
            .map(AlbumGroup::as_str)
            .collect::<Vec<_>>()
            .join(",");
        let url = self.client.api_url(&format!(
            "artists/{}/albums?limit={}&include_groups={}&market={}",
            urlencoding::encode(artist_id),
            self.page_size,
            urlencoding::encode(&include_groups),
            urlencoding::encode(market.as_str()),
        ));

        let owner = artist_id.to_string();
        self.client
            .paginate(
                url,
                move |page: Paged<SpotifyAlbum>| Paged {
                    items: page
                        .items
                        .into_iter()
                        .map(|album| Self::convert_album(album, &owner))
                        .collect(),
                    next: page.next,
                },
                |albums: &[Album]| {
                    albums
                        .last()
                        .map_or(false, |album| album.release_date.as_str() > min_date)
                },
            )
            .await
    }
}

#[async_trait]
impl CatalogProvider for SpotifyConnector {
    #[instrument(skip(self))]
    async fn current_user(&self) -> Result<CatalogUser> {
        let user: SpotifyUser = self.client.get(&self.client.api_url("me")).await?;
        debug!(user_id = %user.id, "Resolved current user");
        Ok(Self::convert_user(user))
    }

    #[instrument(skip(self))]
    async fn followed_artists(&self) -> Result<Vec<Artist>> {
        let url = self.client.api_url(&format!(
            "me/following?limit={}&type=artist",
            self.page_size
        ));

        let artists = self
            .client
            .paginate(
                url,
                |response: FollowedArtistsResponse| response.artists,
                |_: &[SpotifyArtist]| true,
            )
            .await?;

        info!("Listed {} followed artists", artists.len());

        Ok(artists.into_iter().map(Self::convert_artist).collect())
    }

    #[instrument(skip(self, groups, market))]
    async fn artist_albums(
        &self,
        artist_id: &str,
        groups: &[AlbumGroup],
        market: &Market,
        min_date: &str,
    ) -> Result<Vec<Album>> {
        let mut albums = Vec::new();
        let mut remaining = groups;

        // A listing that ends inside some group means the groups after it
        // were never reached; list those again. An empty listing ends the
        // walk even if later groups were never tried.
        while !remaining.is_empty() {
            let fetched = self
                .albums_in_groups(artist_id, remaining, market, min_date)
                .await?;

            let Some(last_group) = fetched.last().map(|album| album.group) else {
                break;
            };

            let resume_at = remaining
                .iter()
                .position(|group| *group == last_group)
                .map_or(remaining.len(), |index| index + 1);

            albums.extend(fetched);
            remaining = &remaining[resume_at..];
        }

        debug!(count = albums.len(), "Fetched artist albums");

        Ok(albums)
    }

    #[instrument(skip(self, album_ids, market), fields(albums = album_ids.len()))]
    async fn album_track_ids(&self, album_ids: &[String], market: &Market) -> Result<Vec<String>> {
        if album_ids.is_empty() {
            return Ok(Vec::new());
        }
        if album_ids.len() > MAX_ALBUM_IDS {
            return Err(SpotifyError::InvalidInput(format!(
                "At most {} album ids per request, got {}",
                MAX_ALBUM_IDS,
                album_ids.len()
            ))
            .into());
        }

        let url = self.client.api_url(&format!(
            "albums?ids={}&market={}",
            urlencoding::encode(&album_ids.join(",")),
            urlencoding::encode(market.as_str()),
        ));
        let response: SeveralAlbumsResponse = self.client.get(&url).await?;

        let mut track_ids = Vec::new();
        for (album, requested_id) in response.albums.into_iter().zip(album_ids) {
            let Some(album) = album else {
                warn!(album_id = %requested_id, "Album not available, skipping");
                continue;
            };

            track_ids.extend(album.tracks.items.into_iter().map(|track| track.id));

            if let Some(next) = album.tracks.next {
                let rest = self
                    .client
                    .paginate(next, |page: Paged<SpotifyTrack>| page, |_: &[SpotifyTrack]| true)
                    .await?;
                debug!(album_id = %album.id, extra = rest.len(), "Followed album track pages");
                track_ids.extend(rest.into_iter().map(|track| track.id));
            }
        }

        Ok(track_ids)
    }

    #[instrument(skip(self, details), fields(name = %details.name))]
    async fn create_playlist(
        &self,
        owner_id: &str,
        details: &PlaylistDetails,
    ) -> Result<PlaylistHandle> {
        let url = self.client.api_url(&format!(
            "users/{}/playlists",
            urlencoding::encode(owner_id)
        ));
        let body = CreatePlaylistBody {
            name: &details.name,
            description: &details.description,
            public: !details.is_private,
        };

        let playlist: SpotifyPlaylist = self.client.post(&url, &body).await?;
        info!(playlist_id = %playlist.id, "Created playlist");

        Ok(PlaylistHandle {
            id: playlist.id,
            name: playlist.name,
        })
    }

    #[instrument(skip(self, track_uris), fields(tracks = track_uris.len()))]
    async fn add_tracks(&self, playlist_id: &str, track_uris: &[String]) -> Result<()> {
        if track_uris.is_empty() {
            return Ok(());
        }
        if track_uris.len() > MAX_TRACK_URIS {
            return Err(SpotifyError::InvalidInput(format!(
                "At most {} track URIs per request, got {}",
                MAX_TRACK_URIS,
                track_uris.len()
            ))
            .into());
        }

        let url = self.client.api_url(&format!(
            "playlists/{}/tracks",
            urlencoding::encode(playlist_id)
        ));
        let snapshot: PlaylistSnapshot = self
            .client
            .post(&url, &AddTracksBody { uris: track_uris })
            .await?;
        debug!(snapshot_id = %snapshot.snapshot_id, "Appended tracks");

        Ok(())
    }

    fn track_uri(&self, track_id: &str) -> String {
        spotify_uri(track_id, "track")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::error::BridgeError;
    use bridge_traits::http::{HttpRequest, HttpResponse};
    use bytes::Bytes;
    use mockall::mock;
    use std::collections::HashMap;
    use std::sync::Mutex;

    mock! {
        HttpClient {}

        #[async_trait]
        impl HttpClient for HttpClient {
            async fn execute(&self, request: HttpRequest) -> Result<HttpResponse>;
        }
    }

    fn ok(body: &str) -> HttpResponse {
        HttpResponse {
            status: 200,
            status_text: "OK".to_string(),
            headers: HashMap::new(),
            body: Bytes::from(body.to_string()),
        }
    }

    fn album_json(id: &str, group: &str, release_date: &str) -> String {
        format!(
            r#"{{"id":"{id}","name":"Album {id}","album_group":"{group}","release_date":"{release_date}",
                "images":[],"artists":[{{"id":"artist-1","name":"Artist One"}}]}}"#
        )
    }

    fn page_json(albums: &[String], next: Option<&str>) -> String {
        let next = next.map_or("null".to_string(), |url| format!("\"{url}\""));
        format!(r#"{{"items":[{}],"next":{}}}"#, albums.join(","), next)
    }

    fn connector(mock: MockHttpClient) -> SpotifyConnector {
        SpotifyConnector::new(Arc::new(mock), "test_token")
    }

    #[tokio::test]
    async fn test_current_user_picks_300px_image() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute().times(1).returning(|req| {
            assert!(req.url.ends_with("/v1/me"));
            Ok(ok(r#"{
                "id": "wizzler",
                "display_name": "Wizzler",
                "images": [
                    { "url": "https://i.scdn.co/image/64", "width": 64, "height": 64 },
                    { "url": "https://i.scdn.co/image/300", "width": 300, "height": 300 }
                ]
            }"#))
        });

        let user = connector(mock_http).current_user().await.unwrap();

        assert_eq!(user.id, "wizzler");
        assert_eq!(user.name, "Wizzler");
        assert_eq!(user.image.as_deref(), Some("https://i.scdn.co/image/300"));
    }

    #[tokio::test]
    async fn test_followed_artists_follows_pages() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute().times(2).returning(|req| {
            if req.url.contains("after=") {
                Ok(ok(r#"{"artists":{"items":[{"id":"b","name":"B"}],"next":null}}"#))
            } else {
                assert!(req.url.contains("limit=50"));
                assert!(req.url.contains("type=artist"));
                Ok(ok(r#"{"artists":{
                    "items":[{"id":"a","name":"A"}],
                    "next":"https://api.spotify.com/v1/me/following?type=artist&after=a&limit=50"
                }}"#))
            }
        });

        let artists = connector(mock_http).followed_artists().await.unwrap();

        assert_eq!(
            artists.iter().map(|a| a.id.as_str()).collect::<Vec<_>>(),
            vec!["a", "b"]
        );
    }

    #[tokio::test]
    async fn test_artist_albums_stops_paging_at_min_date() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute().times(2).returning(|req| {
            if req.url.ends_with("offset=2") {
                Ok(ok(&page_json(
                    &[
                        album_json("c", "album", "2024-03-05"),
                        album_json("d", "album", "2024-02-01"),
                    ],
                    Some("https://api.spotify.com/v1/artists/artist-1/albums?offset=4"),
                )))
            } else {
                Ok(ok(&page_json(
                    &[
                        album_json("a", "album", "2024-04-01"),
                        album_json("b", "album", "2024-03-20"),
                    ],
                    Some("https://api.spotify.com/v1/artists/artist-1/albums?offset=2"),
                )))
            }
        });

        let albums = connector(mock_http)
            .artist_albums(
                "artist-1",
                &[AlbumGroup::Album],
                &Market::from_token(),
                "2024-03-01",
            )
            .await
            .unwrap();

        // The crossing page is kept whole; the third page is never requested.
        assert_eq!(
            albums.iter().map(|a| a.id.as_str()).collect::<Vec<_>>(),
            vec!["a", "b", "c", "d"]
        );
        assert!(albums.iter().all(|a| a.artist_id == "artist-1"));
    }

    #[tokio::test]
    async fn test_artist_albums_lists_remaining_groups() {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&requests);

        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute().times(3).returning(move |req| {
            seen.lock().unwrap().push(req.url.clone());
            let body = if req.url.contains("include_groups=album%2Csingle%2Ccompilation") {
                page_json(
                    &[
                        album_json("a1", "album", "2024-05-01"),
                        album_json("a2", "album", "2023-01-01"),
                    ],
                    Some("https://api.spotify.com/v1/artists/artist-1/albums?offset=2"),
                )
            } else if req.url.contains("include_groups=single%2Ccompilation") {
                page_json(
                    &[
                        album_json("s1", "single", "2024-04-01"),
                        album_json("s2", "single", "2020-01-01"),
                    ],
                    None,
                )
            } else {
                page_json(&[], None)
            };
            Ok(ok(&body))
        });

        let albums = connector(mock_http)
            .artist_albums(
                "artist-1",
                &[
                    AlbumGroup::Album,
                    AlbumGroup::Single,
                    AlbumGroup::Compilation,
                ],
                &Market::new("SE"),
                "2024-03-01",
            )
            .await
            .unwrap();

        assert_eq!(albums.len(), 4);
        let requests = requests.lock().unwrap();
        assert!(requests[0].contains("market=SE"));
        assert!(requests[2].contains("include_groups=compilation"));
    }

    #[tokio::test]
    async fn test_artist_albums_empty_first_group_skips_later_groups() {
        // Known quirk: nothing in the first listing means later groups are
        // never listed on their own, even if they have fresh releases.
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .times(1)
            .returning(|_| Ok(ok(&page_json(&[], None))));

        let albums = connector(mock_http)
            .artist_albums(
                "artist-1",
                &[AlbumGroup::Album, AlbumGroup::Single],
                &Market::from_token(),
                "2024-03-01",
            )
            .await
            .unwrap();

        assert!(albums.is_empty());
    }

    #[tokio::test]
    async fn test_album_track_ids_follows_nested_pages_and_skips_missing() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute().times(2).returning(|req| {
            if req.url.contains("/albums/a1/tracks") {
                Ok(ok(r#"{"items":[{"id":"t3"}],"next":null}"#))
            } else {
                assert!(req.url.contains("ids=a1%2Cmissing%2Ca2"));
                Ok(ok(r#"{"albums":[
                    {"id":"a1","tracks":{"items":[{"id":"t1"},{"id":"t2"}],
                        "next":"https://api.spotify.com/v1/albums/a1/tracks?offset=2"}},
                    null,
                    {"id":"a2","tracks":{"items":[{"id":"t4"}],"next":null}}
                ]}"#))
            }
        });

        let ids = vec!["a1".to_string(), "missing".to_string(), "a2".to_string()];
        let track_ids = connector(mock_http)
            .album_track_ids(&ids, &Market::from_token())
            .await
            .unwrap();

        assert_eq!(track_ids, vec!["t1", "t2", "t3", "t4"]);
    }

    #[tokio::test]
    async fn test_album_track_ids_rejects_oversized_batch() {
        let ids: Vec<String> = (0..21).map(|i| format!("album-{i}")).collect();
        let result = connector(MockHttpClient::new())
            .album_track_ids(&ids, &Market::from_token())
            .await;

        assert!(matches!(result, Err(BridgeError::OperationFailed(_))));
    }

    #[tokio::test]
    async fn test_create_playlist_maps_privacy() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute().times(1).returning(|req| {
            assert!(req.url.ends_with("/v1/users/wizzler/playlists"));
            let body: serde_json::Value =
                serde_json::from_slice(req.body.as_ref().unwrap()).unwrap();
            assert_eq!(body["name"], "Apr 12 Releases");
            assert_eq!(body["public"], false);
            Ok(ok(r#"{"id":"pl-1","name":"Apr 12 Releases"}"#))
        });

        let details = PlaylistDetails {
            name: "Apr 12 Releases".to_string(),
            description: "Fresh".to_string(),
            is_private: true,
        };
        let handle = connector(mock_http)
            .create_playlist("wizzler", &details)
            .await
            .unwrap();

        assert_eq!(handle.id, "pl-1");
    }

    #[tokio::test]
    async fn test_add_tracks_posts_uris() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute().times(1).returning(|req| {
            assert!(req.url.ends_with("/v1/playlists/pl-1/tracks"));
            let body: serde_json::Value =
                serde_json::from_slice(req.body.as_ref().unwrap()).unwrap();
            assert_eq!(body["uris"][1], "spotify:track:t2");
            Ok(ok(r#"{"snapshot_id":"snap"}"#))
        });

        let connector = connector(mock_http);
        let uris = vec![connector.track_uri("t1"), connector.track_uri("t2")];
        connector.add_tracks("pl-1", &uris).await.unwrap();
    }

    #[tokio::test]
    async fn test_api_error_surfaces_as_http_error() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute().times(1).returning(|_| {
            Ok(HttpResponse {
                status: 403,
                status_text: "Forbidden".to_string(),
                headers: HashMap::new(),
                body: Bytes::from_static(
                    br#"{"error":{"status":403,"message":"Insufficient client scope"}}"#,
                ),
            })
        });

        let result = connector(mock_http).current_user().await;

        assert_eq!(
            result.unwrap_err(),
            BridgeError::Http {
                status: 403,
                status_text: "Forbidden".to_string(),
                message: Some("Insufficient client scope".to_string()),
            }
        );
    }
}
