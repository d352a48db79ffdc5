//! Spotify-family adapter: resolves tracks, playlists and albums through
//! the Spotify Web API (client-credentials flow), then hands each track a
//! YouTube search query so playback can resolve an actual stream.

use std::sync::LazyLock;
use std::time::{Duration, Instant};

use base64::Engine;
use base64::prelude::BASE64_STANDARD;
use regex::Regex;
use reqwest::header;
use serde::Deserialize;
use serde_json::Value;
use serenity::async_trait;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, info};

use crate::player::{Requester, SourceKind, Track};

use super::{
    PlaylistInfo, SearchError, SearchOutcome, SearchSource, SPOTIFY_PLAYLIST_CAP,
    truncate_playlist,
};

/// Bounded wait for one full Spotify resolution (token + pages).
const SEARCH_TIMEOUT: Duration = Duration::from_secs(30);

const API_BASE: &str = "https://api.spotify.com/v1";
const TOKEN_URL: &str = "https://accounts.spotify.com/api/token";

static TRACK_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(https?://)?(open\.spotify\.com|spotify)/track/([a-zA-Z0-9]+)(\?.*)?$").unwrap()
});

static PLAYLIST_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(https?://)?(open\.spotify\.com|spotify)/playlist/([a-zA-Z0-9]+)(\?.*)?$")
        .unwrap()
});

static ALBUM_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(https?://)?(open\.spotify\.com|spotify)/album/([a-zA-Z0-9]+)(\?.*)?$").unwrap()
});

/// Client id/secret pair for the client-credentials flow.
#[derive(Debug, Clone)]
pub struct SpotifyCredentials {
    pub client_id: String,
    pub client_secret: String,
}

fn preview(secret: &str) -> String {
    let shown: String = secret.chars().take(5).collect();
    format!("{}...", shown)
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[allow(dead_code)]
    token_type: String,
    expires_in: u64,
}

struct CachedToken {
    access_token: String,
    expires_in: u64,
    created_at: Instant,
}

impl CachedToken {
    /// Treat the token as expired 30 seconds early to leave a buffer.
    fn is_expired(&self) -> bool {
        let expiry = Duration::from_secs(self.expires_in);
        self.created_at.elapsed() > expiry.saturating_sub(Duration::from_secs(30))
    }
}

pub struct SpotifySearch {
    credentials: SpotifyCredentials,
    http: reqwest::Client,
    token: Mutex<Option<CachedToken>>,
    api_base: String,
    token_url: String,
    timeout: Duration,
}

impl SpotifySearch {
    pub fn new(credentials: SpotifyCredentials, http: reqwest::Client) -> Self {
        info!(
            "Spotify adapter configured (client id {})",
            preview(&credentials.client_id)
        );
        Self::with_endpoints(credentials, http, API_BASE.into(), TOKEN_URL.into())
    }

    /// Endpoint injection for tests against a local mock server.
    pub fn with_endpoints(
        credentials: SpotifyCredentials,
        http: reqwest::Client,
        api_base: String,
        token_url: String,
    ) -> Self {
        Self {
            credentials,
            http,
            token: Mutex::new(None),
            api_base,
            token_url,
            timeout: SEARCH_TIMEOUT,
        }
    }

    pub fn extract_track_id(query: &str) -> Option<String> {
        if let Some(id) = query.strip_prefix("spotify:track:") {
            return Some(id.to_string());
        }
        TRACK_REGEX
            .captures(query)
            .and_then(|cap| cap.get(3))
            .map(|m| m.as_str().to_string())
    }

    pub fn extract_playlist_id(query: &str) -> Option<String> {
        PLAYLIST_REGEX
            .captures(query)
            .and_then(|cap| cap.get(3))
            .map(|m| m.as_str().to_string())
    }

    pub fn extract_album_id(query: &str) -> Option<String> {
        ALBUM_REGEX
            .captures(query)
            .and_then(|cap| cap.get(3))
            .map(|m| m.as_str().to_string())
    }

    /// Return a valid access token, requesting a fresh one when the
    /// cached token is missing or about to expire.
    async fn access_token(&self) -> Result<String, SearchError> {
        let mut cache = self.token.lock().await;
        if let Some(token) = &*cache {
            if !token.is_expired() {
                return Ok(token.access_token.clone());
            }
        }

        let auth = BASE64_STANDARD.encode(format!(
            "{}:{}",
            self.credentials.client_id, self.credentials.client_secret
        ));
        let params = [("grant_type", "client_credentials")];
        let response = self
            .http
            .post(&self.token_url)
            .header(header::AUTHORIZATION, format!("Basic {}", auth))
            .form(&params)
            .send()
            .await
            .map_err(|e| SearchError::Backend(format!("Spotify token request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(SearchError::Backend(format!(
                "Spotify token endpoint returned {}",
                status
            )));
        }

        let token = response
            .json::<TokenResponse>()
            .await
            .map_err(|e| SearchError::Malformed(format!("bad token response: {}", e)))?;

        let access_token = token.access_token.clone();
        *cache = Some(CachedToken {
            access_token: token.access_token,
            expires_in: token.expires_in,
            created_at: Instant::now(),
        });
        Ok(access_token)
    }

    async fn get_json(&self, url: &str, token: &str) -> Result<Value, SearchError> {
        let response = self
            .http
            .get(url)
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .send()
            .await
            .map_err(|e| SearchError::Backend(format!("Spotify request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(SearchError::Backend(format!(
                "Spotify API returned {}",
                status
            )));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| SearchError::Malformed(format!("bad Spotify response: {}", e)))
    }

    async fn resolve(
        &self,
        query: &str,
        requester: &Requester,
    ) -> Result<SearchOutcome, SearchError> {
        if let Some(id) = Self::extract_track_id(query) {
            return self.resolve_track(&id, requester).await;
        }
        if let Some(id) = Self::extract_playlist_id(query) {
            return self.resolve_playlist(&id, requester).await;
        }
        if let Some(id) = Self::extract_album_id(query) {
            return self.resolve_album(&id, requester).await;
        }
        self.text_search(query, requester).await
    }

    async fn resolve_track(
        &self,
        id: &str,
        requester: &Requester,
    ) -> Result<SearchOutcome, SearchError> {
        let token = self.access_token().await?;
        let data = self
            .get_json(&format!("{}/tracks/{}", self.api_base, id), &token)
            .await?;
        let track = track_from_item(&data, requester, None)
            .ok_or_else(|| SearchError::Malformed("track without a name".to_string()))?;
        Ok(SearchOutcome {
            tracks: vec![track],
            playlist: None,
        })
    }

    async fn resolve_playlist(
        &self,
        id: &str,
        requester: &Requester,
    ) -> Result<SearchOutcome, SearchError> {
        let token = self.access_token().await?;

        let details = self
            .get_json(
                &format!(
                    "{}/playlists/{}?fields=name,owner(display_name)",
                    self.api_base, id
                ),
                &token,
            )
            .await?;
        let title = details["name"]
            .as_str()
            .unwrap_or("Spotify playlist")
            .to_string();
        let author = details["owner"]["display_name"].as_str().map(String::from);

        let mut tracks = Vec::new();
        let mut page_url = format!("{}/playlists/{}/tracks?limit=50", self.api_base, id);
        loop {
            let page = self.get_json(&page_url, &token).await?;
            let items = page["items"]
                .as_array()
                .ok_or_else(|| SearchError::Malformed("playlist page without items".to_string()))?;
            for item in items {
                // Local files carry no Spotify id and are skipped.
                if item["track"]["id"].is_null() {
                    continue;
                }
                if let Some(track) = track_from_item(&item["track"], requester, None) {
                    tracks.push(track);
                }
            }
            match page["next"].as_str() {
                Some(next) if tracks.len() <= SPOTIFY_PLAYLIST_CAP => page_url = next.to_string(),
                _ => break,
            }
        }

        if tracks.is_empty() {
            return Err(SearchError::NoResults);
        }
        truncate_playlist(&mut tracks, SPOTIFY_PLAYLIST_CAP, "Spotify playlist");
        debug!("resolved {} tracks from playlist '{}'", tracks.len(), title);

        Ok(SearchOutcome {
            tracks,
            playlist: Some(PlaylistInfo { title, author }),
        })
    }

    async fn resolve_album(
        &self,
        id: &str,
        requester: &Requester,
    ) -> Result<SearchOutcome, SearchError> {
        let token = self.access_token().await?;
        let album = self
            .get_json(&format!("{}/albums/{}", self.api_base, id), &token)
            .await?;

        let title = album["name"].as_str().unwrap_or("Spotify album").to_string();
        let author = artist_names(&album["artists"]);
        let cover = album["images"][0]["url"].as_str().map(String::from);

        let mut tracks = Vec::new();
        let mut page = album["tracks"].clone();
        loop {
            let items = page["items"]
                .as_array()
                .ok_or_else(|| SearchError::Malformed("album page without items".to_string()))?;
            for item in items {
                if item["id"].is_null() {
                    continue;
                }
                if let Some(track) = track_from_item(item, requester, cover.as_deref()) {
                    tracks.push(track);
                }
            }
            let next_url = page["next"].as_str().map(String::from);
            match next_url {
                Some(next) if tracks.len() <= SPOTIFY_PLAYLIST_CAP => {
                    page = self.get_json(&next, &token).await?;
                }
                _ => break,
            }
        }

        if tracks.is_empty() {
            return Err(SearchError::NoResults);
        }
        truncate_playlist(&mut tracks, SPOTIFY_PLAYLIST_CAP, "Spotify album");

        Ok(SearchOutcome {
            tracks,
            playlist: Some(PlaylistInfo { title, author }),
        })
    }

    async fn text_search(
        &self,
        query: &str,
        requester: &Requester,
    ) -> Result<SearchOutcome, SearchError> {
        let token = self.access_token().await?;
        let response = self
            .http
            .get(format!("{}/search", self.api_base))
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .query(&[("q", query), ("type", "track"), ("limit", "1")])
            .send()
            .await
            .map_err(|e| SearchError::Backend(format!("Spotify request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(SearchError::Backend(format!(
                "Spotify API returned {}",
                status
            )));
        }

        let data = response
            .json::<Value>()
            .await
            .map_err(|e| SearchError::Malformed(format!("bad Spotify response: {}", e)))?;

        let items = data["tracks"]["items"]
            .as_array()
            .ok_or_else(|| SearchError::Malformed("search response without tracks".to_string()))?;
        let track = items
            .first()
            .and_then(|item| track_from_item(item, requester, None))
            .ok_or(SearchError::NoResults)?;

        Ok(SearchOutcome {
            tracks: vec![track],
            playlist: None,
        })
    }
}

fn artist_names(artists: &Value) -> Option<String> {
    let names: Vec<&str> = artists
        .as_array()?
        .iter()
        .filter_map(|a| a["name"].as_str())
        .collect();
    if names.is_empty() {
        None
    } else {
        Some(names.join(", "))
    }
}

/// Build a normalized track from one Spotify track object. The playable
/// stream is found later through the attached YouTube search query.
fn track_from_item(item: &Value, requester: &Requester, cover: Option<&str>) -> Option<Track> {
    let name = item["name"].as_str()?;
    let artists = artist_names(&item["artists"]);
    let search_hint = match &artists {
        Some(artists) => format!("{} by {} audio", name, artists),
        None => format!("{} audio", name),
    };

    Some(Track {
        title: name.to_string(),
        url: item["external_urls"]["spotify"].as_str().map(String::from),
        search_hint: Some(search_hint),
        duration: item["duration_ms"].as_u64().map(Duration::from_millis),
        thumbnail: item["album"]["images"][0]["url"]
            .as_str()
            .map(String::from)
            .or_else(|| cover.map(String::from)),
        author: artists,
        source: SourceKind::Spotify,
        requested_by: requester.clone(),
    })
}

#[async_trait]
impl SearchSource for SpotifySearch {
    fn kind(&self) -> SourceKind {
        SourceKind::Spotify
    }

    async fn search(
        &self,
        query: &str,
        requester: &Requester,
    ) -> Result<SearchOutcome, SearchError> {
        match timeout(self.timeout, self.resolve(query, requester)).await {
            Ok(result) => result,
            Err(_) => Err(SearchError::Timeout(self.timeout)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serenity::model::id::UserId;

    fn requester() -> Requester {
        Requester {
            id: UserId::new(7),
            name: "tester".into(),
        }
    }

    #[test]
    fn extracts_ids_from_urls_and_uris() {
        assert_eq!(
            SpotifySearch::extract_track_id(
                "https://open.spotify.com/track/4cOdK2wGLETKBW3PvgPWqT?si=xyz"
            )
            .as_deref(),
            Some("4cOdK2wGLETKBW3PvgPWqT")
        );
        assert_eq!(
            SpotifySearch::extract_track_id("spotify:track:4cOdK2wGLETKBW3PvgPWqT").as_deref(),
            Some("4cOdK2wGLETKBW3PvgPWqT")
        );
        assert_eq!(
            SpotifySearch::extract_playlist_id("https://open.spotify.com/playlist/37i9dQ")
                .as_deref(),
            Some("37i9dQ")
        );
        assert_eq!(
            SpotifySearch::extract_album_id("https://open.spotify.com/album/6dVIqQ8q").as_deref(),
            Some("6dVIqQ8q")
        );
        assert_eq!(SpotifySearch::extract_track_id("just a song name"), None);
    }

    #[test]
    fn token_expiry_has_a_buffer() {
        let token = CachedToken {
            access_token: "tok".into(),
            expires_in: 20,
            created_at: Instant::now() - Duration::from_secs(1),
        };
        // expires_in below the 30s buffer counts as already expired
        assert!(token.is_expired());

        let token = CachedToken {
            access_token: "tok".into(),
            expires_in: 3600,
            created_at: Instant::now(),
        };
        assert!(!token.is_expired());
    }

    #[test]
    fn builds_search_hint_from_track_item() {
        let item: Value = serde_json::from_str(
            r#"{
                "name": "Song",
                "artists": [{"name": "A"}, {"name": "B"}],
                "duration_ms": 215000,
                "external_urls": {"spotify": "https://open.spotify.com/track/x"},
                "album": {"images": [{"url": "https://img.example/c.jpg"}]}
            }"#,
        )
        .unwrap();
        let track = track_from_item(&item, &requester(), None).unwrap();
        assert_eq!(track.search_hint.as_deref(), Some("Song by A, B audio"));
        assert_eq!(track.duration, Some(Duration::from_millis(215_000)));
        assert_eq!(track.author.as_deref(), Some("A, B"));
        assert_eq!(track.source, SourceKind::Spotify);
        assert_eq!(
            track.thumbnail.as_deref(),
            Some("https://img.example/c.jpg")
        );
    }

    #[test]
    fn nameless_item_is_rejected() {
        let item: Value = serde_json::from_str(r#"{"artists": []}"#).unwrap();
        assert!(track_from_item(&item, &requester(), None).is_none());
    }
}
