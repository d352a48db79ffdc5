//! Search adapters: translate a free-text or URL query into normalized
//! tracks for one content source family, plus the router that picks the
//! adapter and applies the fallback policy.

pub mod spotify;
pub mod youtube;

use std::sync::Arc;
use std::time::Duration;

use serenity::async_trait;
use thiserror::Error;
use tracing::{info, warn};

use crate::player::{Requester, SourceKind, Track};

/// Spotify-family collections are capped at this many tracks.
pub const SPOTIFY_PLAYLIST_CAP: usize = 100;
/// YouTube-family playlists are capped at this many tracks.
pub const YOUTUBE_PLAYLIST_CAP: usize = 200;

/// Search failures, each with a distinct user-facing message.
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("no results found")]
    NoResults,

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("search timed out after {0:?}")]
    Timeout(Duration),

    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    #[error("search backend error: {0}")]
    Backend(String),
}

impl SearchError {
    /// The reply shown to the user; every variant reads differently.
    pub fn user_message(&self) -> String {
        match self {
            SearchError::NoResults => {
                "❌ No results found! Check the link or title and try again.".to_string()
            }
            SearchError::Malformed(_) => {
                "❌ The source returned an unexpected response. Try again later.".to_string()
            }
            SearchError::Timeout(_) => {
                "❌ The search took too long and was cancelled.".to_string()
            }
            SearchError::NotConfigured(what) => format!(
                "❌ {} is not configured! Set SPOTIFY_CLIENT_ID and SPOTIFY_CLIENT_SECRET.",
                what
            ),
            SearchError::Backend(e) => format!("❌ Search failed: {}", e),
        }
    }
}

/// Collection metadata when a query resolved to a playlist or album.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistInfo {
    pub title: String,
    pub author: Option<String>,
}

/// Normalized result of a successful search.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub tracks: Vec<Track>,
    pub playlist: Option<PlaylistInfo>,
}

impl SearchOutcome {
    pub fn total_duration(&self) -> Duration {
        self.tracks.iter().filter_map(|t| t.duration).sum()
    }
}

/// One content source family's query resolver.
#[async_trait]
pub trait SearchSource: Send + Sync {
    fn kind(&self) -> SourceKind;

    async fn search(
        &self,
        query: &str,
        requester: &Requester,
    ) -> Result<SearchOutcome, SearchError>;
}

/// Bound a resolved collection to `cap` tracks. Deliberate policy, not a
/// backend limitation; logged, never an error.
pub fn truncate_playlist(tracks: &mut Vec<Track>, cap: usize, context: &str) {
    if tracks.len() > cap {
        info!(
            "{} resolved {} tracks, truncating to {}",
            context,
            tracks.len(),
            cap
        );
        tracks.truncate(cap);
    }
}

/// Picks the adapter for a query and applies the zero-result fallback.
pub struct SourceRouter {
    youtube: Arc<dyn SearchSource>,
    spotify: Option<Arc<dyn SearchSource>>,
}

impl SourceRouter {
    pub fn new(youtube: Arc<dyn SearchSource>, spotify: Option<Arc<dyn SearchSource>>) -> Self {
        Self { youtube, spotify }
    }

    /// Queries carrying a Spotify marker route to the Spotify adapter.
    pub fn is_spotify_query(query: &str) -> bool {
        query.contains("spotify.com") || query.starts_with("spotify:")
    }

    pub fn spotify_configured(&self) -> bool {
        self.spotify.is_some()
    }

    /// Auto policy: Spotify marker → Spotify adapter; everything else →
    /// YouTube, falling back to a Spotify text search on zero results
    /// when credentials are configured.
    pub async fn search(
        &self,
        query: &str,
        requester: &Requester,
    ) -> Result<SearchOutcome, SearchError> {
        if Self::is_spotify_query(query) {
            return self.search_spotify(query, requester).await;
        }

        match self.youtube.search(query, requester).await {
            Err(SearchError::NoResults) => {
                let Some(spotify) = &self.spotify else {
                    return Err(SearchError::NoResults);
                };
                warn!("no YouTube results for '{}', trying Spotify", query);
                spotify.search(query, requester).await
            }
            other => other,
        }
    }

    /// Forced Spotify resolution, used by the `spotify` command.
    pub async fn search_spotify(
        &self,
        query: &str,
        requester: &Requester,
    ) -> Result<SearchOutcome, SearchError> {
        let spotify = self
            .spotify
            .as_ref()
            .ok_or(SearchError::NotConfigured("Spotify"))?;
        spotify.search(query, requester).await
    }
}
