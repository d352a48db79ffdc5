//! YouTube-family adapter. Metadata comes from the `yt-dlp` command-line
//! tool (JSON output); the generic path also accepts any other URL that
//! yt-dlp can extract.

use std::time::Duration;

use serde_json::Value;
use serenity::async_trait;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::info;
use url::Url;

use crate::player::{Requester, SourceKind, Track};

use super::{
    PlaylistInfo, SearchError, SearchOutcome, SearchSource, YOUTUBE_PLAYLIST_CAP,
    truncate_playlist,
};

/// Bounded wait for one yt-dlp invocation.
const SEARCH_TIMEOUT: Duration = Duration::from_secs(20);

pub struct YoutubeSearch {
    timeout: Duration,
}

impl Default for YoutubeSearch {
    fn default() -> Self {
        Self::new()
    }
}

impl YoutubeSearch {
    pub fn new() -> Self {
        Self {
            timeout: SEARCH_TIMEOUT,
        }
    }

    /// Watch pages and youtu.be short links.
    pub fn is_youtube_url(query: &str) -> bool {
        match Url::parse(query) {
            Ok(url) => {
                url.host_str().is_some_and(|host| {
                    host == "www.youtube.com" || host == "youtube.com" || host == "m.youtube.com"
                }) || url.host_str() == Some("youtu.be")
            }
            Err(_) => false,
        }
    }

    /// YouTube URLs carrying a playlist id.
    pub fn is_playlist_url(query: &str) -> bool {
        Self::is_youtube_url(query)
            && Url::parse(query)
                .map(|url| url.query_pairs().any(|(k, _)| k == "list"))
                .unwrap_or(false)
    }

    fn is_url(query: &str) -> bool {
        Url::parse(query).is_ok()
    }

    async fn run_ytdlp(&self, args: &[&str]) -> Result<String, SearchError> {
        let output = timeout(
            self.timeout,
            Command::new("yt-dlp").args(args).kill_on_drop(true).output(),
        )
        .await
        .map_err(|_| SearchError::Timeout(self.timeout))?
        .map_err(|e| SearchError::Backend(format!("failed to run yt-dlp: {}", e)))?;

        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if !output.status.success() && stdout.is_empty() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SearchError::Backend(
                stderr.lines().last().unwrap_or("yt-dlp failed").to_string(),
            ));
        }
        // yt-dlp reports an empty search result as empty output.
        if stdout.is_empty() {
            return Err(SearchError::NoResults);
        }
        Ok(stdout)
    }

    fn parse_single(raw: &str, requester: &Requester) -> Result<SearchOutcome, SearchError> {
        let value: Value = serde_json::from_str(raw)
            .map_err(|e| SearchError::Malformed(format!("invalid yt-dlp output: {}", e)))?;
        let track = track_from_value(&value, requester)?;
        Ok(SearchOutcome {
            tracks: vec![track],
            playlist: None,
        })
    }

    fn parse_playlist(raw: &str, requester: &Requester) -> Result<SearchOutcome, SearchError> {
        let value: Value = serde_json::from_str(raw)
            .map_err(|e| SearchError::Malformed(format!("invalid yt-dlp output: {}", e)))?;

        let entries = value["entries"]
            .as_array()
            .ok_or_else(|| SearchError::Malformed("playlist without entries".to_string()))?;
        if entries.is_empty() {
            return Err(SearchError::NoResults);
        }

        let mut tracks: Vec<Track> = entries
            .iter()
            .filter_map(|entry| track_from_value(entry, requester).ok())
            .collect();
        if tracks.is_empty() {
            return Err(SearchError::Malformed(
                "no playable entries in playlist".to_string(),
            ));
        }
        truncate_playlist(&mut tracks, YOUTUBE_PLAYLIST_CAP, "YouTube playlist");

        let title = value["title"]
            .as_str()
            .unwrap_or("YouTube playlist")
            .to_string();
        let author = value["uploader"]
            .as_str()
            .or_else(|| value["channel"].as_str())
            .map(String::from);

        Ok(SearchOutcome {
            tracks,
            playlist: Some(PlaylistInfo { title, author }),
        })
    }
}

/// Build a normalized track from one yt-dlp JSON object (full or
/// flat-playlist entry).
fn track_from_value(value: &Value, requester: &Requester) -> Result<Track, SearchError> {
    let url = value["webpage_url"]
        .as_str()
        .or_else(|| value["url"].as_str())
        .map(String::from)
        .or_else(|| {
            value["id"]
                .as_str()
                .map(|id| format!("https://www.youtube.com/watch?v={}", id))
        })
        .ok_or_else(|| SearchError::Malformed("entry without a URL".to_string()))?;

    let thumbnail = value["thumbnail"]
        .as_str()
        .map(String::from)
        .or_else(|| {
            value["thumbnails"]
                .as_array()
                .and_then(|list| list.last())
                .and_then(|t| t["url"].as_str())
                .map(String::from)
        });

    Ok(Track {
        title: value["title"].as_str().unwrap_or("Unknown Title").to_string(),
        url: Some(url),
        search_hint: None,
        duration: value["duration"].as_f64().map(Duration::from_secs_f64),
        thumbnail,
        author: value["uploader"]
            .as_str()
            .or_else(|| value["channel"].as_str())
            .map(String::from),
        source: SourceKind::Youtube,
        requested_by: requester.clone(),
    })
}

#[async_trait]
impl SearchSource for YoutubeSearch {
    fn kind(&self) -> SourceKind {
        SourceKind::Youtube
    }

    async fn search(
        &self,
        query: &str,
        requester: &Requester,
    ) -> Result<SearchOutcome, SearchError> {
        if Self::is_playlist_url(query) {
            info!("resolving YouTube playlist: {}", query);
            let raw = self.run_ytdlp(&["-J", "--flat-playlist", query]).await?;
            return Self::parse_playlist(&raw, requester);
        }

        if Self::is_url(query) {
            info!("resolving URL via yt-dlp: {}", query);
            let raw = self.run_ytdlp(&["-j", "--no-playlist", query]).await?;
            return Self::parse_single(&raw, requester);
        }

        info!("searching YouTube for: {}", query);
        let search = format!("ytsearch1:{}", query);
        let raw = self.run_ytdlp(&["-j", "--no-playlist", &search]).await?;
        Self::parse_single(&raw, requester)
    }
}
