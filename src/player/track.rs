//! Normalized track representation produced once at the adapter boundary.
//! Downstream code never sniffs source-specific shapes.

use std::time::Duration;

use serenity::model::id::UserId;

/// Which content source family a track was resolved from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Youtube,
    Spotify,
}

impl SourceKind {
    pub fn label(&self) -> &'static str {
        match self {
            SourceKind::Youtube => "YouTube",
            SourceKind::Spotify => "Spotify",
        }
    }
}

/// The user a track was queued for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requester {
    pub id: UserId,
    pub name: String,
}

/// What the playback layer should feed the driver for a track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayTarget {
    /// A direct media page URL.
    Url(String),
    /// A text search resolved by the extractor at play time.
    Search(String),
}

/// Immutable track metadata attached to exactly one queue position.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub title: String,
    /// Display/browse URL, also playable for YouTube-family tracks.
    pub url: Option<String>,
    /// Search query used to resolve playback for tracks whose source does
    /// not expose a direct stream (Spotify).
    pub search_hint: Option<String>,
    pub duration: Option<Duration>,
    pub thumbnail: Option<String>,
    pub author: Option<String>,
    pub source: SourceKind,
    pub requested_by: Requester,
}

impl Track {
    pub fn playback_target(&self) -> Option<PlayTarget> {
        if let Some(hint) = &self.search_hint {
            return Some(PlayTarget::Search(hint.clone()));
        }
        self.url.clone().map(PlayTarget::Url)
    }
}

/// Queue repetition behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RepeatMode {
    #[default]
    Off,
    Track,
    Queue,
}

impl RepeatMode {
    /// Next mode when cycling without an explicit argument.
    pub fn cycled(self) -> Self {
        match self {
            RepeatMode::Off => RepeatMode::Track,
            RepeatMode::Track => RepeatMode::Queue,
            RepeatMode::Queue => RepeatMode::Off,
        }
    }

    /// Parse an explicit user argument, accepting the common aliases.
    pub fn parse(arg: &str) -> Option<Self> {
        match arg.to_lowercase().as_str() {
            "off" | "disable" => Some(RepeatMode::Off),
            "track" | "song" => Some(RepeatMode::Track),
            "queue" | "all" => Some(RepeatMode::Queue),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RepeatMode::Off => "off",
            RepeatMode::Track => "current track",
            RepeatMode::Queue => "entire queue",
        }
    }
}
