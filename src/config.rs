//! Startup configuration: a JSON file for tunables plus environment
//! variables (via `.env`) for credentials.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::Error;
use crate::player::SessionConfig;
use crate::sources::spotify::SpotifyCredentials;

/// Audio quality hint forwarded to the playback layer and shown in
/// now-playing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AudioQuality {
    #[default]
    High,
    Medium,
    Low,
}

impl AudioQuality {
    pub fn label(&self) -> &'static str {
        match self {
            AudioQuality::High => "HD",
            AudioQuality::Medium => "Standard",
            AudioQuality::Low => "Low",
        }
    }
}

/// Bot configuration loaded once at startup and shared read-only.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Leading marker identifying bot-directed messages.
    pub prefix: String,
    /// Initial volume for new sessions, clamped to [1, 100].
    pub default_volume: u8,
    /// How long to stay connected after everyone leaves the voice channel.
    #[serde(with = "humantime_serde")]
    pub leave_on_empty_cooldown: Duration,
    /// How long to stay connected after the queue runs dry.
    #[serde(with = "humantime_serde")]
    pub leave_on_end_cooldown: Duration,
    /// Upper bound on connecting and starting a track.
    #[serde(with = "humantime_serde")]
    pub buffering_timeout: Duration,
    pub max_queue_size: usize,
    pub audio_quality: AudioQuality,
    /// Optional append-only log file next to the console sink.
    pub log_file: Option<PathBuf>,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            prefix: "!".to_string(),
            default_volume: 70,
            leave_on_empty_cooldown: Duration::from_secs(300),
            leave_on_end_cooldown: Duration::from_secs(300),
            buffering_timeout: Duration::from_secs(30),
            max_queue_size: 1000,
            audio_quality: AudioQuality::High,
            log_file: None,
        }
    }
}

impl BotConfig {
    /// Load the configuration from `CADENCE_CONFIG` (or `./config.json`).
    /// A missing file yields the defaults; an unreadable one is an error.
    pub fn load() -> Result<Self, Error> {
        let path = env::var("CADENCE_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config.json"));

        let mut config = if path.exists() {
            let raw = std::fs::read_to_string(&path)?;
            serde_json::from_str::<BotConfig>(&raw)
                .map_err(|e| format!("invalid config file {}: {}", path.display(), e))?
        } else {
            BotConfig::default()
        };

        config.default_volume = config.default_volume.clamp(1, 100);
        Ok(config)
    }

    /// Defaults handed to the queue factory for every new session.
    pub fn session_defaults(&self) -> SessionConfig {
        SessionConfig {
            volume: self.default_volume.clamp(1, 100),
            leave_on_empty_cooldown: self.leave_on_empty_cooldown,
            leave_on_end_cooldown: self.leave_on_end_cooldown,
            buffering_timeout: self.buffering_timeout,
            max_queue_size: self.max_queue_size,
        }
    }

    pub fn discord_token() -> Result<String, Error> {
        env::var("DISCORD_TOKEN").map_err(|_| "DISCORD_TOKEN not set".into())
    }

    /// Both halves of the Spotify credential pair, or `None`. A missing
    /// pair degrades the Spotify adapter only.
    pub fn spotify_credentials() -> Option<SpotifyCredentials> {
        let client_id = env::var("SPOTIFY_CLIENT_ID").ok()?;
        let client_secret = env::var("SPOTIFY_CLIENT_SECRET").ok()?;
        if client_id.is_empty() || client_secret.is_empty() {
            return None;
        }
        Some(SpotifyCredentials {
            client_id,
            client_secret,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_match_documented_values() {
        let config = BotConfig::default();
        assert_eq!(config.prefix, "!");
        assert_eq!(config.default_volume, 70);
        assert_eq!(config.leave_on_empty_cooldown, Duration::from_secs(300));
        assert_eq!(config.leave_on_end_cooldown, Duration::from_secs(300));
        assert_eq!(config.buffering_timeout, Duration::from_secs(30));
        assert_eq!(config.max_queue_size, 1000);
    }

    #[test]
    fn session_defaults_clamp_volume() {
        let config = BotConfig {
            default_volume: 0,
            ..BotConfig::default()
        };
        assert_eq!(config.session_defaults().volume, 1);

        let config = BotConfig {
            default_volume: 255,
            ..BotConfig::default()
        };
        assert_eq!(config.session_defaults().volume, 100);
    }

    #[test]
    fn config_parses_humantime_durations() {
        let raw = r#"{
            "prefix": "?",
            "default_volume": 85,
            "leave_on_end_cooldown": "2m",
            "buffering_timeout": "10s"
        }"#;
        let config: BotConfig = serde_json::from_str(raw).unwrap();
        assert_eq!(config.prefix, "?");
        assert_eq!(config.default_volume, 85);
        assert_eq!(config.leave_on_end_cooldown, Duration::from_secs(120));
        assert_eq!(config.buffering_timeout, Duration::from_secs(10));
        // untouched fields keep their defaults
        assert_eq!(config.max_queue_size, 1000);
    }
}
