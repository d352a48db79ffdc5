//! Per-destination playback sessions: the queue factory, the session
//! queue itself, the voice-driver seam, and the engine event stream.

pub mod connector;
pub mod events;
pub mod manager;
pub mod session;
pub mod track;

use std::time::Duration;

use thiserror::Error;

pub use connector::{PlayingTrack, VoiceConnection, VoiceConnector};
pub use events::PlayerEvent;
pub use manager::PlayerManager;
pub use session::{QueueSnapshot, SessionConfig, SessionMetadata, SessionQueue};
pub use track::{PlayTarget, RepeatMode, Requester, SourceKind, Track};

/// Errors from playback sessions and the voice driver seam.
#[derive(Error, Debug)]
pub enum PlayerError {
    #[error("failed to join voice channel: {0}")]
    Join(String),

    #[error("voice connection timed out after {0:?}")]
    ConnectTimeout(Duration),

    #[error("no active queue for this server")]
    NoQueue,

    #[error("nothing is currently playing")]
    NothingPlaying,

    #[error("track '{0}' has no playable source")]
    MissingSource(String),

    #[error("audio backend error: {0}")]
    Backend(String),
}

/// Result type for playback operations.
pub type PlayerResult<T> = Result<T, PlayerError>;
