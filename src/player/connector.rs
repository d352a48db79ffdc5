//! Seam between playback sessions and the voice driver. The songbird
//! implementation lives here; tests substitute their own.

use std::sync::Arc;

use serenity::async_trait;
use serenity::model::id::{ChannelId, GuildId};
use serenity::prelude::Mutex as SerenityMutex;
use songbird::input::YoutubeDl;
use songbird::tracks::{PlayMode, TrackHandle};
use songbird::{Call, CoreEvent, Event, EventContext, Songbird, TrackEvent};
use tokio::sync::mpsc::UnboundedSender;
use tracing::warn;

use super::events::PlayerEvent;
use super::track::{PlayTarget, Track};
use super::{PlayerError, PlayerResult};

/// Joins voice channels on behalf of the queue factory.
#[async_trait]
pub trait VoiceConnector: Send + Sync {
    async fn connect(
        &self,
        guild: GuildId,
        channel: ChannelId,
    ) -> PlayerResult<Arc<dyn VoiceConnection>>;
}

/// An established voice connection bound to one channel.
#[async_trait]
pub trait VoiceConnection: Send + Sync {
    fn channel_id(&self) -> ChannelId;

    /// Start playing a track at the given volume. `seq` tags the driver
    /// callbacks so stale end/error events can be discarded.
    async fn start(
        &self,
        track: &Track,
        volume: u8,
        seq: u64,
    ) -> PlayerResult<Box<dyn PlayingTrack>>;

    async fn disconnect(&self) -> PlayerResult<()>;
}

/// Control handle for the track currently playing on a connection.
pub trait PlayingTrack: Send + Sync {
    fn pause(&self) -> PlayerResult<()>;
    fn resume(&self) -> PlayerResult<()>;
    fn stop(&self) -> PlayerResult<()>;
    fn set_volume(&self, volume: u8) -> PlayerResult<()>;
}

fn backend(e: impl std::fmt::Display) -> PlayerError {
    PlayerError::Backend(e.to_string())
}

/// [`VoiceConnector`] backed by songbird.
pub struct SongbirdConnector {
    songbird: Arc<Songbird>,
    http: reqwest::Client,
    events: UnboundedSender<PlayerEvent>,
}

impl SongbirdConnector {
    pub fn new(
        songbird: Arc<Songbird>,
        http: reqwest::Client,
        events: UnboundedSender<PlayerEvent>,
    ) -> Self {
        Self {
            songbird,
            http,
            events,
        }
    }
}

#[async_trait]
impl VoiceConnector for SongbirdConnector {
    async fn connect(
        &self,
        guild: GuildId,
        channel: ChannelId,
    ) -> PlayerResult<Arc<dyn VoiceConnection>> {
        let call = self
            .songbird
            .join(guild, channel)
            .await
            .map_err(|e| PlayerError::Join(e.to_string()))?;

        {
            let mut handler = call.lock().await;
            handler.add_global_event(
                Event::Core(CoreEvent::DriverDisconnect),
                DriverDisconnectNotifier {
                    guild,
                    events: self.events.clone(),
                },
            );
            if let Err(e) = handler.deafen(true).await {
                warn!("failed to self-deafen in guild {}: {}", guild, e);
            }
        }

        Ok(Arc::new(SongbirdConnection {
            guild,
            channel,
            call,
            songbird: self.songbird.clone(),
            http: self.http.clone(),
            events: self.events.clone(),
        }))
    }
}

struct SongbirdConnection {
    guild: GuildId,
    channel: ChannelId,
    call: Arc<SerenityMutex<Call>>,
    songbird: Arc<Songbird>,
    http: reqwest::Client,
    events: UnboundedSender<PlayerEvent>,
}

#[async_trait]
impl VoiceConnection for SongbirdConnection {
    fn channel_id(&self) -> ChannelId {
        self.channel
    }

    async fn start(
        &self,
        track: &Track,
        volume: u8,
        seq: u64,
    ) -> PlayerResult<Box<dyn PlayingTrack>> {
        let target = track
            .playback_target()
            .ok_or_else(|| PlayerError::MissingSource(track.title.clone()))?;

        let source = match target {
            PlayTarget::Url(url) => YoutubeDl::new(self.http.clone(), url),
            PlayTarget::Search(query) => YoutubeDl::new_search(self.http.clone(), query),
        };

        let mut handler = self.call.lock().await;
        let handle = handler.play_input(source.into());
        handle.set_volume(volume as f32 / 100.0).map_err(backend)?;
        handle
            .add_event(
                Event::Track(TrackEvent::End),
                TrackEndNotifier {
                    guild: self.guild,
                    seq,
                    events: self.events.clone(),
                },
            )
            .map_err(backend)?;
        handle
            .add_event(
                Event::Track(TrackEvent::Error),
                TrackErrorNotifier {
                    guild: self.guild,
                    seq,
                    events: self.events.clone(),
                },
            )
            .map_err(backend)?;

        Ok(Box::new(SongbirdTrack { handle }))
    }

    async fn disconnect(&self) -> PlayerResult<()> {
        self.songbird
            .remove(self.guild)
            .await
            .map_err(|e| PlayerError::Join(e.to_string()))
    }
}

struct SongbirdTrack {
    handle: TrackHandle,
}

impl PlayingTrack for SongbirdTrack {
    fn pause(&self) -> PlayerResult<()> {
        self.handle.pause().map_err(backend)
    }

    fn resume(&self) -> PlayerResult<()> {
        self.handle.play().map_err(backend)
    }

    fn stop(&self) -> PlayerResult<()> {
        self.handle.stop().map_err(backend)
    }

    fn set_volume(&self, volume: u8) -> PlayerResult<()> {
        self.handle
            .set_volume(volume as f32 / 100.0)
            .map_err(backend)
    }
}

/// Forwards track-end callbacks into the event stream.
struct TrackEndNotifier {
    guild: GuildId,
    seq: u64,
    events: UnboundedSender<PlayerEvent>,
}

#[async_trait]
impl songbird::EventHandler for TrackEndNotifier {
    async fn act(&self, ctx: &EventContext<'_>) -> Option<Event> {
        if let EventContext::Track(_) = ctx {
            let _ = self.events.send(PlayerEvent::TrackFinished {
                guild: self.guild,
                seq: self.seq,
            });
        }
        None
    }
}

/// Forwards driver playback errors into the event stream.
struct TrackErrorNotifier {
    guild: GuildId,
    seq: u64,
    events: UnboundedSender<PlayerEvent>,
}

#[async_trait]
impl songbird::EventHandler for TrackErrorNotifier {
    async fn act(&self, ctx: &EventContext<'_>) -> Option<Event> {
        if let EventContext::Track(list) = ctx {
            let reason = list
                .first()
                .map(|(state, _)| match &state.playing {
                    PlayMode::Errored(e) => e.to_string(),
                    other => format!("unexpected track state: {:?}", other),
                })
                .unwrap_or_else(|| "unknown playback error".to_string());

            let _ = self.events.send(PlayerEvent::TrackFailed {
                guild: self.guild,
                seq: self.seq,
                reason,
            });
        }
        None
    }
}

struct DriverDisconnectNotifier {
    guild: GuildId,
    events: UnboundedSender<PlayerEvent>,
}

#[async_trait]
impl songbird::EventHandler for DriverDisconnectNotifier {
    async fn act(&self, ctx: &EventContext<'_>) -> Option<Event> {
        if let EventContext::DriverDisconnect(_) = ctx {
            let _ = self
                .events
                .send(PlayerEvent::ConnectionLost { guild: self.guild });
        }
        None
    }
}
