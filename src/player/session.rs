//! The per-destination session queue: current track, pending tracks,
//! volume, repeat mode, and the voice connection they share.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use serenity::model::id::{ChannelId, GuildId};
use tokio::sync::Mutex;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::reply::Responder;

use super::connector::{PlayingTrack, VoiceConnection};
use super::events::PlayerEvent;
use super::track::{RepeatMode, Track};
use super::{PlayerError, PlayerResult};

/// Fixed configuration a session is created with. Repeated factory calls
/// never reset these.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub volume: u8,
    pub leave_on_empty_cooldown: Duration,
    pub leave_on_end_cooldown: Duration,
    pub buffering_timeout: Duration,
    pub max_queue_size: usize,
}

/// Where a session reports back to: the text channel that created it.
#[derive(Clone)]
pub struct SessionMetadata {
    pub responder: Arc<dyn Responder>,
}

/// Why the queue is moving on from the current track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceReason {
    Finished,
    Errored,
}

/// Read-only copy of the queue state for rendering and tests.
#[derive(Clone)]
pub struct QueueSnapshot {
    pub current: Option<Track>,
    pub pending: Vec<Track>,
    pub volume: u8,
    pub repeat: RepeatMode,
    pub paused: bool,
}

struct SessionState {
    current: Option<(Track, Box<dyn PlayingTrack>, u64)>,
    pending: VecDeque<Track>,
    volume: u8,
    repeat: RepeatMode,
    paused: bool,
    /// Suppresses repeat-track replay when the advance came from `skip`.
    skip_pending: bool,
    /// Set during shutdown so late driver callbacks become no-ops.
    stopping: bool,
    /// Monotonic tag for the current playback; stale driver callbacks
    /// carry an older value and are discarded.
    play_seq: u64,
    leave_timer: Option<JoinHandle<()>>,
}

impl SessionState {
    fn cancel_leave(&mut self) {
        if let Some(timer) = self.leave_timer.take() {
            timer.abort();
        }
    }
}

pub struct SessionQueue {
    guild: GuildId,
    connection: Arc<dyn VoiceConnection>,
    config: SessionConfig,
    metadata: SessionMetadata,
    events: UnboundedSender<PlayerEvent>,
    state: Mutex<SessionState>,
}

impl SessionQueue {
    pub fn new(
        guild: GuildId,
        connection: Arc<dyn VoiceConnection>,
        config: SessionConfig,
        metadata: SessionMetadata,
        events: UnboundedSender<PlayerEvent>,
    ) -> Self {
        let volume = config.volume.clamp(1, 100);
        Self {
            guild,
            connection,
            config,
            metadata,
            events,
            state: Mutex::new(SessionState {
                current: None,
                pending: VecDeque::new(),
                volume,
                repeat: RepeatMode::Off,
                paused: false,
                skip_pending: false,
                stopping: false,
                play_seq: 0,
                leave_timer: None,
            }),
        }
    }

    pub fn guild(&self) -> GuildId {
        self.guild
    }

    pub fn voice_channel(&self) -> ChannelId {
        self.connection.channel_id()
    }

    pub fn responder(&self) -> Arc<dyn Responder> {
        self.metadata.responder.clone()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Append tracks, bounded by the configured queue size. Returns how
    /// many were accepted and how many were dropped.
    pub async fn enqueue(&self, tracks: Vec<Track>) -> (usize, usize) {
        let mut state = self.state.lock().await;
        state.cancel_leave();

        let occupied = state.pending.len() + state.current.is_some() as usize;
        let room = self.config.max_queue_size.saturating_sub(occupied);
        let total = tracks.len();
        let added = total.min(room);
        state.pending.extend(tracks.into_iter().take(added));

        if added < total {
            warn!(
                "queue for guild {} is full ({}), dropped {} track(s)",
                self.guild,
                self.config.max_queue_size,
                total - added
            );
        }
        (added, total - added)
    }

    /// Number of tracks ahead of a newly queued one (current included).
    pub async fn queue_len(&self) -> usize {
        let state = self.state.lock().await;
        state.pending.len() + state.current.is_some() as usize
    }

    pub async fn is_playing(&self) -> bool {
        self.state.lock().await.current.is_some()
    }

    pub async fn is_paused(&self) -> bool {
        self.state.lock().await.paused
    }

    pub async fn volume(&self) -> u8 {
        self.state.lock().await.volume
    }

    pub async fn repeat(&self) -> RepeatMode {
        self.state.lock().await.repeat
    }

    pub async fn set_repeat(&self, mode: RepeatMode) {
        self.state.lock().await.repeat = mode;
    }

    pub async fn snapshot(&self) -> QueueSnapshot {
        let state = self.state.lock().await;
        QueueSnapshot {
            current: state.current.as_ref().map(|(track, _, _)| track.clone()),
            pending: state.pending.iter().cloned().collect(),
            volume: state.volume,
            repeat: state.repeat,
            paused: state.paused,
        }
    }

    /// Start playback when nothing is playing; otherwise a no-op.
    pub async fn play_if_idle(&self) {
        let idle = {
            let state = self.state.lock().await;
            state.current.is_none() && !state.stopping
        };
        if idle {
            self.start_next().await;
        }
    }

    pub async fn pause(&self) -> PlayerResult<Track> {
        let mut state = self.state.lock().await;
        let (track, handle, _) = state.current.as_ref().ok_or(PlayerError::NothingPlaying)?;
        handle.pause()?;
        let track = track.clone();
        state.paused = true;
        Ok(track)
    }

    pub async fn resume(&self) -> PlayerResult<Track> {
        let mut state = self.state.lock().await;
        let (track, handle, _) = state.current.as_ref().ok_or(PlayerError::NothingPlaying)?;
        handle.resume()?;
        let track = track.clone();
        state.paused = false;
        Ok(track)
    }

    /// Stop the current track; the driver's end callback drives the
    /// actual advance. Returns the skipped track.
    pub async fn skip(&self) -> PlayerResult<Track> {
        let mut state = self.state.lock().await;
        let (track, stopped) = {
            let (track, handle, _) =
                state.current.as_ref().ok_or(PlayerError::NothingPlaying)?;
            (track.clone(), handle.stop())
        };
        stopped?;
        state.skip_pending = true;
        Ok(track)
    }

    /// Store the volume and apply it to the playing track, if any.
    pub async fn set_volume(&self, volume: u8) -> PlayerResult<()> {
        let mut state = self.state.lock().await;
        if let Some((_, handle, _)) = state.current.as_ref() {
            handle.set_volume(volume)?;
        }
        state.volume = volume;
        Ok(())
    }

    /// Move on from the current track. Driven by the event stream; `seq`
    /// must match the playback that triggered the callback.
    pub async fn advance(&self, reason: AdvanceReason, seq: u64) {
        {
            let mut state = self.state.lock().await;
            if state.stopping {
                return;
            }
            if seq != state.play_seq {
                debug!(
                    "discarding stale driver callback for guild {} (seq {} != {})",
                    self.guild, seq, state.play_seq
                );
                return;
            }

            let finished = state.current.take();
            state.paused = false;
            let skipped = std::mem::take(&mut state.skip_pending);
            let repeat = state.repeat;
            if let Some((track, _, _)) = finished {
                match repeat {
                    RepeatMode::Track if !skipped && reason == AdvanceReason::Finished => {
                        state.pending.push_front(track)
                    }
                    RepeatMode::Queue => state.pending.push_back(track),
                    _ => {}
                }
            }
        }
        self.start_next().await;
    }

    async fn start_next(&self) {
        let next = {
            let mut state = self.state.lock().await;
            if state.stopping {
                return;
            }
            state.pending.pop_front()
        };

        match next {
            Some(track) => self.start_track(track).await,
            None => {
                let _ = self.events.send(PlayerEvent::QueueEmpty { guild: self.guild });
            }
        }
    }

    async fn start_track(&self, track: Track) {
        let (volume, seq) = {
            let mut state = self.state.lock().await;
            state.play_seq += 1;
            (state.volume, state.play_seq)
        };

        let started = timeout(
            self.config.buffering_timeout,
            self.connection.start(&track, volume, seq),
        )
        .await;

        match started {
            Ok(Ok(handle)) => {
                {
                    let mut state = self.state.lock().await;
                    state.current = Some((track.clone(), handle, seq));
                    state.paused = false;
                }
                crate::music!("started '{}' in guild {}", track.title, self.guild);
                let _ = self.events.send(PlayerEvent::TrackStarted {
                    guild: self.guild,
                    track,
                });
            }
            Ok(Err(e)) => {
                let _ = self.events.send(PlayerEvent::TrackFailed {
                    guild: self.guild,
                    seq,
                    reason: e.to_string(),
                });
            }
            Err(_) => {
                let _ = self.events.send(PlayerEvent::TrackFailed {
                    guild: self.guild,
                    seq,
                    reason: format!(
                        "buffering timed out after {:?}",
                        self.config.buffering_timeout
                    ),
                });
            }
        }
    }

    /// Replace any scheduled auto-leave with this one.
    pub async fn store_leave_timer(&self, timer: JoinHandle<()>) {
        let mut state = self.state.lock().await;
        state.cancel_leave();
        state.leave_timer = Some(timer);
    }

    pub async fn cancel_leave(&self) {
        self.state.lock().await.cancel_leave();
    }

    /// Tear the session down: stop playback, drop the queue, disconnect.
    pub async fn shutdown(&self) {
        {
            let mut state = self.state.lock().await;
            state.stopping = true;
            state.cancel_leave();
            if let Some((_, handle, _)) = state.current.take() {
                let _ = handle.stop();
            }
            state.pending.clear();
        }
        if let Err(e) = self.connection.disconnect().await {
            warn!("failed to disconnect from guild {}: {}", self.guild, e);
        }
    }
}
