//! The inbound engine event stream. Driver callbacks cross an mpsc
//! channel and are consumed here, one subscriber per event kind, each
//! producing a bounded, non-blocking side effect.

use std::sync::Arc;
use std::time::Duration;

use serenity::model::id::GuildId;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tracing::{error, warn};

use crate::embeds;

use super::manager::PlayerManager;
use super::session::AdvanceReason;
use super::track::Track;

/// Pause before the single auto-skip attempt after a playback error.
const RECOVERY_DELAY: Duration = Duration::from_secs(2);

/// Everything the playback engine reports back asynchronously.
#[derive(Debug, Clone)]
pub enum PlayerEvent {
    TrackStarted { guild: GuildId, track: Track },
    TrackFinished { guild: GuildId, seq: u64 },
    TrackFailed { guild: GuildId, seq: u64, reason: String },
    QueueEmpty { guild: GuildId },
    ChannelEmpty { guild: GuildId },
    ChannelOccupied { guild: GuildId },
    ConnectionLost { guild: GuildId },
}

/// Consume the event stream for the lifetime of the process.
pub fn spawn_event_loop(
    players: Arc<PlayerManager>,
    mut rx: UnboundedReceiver<PlayerEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match event {
                PlayerEvent::TrackStarted { guild, track } => {
                    on_track_started(&players, guild, track).await
                }
                PlayerEvent::TrackFinished { guild, seq } => {
                    if let Some(session) = players.get(guild) {
                        session.advance(AdvanceReason::Finished, seq).await;
                    }
                }
                PlayerEvent::TrackFailed { guild, seq, reason } => {
                    on_track_failed(&players, guild, seq, reason).await
                }
                PlayerEvent::QueueEmpty { guild } => on_queue_empty(&players, guild).await,
                PlayerEvent::ChannelEmpty { guild } => on_channel_empty(&players, guild).await,
                PlayerEvent::ChannelOccupied { guild } => {
                    if let Some(session) = players.get(guild) {
                        session.cancel_leave().await;
                    }
                }
                PlayerEvent::ConnectionLost { guild } => {
                    warn!("voice connection lost in guild {}", guild);
                    if let Some(session) = players.get(guild) {
                        let _ = session
                            .responder()
                            .say("⚠️ Lost the voice connection. Use play to start again.")
                            .await;
                    }
                }
            }
        }
    })
}

async fn on_track_started(players: &Arc<PlayerManager>, guild: GuildId, track: Track) {
    let Some(session) = players.get(guild) else {
        return;
    };
    crate::music!(
        "now playing '{}' ({}) in guild {}",
        track.title,
        track.source.label(),
        guild
    );
    let snapshot = session.snapshot().await;
    let _ = session
        .responder()
        .send_embed(embeds::now_playing(&track, &snapshot))
        .await;
}

/// One bounded recovery per failure: notify, wait a fixed delay, skip to
/// the next track. Successive failures each get their own attempt; there
/// is no cap or backoff across them.
async fn on_track_failed(players: &Arc<PlayerManager>, guild: GuildId, seq: u64, reason: String) {
    error!("playback error in guild {}: {}", guild, reason);
    let Some(session) = players.get(guild) else {
        return;
    };
    let _ = session
        .responder()
        .say(&format!(
            "⚠️ Playback error: {}. Skipping to the next track...",
            reason
        ))
        .await;

    let players = players.clone();
    tokio::spawn(async move {
        tokio::time::sleep(RECOVERY_DELAY).await;
        if let Some(session) = players.get(guild) {
            session.advance(AdvanceReason::Errored, seq).await;
        }
    });
}

async fn on_queue_empty(players: &Arc<PlayerManager>, guild: GuildId) {
    let Some(session) = players.get(guild) else {
        return;
    };
    crate::music!("queue finished in guild {}", guild);
    let _ = session.responder().say("✅ Queue finished!").await;

    let cooldown = session.config().leave_on_end_cooldown;
    schedule_leave(players, &session, guild, cooldown, true).await;
}

async fn on_channel_empty(players: &Arc<PlayerManager>, guild: GuildId) {
    let Some(session) = players.get(guild) else {
        return;
    };
    crate::music!("voice channel empty in guild {}", guild);
    let _ = session
        .responder()
        .say("👋 Everyone left the voice channel.")
        .await;

    let cooldown = session.config().leave_on_empty_cooldown;
    schedule_leave(players, &session, guild, cooldown, false).await;
}

async fn schedule_leave(
    players: &Arc<PlayerManager>,
    session: &Arc<super::session::SessionQueue>,
    guild: GuildId,
    cooldown: Duration,
    require_idle: bool,
) {
    let players = players.clone();
    let timer = tokio::spawn(async move {
        tokio::time::sleep(cooldown).await;
        players.leave_if(guild, require_idle).await;
    });
    session.store_leave_timer(timer).await;
}
