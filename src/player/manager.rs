//! The queue factory: one session per destination, created on first use
//! and looked up by guild key everywhere else.

use std::sync::Arc;

use dashmap::DashMap;
use serenity::model::id::{ChannelId, GuildId};
use tokio::sync::Mutex;
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::timeout;
use tracing::info;

use super::connector::VoiceConnector;
use super::events::PlayerEvent;
use super::session::{SessionConfig, SessionMetadata, SessionQueue};
use super::{PlayerError, PlayerResult};

pub struct PlayerManager {
    sessions: DashMap<GuildId, Arc<SessionQueue>>,
    /// Per-destination creation gates so near-simultaneous first plays
    /// connect exactly once. Distinct destinations never contend.
    creating: DashMap<GuildId, Arc<Mutex<()>>>,
    connector: Arc<dyn VoiceConnector>,
    defaults: SessionConfig,
    events: UnboundedSender<PlayerEvent>,
}

impl PlayerManager {
    pub fn new(
        connector: Arc<dyn VoiceConnector>,
        defaults: SessionConfig,
        events: UnboundedSender<PlayerEvent>,
    ) -> Arc<Self> {
        Arc::new(Self {
            sessions: DashMap::new(),
            creating: DashMap::new(),
            connector,
            defaults,
            events,
        })
    }

    /// Look up the session for a destination. `None` means nothing is
    /// playing there.
    pub fn get(&self, guild: GuildId) -> Option<Arc<SessionQueue>> {
        self.sessions.get(&guild).map(|s| s.value().clone())
    }

    /// Return the existing session unchanged, or connect and create one
    /// with the configured defaults. A failed connection registers
    /// nothing.
    pub async fn get_or_create(
        &self,
        guild: GuildId,
        voice_channel: ChannelId,
        metadata: SessionMetadata,
    ) -> PlayerResult<Arc<SessionQueue>> {
        if let Some(session) = self.get(guild) {
            return Ok(session);
        }

        let gate = self
            .creating
            .entry(guild)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = gate.lock().await;

        // Another task may have finished creating while we waited.
        if let Some(session) = self.get(guild) {
            return Ok(session);
        }

        let connection = timeout(
            self.defaults.buffering_timeout,
            self.connector.connect(guild, voice_channel),
        )
        .await
        .map_err(|_| PlayerError::ConnectTimeout(self.defaults.buffering_timeout))??;

        let session = Arc::new(SessionQueue::new(
            guild,
            connection,
            self.defaults.clone(),
            metadata,
            self.events.clone(),
        ));
        self.sessions.insert(guild, session.clone());
        info!(
            "created session for guild {} in channel {}",
            guild, voice_channel
        );
        Ok(session)
    }

    /// Remove and tear down the session for a destination.
    pub async fn delete(&self, guild: GuildId) -> PlayerResult<()> {
        let (_, session) = self.sessions.remove(&guild).ok_or(PlayerError::NoQueue)?;
        session.shutdown().await;
        crate::music!("session for guild {} removed", guild);
        Ok(())
    }

    /// Auto-leave path: tear the session down unless `require_idle` is
    /// set and something is still playing.
    pub async fn leave_if(&self, guild: GuildId, require_idle: bool) {
        let Some(session) = self.get(guild) else {
            return;
        };
        if require_idle && session.queue_len().await > 0 {
            return;
        }
        let responder = session.responder();
        if self.delete(guild).await.is_ok() {
            let _ = responder
                .say("👋 Leaving the voice channel after inactivity.")
                .await;
        }
    }
}
