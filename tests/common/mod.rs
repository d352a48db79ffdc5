//! Shared harness: wires a player manager to the fake connector and
//! builds command contexts around it.

pub mod fixtures;
pub mod mocks;

use std::sync::Arc;

use serenity::all::{ChannelId, GuildId};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

use cadence::config::BotConfig;
use cadence::player::{PlayerEvent, PlayerManager, SessionMetadata, SessionQueue, SourceKind};
use cadence::registry::CommandContext;
use cadence::sources::{SourceRouter, SearchSource};

use mocks::{ConnectorState, FakeConnector, RecordingResponder, StubSource};

pub struct TestBed {
    pub config: Arc<BotConfig>,
    pub players: Arc<PlayerManager>,
    pub state: Arc<ConnectorState>,
    pub events_tx: UnboundedSender<PlayerEvent>,
    pub events_rx: Option<UnboundedReceiver<PlayerEvent>>,
}

pub fn testbed() -> TestBed {
    testbed_with_config(BotConfig::default())
}

pub fn testbed_with_config(config: BotConfig) -> TestBed {
    let (events_tx, events_rx) = unbounded_channel();
    let state = Arc::new(ConnectorState::default());
    let connector = Arc::new(FakeConnector::new(state.clone(), events_tx.clone()));
    let players = PlayerManager::new(connector, config.session_defaults(), events_tx.clone());
    TestBed {
        config: Arc::new(config),
        players,
        state,
        events_tx,
        events_rx: Some(events_rx),
    }
}

/// Router over a fresh YouTube stub; the stub is returned for scripting.
pub fn stub_router() -> (Arc<SourceRouter>, Arc<StubSource>) {
    let youtube = Arc::new(StubSource::new(SourceKind::Youtube));
    let router = Arc::new(SourceRouter::new(
        youtube.clone() as Arc<dyn SearchSource>,
        None,
    ));
    (router, youtube)
}

pub fn context(
    bed: &TestBed,
    sources: Arc<SourceRouter>,
    responder: Arc<RecordingResponder>,
    guild: GuildId,
    caller_voice: Option<ChannelId>,
) -> CommandContext {
    CommandContext {
        config: bed.config.clone(),
        players: bed.players.clone(),
        sources,
        guild: Some(guild),
        author: fixtures::requester(),
        caller_voice,
        text_channel: ChannelId::new(777),
        responder,
    }
}

pub async fn create_session(
    bed: &TestBed,
    guild: GuildId,
    channel: ChannelId,
    responder: Arc<RecordingResponder>,
) -> Arc<SessionQueue> {
    bed.players
        .get_or_create(guild, channel, SessionMetadata { responder })
        .await
        .expect("session creation failed")
}
