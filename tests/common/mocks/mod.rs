//! Fake seam implementations: a scripted voice connector, a recording
//! responder, and a stub search source.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use serenity::all::{ChannelId, CreateEmbed, GuildId};
use serenity::async_trait;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::oneshot;

use cadence::Error;
use cadence::player::{
    PlayerError, PlayerEvent, PlayerResult, PlayingTrack, Requester, SourceKind, Track,
    VoiceConnection, VoiceConnector,
};
use cadence::reply::Responder;
use cadence::sources::{SearchError, SearchOutcome, SearchSource};

/// Shared observable state for one fake connector.
#[derive(Default)]
pub struct ConnectorState {
    pub connects: AtomicUsize,
    pub disconnects: AtomicUsize,
    /// Titles handed to `start`, in order.
    pub started: Mutex<Vec<String>>,
    /// When set, `connect` fails.
    pub fail_connect: AtomicBool,
    /// `start` fails for tracks with these titles.
    pub failing_titles: Mutex<Vec<String>>,
}

impl ConnectorState {
    pub fn started_titles(&self) -> Vec<String> {
        self.started.lock().unwrap().clone()
    }
}

pub struct FakeConnector {
    pub state: Arc<ConnectorState>,
    pub events: UnboundedSender<PlayerEvent>,
    /// Artificial connect latency, for racing creations.
    pub delay: Duration,
}

impl FakeConnector {
    pub fn new(state: Arc<ConnectorState>, events: UnboundedSender<PlayerEvent>) -> Self {
        Self {
            state,
            events,
            delay: Duration::ZERO,
        }
    }
}

#[async_trait]
impl VoiceConnector for FakeConnector {
    async fn connect(
        &self,
        guild: GuildId,
        channel: ChannelId,
    ) -> PlayerResult<Arc<dyn VoiceConnection>> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.state.fail_connect.load(Ordering::SeqCst) {
            return Err(PlayerError::Join("simulated join failure".to_string()));
        }
        self.state.connects.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(FakeConnection {
            guild,
            channel,
            state: self.state.clone(),
            events: self.events.clone(),
        }))
    }
}

pub struct FakeConnection {
    guild: GuildId,
    channel: ChannelId,
    state: Arc<ConnectorState>,
    events: UnboundedSender<PlayerEvent>,
}

#[async_trait]
impl VoiceConnection for FakeConnection {
    fn channel_id(&self) -> ChannelId {
        self.channel
    }

    async fn start(
        &self,
        track: &Track,
        _volume: u8,
        seq: u64,
    ) -> PlayerResult<Box<dyn PlayingTrack>> {
        if self
            .state
            .failing_titles
            .lock()
            .unwrap()
            .contains(&track.title)
        {
            return Err(PlayerError::Backend("simulated start failure".to_string()));
        }
        self.state.started.lock().unwrap().push(track.title.clone());
        Ok(Box::new(FakeTrack {
            guild: self.guild,
            seq,
            events: self.events.clone(),
        }))
    }

    async fn disconnect(&self) -> PlayerResult<()> {
        self.state.disconnects.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Mirrors the driver contract: stopping a track reports an end event.
pub struct FakeTrack {
    guild: GuildId,
    seq: u64,
    events: UnboundedSender<PlayerEvent>,
}

impl PlayingTrack for FakeTrack {
    fn pause(&self) -> PlayerResult<()> {
        Ok(())
    }

    fn resume(&self) -> PlayerResult<()> {
        Ok(())
    }

    fn stop(&self) -> PlayerResult<()> {
        let _ = self.events.send(PlayerEvent::TrackFinished {
            guild: self.guild,
            seq: self.seq,
        });
        Ok(())
    }

    fn set_volume(&self, _volume: u8) -> PlayerResult<()> {
        Ok(())
    }
}

/// Records everything a handler replies with.
#[derive(Default)]
pub struct RecordingResponder {
    pub messages: Mutex<Vec<String>>,
    pub statuses: Mutex<Vec<String>>,
    pub embeds: Mutex<Vec<CreateEmbed>>,
}

impl RecordingResponder {
    pub fn last_message(&self) -> Option<String> {
        self.messages.lock().unwrap().last().cloned()
    }

    pub fn last_status(&self) -> Option<String> {
        self.statuses.lock().unwrap().last().cloned()
    }

    pub fn message_count(&self) -> usize {
        self.messages.lock().unwrap().len()
    }

    pub fn embed_count(&self) -> usize {
        self.embeds.lock().unwrap().len()
    }
}

#[async_trait]
impl Responder for RecordingResponder {
    async fn say(&self, text: &str) -> Result<(), Error> {
        self.messages.lock().unwrap().push(text.to_string());
        Ok(())
    }

    async fn send_embed(&self, embed: CreateEmbed) -> Result<(), Error> {
        self.embeds.lock().unwrap().push(embed);
        Ok(())
    }

    async fn set_status(&self, text: &str) -> Result<(), Error> {
        self.statuses.lock().unwrap().push(text.to_string());
        Ok(())
    }

    async fn finish_status(&self, embed: CreateEmbed) -> Result<(), Error> {
        self.embeds.lock().unwrap().push(embed);
        Ok(())
    }
}

/// Search source that pops scripted results, optionally waiting on a
/// gate first (for cross-destination interleaving tests).
pub struct StubSource {
    kind: SourceKind,
    results: Mutex<VecDeque<Result<SearchOutcome, SearchError>>>,
    gate: tokio::sync::Mutex<Option<oneshot::Receiver<()>>>,
    pub calls: AtomicUsize,
}

impl StubSource {
    pub fn new(kind: SourceKind) -> Self {
        Self {
            kind,
            results: Mutex::new(VecDeque::new()),
            gate: tokio::sync::Mutex::new(None),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn push(&self, result: Result<SearchOutcome, SearchError>) {
        self.results.lock().unwrap().push_back(result);
    }

    /// The next search blocks until the sender half fires.
    pub async fn gate_next(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.gate.lock().await = Some(rx);
        tx
    }
}

#[async_trait]
impl SearchSource for StubSource {
    fn kind(&self) -> SourceKind {
        self.kind
    }

    async fn search(
        &self,
        _query: &str,
        _requester: &Requester,
    ) -> Result<SearchOutcome, SearchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.gate.lock().await.take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        self.results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(SearchError::NoResults))
    }
}
