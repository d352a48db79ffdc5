//! Engine event stream behavior: advancing on track end, repeat modes,
//! the one-shot error recovery, and auto-leave cooldowns.

mod common;

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use pretty_assertions::assert_eq;
use serenity::all::{ChannelId, GuildId};

use cadence::player::{PlayerEvent, RepeatMode, events};

use common::mocks::RecordingResponder;
use common::{create_session, fixtures, testbed};

const GUILD: GuildId = GuildId::new(400);
const VOICE: ChannelId = ChannelId::new(40);

async fn settle() {
    // lets the event loop drain; the paused clock auto-advances
    tokio::time::sleep(Duration::from_millis(20)).await;
}

#[tokio::test(start_paused = true)]
async fn track_end_advances_to_the_next_track() {
    let mut bed = testbed();
    events::spawn_event_loop(bed.players.clone(), bed.events_rx.take().unwrap());
    let responder = Arc::new(RecordingResponder::default());
    let session = create_session(&bed, GUILD, VOICE, responder.clone()).await;

    session
        .enqueue(vec![fixtures::track("one"), fixtures::track("two")])
        .await;
    session.play_if_idle().await;
    assert_eq!(bed.state.started_titles(), vec!["one".to_string()]);

    bed.events_tx
        .send(PlayerEvent::TrackFinished { guild: GUILD, seq: 1 })
        .unwrap();
    settle().await;

    assert_eq!(
        bed.state.started_titles(),
        vec!["one".to_string(), "two".to_string()]
    );
    let snapshot = session.snapshot().await;
    assert_eq!(snapshot.current.map(|t| t.title).as_deref(), Some("two"));
}

#[tokio::test(start_paused = true)]
async fn stale_callbacks_are_discarded() {
    let mut bed = testbed();
    events::spawn_event_loop(bed.players.clone(), bed.events_rx.take().unwrap());
    let session = create_session(&bed, GUILD, VOICE, Arc::new(RecordingResponder::default())).await;

    session
        .enqueue(vec![fixtures::track("one"), fixtures::track("two")])
        .await;
    session.play_if_idle().await;

    // a callback from a playback that is no longer current does nothing
    bed.events_tx
        .send(PlayerEvent::TrackFinished { guild: GUILD, seq: 99 })
        .unwrap();
    settle().await;

    assert_eq!(bed.state.started_titles(), vec!["one".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn repeat_track_replays_on_natural_end() {
    let mut bed = testbed();
    events::spawn_event_loop(bed.players.clone(), bed.events_rx.take().unwrap());
    let session = create_session(&bed, GUILD, VOICE, Arc::new(RecordingResponder::default())).await;

    session.set_repeat(RepeatMode::Track).await;
    session.enqueue(vec![fixtures::track("loop me")]).await;
    session.play_if_idle().await;

    bed.events_tx
        .send(PlayerEvent::TrackFinished { guild: GUILD, seq: 1 })
        .unwrap();
    settle().await;

    assert_eq!(
        bed.state.started_titles(),
        vec!["loop me".to_string(), "loop me".to_string()]
    );
}

#[tokio::test(start_paused = true)]
async fn skip_overrides_track_repeat() {
    let mut bed = testbed();
    events::spawn_event_loop(bed.players.clone(), bed.events_rx.take().unwrap());
    let session = create_session(&bed, GUILD, VOICE, Arc::new(RecordingResponder::default())).await;

    session.set_repeat(RepeatMode::Track).await;
    session
        .enqueue(vec![fixtures::track("one"), fixtures::track("two")])
        .await;
    session.play_if_idle().await;

    session.skip().await.unwrap();
    settle().await;

    assert_eq!(
        bed.state.started_titles(),
        vec!["one".to_string(), "two".to_string()]
    );
}

#[tokio::test(start_paused = true)]
async fn queue_repeat_requeues_finished_tracks() {
    let mut bed = testbed();
    events::spawn_event_loop(bed.players.clone(), bed.events_rx.take().unwrap());
    let session = create_session(&bed, GUILD, VOICE, Arc::new(RecordingResponder::default())).await;

    session.set_repeat(RepeatMode::Queue).await;
    session
        .enqueue(vec![fixtures::track("one"), fixtures::track("two")])
        .await;
    session.play_if_idle().await;

    bed.events_tx
        .send(PlayerEvent::TrackFinished { guild: GUILD, seq: 1 })
        .unwrap();
    settle().await;

    let snapshot = session.snapshot().await;
    assert_eq!(snapshot.current.map(|t| t.title).as_deref(), Some("two"));
    assert_eq!(
        snapshot.pending.iter().map(|t| t.title.as_str()).collect::<Vec<_>>(),
        vec!["one"]
    );
}

#[tokio::test(start_paused = true)]
async fn playback_error_notifies_and_auto_skips_once() {
    let mut bed = testbed();
    events::spawn_event_loop(bed.players.clone(), bed.events_rx.take().unwrap());
    let responder = Arc::new(RecordingResponder::default());
    let session = create_session(&bed, GUILD, VOICE, responder.clone()).await;

    bed.state
        .failing_titles
        .lock()
        .unwrap()
        .push("broken".to_string());
    session
        .enqueue(vec![
            fixtures::track("one"),
            fixtures::track("broken"),
            fixtures::track("three"),
        ])
        .await;
    session.play_if_idle().await;

    bed.events_tx
        .send(PlayerEvent::TrackFinished { guild: GUILD, seq: 1 })
        .unwrap();
    // recovery fires after its fixed delay
    tokio::time::sleep(Duration::from_secs(3)).await;

    assert_eq!(
        bed.state.started_titles(),
        vec!["one".to_string(), "three".to_string()]
    );
    let messages = responder.messages.lock().unwrap().clone();
    assert!(messages.iter().any(|m| m.contains("Playback error")));
}

#[tokio::test(start_paused = true)]
async fn empty_queue_leaves_after_the_cooldown() {
    let mut bed = testbed();
    events::spawn_event_loop(bed.players.clone(), bed.events_rx.take().unwrap());
    let responder = Arc::new(RecordingResponder::default());
    let session = create_session(&bed, GUILD, VOICE, responder.clone()).await;

    session.enqueue(vec![fixtures::track("only")]).await;
    session.play_if_idle().await;

    bed.events_tx
        .send(PlayerEvent::TrackFinished { guild: GUILD, seq: 1 })
        .unwrap();
    settle().await;

    let messages = responder.messages.lock().unwrap().clone();
    assert!(messages.iter().any(|m| m.contains("Queue finished")));
    assert!(bed.players.get(GUILD).is_some());

    // default leave-at-end cooldown is five minutes
    tokio::time::sleep(Duration::from_secs(301)).await;
    assert!(bed.players.get(GUILD).is_none());
    assert_eq!(bed.state.disconnects.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn new_tracks_cancel_the_pending_leave() {
    let mut bed = testbed();
    events::spawn_event_loop(bed.players.clone(), bed.events_rx.take().unwrap());
    let session = create_session(&bed, GUILD, VOICE, Arc::new(RecordingResponder::default())).await;

    session.enqueue(vec![fixtures::track("only")]).await;
    session.play_if_idle().await;
    bed.events_tx
        .send(PlayerEvent::TrackFinished { guild: GUILD, seq: 1 })
        .unwrap();
    settle().await;

    // queueing again before the cooldown fires keeps the session alive
    session.enqueue(vec![fixtures::track("encore")]).await;
    session.play_if_idle().await;

    tokio::time::sleep(Duration::from_secs(400)).await;
    assert!(bed.players.get(GUILD).is_some());
}

#[tokio::test(start_paused = true)]
async fn empty_channel_leaves_even_mid_playback() {
    let mut bed = testbed();
    events::spawn_event_loop(bed.players.clone(), bed.events_rx.take().unwrap());
    let responder = Arc::new(RecordingResponder::default());
    let session = create_session(&bed, GUILD, VOICE, responder.clone()).await;

    session.enqueue(vec![fixtures::track("only")]).await;
    session.play_if_idle().await;

    bed.events_tx
        .send(PlayerEvent::ChannelEmpty { guild: GUILD })
        .unwrap();
    tokio::time::sleep(Duration::from_secs(301)).await;

    assert!(bed.players.get(GUILD).is_none());
}

#[tokio::test(start_paused = true)]
async fn returning_listeners_cancel_the_empty_channel_leave() {
    let mut bed = testbed();
    events::spawn_event_loop(bed.players.clone(), bed.events_rx.take().unwrap());
    let session = create_session(&bed, GUILD, VOICE, Arc::new(RecordingResponder::default())).await;

    session.enqueue(vec![fixtures::track("only")]).await;
    session.play_if_idle().await;

    bed.events_tx
        .send(PlayerEvent::ChannelEmpty { guild: GUILD })
        .unwrap();
    settle().await;
    bed.events_tx
        .send(PlayerEvent::ChannelOccupied { guild: GUILD })
        .unwrap();

    tokio::time::sleep(Duration::from_secs(400)).await;
    assert!(bed.players.get(GUILD).is_some());
}
