//! Event-driven playback tests
//!
//! Exercises the spawned ended-watcher through the fake port's notification
//! channel and the engine's broadcast event stream, instead of calling
//! `on_track_ended` directly.

mod helpers;

use helpers::{attach_tracks, test_engine};
use pacetune_common::events::{EngineEvent, PlaybackState};
use pacetune_engine::{PlaybackEngine, SequencerState};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::{sleep, timeout};

async fn wait_for_state<F>(engine: &PlaybackEngine, mut pred: F)
where
    F: FnMut(&SequencerState) -> bool,
{
    timeout(Duration::from_secs(2), async {
        loop {
            if pred(&engine.sequencer_state().await) {
                break;
            }
            sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("timed out waiting for sequencer state");
}

fn drain(rx: &mut broadcast::Receiver<EngineEvent>) -> Vec<EngineEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn an_ended_signal_from_the_port_advances_the_queue() {
    let (port, engine) = test_engine();
    let ids = attach_tracks(&engine, 3).await;

    engine.play_all().await.unwrap();
    port.emit_ended();

    wait_for_state(&engine, |s| {
        matches!(s, SequencerState::PlayingQueue { index: 1, .. })
    })
    .await;

    assert_eq!(engine.active_track_id().await, Some(ids[1]));
    assert_eq!(port.loads().len(), 2);
}

#[tokio::test]
async fn signals_after_stop_are_suppressed() {
    let (port, engine) = test_engine();
    attach_tracks(&engine, 3).await;

    engine.play_all().await.unwrap();
    engine.stop().await.unwrap();

    port.emit_ended();
    sleep(Duration::from_millis(50)).await;

    assert_eq!(engine.sequencer_state().await, SequencerState::Idle);
    // only the first entry was ever loaded
    assert_eq!(port.loads().len(), 1);
}

#[tokio::test]
async fn a_full_traversal_ends_with_queue_completed() {
    let (port, engine) = test_engine();
    attach_tracks(&engine, 2).await;
    let mut rx = engine.subscribe_events();

    engine.play_all().await.unwrap();

    port.emit_ended();
    wait_for_state(&engine, |s| {
        matches!(s, SequencerState::PlayingQueue { index: 1, .. })
    })
    .await;

    port.emit_ended();
    wait_for_state(&engine, |s| *s == SequencerState::Idle).await;

    let events = drain(&mut rx);
    assert!(events
        .iter()
        .any(|e| matches!(e, EngineEvent::QueueCompleted { .. })));
    assert!(events
        .iter()
        .any(|e| matches!(e, EngineEvent::ActiveTrackChanged { track_id: None, .. })));
}

#[tokio::test]
async fn re_arming_supersedes_the_previous_watcher() {
    let (port, engine) = test_engine();
    attach_tracks(&engine, 3).await;

    engine.play_all().await.unwrap();
    engine.stop().await.unwrap();
    engine.play_all().await.unwrap();

    // one signal advances by exactly one entry; a stale second watcher
    // would double-advance
    port.emit_ended();
    wait_for_state(&engine, |s| {
        matches!(s, SequencerState::PlayingQueue { index: 1, .. })
    })
    .await;

    sleep(Duration::from_millis(50)).await;
    assert!(matches!(
        engine.sequencer_state().await,
        SequencerState::PlayingQueue { index: 1, .. }
    ));
}

#[tokio::test]
async fn single_play_announces_itself_on_the_event_stream() {
    let (_port, engine) = test_engine();
    let ids = attach_tracks(&engine, 1).await;
    engine.set_current_bpm(ids[0], "120").await.unwrap();
    engine.set_target_bpm(ids[0], "150").await.unwrap();

    let mut rx = engine.subscribe_events();
    engine.play_track(ids[0]).await.unwrap();

    let events = drain(&mut rx);
    assert!(events.iter().any(|e| matches!(
        e,
        EngineEvent::TrackStarted { track_id, playback_rate, .. }
            if *track_id == ids[0] && *playback_rate == 1.25
    )));
    assert!(events.iter().any(|e| matches!(
        e,
        EngineEvent::ActiveTrackChanged { track_id: Some(id), .. } if *id == ids[0]
    )));
    assert!(events.iter().any(|e| matches!(
        e,
        EngineEvent::PlaybackStateChanged { state: PlaybackState::Playing, .. }
    )));
}

#[tokio::test]
async fn a_rejected_play_announces_playback_blocked() {
    let (port, engine) = test_engine();
    let ids = attach_tracks(&engine, 1).await;

    let mut rx = engine.subscribe_events();
    port.reject_next_play();
    let _ = engine.play_track(ids[0]).await;

    let events = drain(&mut rx);
    assert!(events.iter().any(|e| matches!(
        e,
        EngineEvent::PlaybackBlocked { track_id, .. } if *track_id == ids[0]
    )));
    assert!(!events
        .iter()
        .any(|e| matches!(e, EngineEvent::TrackStarted { .. })));
}
