//! Integration tests for the tubeplayer controller
//!
//! These tests drive full sessions over the simulated SDK:
//! - Opening, replacing and closing sessions
//! - The command surface and its local state
//! - Polling against the instance clock
//! - The dialog shell

use anyhow::Result;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tubeplayer::player::{
    DismissReason, PlaybackSpeed, PlaybackState, PlayerConfig, PlayerDialog, PlayerEvent,
};
use tubeplayer::sdk::{SimulatedMedia, SimulatedSdk};
use tubeplayer::video::{LiveBroadcastContent, Video, LIVE_DURATION_LABEL};
use tubeplayer_integration_tests::{EventLog, Harness};

#[tokio::test(start_paused = true)]
async fn test_set_volume_unmutes() -> Result<()> {
    let h = Harness::new(SimulatedSdk::new())?;
    h.controller.open(Video::new("abc", "Title"))?;
    h.settle().await;

    for volume in 1..=100u8 {
        if !h.controller.snapshot().muted {
            h.controller.toggle_mute();
        }
        assert!(h.controller.snapshot().muted);

        h.controller.set_volume(volume);
        let state = h.controller.snapshot();
        assert_eq!(state.volume, volume);
        assert!(!state.muted, "volume {} left the player muted", volume);
        assert_eq!(h.instance().raw_volume(), (volume, false));
    }

    // Zero volume leaves the mute flag alone
    h.controller.toggle_mute();
    h.controller.set_volume(0);
    assert!(h.controller.snapshot().muted);

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_toggle_mute_twice_restores() -> Result<()> {
    let h = Harness::new(SimulatedSdk::new())?;
    h.controller.open(Video::new("abc", "Title"))?;
    h.settle().await;
    h.controller.set_volume(65);

    let before = h.controller.snapshot();
    h.controller.toggle_mute();
    let muted = h.controller.snapshot();
    assert!(muted.muted);
    assert_eq!(muted.volume, 65);

    h.controller.toggle_mute();
    let after = h.controller.snapshot();
    assert_eq!(after.muted, before.muted);
    assert_eq!(after.volume, before.volume);
    assert_eq!(h.instance().raw_volume(), (65, false));

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_open_replaces_session() -> Result<()> {
    let h = Harness::new(SimulatedSdk::new())?;
    let log = EventLog::attach(&h.controller);

    h.controller.open(Video::new("video-a", "A"))?;
    h.settle().await;
    let first = h.instance();

    h.controller.open(Video::new("video-b", "B"))?;
    h.settle().await;

    let live = h.sdk.live_instances();
    assert_eq!(live.len(), 1);
    assert_eq!(live[0].video_id(), "video-b");
    assert_eq!(h.controller.bound_video_id().as_deref(), Some("video-b"));
    assert!(first.is_destroyed());

    // A's poll timer never touches the destroyed instance
    sleep(Duration::from_secs(3)).await;
    assert_eq!(first.calls_after_destroy(), 0);
    assert_eq!(
        log.count(|e| matches!(e, PlayerEvent::SessionClosed { video_id } if video_id == "video-a")),
        1
    );

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_open_while_loading_creates_single_instance() -> Result<()> {
    let h = Harness::new(SimulatedSdk::manual())?;

    h.controller.open(Video::new("video-a", "A"))?;
    sleep(Duration::from_millis(10)).await;
    h.controller.open(Video::new("video-b", "B"))?;
    sleep(Duration::from_millis(10)).await;
    assert_eq!(h.sdk.loader_injections(), 1);
    assert!(!h.bootstrap.is_ready());

    h.sdk.finish_loading();
    h.settle().await;

    let instances = h.sdk.instances();
    assert_eq!(instances.len(), 1);
    assert_eq!(instances[0].video_id(), "video-b");

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_close_twice() -> Result<()> {
    let h = Harness::new(SimulatedSdk::new())?;
    let log = EventLog::attach(&h.controller);
    h.controller.open(Video::new("abc", "Title"))?;
    h.settle().await;

    h.controller.close();
    h.controller.close();

    let state = h.controller.snapshot();
    assert_eq!(state.playback_state, PlaybackState::Uninitialized);
    assert_eq!(state.current_time, 0.0);
    assert_eq!(state.duration, 0.0);
    assert!(!state.is_playing());
    assert!(h.controller.bound_video_id().is_none());
    assert!(h.instance().is_destroyed());
    assert_eq!(h.instance().calls_after_destroy(), 0);
    assert_eq!(log.count(|e| matches!(e, PlayerEvent::SessionClosed { .. })), 1);

    // Commands after close are silent no-ops
    h.controller.toggle_play();
    h.controller.seek(10.0);
    assert_eq!(h.instance().calls_after_destroy(), 0);

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_close_before_mount() -> Result<()> {
    let h = Harness::new(SimulatedSdk::new())?;
    h.controller.open(Video::new("abc", "Title"))?;
    sleep(Duration::from_millis(20)).await;

    h.controller.close();
    h.settle().await;

    assert!(h.sdk.instances().is_empty());
    assert_eq!(h.controller.playback_state(), PlaybackState::Uninitialized);

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_dialog_clamps_seek() -> Result<()> {
    let h = Harness::new(SimulatedSdk::new().with_media("abc", SimulatedMedia::vod(120.0)))?;
    let dialog = PlayerDialog::new(h.controller, || {});
    dialog.render(Some(&Video::new("abc", "Title")), true)?;
    sleep(Duration::from_millis(200)).await;

    dialog.seek_to(500.0);
    assert_eq!(dialog.controller().snapshot().current_time, 120.0);

    dialog.seek_to(-5.0);
    assert_eq!(dialog.controller().snapshot().current_time, 0.0);

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_seek_then_poll() -> Result<()> {
    let h = Harness::new(SimulatedSdk::new().with_media("talk", SimulatedMedia::vod(2745.0)))?;
    h.controller.open(Video::new("talk", "Talk").with_duration("45:30"))?;
    h.settle().await;
    assert_eq!(h.controller.snapshot().duration_label(), "45:30");

    h.controller.seek(1000.0);
    assert_eq!(h.controller.snapshot().current_time, 1000.0);

    sleep(Duration::from_millis(500)).await;
    let polled = h.controller.snapshot().current_time;
    let actual = h.instance().position();
    assert!((polled - actual).abs() <= 1.0, "polled {} vs instance {}", polled, actual);
    assert!(polled >= 1000.0);

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_seek_keeps_pause() -> Result<()> {
    let h = Harness::new(SimulatedSdk::new())?;
    h.controller.open(Video::new("abc", "Title"))?;
    h.settle().await;

    h.controller.pause();
    h.settle().await;
    h.controller.seek(42.0);
    sleep(Duration::from_secs(2)).await;

    assert_eq!(h.controller.playback_state(), PlaybackState::Paused);
    assert_eq!(h.controller.snapshot().current_time, 42.0);
    assert!(!h.instance().is_playing());

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_live_video() -> Result<()> {
    let h = Harness::new(SimulatedSdk::new().with_media("live", SimulatedMedia::live()))?;
    let video = Video::new("live", "Live worship").with_broadcast(LiveBroadcastContent::Live);
    h.controller.open(video)?;
    h.settle().await;

    assert_eq!(h.controller.snapshot().duration_label(), LIVE_DURATION_LABEL);
    assert_eq!(h.controller.playback_state(), PlaybackState::Playing);

    h.controller.toggle_play();
    h.settle().await;
    assert_eq!(h.controller.playback_state(), PlaybackState::Paused);

    h.controller.toggle_play();
    h.settle().await;
    assert_eq!(h.controller.playback_state(), PlaybackState::Playing);

    sleep(Duration::from_secs(2)).await;
    assert_eq!(h.controller.snapshot().duration_label(), LIVE_DURATION_LABEL);

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_speed_round_trip() -> Result<()> {
    let h = Harness::new(SimulatedSdk::new())?;
    h.controller.open(Video::new("abc", "Title"))?;
    h.settle().await;

    h.controller.set_speed(PlaybackSpeed::OneAndHalf);
    assert_eq!(h.instance().playback_rate(), 1.5);
    assert_eq!(h.controller.snapshot().speed.label(), "1.5x");

    h.controller.set_speed(PlaybackSpeed::Normal);
    let speed = h.controller.snapshot().speed;
    assert_eq!(speed.value(), 1.0);
    assert_eq!(speed.label(), "Normal");
    assert_eq!(h.instance().playback_rate(), 1.0);

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_custom_poll_interval() -> Result<()> {
    let config = PlayerConfig {
        poll_interval_ms: 2000,
        ..PlayerConfig::default()
    };
    let h = Harness::with_config(SimulatedSdk::new(), config)?;
    let log = EventLog::attach(&h.controller);
    h.controller.open(Video::new("abc", "Title"))?;

    sleep(Duration::from_millis(1500)).await;
    assert_eq!(log.count(|e| matches!(e, PlayerEvent::PositionChanged { .. })), 0);

    sleep(Duration::from_millis(1000)).await;
    assert_eq!(log.count(|e| matches!(e, PlayerEvent::PositionChanged { .. })), 1);

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_sdk_error_code_is_reported() -> Result<()> {
    let h = Harness::new(SimulatedSdk::new())?;
    let log = EventLog::attach(&h.controller);
    h.controller.open(Video::new("abc", "Title"))?;
    h.settle().await;

    h.instance().push_error(150);
    h.settle().await;

    assert_eq!(log.count(|e| matches!(e, PlayerEvent::Error { .. })), 1);
    assert!(h.controller.is_open());

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_event_order_for_session() -> Result<()> {
    let h = Harness::new(SimulatedSdk::new())?;
    let log = EventLog::attach(&h.controller);
    h.controller.open(Video::new("abc", "Title"))?;
    h.settle().await;
    h.controller.close();

    let events = log.events();
    assert!(matches!(events.first(), Some(PlayerEvent::SessionOpened { .. })));
    assert!(matches!(events.get(1), Some(PlayerEvent::PlayerReady { .. })));
    assert!(matches!(events.get(2), Some(PlayerEvent::PlaybackStarted)));
    assert!(matches!(events.last(), Some(PlayerEvent::SessionClosed { .. })));

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_dialog_dismiss_flow() -> Result<()> {
    let h = Harness::new(SimulatedSdk::new())?;
    let fullscreen = h.fullscreen.clone();
    let closes = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&closes);
    let mut dialog = PlayerDialog::new(h.controller, move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let video = Video::new("abc", "Title");
    dialog.render(Some(&video), true)?;
    sleep(Duration::from_millis(200)).await;

    dialog.controller().toggle_fullscreen();
    sleep(Duration::from_millis(50)).await;
    assert!(fullscreen.is_active());
    assert!(!dialog.dismiss(DismissReason::Escape));

    assert!(dialog.dismiss(DismissReason::CloseButton));
    assert_eq!(closes.load(Ordering::SeqCst), 1);

    // The screen reacts by closing the dialog; fullscreen is left too
    dialog.render(Some(&video), false)?;
    sleep(Duration::from_millis(50)).await;
    assert!(!dialog.controller().is_open());
    assert!(!fullscreen.is_active());
    assert!(!dialog.controller().is_fullscreen());

    Ok(())
}
