//! Integration tests for catalog loading and configuration
//!
//! These tests exercise the on-disk inputs the console binary reads and
//! feed them through a full session.

use anyhow::Result;
use serial_test::serial;
use tubeplayer::catalog::VideoCatalog;
use tubeplayer::player::PlaybackState;
use tubeplayer::sdk::{SimulatedMedia, SimulatedSdk};
use tubeplayer::utils::{parse_clock, Config};
use tubeplayer::video::LIVE_DURATION_LABEL;
use tubeplayer_integration_tests::{Harness, TestFixture};

#[test]
fn test_catalog_from_api_response() -> Result<()> {
    let fixture = TestFixture::new()?;
    let catalog = VideoCatalog::load(&fixture.catalog)?;

    assert_eq!(catalog.len(), 2);

    let talk = catalog.get("talk45")?;
    assert_eq!(talk.duration, "45:30");
    assert_eq!(talk.view_count, "1.2K");
    assert_eq!(talk.thumbnail, "https://i.ytimg.com/vi/talk45/mqdefault.jpg");
    assert_eq!(talk.thumbnail_high, "https://i.ytimg.com/vi/talk45/hqdefault.jpg");
    assert!(!talk.is_live);

    let live = catalog.get("live1")?;
    assert!(live.is_live);
    assert_eq!(live.display_duration(), LIVE_DURATION_LABEL);

    assert_eq!(catalog.featured().map(|v| v.id.as_str()), Some("live1"));
    assert_eq!(catalog.search("service").len(), 1);

    Ok(())
}

#[test]
#[serial]
fn test_config_file_and_env_overrides() -> Result<()> {
    let fixture = TestFixture::new()?;

    let config = Config::load_with(Some(&fixture.config))?;
    assert_eq!(config.player.poll_interval_ms, 250);
    assert_eq!(config.player.container_id, "hero-player");
    assert_eq!(config.catalog.channel_id, "UC123");

    std::env::set_var("TUBEPLAYER_SDK_LOAD_TIMEOUT_MS", "5000");
    std::env::set_var("TUBEPLAYER_LOG_LEVEL", "debug");
    let config = Config::load_with(Some(&fixture.config));
    std::env::remove_var("TUBEPLAYER_SDK_LOAD_TIMEOUT_MS");
    std::env::remove_var("TUBEPLAYER_LOG_LEVEL");

    let config = config?;
    assert_eq!(config.player.sdk_load_timeout_ms, Some(5000));
    assert_eq!(config.general.log_level, "debug");

    Ok(())
}

#[test]
#[serial]
fn test_invalid_env_override_rejected() -> Result<()> {
    let fixture = TestFixture::new()?;

    std::env::set_var("TUBEPLAYER_POLL_INTERVAL_MS", "0");
    let result = Config::load_with(Some(&fixture.config));
    std::env::remove_var("TUBEPLAYER_POLL_INTERVAL_MS");

    assert!(result.is_err());
    Ok(())
}

#[tokio::test(start_paused = true)]
#[serial]
async fn test_session_from_catalog_and_config() -> Result<()> {
    let fixture = TestFixture::new()?;
    let config = Config::load_with(Some(&fixture.config))?;
    let catalog = VideoCatalog::load(&fixture.catalog)?;

    let talk = catalog.get("talk45")?.clone();
    let length = parse_clock(&talk.duration).unwrap_or_default();
    let sdk = SimulatedSdk::new()
        .with_media(&talk.id, SimulatedMedia::vod(length))
        .with_media("live1", SimulatedMedia::live());

    let h = Harness::with_config(sdk, config.player)?;
    h.controller.open(talk)?;
    h.settle().await;

    assert_eq!(h.instance().container_id(), "hero-player");
    let state = h.controller.snapshot();
    assert_eq!(state.playback_state, PlaybackState::Playing);
    assert_eq!(state.duration, 2745.0);

    h.controller.open(catalog.get("live1")?.clone())?;
    h.settle().await;
    assert_eq!(h.controller.snapshot().duration_label(), LIVE_DURATION_LABEL);
    assert_eq!(h.sdk.live_instances().len(), 1);

    Ok(())
}
