//! Integration tests for the platform-backed video source
//!
//! These tests run the source against an in-process stand-in of the
//! platform API and check that the static catalog answers whenever the
//! platform cannot.

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tubeplayer::utils::CatalogConfig;
use tubeplayer::video::{LiveBroadcastContent, Video, LIVE_DURATION_LABEL};
use tubeplayer::{LiveStatusWatcher, VideoCatalog, VideoSource};
use tubeplayer_integration_tests::platform::{StubPlatform, API_KEY, CHANNEL_ID};

fn static_catalog() -> VideoCatalog {
    VideoCatalog::new(vec![
        Video::new("local1", "Recorded service").with_duration("58:00"),
        Video::new("local2", "Youth night").with_duration("1:10:00"),
    ])
}

/// Wait until the watcher publishes a status with the given flag
async fn wait_for_live(watcher: &LiveStatusWatcher, is_live: bool) -> Result<()> {
    let mut status = watcher.subscribe();
    tokio::time::timeout(Duration::from_secs(5), status.wait_for(|s| s.is_live == is_live))
        .await??;
    Ok(())
}

#[tokio::test]
async fn test_channel_videos_from_platform() -> Result<()> {
    let platform = StubPlatform::start().await?;
    let source = VideoSource::from_config(&platform.catalog_config(), static_catalog())?;
    assert!(!source.is_static());

    let catalog = source.videos().await;
    assert_eq!(catalog.len(), 2);

    let talk = catalog.get("talk45")?;
    assert_eq!(talk.duration, "45:30");
    assert_eq!(talk.view_count, "1.2K");
    assert_eq!(talk.thumbnail_high, "https://i.ytimg.com/vi/talk45/hqdefault.jpg");
    assert_eq!(catalog.get("study7")?.duration, "1:02:03");
    assert_eq!(catalog.get("study7")?.view_count, "2.5M");

    let requests = platform.requests();
    assert_eq!(requests.len(), 2);
    let (endpoint, params) = &requests[0];
    assert_eq!(endpoint, "search");
    assert_eq!(params["key"], API_KEY);
    assert_eq!(params["channelId"], CHANNEL_ID);
    assert_eq!(params["order"], "date");
    assert_eq!(params["maxResults"], "20");
    let (endpoint, params) = &requests[1];
    assert_eq!(endpoint, "videos");
    assert_eq!(params["id"], "talk45,study7");

    Ok(())
}

#[tokio::test]
async fn test_search_through_platform() -> Result<()> {
    let platform = StubPlatform::start().await?;
    let source = VideoSource::from_config(&platform.catalog_config(), static_catalog())?;

    let hits = source.search("bible").await;
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, "study7");
    assert_eq!(platform.requests()[0].1["q"], "bible");

    assert!(source.search("nothing like this").await.is_empty());

    let before = platform.requests().len();
    assert!(source.search("   ").await.is_empty());
    assert_eq!(platform.requests().len(), before);

    Ok(())
}

#[tokio::test]
async fn test_live_status_from_platform() -> Result<()> {
    let platform = StubPlatform::start().await?;
    let source = VideoSource::from_config(&platform.catalog_config(), static_catalog())?;

    assert!(!source.live_status().await?.is_live);

    platform.set_live(true);
    let status = source.live_status().await?;
    assert!(status.is_live);
    let video = status.live_video.expect("live video");
    assert_eq!(video.id, "live1");
    assert_eq!(video.duration, LIVE_DURATION_LABEL);
    assert_eq!(video.live_broadcast_content, LiveBroadcastContent::Live);

    let (_, params) = platform.requests().pop().expect("request recorded");
    assert_eq!(params["eventType"], "live");
    assert_eq!(params["maxResults"], "1");

    Ok(())
}

#[tokio::test]
async fn test_failed_requests_fall_back_to_static_catalog() -> Result<()> {
    let platform = StubPlatform::start().await?;
    let source = VideoSource::from_config(&platform.catalog_config(), static_catalog())?;
    platform.set_failing(true);

    let catalog = source.videos().await;
    assert_eq!(catalog.len(), 2);
    assert!(catalog.get("local1").is_ok());

    let hits = source.search("youth").await;
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, "local2");

    assert!(source.live_status().await.is_err());

    Ok(())
}

#[tokio::test]
async fn test_wrong_key_falls_back_to_static_catalog() -> Result<()> {
    let platform = StubPlatform::start().await?;
    let config = CatalogConfig {
        api_key: Some("revoked".to_string()),
        ..platform.catalog_config()
    };
    let source = VideoSource::from_config(&config, static_catalog())?;

    assert!(source.videos().await.get("local1").is_ok());
    Ok(())
}

#[tokio::test]
async fn test_unreachable_platform_falls_back() -> Result<()> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);

    let config = CatalogConfig {
        api_key: Some(API_KEY.to_string()),
        channel_id: CHANNEL_ID.to_string(),
        api_base_url: format!("http://{}", addr),
        ..Default::default()
    };
    let source = VideoSource::from_config(&config, static_catalog())?;

    assert_eq!(source.videos().await.len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_without_key_platform_is_never_called() -> Result<()> {
    let platform = StubPlatform::start().await?;
    let config = CatalogConfig {
        api_key: None,
        ..platform.catalog_config()
    };
    let source = VideoSource::from_config(&config, static_catalog())?;
    assert!(source.is_static());

    assert_eq!(source.videos().await.len(), 2);
    assert_eq!(source.search("service").await.len(), 1);
    assert!(!source.live_status().await?.is_live);
    assert!(platform.requests().is_empty());

    Ok(())
}

#[tokio::test]
async fn test_watcher_follows_broadcast() -> Result<()> {
    let platform = StubPlatform::start().await?;
    let source = Arc::new(VideoSource::from_config(
        &platform.catalog_config(),
        static_catalog(),
    )?);
    let watcher = LiveStatusWatcher::spawn(Arc::clone(&source), Duration::from_millis(50));
    assert!(!watcher.current().is_live);

    platform.set_live(true);
    wait_for_live(&watcher, true).await?;
    assert_eq!(
        watcher.current().live_video.map(|v| v.id),
        Some("live1".to_string())
    );

    // A failing check keeps the last answer
    platform.set_failing(true);
    let checks = platform.requests().len();
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(platform.requests().len() > checks);
    assert!(watcher.current().is_live);

    platform.set_failing(false);
    platform.set_live(false);
    wait_for_live(&watcher, false).await?;

    watcher.stop();
    tokio::time::sleep(Duration::from_millis(20)).await;
    let checks = platform.requests().len();
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(platform.requests().len(), checks);

    Ok(())
}
