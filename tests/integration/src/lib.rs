//! Integration test utilities for tubeplayer
//!
//! This module provides common utilities for integration testing including:
//! - A controller wired to the simulated SDK and fullscreen host
//! - An event recorder
//! - On-disk catalog and config fixtures
//! - A stand-in for the platform data API


use anyhow::Result;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tubeplayer::fullscreen::SimulatedFullscreen;
use tubeplayer::player::{EventSubscription, PlayerConfig, PlayerController, PlayerEvent};
use tubeplayer::sdk::{SdkBootstrap, SimulatedInstance, SimulatedSdk};

/// Long enough for the bootstrap, the mount delay and the first callbacks
pub const SETTLE: Duration = Duration::from_millis(200);

/// Controller over simulated backends, with a private bootstrap
pub struct Harness {
    pub sdk: SimulatedSdk,
    pub fullscreen: SimulatedFullscreen,
    pub bootstrap: Arc<SdkBootstrap>,
    pub controller: PlayerController,
}

impl Harness {
    pub fn new(sdk: SimulatedSdk) -> Result<Self> {
        Self::with_config(sdk, PlayerConfig::default())
    }

    pub fn with_config(sdk: SimulatedSdk, config: PlayerConfig) -> Result<Self> {
        let fullscreen = SimulatedFullscreen::new();
        let bootstrap = Arc::new(SdkBootstrap::new());
        let controller = PlayerController::builder()
            .with_config(config)
            .with_sdk(sdk.clone())
            .with_fullscreen(fullscreen.clone())
            .with_bootstrap(Arc::clone(&bootstrap))
            .build()?;
        Ok(Self {
            sdk,
            fullscreen,
            bootstrap,
            controller,
        })
    }

    /// Let background tasks run
    pub async fn settle(&self) {
        tokio::time::sleep(SETTLE).await;
    }

    /// The most recently created simulated instance
    pub fn instance(&self) -> SimulatedInstance {
        self.sdk
            .last_instance()
            .expect("no player instance was created")
    }
}

/// Records every event a controller dispatches
pub struct EventLog {
    events: Arc<Mutex<Vec<PlayerEvent>>>,
    _subscription: EventSubscription,
}

impl EventLog {
    pub fn attach(controller: &PlayerController) -> Self {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let subscription = controller.subscribe(move |event| sink.lock().push(event.clone()));
        Self {
            events,
            _subscription: subscription,
        }
    }

    pub fn events(&self) -> Vec<PlayerEvent> {
        self.events.lock().clone()
    }

    pub fn count(&self, predicate: impl Fn(&PlayerEvent) -> bool) -> usize {
        self.events.lock().iter().filter(|e| predicate(e)).count()
    }
}

/// Test fixture for integration tests
pub struct TestFixture {
    pub temp_dir: TempDir,
    pub catalog: PathBuf,
    pub config: PathBuf,
}

impl TestFixture {
    /// Create a temp dir holding a `videos.list` catalog and a config file
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;

        let catalog = temp_dir.path().join("videos.json");
        std::fs::write(&catalog, serde_json::to_string_pretty(&Self::catalog_json())?)?;

        let config = temp_dir.path().join("config.toml");
        std::fs::write(
            &config,
            "[player]\npoll_interval_ms = 250\ncontainer_id = \"hero-player\"\n\n[catalog]\nchannel_id = \"UC123\"\n",
        )?;

        Ok(Self {
            temp_dir,
            catalog,
            config,
        })
    }

    /// Get the path to the temporary directory
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    fn catalog_json() -> serde_json::Value {
        serde_json::json!({
            "kind": "youtube#videoListResponse",
            "items": [
                {
                    "id": "talk45",
                    "snippet": {
                        "title": "Sunday service",
                        "description": "Full recording",
                        "channelTitle": "Church",
                        "publishedAt": "2024-05-05T10:00:00Z",
                        "liveBroadcastContent": "none",
                        "thumbnails": {
                            "default": { "url": "https://i.ytimg.com/vi/talk45/default.jpg" },
                            "medium": { "url": "https://i.ytimg.com/vi/talk45/mqdefault.jpg" },
                            "high": { "url": "https://i.ytimg.com/vi/talk45/hqdefault.jpg" }
                        }
                    },
                    "contentDetails": { "duration": "PT45M30S" },
                    "statistics": { "viewCount": "1234" }
                },
                {
                    "id": "live1",
                    "snippet": {
                        "title": "Live worship",
                        "description": "Streaming now",
                        "channelTitle": "Church",
                        "publishedAt": "2024-05-12T10:00:00Z",
                        "liveBroadcastContent": "live"
                    },
                    "contentDetails": { "duration": "P0D" },
                    "statistics": { "viewCount": "87" }
                }
            ]
        })
    }
}
