//! Embedded player controller
//!
//! This module owns the single player session: it bootstraps the external
//! SDK, binds an instance to the requested video, keeps a local view model
//! in sync with it, and translates control-surface commands into instance
//! calls.

mod controller;
mod dialog;
mod events;
mod poll;
mod state;

pub use controller::{PlayerController, PlayerControllerBuilder};
pub use dialog::{ControlKey, DismissReason, PlayerDialog};
pub use events::EventSubscription;
pub use state::SessionState;

use crate::sdk::PlayerOptions;
use crate::utils::error::{PlayerError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Playback state of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    /// No session
    #[default]
    Uninitialized,

    /// Waiting for the SDK and the embedded instance
    Loading,

    /// Instance ready, no state change seen yet
    Ready,

    /// Currently playing
    Playing,

    /// Paused, buffering, cued or ended
    Paused,

    /// Instance released; only passed through during teardown
    Destroyed,
}

/// Playback rates offered by the control surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackSpeed {
    Quarter,
    Half,
    ThreeQuarters,
    #[default]
    Normal,
    OneAndQuarter,
    OneAndHalf,
    OneAndThreeQuarters,
    Double,
}

impl PlaybackSpeed {
    /// Every speed, slowest first
    pub const ALL: [PlaybackSpeed; 8] = [
        PlaybackSpeed::Quarter,
        PlaybackSpeed::Half,
        PlaybackSpeed::ThreeQuarters,
        PlaybackSpeed::Normal,
        PlaybackSpeed::OneAndQuarter,
        PlaybackSpeed::OneAndHalf,
        PlaybackSpeed::OneAndThreeQuarters,
        PlaybackSpeed::Double,
    ];

    pub fn value(self) -> f64 {
        match self {
            PlaybackSpeed::Quarter => 0.25,
            PlaybackSpeed::Half => 0.5,
            PlaybackSpeed::ThreeQuarters => 0.75,
            PlaybackSpeed::Normal => 1.0,
            PlaybackSpeed::OneAndQuarter => 1.25,
            PlaybackSpeed::OneAndHalf => 1.5,
            PlaybackSpeed::OneAndThreeQuarters => 1.75,
            PlaybackSpeed::Double => 2.0,
        }
    }

    /// Exact match against the enumerated rates
    pub fn from_value(value: f64) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.value() == value)
    }

    /// Menu label; only 1x reads "Normal"
    pub fn label(self) -> String {
        match self {
            PlaybackSpeed::Normal => "Normal".to_string(),
            other => format!("{}x", other.value()),
        }
    }

    fn index(self) -> usize {
        Self::ALL.iter().position(|s| *s == self).unwrap_or(3)
    }

    /// Next faster speed, if any
    pub fn faster(self) -> Option<Self> {
        Self::ALL.get(self.index() + 1).copied()
    }

    /// Next slower speed, if any
    pub fn slower(self) -> Option<Self> {
        self.index().checked_sub(1).map(|i| Self::ALL[i])
    }
}

impl fmt::Display for PlaybackSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

impl FromStr for PlaybackSpeed {
    type Err = PlayerError;

    /// Accepts "1.5", "1.5x" and "normal"
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("normal") {
            return Ok(PlaybackSpeed::Normal);
        }
        let value: f64 = s
            .trim_end_matches(['x', 'X'])
            .parse()
            .map_err(|_| PlayerError::invalid_input(format!("not a speed: {}", s)))?;
        Self::from_value(value)
            .ok_or_else(|| PlayerError::invalid_input(format!("unsupported speed: {}", s)))
    }
}

/// Requested playback quality
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Quality {
    /// Let the player pick
    #[default]
    Auto,
    /// One of the player's advertised level names
    Level(String),
}

impl Quality {
    /// Value passed to the SDK
    pub fn as_str(&self) -> &str {
        match self {
            Quality::Auto => "auto",
            Quality::Level(level) => level,
        }
    }

    pub fn label(&self) -> String {
        match self {
            Quality::Auto => "Auto".to_string(),
            Quality::Level(level) => quality_label(level),
        }
    }
}

impl From<&str> for Quality {
    fn from(s: &str) -> Self {
        if s.eq_ignore_ascii_case("auto") {
            Quality::Auto
        } else {
            Quality::Level(s.to_string())
        }
    }
}

/// Human label for an SDK quality level; unknown levels are shown as-is
pub fn quality_label(level: &str) -> String {
    let label = match level {
        "tiny" => "144p",
        "small" => "240p",
        "medium" => "360p",
        "large" => "480p",
        "hd720" => "720p",
        "hd1080" => "1080p",
        "hd1440" => "1440p",
        "hd2160" => "4K",
        "auto" => "Auto",
        raw => raw,
    };
    label.to_string()
}

/// Player configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Element id of the surface the player is embedded into
    pub container_id: String,

    /// State-sync poll period in milliseconds
    pub poll_interval_ms: u64,

    /// Wait between SDK readiness and instance creation, in milliseconds
    pub mount_delay_ms: u64,

    /// Give up waiting for the SDK after this many milliseconds
    pub sdk_load_timeout_ms: Option<u64>,

    /// Start playback when the instance becomes ready
    pub autoplay: bool,

    /// SDK module providing captions
    pub captions_module: String,

    /// Arrow-key seek step in seconds
    pub seek_step: u64,

    /// Arrow-key volume step (0-100 scale)
    pub volume_step: u8,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            container_id: "player-container".to_string(),
            poll_interval_ms: 500,
            mount_delay_ms: 100,
            sdk_load_timeout_ms: None,
            autoplay: true,
            captions_module: "captions".to_string(),
            seek_step: 10,
            volume_step: 5,
        }
    }
}

impl PlayerConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn mount_delay(&self) -> Duration {
        Duration::from_millis(self.mount_delay_ms)
    }

    pub fn sdk_load_timeout(&self) -> Option<Duration> {
        self.sdk_load_timeout_ms.map(Duration::from_millis)
    }

    /// Embed options handed to the SDK
    pub fn player_options(&self) -> PlayerOptions {
        PlayerOptions {
            autoplay: self.autoplay,
            ..PlayerOptions::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.container_id.trim().is_empty() {
            return Err(PlayerError::Config("container_id must not be empty".to_string()));
        }
        if self.poll_interval_ms == 0 {
            return Err(PlayerError::Config("poll_interval_ms must be non-zero".to_string()));
        }
        if self.volume_step == 0 || self.volume_step > 100 {
            return Err(PlayerError::Config("volume_step must be between 1 and 100".to_string()));
        }
        if self.seek_step == 0 {
            return Err(PlayerError::Config("seek_step must be non-zero".to_string()));
        }
        if self.captions_module.trim().is_empty() {
            return Err(PlayerError::Config("captions_module must not be empty".to_string()));
        }
        Ok(())
    }
}

/// View-model change notification
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    /// A session was created for a video
    SessionOpened { video_id: String },

    /// The instance signalled readiness
    PlayerReady { duration: f64, qualities: Vec<String> },

    /// Playback started
    PlaybackStarted,

    /// Playback paused (or buffering, cued)
    PlaybackPaused,

    /// End of media reached; the session stays open
    PlaybackEnded,

    /// Cached position changed
    PositionChanged { seconds: f64 },

    /// Volume or mute changed
    VolumeChanged { volume: u8, muted: bool },

    /// Playback speed changed
    SpeedChanged { speed: PlaybackSpeed },

    /// Requested quality changed
    QualityChanged { quality: Quality },

    /// Captions toggled
    CaptionsChanged { enabled: bool },

    /// Host fullscreen state changed
    FullscreenChanged { active: bool },

    /// The session was destroyed
    SessionClosed { video_id: String },

    /// Something failed inside the controller
    Error { message: String },
}
