//! Session view model
//!
//! The cached picture of the external player the control surface renders
//! from. Every field is a last-write-wins snapshot: commands write it
//! optimistically, the poll loop and SDK events overwrite it.

use crate::player::{PlaybackSpeed, PlaybackState, Quality};
use crate::sdk::ExternalState;
use crate::utils::format_clock;
use crate::video::{Video, LIVE_DURATION_LABEL};

/// Local view of the player session
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    /// Video bound to the session, `None` when no session is active
    pub video: Option<Video>,

    pub playback_state: PlaybackState,

    /// Cached position in seconds
    pub current_time: f64,

    /// Media length in seconds, 0 until known
    pub duration: f64,

    /// Volume 0-100, kept while muted
    pub volume: u8,

    pub muted: bool,

    pub speed: PlaybackSpeed,

    pub quality: Quality,

    /// Levels advertised by the instance at readiness
    pub available_qualities: Vec<String>,

    pub captions_enabled: bool,

    /// Mirrors the host's fullscreen notifications
    pub fullscreen_active: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            video: None,
            playback_state: PlaybackState::Uninitialized,
            current_time: 0.0,
            duration: 0.0,
            volume: 100,
            muted: false,
            speed: PlaybackSpeed::Normal,
            quality: Quality::Auto,
            available_qualities: Vec::new(),
            captions_enabled: false,
            fullscreen_active: false,
        }
    }
}

impl SessionState {
    pub fn bound_video_id(&self) -> Option<&str> {
        self.video.as_ref().map(|v| v.id.as_str())
    }

    pub fn is_active(&self) -> bool {
        self.video.is_some()
    }

    pub fn is_playing(&self) -> bool {
        self.playback_state == PlaybackState::Playing
    }

    pub fn is_live(&self) -> bool {
        self.video.as_ref().is_some_and(|v| v.is_live)
    }

    /// Reset and bind a new video in the Loading state
    pub(crate) fn begin(&mut self, video: Video) {
        self.reset();
        self.video = Some(video);
        self.playback_state = PlaybackState::Loading;
    }

    /// Back to the initial shape
    ///
    /// `fullscreen_active` is left alone: only the host's notification may change it.
    pub(crate) fn reset(&mut self) {
        let fullscreen_active = self.fullscreen_active;
        *self = Self {
            fullscreen_active,
            ..Self::default()
        };
    }

    /// Take what the instance reports at readiness
    pub(crate) fn apply_ready(&mut self, duration: f64, volume: u8, muted: bool, qualities: Vec<String>) {
        self.duration = if duration.is_finite() { duration.max(0.0) } else { 0.0 };
        self.volume = volume.min(100);
        self.muted = muted;
        self.available_qualities = qualities;
        self.playback_state = PlaybackState::Ready;
    }

    /// Collapse the SDK's state onto Playing or Paused
    pub(crate) fn apply_external(&mut self, external: ExternalState) -> PlaybackState {
        self.playback_state = match external {
            ExternalState::Playing => PlaybackState::Playing,
            _ => PlaybackState::Paused,
        };
        self.playback_state
    }

    /// Store a polled position, clamped into the known media range
    pub(crate) fn update_position(&mut self, seconds: f64) {
        if !seconds.is_finite() {
            return;
        }
        self.current_time = if self.duration > 0.0 && !self.is_live() {
            seconds.clamp(0.0, self.duration)
        } else {
            seconds.max(0.0)
        };
    }

    /// Whether the instance advertised `quality` (auto is always accepted)
    pub fn accepts_quality(&self, quality: &Quality) -> bool {
        match quality {
            Quality::Auto => true,
            Quality::Level(level) => self.available_qualities.iter().any(|q| q == level),
        }
    }

    /// Duration text for the control bar
    ///
    /// Live sessions show the live sentinel instead of a length. Before the
    /// instance reports a duration the video's own display string is used.
    pub fn duration_label(&self) -> String {
        if self.is_live() {
            return LIVE_DURATION_LABEL.to_string();
        }
        if self.duration > 0.0 {
            return format_clock(self.duration);
        }
        self.video
            .as_ref()
            .map(|v| v.duration.clone())
            .unwrap_or_else(|| format_clock(0.0))
    }

    pub fn position_label(&self) -> String {
        format_clock(self.current_time)
    }

    /// Scrubber position in [0, 1]; 0 when the length is unknown or live
    pub fn progress(&self) -> f64 {
        if self.duration > 0.0 && !self.is_live() {
            (self.current_time / self.duration).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// Qualities offered in the menu, "auto" first and never duplicated
    pub fn quality_menu(&self) -> Vec<Quality> {
        std::iter::once(Quality::Auto)
            .chain(
                self.available_qualities
                    .iter()
                    .filter(|q| !q.eq_ignore_ascii_case("auto"))
                    .map(|q| Quality::Level(q.clone())),
            )
            .collect()
    }
}
