//! External player SDK seam
//!
//! The embeddable player is loaded and driven by a third-party SDK the
//! controller does not own. This module declares the narrow surface the
//! controller is allowed to use:
//!
//! - [`PlayerSdk`]: the loaded SDK (loader injection and instance creation)
//! - [`PlayerInstance`]: an opaque handle to one embedded player
//! - [`SdkEvent`]: callbacks the instance delivers through an [`EventSink`]
//!
//! [`bootstrap`] turns the SDK's single global ready callback into a
//! one-shot broadcast signal, and [`simulated`] provides an in-process
//! implementation used by the console binary and the tests.

pub mod bootstrap;
pub mod simulated;

pub use bootstrap::{ReadySignal, SdkBootstrap};
pub use simulated::{SimulatedInstance, SimulatedMedia, SimulatedSdk};

use crate::utils::error::Result;
use tokio::sync::mpsc;

/// Player states as reported by the SDK's state-change callback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExternalState {
    Unstarted,
    Ended,
    Playing,
    Paused,
    Buffering,
    Cued,
    /// A code this crate does not know about
    Unknown(i32),
}

impl ExternalState {
    /// Decode the SDK's numeric state code
    pub fn from_code(code: i32) -> Self {
        match code {
            -1 => ExternalState::Unstarted,
            0 => ExternalState::Ended,
            1 => ExternalState::Playing,
            2 => ExternalState::Paused,
            3 => ExternalState::Buffering,
            5 => ExternalState::Cued,
            other => ExternalState::Unknown(other),
        }
    }

    pub fn code(self) -> i32 {
        match self {
            ExternalState::Unstarted => -1,
            ExternalState::Ended => 0,
            ExternalState::Playing => 1,
            ExternalState::Paused => 2,
            ExternalState::Buffering => 3,
            ExternalState::Cued => 5,
            ExternalState::Unknown(code) => code,
        }
    }
}

/// Callbacks delivered by a player instance
#[derive(Debug, Clone, PartialEq)]
pub enum SdkEvent {
    /// The instance finished loading and accepts commands
    Ready,
    /// Playback state changed
    StateChange(ExternalState),
    /// The SDK reported an error code (invalid id, embedding disabled, ...)
    Error(i32),
}

/// Channel end handed to the SDK when an instance is created
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::UnboundedSender<SdkEvent>,
}

impl EventSink {
    pub fn new(tx: mpsc::UnboundedSender<SdkEvent>) -> Self {
        Self { tx }
    }

    /// Deliver an event; silently dropped once the session has gone away
    pub fn emit(&self, event: SdkEvent) {
        if self.tx.send(event).is_err() {
            log::trace!("SDK event dropped: receiver closed");
        }
    }
}

/// Options passed to the SDK when embedding a player
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerOptions {
    /// Start playback as soon as the instance is ready
    pub autoplay: bool,
    /// Show the SDK's own controls; the controller draws its own
    pub native_controls: bool,
    /// Allow playback to start in a fullscreen-capable surface
    pub allow_fullscreen: bool,
    /// Suggest related videos from other channels at the end
    pub related_videos: bool,
    /// Position to start from, in seconds
    pub start_seconds: f64,
}

impl Default for PlayerOptions {
    fn default() -> Self {
        Self {
            autoplay: true,
            native_controls: false,
            allow_fullscreen: true,
            related_videos: false,
            start_seconds: 0.0,
        }
    }
}

/// The loaded external player SDK
pub trait PlayerSdk: Send + Sync {
    /// Whether the SDK's global entry point is already present
    fn is_loaded(&self) -> bool;

    /// Inject the SDK loader resource
    ///
    /// The SDK fires `ready` once its global entry point exists. If loading
    /// fails the signal is never fired.
    fn inject_loader(&self, ready: ReadySignal);

    /// Embed a player for `video_id` into the element `container_id`
    fn create_instance(
        &self,
        container_id: &str,
        video_id: &str,
        options: &PlayerOptions,
        events: EventSink,
    ) -> Result<Box<dyn PlayerInstance>>;
}

/// Opaque handle to one embedded player
///
/// This is the entire surface the controller may call. Implementations are
/// single objects that apply calls in order.
pub trait PlayerInstance: Send {
    fn play(&mut self);
    fn pause(&mut self);
    /// Jump to `seconds`, keeping the current play/pause mode
    fn seek_to(&mut self, seconds: f64, allow_seek_ahead: bool);
    fn set_volume(&mut self, volume: u8);
    fn mute(&mut self);
    fn unmute(&mut self);
    fn set_playback_rate(&mut self, rate: f64);
    fn set_playback_quality(&mut self, quality: &str);
    fn load_module(&mut self, module: &str);
    fn unload_module(&mut self, module: &str);
    fn current_time(&self) -> f64;
    fn duration(&self) -> f64;
    fn volume(&self) -> u8;
    fn is_muted(&self) -> bool;
    fn available_quality_levels(&self) -> Vec<String>;
    /// Remove the embedded player; no other call is valid afterwards
    fn destroy(&mut self);
}
