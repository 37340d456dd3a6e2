//! In-process stand-in for the external player SDK
//!
//! Behaves like the embeddable player closely enough to drive the
//! controller end to end: a loader that fires the ready signal, instances
//! that emit `Ready` and state changes, a playback clock that advances on
//! Tokio time while playing, and an `Ended` transition at the end of the
//! media. Every handle given to the controller is also kept here so callers
//! can inspect what the controller did to it.

use super::{
    EventSink, ExternalState, PlayerInstance, PlayerOptions, PlayerSdk, ReadySignal, SdkEvent,
};
use crate::utils::error::{PlayerError, Result};
use log::debug;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::time::Instant;

/// What the simulated platform knows about one video
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedMedia {
    /// Length in seconds; ignored for live media
    pub duration: f64,
    /// Quality levels the player advertises once ready
    pub qualities: Vec<String>,
    /// Live media reports a duration that grows with playback
    pub live: bool,
}

impl SimulatedMedia {
    pub fn vod(duration: f64) -> Self {
        Self {
            duration,
            ..Self::default()
        }
    }

    pub fn live() -> Self {
        Self {
            duration: 0.0,
            live: true,
            ..Self::default()
        }
    }

    pub fn with_qualities(mut self, qualities: &[&str]) -> Self {
        self.qualities = qualities.iter().map(|q| q.to_string()).collect();
        self
    }
}

impl Default for SimulatedMedia {
    fn default() -> Self {
        Self {
            duration: 600.0,
            qualities: ["hd1080", "hd720", "large", "medium", "small", "tiny", "auto"]
                .iter()
                .map(|q| q.to_string())
                .collect(),
            live: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoaderMode {
    /// The loader fires the ready signal as soon as it is injected
    Immediate,
    /// The loader waits for `finish_loading`
    Manual,
}

#[derive(Debug)]
struct SdkState {
    loaded: bool,
    mode: LoaderMode,
    injections: usize,
    pending: Option<ReadySignal>,
    media: HashMap<String, SimulatedMedia>,
    instances: Vec<SimulatedInstance>,
    fail_creation: bool,
}

/// Simulated SDK
#[derive(Debug, Clone)]
pub struct SimulatedSdk {
    state: Arc<Mutex<SdkState>>,
}

impl Default for SimulatedSdk {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedSdk {
    /// SDK whose loader succeeds as soon as it is injected
    pub fn new() -> Self {
        Self::with_mode(LoaderMode::Immediate, false)
    }

    /// SDK whose global entry point already exists
    pub fn preloaded() -> Self {
        Self::with_mode(LoaderMode::Immediate, true)
    }

    /// SDK whose loader only completes on [`finish_loading`](Self::finish_loading)
    pub fn manual() -> Self {
        Self::with_mode(LoaderMode::Manual, false)
    }

    fn with_mode(mode: LoaderMode, loaded: bool) -> Self {
        Self {
            state: Arc::new(Mutex::new(SdkState {
                loaded,
                mode,
                injections: 0,
                pending: None,
                media: HashMap::new(),
                instances: Vec::new(),
                fail_creation: false,
            })),
        }
    }

    /// Register what the platform serves for `video_id`
    pub fn with_media(self, video_id: &str, media: SimulatedMedia) -> Self {
        self.state.lock().media.insert(video_id.to_string(), media);
        self
    }

    /// Complete a pending manual load and fire the ready signal
    pub fn finish_loading(&self) {
        let pending = {
            let mut state = self.state.lock();
            state.loaded = true;
            state.pending.take()
        };
        if let Some(signal) = pending {
            signal.fire();
        }
    }

    /// Simulate a loader network failure: the signal is dropped unfired
    pub fn fail_loading(&self) {
        self.state.lock().pending.take();
    }

    /// Make subsequent `create_instance` calls fail
    pub fn set_fail_creation(&self, fail: bool) {
        self.state.lock().fail_creation = fail;
    }

    pub fn loader_injections(&self) -> usize {
        self.state.lock().injections
    }

    /// Every instance ever created, oldest first
    pub fn instances(&self) -> Vec<SimulatedInstance> {
        self.state.lock().instances.clone()
    }

    /// Instances that have not been destroyed
    pub fn live_instances(&self) -> Vec<SimulatedInstance> {
        self.state
            .lock()
            .instances
            .iter()
            .filter(|i| !i.is_destroyed())
            .cloned()
            .collect()
    }

    /// The most recently created instance
    pub fn last_instance(&self) -> Option<SimulatedInstance> {
        self.state.lock().instances.last().cloned()
    }
}

impl PlayerSdk for SimulatedSdk {
    fn is_loaded(&self) -> bool {
        self.state.lock().loaded
    }

    fn inject_loader(&self, ready: ReadySignal) {
        let fire_now = {
            let mut state = self.state.lock();
            state.injections += 1;
            match state.mode {
                LoaderMode::Immediate => {
                    state.loaded = true;
                    true
                }
                LoaderMode::Manual => {
                    state.pending = Some(ready.clone());
                    false
                }
            }
        };
        if fire_now {
            ready.fire();
        }
    }

    fn create_instance(
        &self,
        container_id: &str,
        video_id: &str,
        options: &PlayerOptions,
        events: EventSink,
    ) -> Result<Box<dyn PlayerInstance>> {
        let mut state = self.state.lock();
        if !state.loaded {
            return Err(PlayerError::Sdk("player SDK not loaded".to_string()));
        }
        if state.fail_creation {
            return Err(PlayerError::Instance(format!(
                "cannot embed {} into #{}",
                video_id, container_id
            )));
        }

        let media = state.media.get(video_id).cloned().unwrap_or_default();
        let instance = SimulatedInstance {
            inner: Arc::new(Mutex::new(Playback {
                video_id: video_id.to_string(),
                container_id: container_id.to_string(),
                position: options.start_seconds.max(0.0),
                anchor: None,
                rate: 1.0,
                volume: 100,
                muted: false,
                quality: "auto".to_string(),
                modules: Vec::new(),
                ended: false,
                destroyed: false,
                calls_after_destroy: 0,
                media,
                sink: events,
            })),
        };
        state.instances.push(instance.clone());
        drop(state);

        debug!("Simulated player created for {} in #{}", video_id, container_id);
        let mut handle = instance.clone();
        instance.emit(SdkEvent::Ready);
        if options.autoplay {
            handle.play();
        }

        Ok(Box::new(instance))
    }
}

#[derive(Debug)]
struct Playback {
    video_id: String,
    container_id: String,
    /// Position at `anchor`, or the frozen position while paused
    position: f64,
    /// Set while playing
    anchor: Option<Instant>,
    rate: f64,
    volume: u8,
    muted: bool,
    quality: String,
    modules: Vec<String>,
    ended: bool,
    destroyed: bool,
    calls_after_destroy: usize,
    media: SimulatedMedia,
    sink: EventSink,
}

impl Playback {
    fn position_now(&self) -> f64 {
        let position = match self.anchor {
            Some(anchor) => self.position + anchor.elapsed().as_secs_f64() * self.rate,
            None => self.position,
        };
        if self.media.live {
            position
        } else {
            position.min(self.media.duration)
        }
    }

    /// Fold elapsed play time into `position`, firing `Ended` at the end
    fn settle(&mut self) {
        if self.anchor.is_none() {
            return;
        }
        self.position = self.position_now();
        self.anchor = Some(Instant::now());
        if !self.media.live && self.position >= self.media.duration {
            self.anchor = None;
            self.ended = true;
            self.sink.emit(SdkEvent::StateChange(ExternalState::Ended));
        }
    }

    /// Record a call against a destroyed player; true if the call must be ignored
    fn rejected(&mut self, call: &str) -> bool {
        if self.destroyed {
            self.calls_after_destroy += 1;
            log::error!("{} called on destroyed player {}", call, self.video_id);
        }
        self.destroyed
    }
}

/// Handle to a simulated embedded player
#[derive(Debug, Clone)]
pub struct SimulatedInstance {
    inner: Arc<Mutex<Playback>>,
}

impl SimulatedInstance {
    fn emit(&self, event: SdkEvent) {
        self.inner.lock().sink.emit(event);
    }

    pub fn video_id(&self) -> String {
        self.inner.lock().video_id.clone()
    }

    pub fn container_id(&self) -> String {
        self.inner.lock().container_id.clone()
    }

    pub fn is_destroyed(&self) -> bool {
        self.inner.lock().destroyed
    }

    /// Number of calls made after `destroy`
    pub fn calls_after_destroy(&self) -> usize {
        self.inner.lock().calls_after_destroy
    }

    pub fn is_playing(&self) -> bool {
        self.inner.lock().anchor.is_some()
    }

    pub fn has_ended(&self) -> bool {
        self.inner.lock().ended
    }

    /// Position without counting as a player call
    pub fn position(&self) -> f64 {
        self.inner.lock().position_now()
    }

    pub fn playback_rate(&self) -> f64 {
        self.inner.lock().rate
    }

    pub fn quality(&self) -> String {
        self.inner.lock().quality.clone()
    }

    pub fn loaded_modules(&self) -> Vec<String> {
        self.inner.lock().modules.clone()
    }

    pub fn raw_volume(&self) -> (u8, bool) {
        let playback = self.inner.lock();
        (playback.volume, playback.muted)
    }

    /// Push a state change as if the platform did it (buffering, cued, ...)
    pub fn push_state(&self, state: ExternalState) {
        self.emit(SdkEvent::StateChange(state));
    }

    /// Push an error code as if the platform reported it
    pub fn push_error(&self, code: i32) {
        self.emit(SdkEvent::Error(code));
    }
}

impl PlayerInstance for SimulatedInstance {
    fn play(&mut self) {
        let mut p = self.inner.lock();
        if p.rejected("play") || p.anchor.is_some() {
            return;
        }
        if p.ended {
            p.position = 0.0;
            p.ended = false;
        }
        p.anchor = Some(Instant::now());
        p.sink.emit(SdkEvent::StateChange(ExternalState::Playing));
    }

    fn pause(&mut self) {
        let mut p = self.inner.lock();
        if p.rejected("pause") || p.anchor.is_none() {
            return;
        }
        p.position = p.position_now();
        p.anchor = None;
        p.sink.emit(SdkEvent::StateChange(ExternalState::Paused));
    }

    fn seek_to(&mut self, seconds: f64, _allow_seek_ahead: bool) {
        let mut p = self.inner.lock();
        if p.rejected("seekTo") {
            return;
        }
        p.position = if p.media.live {
            seconds.max(0.0)
        } else {
            seconds.clamp(0.0, p.media.duration)
        };
        p.ended = false;
        if p.anchor.is_some() {
            p.anchor = Some(Instant::now());
        }
    }

    fn set_volume(&mut self, volume: u8) {
        let mut p = self.inner.lock();
        if !p.rejected("setVolume") {
            p.volume = volume.min(100);
        }
    }

    fn mute(&mut self) {
        let mut p = self.inner.lock();
        if !p.rejected("mute") {
            p.muted = true;
        }
    }

    fn unmute(&mut self) {
        let mut p = self.inner.lock();
        if !p.rejected("unMute") {
            p.muted = false;
        }
    }

    fn set_playback_rate(&mut self, rate: f64) {
        let mut p = self.inner.lock();
        if p.rejected("setPlaybackRate") {
            return;
        }
        p.settle();
        p.rate = rate;
    }

    fn set_playback_quality(&mut self, quality: &str) {
        let mut p = self.inner.lock();
        if !p.rejected("setPlaybackQuality") {
            p.quality = quality.to_string();
        }
    }

    fn load_module(&mut self, module: &str) {
        let mut p = self.inner.lock();
        if p.rejected("loadModule") {
            return;
        }
        if !p.modules.iter().any(|m| m == module) {
            p.modules.push(module.to_string());
        }
    }

    fn unload_module(&mut self, module: &str) {
        let mut p = self.inner.lock();
        if !p.rejected("unloadModule") {
            p.modules.retain(|m| m != module);
        }
    }

    fn current_time(&self) -> f64 {
        let mut p = self.inner.lock();
        if p.rejected("getCurrentTime") {
            return 0.0;
        }
        p.settle();
        p.position
    }

    fn duration(&self) -> f64 {
        let mut p = self.inner.lock();
        if p.rejected("getDuration") {
            return 0.0;
        }
        if p.media.live {
            p.position_now()
        } else {
            p.media.duration
        }
    }

    fn volume(&self) -> u8 {
        let mut p = self.inner.lock();
        if p.rejected("getVolume") {
            return 0;
        }
        p.volume
    }

    fn is_muted(&self) -> bool {
        let mut p = self.inner.lock();
        if p.rejected("isMuted") {
            return false;
        }
        p.muted
    }

    fn available_quality_levels(&self) -> Vec<String> {
        let mut p = self.inner.lock();
        if p.rejected("getAvailableQualityLevels") {
            return Vec::new();
        }
        p.media.qualities.clone()
    }

    fn destroy(&mut self) {
        let mut p = self.inner.lock();
        if p.rejected("destroy") {
            return;
        }
        p.position = p.position_now();
        p.anchor = None;
        p.destroyed = true;
        debug!("Simulated player for {} destroyed", p.video_id);
    }
}
