//! Player controller implementation for tubeplayer
//!
//! The [`PlayerController`] owns at most one player session. It bootstraps
//! the SDK, creates the embedded instance after a short mount delay, folds
//! SDK callbacks and poll ticks into the [`SessionState`] view model, and
//! forwards control-surface commands to the instance.
//!
//! Every mutation of the session (commands, timer ticks, SDK callbacks,
//! fullscreen notifications) happens under a single lock. Events produced
//! while the lock is held are queued and dispatched to subscribers after it
//! is released, so subscribers may call back into the controller.

use super::events::{EventDispatcher, EventSubscription};
use super::poll::PollTimer;
use super::state::SessionState;
use super::{PlaybackSpeed, PlaybackState, PlayerConfig, PlayerEvent, Quality};
use crate::fullscreen::{FullscreenApi, FullscreenFuture, SimulatedFullscreen};
use crate::sdk::{bootstrap, EventSink, ExternalState, PlayerInstance, PlayerSdk, SdkBootstrap, SdkEvent};
use crate::utils::error::{PlayerError, Result};
use crate::video::Video;

use log::{debug, error, info, trace, warn};
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Builder for [`PlayerController`]
pub struct PlayerControllerBuilder {
    config: PlayerConfig,
    sdk: Option<Arc<dyn PlayerSdk>>,
    fullscreen: Option<Arc<dyn FullscreenApi>>,
    bootstrap: Option<Arc<SdkBootstrap>>,
    runtime: Option<Handle>,
}

impl Default for PlayerControllerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PlayerControllerBuilder {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self {
            config: PlayerConfig::default(),
            sdk: None,
            fullscreen: None,
            bootstrap: None,
            runtime: None,
        }
    }

    /// Set player configuration
    pub fn with_config(mut self, config: PlayerConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the SDK the controller embeds players with (required)
    pub fn with_sdk<S: PlayerSdk + 'static>(mut self, sdk: S) -> Self {
        self.sdk = Some(Arc::new(sdk));
        self
    }

    /// Set the host fullscreen API; defaults to an in-memory host
    pub fn with_fullscreen<F: FullscreenApi + 'static>(mut self, fullscreen: F) -> Self {
        self.fullscreen = Some(Arc::new(fullscreen));
        self
    }

    /// Use a private bootstrap instead of the process-wide one
    pub fn with_bootstrap(mut self, bootstrap: Arc<SdkBootstrap>) -> Self {
        self.bootstrap = Some(bootstrap);
        self
    }

    /// Run session tasks on `runtime` instead of the current one
    pub fn with_runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Build the controller
    pub fn build(self) -> Result<PlayerController> {
        self.config.validate()?;

        let sdk = self
            .sdk
            .ok_or_else(|| PlayerError::Config("no player SDK configured".to_string()))?;
        let runtime = match self.runtime {
            Some(runtime) => runtime,
            None => Handle::try_current().map_err(|_| {
                PlayerError::Internal("player controller needs a Tokio runtime".to_string())
            })?,
        };
        let fullscreen = self
            .fullscreen
            .unwrap_or_else(|| Arc::new(SimulatedFullscreen::new()));
        let bootstrap = self.bootstrap.unwrap_or_else(bootstrap::global);

        let shared = Arc::new(Shared {
            inner: Mutex::new(Inner::default()),
            events: EventDispatcher::new(),
            config: self.config,
            runtime,
        });

        let listener = spawn_fullscreen_listener(&shared, fullscreen.as_ref());

        debug!(
            "Player controller created (container #{}, poll {}ms)",
            shared.config.container_id, shared.config.poll_interval_ms
        );

        Ok(PlayerController {
            shared,
            sdk,
            fullscreen,
            bootstrap,
            listener,
        })
    }
}

/// Mutable session data, only touched under [`Shared::inner`]
#[derive(Default)]
struct Inner {
    state: SessionState,
    instance: Option<Box<dyn PlayerInstance>>,
    /// Bumped on every open and teardown; stale tasks compare against it
    generation: u64,
    poll: Option<PollTimer>,
    lifecycle: Option<JoinHandle<()>>,
    pending: Vec<PlayerEvent>,
}

impl Inner {
    fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }

    /// Release everything the session holds and reset the view model
    ///
    /// The poll timer is stopped before the instance is destroyed.
    fn teardown(&mut self) {
        if let Some(poll) = self.poll.take() {
            poll.stop();
        }
        if let Some(task) = self.lifecycle.take() {
            task.abort();
        }
        self.generation += 1;

        if let Some(mut instance) = self.instance.take() {
            instance.destroy();
            self.state.playback_state = PlaybackState::Destroyed;
        }
        if let Some(video) = self.state.video.take() {
            info!("Player session for {} closed", video.id);
            self.pending.push(PlayerEvent::SessionClosed { video_id: video.id });
        }
        self.state.reset();
    }
}

struct Shared {
    inner: Mutex<Inner>,
    events: EventDispatcher,
    config: PlayerConfig,
    runtime: Handle,
}

impl Shared {
    /// Run `f` under the session lock, then dispatch whatever it queued
    fn with_inner<R>(&self, f: impl FnOnce(&mut Inner) -> R) -> R {
        let (result, events) = {
            let mut inner = self.inner.lock();
            let result = f(&mut inner);
            (result, std::mem::take(&mut inner.pending))
        };
        for event in &events {
            self.events.dispatch(event);
        }
        result
    }

    /// Create the external instance for the session `generation`
    ///
    /// Returns false if the session was replaced or creation failed.
    fn attach_instance(&self, sdk: &dyn PlayerSdk, generation: u64, sink: EventSink) -> bool {
        self.with_inner(|inner| {
            if !inner.is_current(generation) {
                debug!("Session replaced before the player was mounted");
                return false;
            }
            let Some(video_id) = inner.state.bound_video_id().map(str::to_string) else {
                return false;
            };

            let options = self.config.player_options();
            match sdk.create_instance(&self.config.container_id, &video_id, &options, sink) {
                Ok(instance) => {
                    info!("Player created for {}", video_id);
                    inner.instance = Some(instance);
                    true
                }
                Err(e) => {
                    error!("Failed to create player for {}: {}", video_id, e);
                    inner.pending.push(PlayerEvent::Error {
                        message: e.to_string(),
                    });
                    false
                }
            }
        })
    }

    fn handle_sdk_event(self: &Arc<Self>, generation: u64, event: SdkEvent) {
        self.with_inner(|inner| {
            if !inner.is_current(generation) || inner.instance.is_none() {
                trace!("Dropping {:?} from a stale session", event);
                return;
            }
            match event {
                SdkEvent::Ready => self.on_ready(inner, generation),
                SdkEvent::StateChange(external) => {
                    let state = inner.state.apply_external(external);
                    debug!("Player state {:?} -> {:?}", external, state);
                    let event = match external {
                        ExternalState::Playing => PlayerEvent::PlaybackStarted,
                        ExternalState::Ended => PlayerEvent::PlaybackEnded,
                        _ => PlayerEvent::PlaybackPaused,
                    };
                    inner.pending.push(event);
                }
                SdkEvent::Error(code) => {
                    warn!("Player reported error code {}", code);
                    inner.pending.push(PlayerEvent::Error {
                        message: format!("player error code {}", code),
                    });
                }
            }
        });
    }

    fn on_ready(self: &Arc<Self>, inner: &mut Inner, generation: u64) {
        let Some(instance) = inner.instance.as_ref() else {
            return;
        };
        let duration = instance.duration();
        let volume = instance.volume();
        let muted = instance.is_muted();
        let qualities = instance.available_quality_levels();

        inner
            .state
            .apply_ready(duration, volume, muted, qualities.clone());
        info!(
            "Player ready ({}, {} quality levels)",
            inner.state.duration_label(),
            qualities.len()
        );
        inner.pending.push(PlayerEvent::PlayerReady {
            duration: inner.state.duration,
            qualities,
        });

        if let Some(previous) = inner.poll.take() {
            previous.stop();
        }
        let weak = Arc::downgrade(self);
        inner.poll = Some(PollTimer::start(
            &self.runtime,
            self.config.poll_interval(),
            move || match weak.upgrade() {
                Some(shared) => shared.sync_tick(generation),
                None => false,
            },
        ));
    }

    /// One state-sync tick; false once the session is gone
    fn sync_tick(&self, generation: u64) -> bool {
        self.with_inner(|inner| {
            if !inner.is_current(generation) {
                return false;
            }
            let Inner {
                instance, state, pending, ..
            } = inner;
            let Some(instance) = instance.as_ref() else {
                return false;
            };

            let position = instance.current_time();
            if state.duration <= 0.0 || state.is_live() {
                let duration = instance.duration();
                if duration.is_finite() && duration > 0.0 {
                    state.duration = duration;
                }
            }

            let previous = state.current_time;
            state.update_position(position);
            trace!("Poll: position {:.2}s", state.current_time);
            if state.current_time != previous {
                pending.push(PlayerEvent::PositionChanged {
                    seconds: state.current_time,
                });
            }
            true
        })
    }

    fn set_fullscreen(&self, active: bool) {
        self.with_inner(|inner| {
            if inner.state.fullscreen_active != active {
                info!("Fullscreen {}", if active { "entered" } else { "left" });
                inner.state.fullscreen_active = active;
                inner.pending.push(PlayerEvent::FullscreenChanged { active });
            }
        });
    }
}

/// Wait for the SDK, mount the instance and pump its callbacks
async fn run_session(
    shared: Weak<Shared>,
    sdk: Arc<dyn PlayerSdk>,
    bootstrap: Arc<SdkBootstrap>,
    generation: u64,
) {
    let (timeout, mount_delay) = match shared.upgrade() {
        Some(shared) => (shared.config.sdk_load_timeout(), shared.config.mount_delay()),
        None => return,
    };

    if let Err(e) = bootstrap.ensure_ready_within(sdk.as_ref(), timeout).await {
        error!("Player SDK unavailable: {}", e);
        if let Some(shared) = shared.upgrade() {
            shared.with_inner(|inner| {
                if inner.is_current(generation) {
                    inner.pending.push(PlayerEvent::Error {
                        message: e.to_string(),
                    });
                }
            });
        }
        return;
    }

    tokio::time::sleep(mount_delay).await;

    let (tx, mut rx) = mpsc::unbounded_channel();
    match shared.upgrade() {
        Some(owner) => {
            if !owner.attach_instance(sdk.as_ref(), generation, EventSink::new(tx)) {
                return;
            }
        }
        None => return,
    }

    while let Some(event) = rx.recv().await {
        let Some(owner) = shared.upgrade() else {
            break;
        };
        owner.handle_sdk_event(generation, event);
    }
}

fn spawn_fullscreen_listener(shared: &Arc<Shared>, fullscreen: &dyn FullscreenApi) -> JoinHandle<()> {
    let mut changes = fullscreen.subscribe();
    let initial = *changes.borrow_and_update();
    shared.with_inner(|inner| inner.state.fullscreen_active = initial);

    let weak = Arc::downgrade(shared);
    shared.runtime.spawn(async move {
        while changes.changed().await.is_ok() {
            let active = *changes.borrow_and_update();
            let Some(shared) = weak.upgrade() else {
                break;
            };
            shared.set_fullscreen(active);
        }
    })
}

/// Controller for the single embedded player session
pub struct PlayerController {
    shared: Arc<Shared>,
    sdk: Arc<dyn PlayerSdk>,
    fullscreen: Arc<dyn FullscreenApi>,
    bootstrap: Arc<SdkBootstrap>,
    listener: JoinHandle<()>,
}

impl PlayerController {
    pub fn builder() -> PlayerControllerBuilder {
        PlayerControllerBuilder::new()
    }

    /// Start a session for `video`, replacing any current one
    ///
    /// The instance is created in the background once the SDK is ready and
    /// the mount delay has passed.
    pub fn open(&self, video: Video) -> Result<()> {
        if video.id.trim().is_empty() {
            return Err(PlayerError::invalid_input("video id must not be empty"));
        }

        self.shared.with_inner(|inner| {
            if inner.state.is_active() || inner.instance.is_some() {
                inner.teardown();
            }
            inner.generation += 1;
            let generation = inner.generation;

            info!("Opening player session for {} ({})", video.id, video.title);
            inner.pending.push(PlayerEvent::SessionOpened {
                video_id: video.id.clone(),
            });
            inner.state.begin(video);

            inner.lifecycle = Some(self.shared.runtime.spawn(run_session(
                Arc::downgrade(&self.shared),
                Arc::clone(&self.sdk),
                Arc::clone(&self.bootstrap),
                generation,
            )));
        });
        Ok(())
    }

    /// Destroy the session; safe to call with no session
    pub fn close(&self) {
        let exit_fullscreen = self.shared.with_inner(|inner| {
            let active = inner.state.is_active();
            inner.teardown();
            active && inner.state.fullscreen_active
        });
        if exit_fullscreen {
            self.settle_fullscreen(self.fullscreen.exit_fullscreen());
        }
    }

    /// Run `f` against the live instance, or do nothing if there is none
    fn command<F>(&self, name: &str, f: F)
    where
        F: FnOnce(&mut dyn PlayerInstance, &mut SessionState, &mut Vec<PlayerEvent>),
    {
        self.shared.with_inner(|inner| {
            let Inner {
                instance, state, pending, ..
            } = inner;
            match instance.as_deref_mut() {
                Some(instance) => f(instance, state, pending),
                None => debug!("{} ignored: no active player", name),
            }
        });
    }

    /// Pause if playing, play otherwise
    ///
    /// The local state follows the SDK's state-change callback.
    pub fn toggle_play(&self) {
        self.command("toggle_play", |instance, state, _| {
            if state.is_playing() {
                instance.pause();
            } else {
                instance.play();
            }
        });
    }

    pub fn play(&self) {
        self.command("play", |instance, _, _| instance.play());
    }

    pub fn pause(&self) {
        self.command("pause", |instance, _, _| instance.pause());
    }

    /// Jump to `seconds`, keeping the play/pause mode
    ///
    /// Range clamping is the caller's job; the cached position is updated
    /// immediately and corrected by the next poll.
    pub fn seek(&self, seconds: f64) {
        if !seconds.is_finite() {
            debug!("Ignoring seek to {}", seconds);
            return;
        }
        self.command("seek", |instance, state, pending| {
            debug!("Seek to {:.2}s", seconds);
            instance.seek_to(seconds, true);
            state.current_time = seconds;
            pending.push(PlayerEvent::PositionChanged { seconds });
        });
    }

    /// Set the volume (0-100); a non-zero volume also unmutes
    pub fn set_volume(&self, volume: u8) {
        let volume = volume.min(100);
        self.command("set_volume", |instance, state, pending| {
            instance.set_volume(volume);
            state.volume = volume;
            if volume > 0 && state.muted {
                instance.unmute();
                state.muted = false;
            }
            debug!("Volume {} (muted: {})", state.volume, state.muted);
            pending.push(PlayerEvent::VolumeChanged {
                volume: state.volume,
                muted: state.muted,
            });
        });
    }

    /// Flip mute; the volume level is kept
    pub fn toggle_mute(&self) {
        self.command("toggle_mute", |instance, state, pending| {
            if state.muted {
                instance.unmute();
            } else {
                instance.mute();
            }
            state.muted = !state.muted;
            pending.push(PlayerEvent::VolumeChanged {
                volume: state.volume,
                muted: state.muted,
            });
        });
    }

    pub fn set_speed(&self, speed: PlaybackSpeed) {
        self.command("set_speed", |instance, state, pending| {
            instance.set_playback_rate(speed.value());
            state.speed = speed;
            debug!("Playback speed {}", speed);
            pending.push(PlayerEvent::SpeedChanged { speed });
        });
    }

    /// Request a quality level
    ///
    /// Levels the instance did not advertise are ignored. The SDK gives no
    /// confirmation, so the local value is set immediately.
    pub fn set_quality(&self, quality: Quality) {
        self.command("set_quality", |instance, state, pending| {
            if !state.accepts_quality(&quality) {
                warn!("Quality {} not offered by the player", quality.as_str());
                return;
            }
            instance.set_playback_quality(quality.as_str());
            debug!("Quality {}", quality.label());
            state.quality = quality.clone();
            pending.push(PlayerEvent::QualityChanged { quality });
        });
    }

    /// Load or unload the captions module
    pub fn toggle_captions(&self) {
        let module = self.shared.config.captions_module.clone();
        self.command("toggle_captions", |instance, state, pending| {
            let enabled = !state.captions_enabled;
            if enabled {
                instance.load_module(&module);
            } else {
                instance.unload_module(&module);
            }
            state.captions_enabled = enabled;
            pending.push(PlayerEvent::CaptionsChanged { enabled });
        });
    }

    /// Request or leave fullscreen on the player container
    ///
    /// `fullscreen_active` only changes when the host reports it.
    pub fn toggle_fullscreen(&self) {
        let active = self
            .shared
            .with_inner(|inner| inner.instance.is_some().then_some(inner.state.fullscreen_active));
        let Some(active) = active else {
            debug!("toggle_fullscreen ignored: no active player");
            return;
        };

        let request = if active {
            self.fullscreen.exit_fullscreen()
        } else {
            self.fullscreen
                .request_fullscreen(&self.shared.config.container_id)
        };
        self.settle_fullscreen(request);
    }

    /// Leave fullscreen if the host reports it active
    pub fn exit_fullscreen(&self) {
        let active = self
            .shared
            .with_inner(|inner| inner.instance.is_some() && inner.state.fullscreen_active);
        if !active {
            debug!("exit_fullscreen ignored: not fullscreen");
            return;
        }
        self.settle_fullscreen(self.fullscreen.exit_fullscreen());
    }

    fn settle_fullscreen(&self, request: FullscreenFuture) {
        self.shared.runtime.spawn(async move {
            if let Err(e) = request.await {
                warn!("Fullscreen request rejected: {}", e);
            }
        });
    }

    /// Copy of the current view model
    pub fn snapshot(&self) -> SessionState {
        self.shared.inner.lock().state.clone()
    }

    pub fn playback_state(&self) -> PlaybackState {
        self.shared.inner.lock().state.playback_state
    }

    pub fn bound_video_id(&self) -> Option<String> {
        self.shared
            .inner
            .lock()
            .state
            .bound_video_id()
            .map(str::to_string)
    }

    /// Whether a session is open (loading or mounted)
    pub fn is_open(&self) -> bool {
        self.shared.inner.lock().state.is_active()
    }

    /// Whether the external instance exists
    pub fn has_instance(&self) -> bool {
        self.shared.inner.lock().instance.is_some()
    }

    pub fn is_fullscreen(&self) -> bool {
        self.shared.inner.lock().state.fullscreen_active
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.shared.config
    }

    /// Receive every view-model change until the handle is dropped
    pub fn subscribe<F>(&self, callback: F) -> EventSubscription
    where
        F: Fn(&PlayerEvent) + Send + Sync + 'static,
    {
        self.shared.events.subscribe(callback)
    }
}

impl Drop for PlayerController {
    fn drop(&mut self) {
        self.listener.abort();
        self.shared.with_inner(Inner::teardown);
    }
}
