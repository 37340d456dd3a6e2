//! Caller-side shell around the controller
//!
//! [`PlayerDialog`] is what a hosting screen talks to. It turns the screen's
//! `(video, is_open)` pair into open/close calls, routes dismissal requests
//! back to the screen, and maps control keys onto commands, clamping seek
//! targets and volume steps before they reach the controller.

use super::controller::PlayerController;
use crate::utils::clamp;
use crate::utils::error::Result;
use crate::video::Video;
use log::debug;

/// What asked the dialog to go away
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DismissReason {
    CloseButton,
    Backdrop,
    Escape,
}

/// Keyboard controls of the player surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlKey {
    Space,
    Left,
    Right,
    Up,
    Down,
    Home,
    End,
    Mute,
    Fullscreen,
    Captions,
    SpeedUp,
    SpeedDown,
    Escape,
}

impl ControlKey {
    /// Map a typed character to a control, case-insensitively
    pub fn from_char(c: char) -> Option<Self> {
        let key = match c.to_ascii_lowercase() {
            ' ' | 'k' => ControlKey::Space,
            'j' => ControlKey::Left,
            'l' => ControlKey::Right,
            'm' => ControlKey::Mute,
            'f' => ControlKey::Fullscreen,
            'c' => ControlKey::Captions,
            '>' => ControlKey::SpeedUp,
            '<' => ControlKey::SpeedDown,
            '0' => ControlKey::Home,
            '\u{1b}' => ControlKey::Escape,
            _ => return None,
        };
        Some(key)
    }
}

/// Modal player driven by a hosting screen
pub struct PlayerDialog {
    controller: PlayerController,
    on_close: Box<dyn FnMut() + Send>,
}

impl PlayerDialog {
    /// Wrap `controller`; `on_close` runs whenever the user asks to dismiss
    pub fn new<F>(controller: PlayerController, on_close: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        Self {
            controller,
            on_close: Box::new(on_close),
        }
    }

    pub fn controller(&self) -> &PlayerController {
        &self.controller
    }

    /// Reconcile the screen's inputs with the session
    ///
    /// An open dialog with a video opens a session unless that video is
    /// already bound. Anything else closes the session.
    pub fn render(&self, video: Option<&Video>, is_open: bool) -> Result<()> {
        match video {
            Some(video) if is_open => {
                if self.controller.bound_video_id().as_deref() != Some(video.id.as_str()) {
                    self.controller.open(video.clone())?;
                }
            }
            _ => {
                if self.controller.is_open() {
                    self.controller.close();
                }
            }
        }
        Ok(())
    }

    /// Ask the screen to close the dialog
    ///
    /// Escape while fullscreen does not dismiss; the host leaves fullscreen
    /// instead. Returns whether `on_close` was called.
    pub fn dismiss(&mut self, reason: DismissReason) -> bool {
        if reason == DismissReason::Escape && self.controller.is_fullscreen() {
            debug!("Escape consumed by fullscreen exit");
            return false;
        }
        debug!("Dialog dismissed ({:?})", reason);
        (self.on_close)();
        true
    }

    /// Apply a control key
    pub fn handle_key(&mut self, key: ControlKey) {
        let step = self.controller.config().seek_step as f64;
        let volume_step = self.controller.config().volume_step;
        let state = self.controller.snapshot();

        match key {
            ControlKey::Space => self.controller.toggle_play(),
            ControlKey::Left => self.seek_to(state.current_time - step),
            ControlKey::Right => self.seek_to(state.current_time + step),
            ControlKey::Home => self.seek_to(0.0),
            ControlKey::End => self.seek_to(state.duration),
            ControlKey::Up => self
                .controller
                .set_volume(state.volume.saturating_add(volume_step).min(100)),
            ControlKey::Down => self
                .controller
                .set_volume(state.volume.saturating_sub(volume_step)),
            ControlKey::Mute => self.controller.toggle_mute(),
            ControlKey::Fullscreen => self.controller.toggle_fullscreen(),
            ControlKey::Captions => self.controller.toggle_captions(),
            ControlKey::SpeedUp => {
                if let Some(speed) = state.speed.faster() {
                    self.controller.set_speed(speed);
                }
            }
            ControlKey::SpeedDown => {
                if let Some(speed) = state.speed.slower() {
                    self.controller.set_speed(speed);
                }
            }
            ControlKey::Escape => {
                if !self.dismiss(DismissReason::Escape) {
                    self.controller.exit_fullscreen();
                }
            }
        }
    }

    /// Seek with the target clamped into the media range
    ///
    /// Live streams have no upper bound.
    pub fn seek_to(&self, seconds: f64) {
        if !seconds.is_finite() {
            return;
        }
        let state = self.controller.snapshot();
        let target = if state.is_live() || state.duration <= 0.0 {
            seconds.max(0.0)
        } else {
            clamp(seconds, 0.0, state.duration)
        };
        self.controller.seek(target);
    }

    /// Seek to a scrubber position in [0, 1]; ignored for live or unknown length
    pub fn seek_to_fraction(&self, fraction: f64) {
        let state = self.controller.snapshot();
        if state.is_live() || state.duration <= 0.0 || !fraction.is_finite() {
            return;
        }
        self.seek_to(clamp(fraction, 0.0, 1.0) * state.duration);
    }
}
