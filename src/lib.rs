//! tubeplayer - headless controller for an embedded video player
//!
//! The crate drives a third-party embeddable player through a narrow SDK
//! seam, keeps a local view model of the session in sync with it, and
//! exposes the control surface a hosting UI needs.

pub mod catalog;
pub mod console;
pub mod fullscreen;
pub mod player;
pub mod sdk;
pub mod source;
pub mod utils;
pub mod video;

pub use catalog::VideoCatalog;
pub use source::{LiveStatusWatcher, VideoSource};
pub use player::{PlayerController, PlayerDialog, PlayerEvent, SessionState};
pub use utils::error::{PlayerError, Result};
pub use video::Video;
