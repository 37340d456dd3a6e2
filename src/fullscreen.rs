//! Host fullscreen API
//!
//! Requests settle asynchronously and may be denied; whether fullscreen is
//! actually active is only ever learned from the change notification.

use crate::utils::error::{PlayerError, Result};
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

/// Settlement of a fullscreen request
pub type FullscreenFuture = Pin<Box<dyn Future<Output = Result<()>> + Send + 'static>>;

/// Browser-style fullscreen control
pub trait FullscreenApi: Send + Sync {
    /// Ask the host to make the element `target` fullscreen
    fn request_fullscreen(&self, target: &str) -> FullscreenFuture;

    /// Leave fullscreen
    fn exit_fullscreen(&self) -> FullscreenFuture;

    /// Fullscreen-change notifications; the current value is the live state
    fn subscribe(&self) -> watch::Receiver<bool>;
}

/// Fullscreen host that lives entirely in memory
///
/// Grants requests unless told to deny them, and lets callers simulate the
/// user leaving fullscreen through an out-of-band gesture.
#[derive(Debug, Clone)]
pub struct SimulatedFullscreen {
    state: Arc<watch::Sender<bool>>,
    deny: Arc<AtomicBool>,
    requests: Arc<AtomicUsize>,
}

impl Default for SimulatedFullscreen {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedFullscreen {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self {
            state: Arc::new(tx),
            deny: Arc::new(AtomicBool::new(false)),
            requests: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Reject every following request, as a browser without a user gesture would
    pub fn set_deny(&self, deny: bool) {
        self.deny.store(deny, Ordering::SeqCst);
    }

    pub fn is_active(&self) -> bool {
        *self.state.borrow()
    }

    /// Number of request and exit calls made so far
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    /// The user pressed the host's own escape gesture
    pub fn user_exit(&self) {
        self.state.send_replace(false);
    }

    fn settle(&self, target: bool, action: &'static str) -> FullscreenFuture {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let state = Arc::clone(&self.state);
        let deny = self.deny.load(Ordering::SeqCst);
        Box::pin(async move {
            tokio::task::yield_now().await;
            if deny {
                return Err(PlayerError::Fullscreen(format!("{} denied by host", action)));
            }
            state.send_if_modified(|active| {
                let changed = *active != target;
                *active = target;
                changed
            });
            Ok(())
        })
    }
}

impl FullscreenApi for SimulatedFullscreen {
    fn request_fullscreen(&self, target: &str) -> FullscreenFuture {
        log::debug!("Fullscreen requested for #{}", target);
        self.settle(true, "requestFullscreen")
    }

    fn exit_fullscreen(&self) -> FullscreenFuture {
        self.settle(false, "exitFullscreen")
    }

    fn subscribe(&self) -> watch::Receiver<bool> {
        self.state.subscribe()
    }
}
