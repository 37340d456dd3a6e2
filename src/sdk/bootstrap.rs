//! One-shot SDK bootstrap
//!
//! The SDK announces readiness through a single global callback. Here that
//! callback becomes a [`ReadySignal`] feeding a watch channel: every waiter
//! registered before it fires is woken once, and anyone arriving later sees
//! the stored value and resolves immediately. The loader is injected at most
//! once per [`SdkBootstrap`], however many waiters race to it.

use super::PlayerSdk;
use crate::utils::error::{PlayerError, Result};
use log::{debug, info};
use once_cell::sync::Lazy;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

static GLOBAL: Lazy<Arc<SdkBootstrap>> = Lazy::new(|| Arc::new(SdkBootstrap::new()));

/// Process-wide bootstrap shared by every controller that does not bring its own
pub fn global() -> Arc<SdkBootstrap> {
    Arc::clone(&GLOBAL)
}

/// Handle the SDK calls once its global entry point is available
#[derive(Debug, Clone)]
pub struct ReadySignal {
    tx: Arc<watch::Sender<bool>>,
}

impl ReadySignal {
    /// Mark the SDK as ready; later calls have no effect
    pub fn fire(&self) {
        if !self.tx.send_replace(true) {
            info!("Player SDK ready");
        }
    }
}

/// Tracks loader injection and the ready signal
#[derive(Debug)]
pub struct SdkBootstrap {
    injected: AtomicBool,
    ready: Arc<watch::Sender<bool>>,
}

impl Default for SdkBootstrap {
    fn default() -> Self {
        Self::new()
    }
}

impl SdkBootstrap {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self {
            injected: AtomicBool::new(false),
            ready: Arc::new(tx),
        }
    }

    pub fn is_ready(&self) -> bool {
        *self.ready.borrow()
    }

    pub fn loader_injected(&self) -> bool {
        self.injected.load(Ordering::SeqCst)
    }

    /// A handle that marks this bootstrap ready when fired
    pub fn signal(&self) -> ReadySignal {
        ReadySignal {
            tx: Arc::clone(&self.ready),
        }
    }

    /// Wait until the SDK is usable, injecting the loader if nobody has yet
    ///
    /// Never resolves if the loader fails and the signal is never fired.
    pub async fn ensure_ready(&self, sdk: &dyn PlayerSdk) -> Result<()> {
        let mut rx = self.ready.subscribe();
        if *rx.borrow() {
            return Ok(());
        }

        if sdk.is_loaded() {
            debug!("Player SDK already present");
            self.signal().fire();
            return Ok(());
        }

        if !self.injected.swap(true, Ordering::SeqCst) {
            info!("Injecting player SDK loader");
            sdk.inject_loader(self.signal());
        } else {
            debug!("Player SDK loader already injected, waiting for ready signal");
        }

        if rx.wait_for(|ready| *ready).await.is_err() {
            return Err(PlayerError::Sdk("ready signal dropped".to_string()));
        }
        Ok(())
    }

    /// [`ensure_ready`](Self::ensure_ready) bounded by an optional timeout
    pub async fn ensure_ready_within(
        &self,
        sdk: &dyn PlayerSdk,
        timeout: Option<Duration>,
    ) -> Result<()> {
        match timeout {
            Some(limit) => tokio::time::timeout(limit, self.ensure_ready(sdk))
                .await
                .map_err(|_| PlayerError::SdkLoadTimeout(limit))?,
            None => self.ensure_ready(sdk).await,
        }
    }

    /// Forget the loader and the ready state
    ///
    /// Waiters already suspended keep waiting for a new signal.
    pub fn reset(&self) {
        self.injected.store(false, Ordering::SeqCst);
        self.ready.send_replace(false);
        debug!("Player SDK bootstrap reset");
    }
}
