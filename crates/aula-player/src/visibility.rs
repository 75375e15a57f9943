//! Visibility of the host surface as an explicit event stream.
//!
//! The host surface (window, tab, embedding view) publishes foreground /
//! background transitions through a [`VisibilitySource`]; the player holds
//! a [`VisibilityHandle`] subscription that is released on teardown. This
//! keeps "the surface is hidden" out of global mutable state -- the
//! controller only ever reacts to delivered events.

use tokio::sync::watch;

/// Publisher side, owned by the embedder.
#[derive(Debug)]
pub struct VisibilitySource {
    tx: watch::Sender<bool>,
}

impl VisibilitySource {
    /// Create a source (initially visible) and its subscription handle.
    pub fn new() -> (Self, VisibilityHandle) {
        let (tx, rx) = watch::channel(true);
        (Self { tx }, VisibilityHandle { rx })
    }

    /// Publish a visibility change. No-op if nothing is subscribed.
    pub fn set_visible(&self, visible: bool) {
        let _ = self.tx.send(visible);
    }
}

/// Subscriber side, consumed by the player's event loop.
#[derive(Debug, Clone)]
pub struct VisibilityHandle {
    rx: watch::Receiver<bool>,
}

impl VisibilityHandle {
    /// Current visibility without waiting.
    pub fn is_visible(&self) -> bool {
        *self.rx.borrow()
    }

    /// Wait for the next change and return the new visibility.
    /// Returns `None` once the source is dropped.
    pub async fn changed(&mut self) -> Option<bool> {
        self.rx.changed().await.ok()?;
        Some(*self.rx.borrow())
    }
}
