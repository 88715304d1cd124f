//! Event-thread marshaling
//!
//! All panel and container mutation happens on the single UI thread. The
//! one cross-thread hazard is the process-exited notification, which
//! arrives on an arbitrary watcher thread; it is forwarded here and drained
//! by the UI loop. The waker pokes the native message loop so a blocked
//! `GetMessage` observes the queued event promptly.

use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;

use uuid::Uuid;

/// Notifications handled on the UI thread
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiEvent {
    /// The hosted process of a panel terminated (any cause)
    ProcessExited { panel_id: Uuid },
}

type Waker = Arc<dyn Fn() + Send + Sync>;

/// Cloneable handle for posting events from any thread
#[derive(Clone)]
pub struct EventProxy {
    tx: Sender<UiEvent>,
    waker: Waker,
}

impl EventProxy {
    pub fn post(&self, event: UiEvent) {
        // a closed receiver means the app is shutting down; drop silently
        let _ = self.tx.send(event);
        (self.waker)();
    }
}

/// UI-thread side of the event queue
pub struct EventQueue {
    tx: Sender<UiEvent>,
    rx: Receiver<UiEvent>,
    waker: Waker,
}

impl EventQueue {
    /// Queue with a no-op waker (tests, headless use)
    pub fn new() -> Self {
        Self::with_waker(Arc::new(|| {}))
    }

    /// Queue whose proxy wakes the native event loop after each post
    pub fn with_waker(waker: Waker) -> Self {
        let (tx, rx) = channel();
        Self { tx, rx, waker }
    }

    pub fn proxy(&self) -> EventProxy {
        EventProxy {
            tx: self.tx.clone(),
            waker: self.waker.clone(),
        }
    }

    /// Take all currently queued events without blocking
    pub fn drain(&self) -> Vec<UiEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            events.push(event);
        }
        events
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}
