//! One-shot stop signal shared by the server, the WebSocket relay and tests.
//!
//! The first `trigger` wins: it records why the edge is stopping and wakes
//! every subscriber. Later calls are ignored, so a second signal during the
//! drain does not restart anything.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::broadcast;

#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
    fired: Arc<AtomicBool>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self {
            tx,
            fired: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Receiver that yields once the edge starts stopping.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Start stopping. Returns `false` if shutdown was already under way.
    pub fn trigger(&self, reason: &str) -> bool {
        if self.fired.swap(true, Ordering::AcqRel) {
            tracing::debug!(reason, "Shutdown already in progress");
            return false;
        }
        let listeners = self.tx.send(()).unwrap_or(0);
        tracing::info!(reason, listeners, "Shutting down");
        true
    }

    pub fn is_triggered(&self) -> bool {
        self.fired.load(Ordering::Acquire)
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_trigger_wakes_every_clone_once() {
        let shutdown = Shutdown::new();
        let mut server = shutdown.subscribe();
        let mut relay = shutdown.clone().subscribe();

        assert!(!shutdown.is_triggered());
        assert!(shutdown.clone().trigger("SIGTERM"));
        assert!(server.recv().await.is_ok());
        assert!(relay.recv().await.is_ok());

        assert!(!shutdown.trigger("SIGINT"));
        assert!(shutdown.is_triggered());
        assert!(relay.try_recv().is_err());
    }
}
