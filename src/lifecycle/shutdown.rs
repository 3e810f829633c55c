//! Shutdown coordination for the geo endpoint.

use tokio::sync::broadcast;

/// Broadcast handle that stops a running `HttpServer`.
///
/// `HttpServer::run` takes a receiver from `subscribe`; `trigger` asks every
/// subscribed server to stop accepting and drain.
#[derive(Clone)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Signal all subscribers. A no-op when nobody is listening.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
