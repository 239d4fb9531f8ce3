//! Shutdown coordination.

use std::time::Duration;

use tokio::sync::broadcast;

/// Broadcasts a single shutdown signal to every subscribed task.
#[derive(Debug, Clone)]
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

    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve once a shutdown was triggered and `grace` has passed since.
/// Used to force exit when in-flight calls do not drain in time.
pub async fn drain_deadline(mut rx: broadcast::Receiver<()>, grace: Duration) {
    // A closed channel means the coordinator is gone; treat it as a trigger.
    let _ = rx.recv().await;
    tokio::time::sleep(grace).await;
}
