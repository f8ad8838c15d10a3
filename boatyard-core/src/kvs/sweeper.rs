//! Background task that physically removes expired entries

use crate::kvs::memory::MemoryStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

/// Handle to a running expiry sweeper
pub struct ExpirySweeper {
    shutdown_tx: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl ExpirySweeper {
    /// Spawn a sweeper on the current tokio runtime
    pub fn spawn(store: Arc<MemoryStore>, interval: Duration) -> Self {
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!("Expiry sweeper started (interval: {:?})", interval);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let removed = store.purge_expired();
                        if removed > 0 {
                            debug!(removed, "Expiry sweep complete");
                        }
                    }
                    _ = &mut shutdown_rx => break,
                }
            }

            info!("Expiry sweeper stopped");
        });

        Self { shutdown_tx, handle }
    }

    /// Stop the sweeper and wait for the task to finish
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
        let _ = self.handle.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::kvs::KeyValueStore;
    use bytes::Bytes;

    #[tokio::test]
    async fn test_sweeper_purges_expired_entries() {
        let clock = ManualClock::default();
        let store = Arc::new(MemoryStore::new(Arc::new(clock.clone())));
        store.set("gone", Bytes::from_static(b"1"), Some(1)).unwrap();
        store.set("kept", Bytes::from_static(b"2"), None).unwrap();
        clock.advance_secs(5);

        let sweeper = ExpirySweeper::spawn(Arc::clone(&store), Duration::from_millis(5));

        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        while store.len() > 1 && tokio::time::Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        sweeper.shutdown().await;

        assert_eq!(store.len(), 1);
        assert_eq!(store.keys("*").unwrap(), vec!["kept".to_string()]);
    }

    #[tokio::test]
    async fn test_sweeper_shutdown_is_prompt() {
        let store = Arc::new(MemoryStore::with_system_clock());
        let sweeper = ExpirySweeper::spawn(store, Duration::from_secs(3600));

        tokio::time::timeout(Duration::from_secs(1), sweeper.shutdown())
            .await
            .expect("sweeper did not stop");
    }
}
