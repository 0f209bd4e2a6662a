//! Connectivity tracking
//!
//! [`Connectivity`] is the online/offline flag consulted before submitting.
//! It can be driven by platform signals (`set_online`) or by a
//! [`ConnectivityMonitor`] that pings the backend periodically.

use crate::backend::OrderBackend;
use crate::task::TaskHandle;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;

/// Shared online/offline flag
#[derive(Debug, Clone)]
pub struct Connectivity {
    tx: Arc<watch::Sender<bool>>,
}

impl Connectivity {
    pub fn new(online: bool) -> Self {
        let (tx, _) = watch::channel(online);
        Self { tx: Arc::new(tx) }
    }

    pub fn is_online(&self) -> bool {
        *self.tx.borrow()
    }

    /// Update the flag; subscribers are notified only on change
    pub fn set_online(&self, online: bool) {
        let changed = self.tx.send_if_modified(|current| {
            if *current == online {
                return false;
            }
            *current = online;
            true
        });
        if changed {
            if online {
                tracing::info!("Connection restored");
            } else {
                tracing::warn!("Connection lost, order submission disabled");
            }
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

impl Default for Connectivity {
    fn default() -> Self {
        Self::new(true)
    }
}

/// Periodically pings the backend and updates a [`Connectivity`] flag
pub struct ConnectivityMonitor {
    backend: Arc<dyn OrderBackend>,
    connectivity: Connectivity,
    check_interval: Duration,
}

impl ConnectivityMonitor {
    pub fn new(
        backend: Arc<dyn OrderBackend>,
        connectivity: Connectivity,
        check_interval: Duration,
    ) -> Self {
        Self {
            backend,
            connectivity,
            check_interval,
        }
    }

    /// Start the ping loop
    pub fn spawn(self) -> TaskHandle {
        let token = CancellationToken::new();
        let task_token = token.clone();
        let task = tokio::spawn(async move { self.run(task_token).await });
        TaskHandle::new(token, task)
    }

    async fn run(self, token: CancellationToken) {
        let mut ticker = interval(self.check_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut consecutive_failures = 0u32;

        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    tracing::debug!("Connectivity monitor shutdown");
                    break;
                }
                _ = ticker.tick() => {}
            }

            let result = tokio::select! {
                _ = token.cancelled() => break,
                result = self.backend.ping() => result,
            };

            match result {
                Ok(()) => {
                    consecutive_failures = 0;
                    self.connectivity.set_online(true);
                }
                Err(e) => {
                    consecutive_failures += 1;
                    tracing::warn!(attempt = consecutive_failures, error = %e, "Backend ping failed");
                    self.connectivity.set_online(false);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;

    #[test]
    fn test_flag_notifies_only_on_change() {
        let connectivity = Connectivity::default();
        let mut rx = connectivity.subscribe();
        assert!(connectivity.is_online());

        connectivity.set_online(true);
        assert!(!rx.has_changed().unwrap());

        connectivity.set_online(false);
        assert!(rx.has_changed().unwrap());
        assert!(!*rx.borrow_and_update());
        assert!(!connectivity.is_online());
    }

    #[tokio::test(start_paused = true)]
    async fn test_monitor_follows_backend_reachability() {
        let backend = Arc::new(MemoryBackend::new());
        let connectivity = Connectivity::default();
        let handle = ConnectivityMonitor::new(
            backend.clone(),
            connectivity.clone(),
            Duration::from_secs(10),
        )
        .spawn();

        backend.set_unreachable(true);
        tokio::time::sleep(Duration::from_secs(11)).await;
        assert!(!connectivity.is_online());

        backend.set_unreachable(false);
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(connectivity.is_online());

        handle.stop().await;
    }
}
