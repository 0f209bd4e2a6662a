//! Simulated kitchen for demos
//!
//! Advances every order created on a [`MemoryBackend`] through a fixed
//! schedule, the way a real kitchen would update the backend. The status
//! synchronizer cannot tell the difference: it only sees the backend.

use super::MemoryBackend;
use crate::task::TaskHandle;
use shared::order::OrderStatus;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Drives a [`MemoryBackend`] forward on timers
#[derive(Debug, Clone)]
pub struct SimulatedKitchen {
    backend: Arc<MemoryBackend>,
    /// Offsets from order creation
    schedule: Vec<(Duration, OrderStatus)>,
}

impl SimulatedKitchen {
    /// Default schedule: preparing after 3 s, ready after 6 s
    pub fn new(backend: Arc<MemoryBackend>) -> Self {
        Self {
            backend,
            schedule: vec![
                (Duration::from_secs(3), OrderStatus::Preparing),
                (Duration::from_secs(6), OrderStatus::Ready),
            ],
        }
    }

    /// Append a step at `offset` after creation
    pub fn with_step(mut self, offset: Duration, status: OrderStatus) -> Self {
        self.schedule.push((offset, status));
        self.schedule.sort_by_key(|(offset, _)| *offset);
        self
    }

    pub fn with_schedule(mut self, schedule: Vec<(Duration, OrderStatus)>) -> Self {
        self.schedule = schedule;
        self.schedule.sort_by_key(|(offset, _)| *offset);
        self
    }

    /// Start watching for new orders; dropping the handle stops every
    /// progression
    pub fn spawn(self) -> TaskHandle {
        let token = CancellationToken::new();
        let mut created = self.backend.subscribe_created();
        let task_token = token.clone();

        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = task_token.cancelled() => {
                        tracing::debug!("Simulated kitchen shutdown");
                        break;
                    }
                    result = created.recv() => match result {
                        Ok(order_id) => {
                            tracing::info!(order_id = %order_id, "Kitchen picked up order");
                            tokio::spawn(run_schedule(
                                self.backend.clone(),
                                order_id,
                                self.schedule.clone(),
                                task_token.child_token(),
                            ));
                        }
                        Err(RecvError::Lagged(n)) => {
                            tracing::warn!("Simulated kitchen missed {} orders", n);
                        }
                        Err(RecvError::Closed) => break,
                    }
                }
            }
        });

        TaskHandle::new(token, task)
    }
}

async fn run_schedule(
    backend: Arc<MemoryBackend>,
    order_id: String,
    schedule: Vec<(Duration, OrderStatus)>,
    token: CancellationToken,
) {
    let start = Instant::now();
    for (offset, status) in schedule {
        tokio::select! {
            _ = token.cancelled() => return,
            _ = tokio::time::sleep_until(start + offset) => {}
        }
        if !backend.set_status(&order_id, status) {
            tracing::debug!(order_id = %order_id, "Order gone, kitchen stops");
            return;
        }
        tracing::info!(order_id = %order_id, status = %status, "Kitchen advanced order");
    }
}
