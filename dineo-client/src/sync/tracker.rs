//! Status tracker task
//!
//! One spawned task per tracked order. It owns the [`StatusRegister`], the
//! poll timer and the push subscription, and tears all of them down on
//! cancellation or once the order is terminal.

use super::StatusRegister;
use crate::backend::{OrderBackend, StatusSubscription};
use crate::config::ClientConfig;
use crate::error::{BackendError, BackendResult};
use crate::store::SessionStore;
use shared::order::{OrderStatus, StatusEvent, StatusVariant};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Channel a status candidate arrived on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusSource {
    InitialFetch,
    Poll,
    Push,
}

impl fmt::Display for StatusSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::InitialFetch => "initial_fetch",
            Self::Poll => "poll",
            Self::Push => "push",
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TrackerOptions {
    pub poll_interval: Duration,
    pub variant: StatusVariant,
}

impl From<&ClientConfig> for TrackerOptions {
    fn from(config: &ClientConfig) -> Self {
        Self {
            poll_interval: config.poll_interval,
            variant: config.status_variant,
        }
    }
}

/// Live view of one order's status
///
/// Dropping the tracker cancels it; [`StatusTracker::stop`] also waits for
/// the task to finish.
#[derive(Debug)]
pub struct StatusTracker {
    order_id: String,
    status_rx: watch::Receiver<OrderStatus>,
    token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl StatusTracker {
    /// Start tracking `order_id` with `floor` as the last known status
    ///
    /// When `session` is given, every advance is persisted to the stored
    /// active order snapshot.
    pub fn spawn(
        backend: Arc<dyn OrderBackend>,
        session: Option<SessionStore>,
        order_id: impl Into<String>,
        floor: OrderStatus,
        options: TrackerOptions,
    ) -> Self {
        let order_id = order_id.into();
        let (status_tx, status_rx) = watch::channel(floor);
        let token = CancellationToken::new();

        let worker = TrackerWorker {
            backend,
            session,
            order_id: order_id.clone(),
            register: StatusRegister::new(floor),
            status_tx,
            token: token.clone(),
            options,
        };
        let task = tokio::spawn(worker.run());

        Self {
            order_id,
            status_rx,
            token,
            task: Some(task),
        }
    }

    pub fn order_id(&self) -> &str {
        &self.order_id
    }

    /// Currently displayed status
    pub fn status(&self) -> OrderStatus {
        *self.status_rx.borrow()
    }

    /// Receiver that is notified once per forward transition
    pub fn subscribe(&self) -> watch::Receiver<OrderStatus> {
        self.status_rx.clone()
    }

    /// Wait until the displayed status reaches at least `target`
    ///
    /// Returns the status reached, or `None` if tracking ended first.
    pub async fn wait_for(&self, target: OrderStatus) -> Option<OrderStatus> {
        let mut rx = self.status_rx.clone();
        let reached = rx.wait_for(|status| *status >= target).await.ok()?;
        Some(*reached)
    }

    /// Whether the poll/push task has ended
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(|task| task.is_finished())
    }

    /// Cancel polling and the push subscription, and wait for both to end
    pub async fn stop(mut self) {
        self.token.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for StatusTracker {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

struct TrackerWorker {
    backend: Arc<dyn OrderBackend>,
    session: Option<SessionStore>,
    order_id: String,
    register: StatusRegister,
    status_tx: watch::Sender<OrderStatus>,
    token: CancellationToken,
    options: TrackerOptions,
}

impl TrackerWorker {
    async fn run(mut self) {
        let order_id = self.order_id.clone();
        tracing::debug!(order_id = %order_id, floor = %self.register.current(), "Status tracking started");

        if self.is_terminal() {
            return;
        }

        let backend = self.backend.clone();
        match self.cancellable(backend.fetch_status(&order_id)).await {
            None => return,
            Some(Ok(status)) => self.apply(status, StatusSource::InitialFetch),
            Some(Err(e)) => {
                tracing::warn!(order_id = %order_id, error = %e, "Initial status fetch failed, keeping last known status");
            }
        }
        if self.is_terminal() {
            tracing::info!(order_id = %order_id, status = %self.register.current(), "Order already terminal");
            return;
        }

        let period = self.options.poll_interval;
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut subscription: Option<StatusSubscription> = None;
        let mut attempt = Some(self.open_subscription());

        loop {
            tokio::select! {
                _ = self.token.cancelled() => {
                    tracing::debug!(order_id = %order_id, "Status tracking cancelled");
                    break;
                }
                _ = ticker.tick() => {
                    if subscription.is_none() && attempt.is_none() {
                        attempt = Some(self.open_subscription());
                    }
                    match self.cancellable(backend.fetch_status(&order_id)).await {
                        None => break,
                        Some(Ok(status)) => self.apply(status, StatusSource::Poll),
                        Some(Err(e)) => {
                            tracing::warn!(order_id = %order_id, error = %e, "Status poll failed");
                        }
                    }
                }
                result = join_attempt(&mut attempt) => {
                    attempt = None;
                    match result {
                        Ok(sub) => {
                            tracing::debug!(order_id = %order_id, "Status subscription open");
                            subscription = Some(sub);
                        }
                        Err(e) => {
                            tracing::warn!(order_id = %order_id, error = %e, "Status subscription failed, polling only");
                        }
                    }
                }
                event = next_event(&mut subscription) => match event {
                    Some(event) => self.apply_event(event),
                    None => {
                        tracing::warn!(order_id = %order_id, "Status subscription closed, relying on polling");
                        subscription = None;
                    }
                }
            }

            if self.is_terminal() {
                tracing::info!(order_id = %order_id, status = %self.register.current(), "Order reached terminal status, tracking stopped");
                break;
            }
        }

        if let Some(pending) = attempt.take() {
            pending.abort();
        }
        // Dropping `subscription` here stops the push producer
    }

    /// Open the push channel on its own task so a slow backend never
    /// holds up polling
    ///
    /// Each attempt is bounded by the poll interval; the next tick retries.
    fn open_subscription(&self) -> JoinHandle<BackendResult<StatusSubscription>> {
        let backend = self.backend.clone();
        let order_id = self.order_id.clone();
        let limit = self.options.poll_interval;
        tokio::spawn(async move {
            match tokio::time::timeout(limit, backend.subscribe_status(&order_id)).await {
                Ok(result) => result,
                Err(_) => Err(BackendError::Timeout(format!(
                    "status subscription for {order_id}"
                ))),
            }
        })
    }

    async fn cancellable<F: Future>(&self, fut: F) -> Option<F::Output> {
        tokio::select! {
            _ = self.token.cancelled() => None,
            output = fut => Some(output),
        }
    }

    fn apply_event(&mut self, event: StatusEvent) {
        if event.order_id != self.order_id {
            tracing::debug!(order_id = %self.order_id, other = %event.order_id, "Ignoring event for another order");
            return;
        }
        self.apply(event.status, StatusSource::Push);
    }

    fn apply(&mut self, candidate: OrderStatus, source: StatusSource) {
        if !self.register.apply(candidate) {
            tracing::trace!(order_id = %self.order_id, %candidate, %source, "Stale or duplicate status ignored");
            return;
        }

        let status = self.register.current();
        tracing::info!(order_id = %self.order_id, %status, %source, "Order status advanced");
        self.status_tx.send_replace(status);

        if let Some(session) = &self.session
            && let Err(e) = session.advance_active_status(&self.order_id, status)
        {
            tracing::error!(order_id = %self.order_id, error = %e, "Failed to persist order status");
        }
    }

    fn is_terminal(&self) -> bool {
        self.register.current().is_terminal(self.options.variant)
    }
}

async fn join_attempt(
    attempt: &mut Option<JoinHandle<BackendResult<StatusSubscription>>>,
) -> BackendResult<StatusSubscription> {
    match attempt {
        Some(handle) => match handle.await {
            Ok(result) => result,
            Err(e) => Err(BackendError::Unavailable(format!(
                "subscription task ended: {e}"
            ))),
        },
        None => std::future::pending().await,
    }
}

async fn next_event(subscription: &mut Option<StatusSubscription>) -> Option<StatusEvent> {
    match subscription {
        Some(sub) => sub.recv().await,
        None => std::future::pending().await,
    }
}
