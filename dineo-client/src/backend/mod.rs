//! Remote order backend
//!
//! [`OrderBackend`] is the only way the client talks to the outside world.
//! It is constructed once and injected as `Arc<dyn OrderBackend>`.
//!
//! - [`RestBackend`]: hosted PostgREST-style store over HTTP + SSE
//! - [`MemoryBackend`]: in-process store with fault injection
//! - [`SimulatedKitchen`]: demo driver that advances a [`MemoryBackend`]

mod memory;
mod rest;
mod simulated;

pub use memory::MemoryBackend;
pub use rest::{RestBackend, SseDecoder};
pub use simulated::SimulatedKitchen;

use crate::error::BackendResult;
use async_trait::async_trait;
use shared::models::MenuItem;
use shared::order::{OrderHeader, OrderLineRecord, OrderStatus, StatusEvent};
use tokio::sync::mpsc;
use tokio_util::sync::{CancellationToken, DropGuard};

/// Buffer size for per-order push channels
pub(crate) const SUBSCRIPTION_BUFFER: usize = 16;

#[async_trait]
pub trait OrderBackend: Send + Sync {
    /// All orderable items
    async fn fetch_menu(&self) -> BackendResult<Vec<MenuItem>>;

    /// Create the order header; returns the authoritative order id
    async fn create_order(&self, header: &OrderHeader) -> BackendResult<String>;

    /// Create the line records of an existing header
    async fn create_order_lines(&self, lines: &[OrderLineRecord]) -> BackendResult<()>;

    async fn fetch_status(&self, order_id: &str) -> BackendResult<OrderStatus>;

    /// Push channel for status changes of one order
    async fn subscribe_status(&self, order_id: &str) -> BackendResult<StatusSubscription>;

    /// Compensating delete of a header and any of its lines
    async fn cancel_order(&self, order_id: &str) -> BackendResult<()>;

    /// Cheap reachability check
    async fn ping(&self) -> BackendResult<()>;
}

/// Receiving end of a push subscription
///
/// Dropping it stops the producer. `recv` returning `None` means the
/// channel closed; callers fall back to polling.
#[derive(Debug)]
pub struct StatusSubscription {
    rx: mpsc::Receiver<StatusEvent>,
    _guard: DropGuard,
}

impl StatusSubscription {
    /// Create a subscription whose producer observes `cancel`
    pub fn channel(cancel: CancellationToken) -> (mpsc::Sender<StatusEvent>, Self) {
        let (tx, rx) = mpsc::channel(SUBSCRIPTION_BUFFER);
        let subscription = Self {
            rx,
            _guard: cancel.drop_guard(),
        };
        (tx, subscription)
    }

    pub async fn recv(&mut self) -> Option<StatusEvent> {
        self.rx.recv().await
    }
}
