//! HTTP backend for a hosted PostgREST-style order store
//!
//! | Operation | Request |
//! |-----------|---------|
//! | menu | `GET rest/v1/menu_items?select=*` |
//! | header | `POST rest/v1/orders` (`Prefer: return=representation`) |
//! | lines | `POST rest/v1/order_items` |
//! | status | `GET rest/v1/orders?id=eq.<id>&select=status` |
//! | cancel | `DELETE rest/v1/order_items?order_id=eq.<id>`, then `rest/v1/orders` |
//! | push | `GET realtime/v1/orders/<id>/events` (server-sent events) |

use super::{OrderBackend, StatusSubscription};
use crate::config::ClientConfig;
use crate::error::{BackendError, BackendResult};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use shared::models::MenuItem;
use shared::order::{OrderHeader, OrderLineRecord, OrderStatus, StatusEvent};
use tokio_util::sync::CancellationToken;

/// HTTP order backend
#[derive(Debug, Clone)]
pub struct RestBackend {
    client: Client,
    /// Client without a total timeout, for long-lived event streams
    stream_client: Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatusRow {
    status: OrderStatus,
}

impl RestBackend {
    /// Create a new backend from configuration
    pub fn new(config: &ClientConfig) -> BackendResult<Self> {
        let client = Client::builder().timeout(config.request_timeout()).build()?;
        let stream_client = Client::builder()
            .connect_timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            client,
            stream_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, client: &Client, method: Method, path: &str) -> RequestBuilder {
        let mut request = client.request(method, self.url(path));
        if let Some(key) = &self.api_key {
            request = request
                .header("apikey", key)
                .header(reqwest::header::AUTHORIZATION, format!("Bearer {}", key));
        }
        request
    }

    /// Handle the HTTP response
    async fn handle_response<T: DeserializeOwned>(response: Response) -> BackendResult<T> {
        let response = Self::ensure_success(response).await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| BackendError::InvalidResponse(e.to_string()))
    }

    async fn ensure_success(response: Response) -> BackendResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(BackendError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

/// Extract the id of the first returned row; ids may be text or numeric
fn first_row_id(rows: &[serde_json::Value]) -> BackendResult<String> {
    let id = rows
        .first()
        .and_then(|row| row.get("id"))
        .ok_or_else(|| BackendError::InvalidResponse("order insert returned no id".to_string()))?;
    match id {
        serde_json::Value::String(s) => Ok(s.clone()),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(BackendError::InvalidResponse(format!(
            "unexpected order id: {other}"
        ))),
    }
}

#[async_trait]
impl OrderBackend for RestBackend {
    async fn fetch_menu(&self) -> BackendResult<Vec<MenuItem>> {
        let response = self
            .request(&self.client, Method::GET, "rest/v1/menu_items")
            .query(&[("select", "*")])
            .send()
            .await?;
        Self::handle_response(response).await
    }

    async fn create_order(&self, header: &OrderHeader) -> BackendResult<String> {
        let response = self
            .request(&self.client, Method::POST, "rest/v1/orders")
            .header("Prefer", "return=representation")
            .json(header)
            .send()
            .await?;
        let rows: Vec<serde_json::Value> = Self::handle_response(response).await?;
        first_row_id(&rows)
    }

    async fn create_order_lines(&self, lines: &[OrderLineRecord]) -> BackendResult<()> {
        let response = self
            .request(&self.client, Method::POST, "rest/v1/order_items")
            .header("Prefer", "return=minimal")
            .json(lines)
            .send()
            .await?;
        Self::ensure_success(response).await?;
        Ok(())
    }

    async fn fetch_status(&self, order_id: &str) -> BackendResult<OrderStatus> {
        let response = self
            .request(&self.client, Method::GET, "rest/v1/orders")
            .query(&[("id", format!("eq.{order_id}")), ("select", "status".to_string())])
            .send()
            .await?;
        let rows: Vec<StatusRow> = Self::handle_response(response).await?;
        rows.first()
            .map(|row| row.status)
            .ok_or_else(|| BackendError::NotFound(order_id.to_string()))
    }

    async fn subscribe_status(&self, order_id: &str) -> BackendResult<StatusSubscription> {
        let path = format!("realtime/v1/orders/{order_id}/events");
        let response = self
            .request(&self.stream_client, Method::GET, &path)
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .send()
            .await?;
        let response = Self::ensure_success(response).await?;

        let cancel = CancellationToken::new();
        let (tx, subscription) = StatusSubscription::channel(cancel.clone());
        let order_id = order_id.to_string();

        tokio::spawn(async move {
            let mut stream = Box::pin(response.bytes_stream());
            let mut decoder = SseDecoder::default();
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    chunk = stream.next() => match chunk {
                        Some(Ok(bytes)) => {
                            for event in decoder.push(&bytes) {
                                if event.order_id != order_id {
                                    continue;
                                }
                                if tx.send(event).await.is_err() {
                                    return;
                                }
                            }
                        }
                        Some(Err(e)) => {
                            tracing::warn!(order_id = %order_id, error = %e, "Status stream failed");
                            break;
                        }
                        None => {
                            tracing::debug!(order_id = %order_id, "Status stream ended");
                            break;
                        }
                    }
                }
            }
        });

        Ok(subscription)
    }

    async fn cancel_order(&self, order_id: &str) -> BackendResult<()> {
        let filter = format!("eq.{order_id}");

        let response = self
            .request(&self.client, Method::DELETE, "rest/v1/order_items")
            .query(&[("order_id", filter.as_str())])
            .send()
            .await?;
        Self::ensure_success(response).await?;

        let response = self
            .request(&self.client, Method::DELETE, "rest/v1/orders")
            .query(&[("id", filter.as_str())])
            .send()
            .await?;
        Self::ensure_success(response).await?;
        Ok(())
    }

    async fn ping(&self) -> BackendResult<()> {
        let response = self
            .request(&self.client, Method::GET, "rest/v1/menu_items")
            .query(&[("select", "id"), ("limit", "1")])
            .send()
            .await?;
        Self::ensure_success(response).await?;
        Ok(())
    }
}

/// Incremental server-sent events decoder
///
/// `data:` lines of one event are joined with `\n` and the event is
/// dispatched on the blank line that ends it. The payload must be a JSON
/// [`StatusEvent`]; undecodable payloads are logged and skipped.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    data: Vec<String>,
}

impl SseDecoder {
    /// Feed raw bytes, returning every complete event
    pub fn push(&mut self, bytes: &[u8]) -> Vec<StatusEvent> {
        self.buffer.extend_from_slice(bytes);

        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line);
            let line = line.trim_end_matches(['\n', '\r']);

            if line.is_empty() {
                if let Some(event) = self.dispatch() {
                    events.push(event);
                }
                continue;
            }
            if let Some(data) = line.strip_prefix("data:") {
                let data = data.strip_prefix(' ').unwrap_or(data);
                self.data.push(data.to_string());
            }
            // Comments and other fields carry nothing we use
        }
        events
    }

    fn dispatch(&mut self) -> Option<StatusEvent> {
        if self.data.is_empty() {
            return None;
        }
        let payload = self.data.join("\n");
        self.data.clear();
        match serde_json::from_str::<StatusEvent>(&payload) {
            Ok(event) => Some(event),
            Err(e) => {
                tracing::warn!(error = %e, "Skipping undecodable status event");
                None
            }
        }
    }
}
