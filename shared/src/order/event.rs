//! Status push notification

use super::snapshot::OrderStatus;
use serde::{Deserialize, Serialize};

/// Status-change notification scoped to one order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEvent {
    #[serde(alias = "id")]
    pub order_id: String,
    pub status: OrderStatus,
    /// Server-side change time (unix millis), when the backend provides it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changed_at: Option<i64>,
}

impl StatusEvent {
    pub fn new(order_id: impl Into<String>, status: OrderStatus) -> Self {
        Self {
            order_id: order_id.into(),
            status,
            changed_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_row_change_payload() {
        // Row-change payloads carry the whole row; extra fields are ignored
        let json = r#"{"id":"ORD-5","status":"cooking","table_number":3,"total_amount":99.0}"#;
        let event: StatusEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event, StatusEvent::new("ORD-5", OrderStatus::Preparing));
    }
}
