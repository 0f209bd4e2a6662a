//! Order snapshot and status lifecycle
//!
//! The snapshot is a device-local cache of an order whose truth lives on the
//! backend. Only `status` changes after submission.

use super::types::CartLine;
use crate::models::TableNumber;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Order fulfillment status
///
/// Declaration order is the lifecycle order; a displayed status may only
/// move to a strictly greater value. `cooking` and `made` are accepted as
/// legacy spellings of `preparing` and `ready`.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Received,
    #[serde(alias = "cooking")]
    Preparing,
    #[serde(alias = "made")]
    Ready,
    Completed,
}

impl OrderStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Preparing => "preparing",
            Self::Ready => "ready",
            Self::Completed => "completed",
        }
    }

    /// Whether no further transitions are expected under `variant`
    pub fn is_terminal(&self, variant: StatusVariant) -> bool {
        *self >= variant.terminal()
    }

    /// Next status in the lifecycle, if any
    pub fn next(&self) -> Option<Self> {
        match self {
            Self::Received => Some(Self::Preparing),
            Self::Preparing => Some(Self::Ready),
            Self::Ready => Some(Self::Completed),
            Self::Completed => None,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status string not part of the lifecycle
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown order status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for OrderStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "received" => Ok(Self::Received),
            "preparing" | "cooking" => Ok(Self::Preparing),
            "ready" | "made" => Ok(Self::Ready),
            "completed" => Ok(Self::Completed),
            _ => Err(UnknownStatus(s.to_string())),
        }
    }
}

/// Which lifecycle the backend runs
///
/// `Short` ends at `ready`; `Extended` adds `completed` (order handed over
/// and closed).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StatusVariant {
    Short,
    #[default]
    Extended,
}

impl StatusVariant {
    pub const fn terminal(&self) -> OrderStatus {
        match self {
            Self::Short => OrderStatus::Ready,
            Self::Extended => OrderStatus::Completed,
        }
    }
}

impl FromStr for StatusVariant {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "short" => Ok(Self::Short),
            "extended" => Ok(Self::Extended),
            _ => Err(UnknownStatus(s.to_string())),
        }
    }
}

/// Device-local snapshot of a submitted order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderSnapshot {
    /// Order ID (assigned by the backend)
    #[serde(alias = "id")]
    pub order_id: String,
    #[serde(alias = "tableNumber")]
    pub table_number: TableNumber,
    /// Cart at submission time, never modified afterwards
    pub items: Vec<CartLine>,
    pub subtotal: Decimal,
    /// Subtotal with tax
    pub total: Decimal,
    pub status: OrderStatus,
    /// Submission timestamp (unix millis)
    #[serde(alias = "createdAt")]
    pub submitted_at: i64,
}

impl OrderSnapshot {
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|line| line.quantity).sum()
    }
}
