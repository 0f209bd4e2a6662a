//! Cart and remote write types

use super::money;
use super::snapshot::OrderStatus;
use crate::models::{MenuItem, TableNumber};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One distinct menu item plus requested quantity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub item: MenuItem,
    /// Always >= 1 inside a cart
    pub quantity: u32,
}

impl CartLine {
    pub fn new(item: MenuItem, quantity: u32) -> Self {
        Self { item, quantity }
    }

    pub fn line_total(&self) -> Decimal {
        money::line_total(self.item.price, self.quantity)
    }
}

/// Order header written before any line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderHeader {
    pub table_number: TableNumber,
    pub status: OrderStatus,
    pub total_amount: Decimal,
}

impl OrderHeader {
    /// New header in the initial `received` status
    pub fn received(table_number: TableNumber, total_amount: Decimal) -> Self {
        Self {
            table_number,
            status: OrderStatus::Received,
            total_amount,
        }
    }
}

/// One remote order line, referencing its header
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLineRecord {
    pub order_id: String,
    pub menu_item_id: String,
    pub quantity: u32,
    /// Unit price at submission time
    pub price: Decimal,
}

impl OrderLineRecord {
    /// Build the line records for `order_id` from cart lines
    pub fn from_cart(order_id: &str, lines: &[CartLine]) -> Vec<Self> {
        lines
            .iter()
            .map(|line| Self {
                order_id: order_id.to_string(),
                menu_item_id: line.item.id.clone(),
                quantity: line.quantity,
                price: line.item.price,
            })
            .collect()
    }
}
