//! Customer orders.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fulfilment stage of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
pub enum OrderStatus {
    Pending,
    Accepted,
    Preparing,
    #[serde(rename = "On The Way")]
    #[strum(serialize = "On The Way")]
    OnTheWay,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Every stage, in fulfilment order.
    pub const ALL: [Self; 6] = [
        Self::Pending,
        Self::Accepted,
        Self::Preparing,
        Self::OnTheWay,
        Self::Delivered,
        Self::Cancelled,
    ];

    /// Whether the order has reached a final stage.
    pub fn is_settled(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }
}

/// Display snapshot of a person attached to an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderParty {
    pub name: String,
    pub avatar_url: String,
    pub data_ai_hint: String,
}

/// One line of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub name: String,
    pub quantity: u32,
}

/// Order record from the `orders` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub customer: OrderParty,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver: Option<OrderParty>,
    pub items: Vec<OrderItem>,
    pub status: OrderStatus,
    pub total: f64,
    pub date: DateTime<Utc>,
    pub delivery_address: String,
}

impl Order {
    /// Total item count across all lines.
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }
}
