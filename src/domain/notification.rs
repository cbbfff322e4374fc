use super::identity::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Shared broadcast topic for admin-facing events.
pub const ADMIN_TOPIC: &str = "admin/notifications";

/// Realtime event discriminator, rendered as the wire token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    SellerNewOrder,
    SellerOrderCancelled,
    BuyerOrderUpdate,
    AdminNewOrder,
    AdminOrderCancelled,
    AdminOrderUpdate,
}

/// A persisted notification, queryable after the fact. Its lifecycle is
/// independent from the order that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationRecord {
    pub id: u64,
    pub recipient: UserId,
    pub message: String,
    pub link: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// Unsaved persisted-notification input.
#[derive(Debug, Clone, PartialEq)]
pub struct NewNotification {
    pub recipient: UserId,
    pub message: String,
    pub link: String,
}

/// Realtime wire envelope: `{ type, payload, timestamp }`, timestamp in
/// ISO-8601.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocketMessage {
    pub r#type: EventType,
    pub payload: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

impl SocketMessage {
    pub fn of<T: Serialize>(r#type: EventType, payload: &T) -> Self {
        Self {
            r#type,
            payload: serde_json::to_value(payload).unwrap_or(serde_json::Value::Null),
            timestamp: Utc::now(),
        }
    }
}
