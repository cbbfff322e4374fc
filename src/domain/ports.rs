use super::address::{Address, AddressId, NewAddress};
use super::cart::Cart;
use super::identity::{SellerId, UserId};
use super::inventory::InventoryVariant;
use super::money::Price;
use super::notification::{NewNotification, NotificationRecord, SocketMessage};
use super::order::{Order, OrderId};
use super::payment::{PaymentMethod, PaymentRef};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

/// Per-SKU stock ledger.
///
/// `reserve` must serialise against concurrent reservations for the same SKU
/// (exclusive lock scoped to the variant, never table-wide) and perform the
/// availability check and the decrement as one step under that lock.
#[async_trait]
pub trait InventoryStore: Send + Sync {
    async fn put_variant(&self, variant: InventoryVariant) -> Result<()>;
    async fn get_variant(&self, sku: &str) -> Result<Option<InventoryVariant>>;
    /// Returns the variant state after the reservation was applied.
    async fn reserve(&self, sku: &str, quantity: u32) -> Result<InventoryVariant>;
    /// Compensating restock. Must not fail for an unknown SKU; callers rely
    /// on release being unable to abort a committed cancellation.
    async fn release(&self, sku: &str, quantity: u32) -> Result<()>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persists a freshly built order, assigning its internal id and the
    /// initial version.
    async fn insert(&self, order: Order) -> Result<Order>;
    async fn get(&self, id: OrderId) -> Result<Option<Order>>;
    async fn get_by_external_id(&self, external_id: Uuid) -> Result<Option<Order>>;
    /// Compare-and-swap write: commits `order` only if the stored version
    /// still equals `expected_version`, bumping the version; fails with
    /// `ConcurrencyConflict` otherwise.
    async fn update_versioned(&self, order: Order, expected_version: u64) -> Result<Order>;
    async fn delete(&self, id: OrderId) -> Result<()>;
    async fn list_for_buyer(&self, buyer: UserId) -> Result<Vec<Order>>;
    async fn list_for_seller(&self, seller: SellerId) -> Result<Vec<Order>>;
    async fn list_all(&self) -> Result<Vec<Order>>;
}

#[async_trait]
pub trait CartStore: Send + Sync {
    async fn load(&self, buyer: UserId) -> Result<Option<Cart>>;
    async fn put(&self, cart: Cart) -> Result<()>;
    async fn clear(&self, buyer: UserId) -> Result<()>;
}

#[async_trait]
pub trait AddressStore: Send + Sync {
    async fn resolve(&self, id: AddressId) -> Result<Option<Address>>;
    async fn save(&self, user: UserId, address: NewAddress) -> Result<Address>;
    async fn first_for_user(&self, user: UserId) -> Result<Option<Address>>;
}

#[async_trait]
pub trait PaymentLedger: Send + Sync {
    async fn open(&self, amount: Price, method: PaymentMethod, buyer: UserId)
    -> Result<PaymentRef>;
}

#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn append(&self, notification: NewNotification) -> Result<NotificationRecord>;
    async fn list_for_recipient(&self, recipient: UserId) -> Result<Vec<NotificationRecord>>;
    async fn unread_count(&self, recipient: UserId) -> Result<u64>;
}

/// Live push channel. Delivery is at-most-once: messages to recipients
/// without an open connection are dropped silently.
#[async_trait]
pub trait RealtimeChannel: Send + Sync {
    async fn send_to_user(&self, user: UserId, message: SocketMessage) -> Result<()>;
    async fn broadcast(&self, topic: &str, message: SocketMessage) -> Result<()>;
}

// Shared handles; the fan-out worker and the engine hold the same stores.
pub type InventoryStoreRef = Arc<dyn InventoryStore>;
pub type OrderStoreRef = Arc<dyn OrderStore>;
pub type CartStoreRef = Arc<dyn CartStore>;
pub type AddressStoreRef = Arc<dyn AddressStore>;
pub type PaymentLedgerRef = Arc<dyn PaymentLedger>;
pub type NotificationStoreRef = Arc<dyn NotificationStore>;
pub type RealtimeChannelRef = Arc<dyn RealtimeChannel>;
