use crate::domain::address::{Address, AddressId, NewAddress};
use crate::domain::cart::Cart;
use crate::domain::identity::{SellerId, UserId};
use crate::domain::inventory::{InventoryVariant, Sku};
use crate::domain::money::Price;
use crate::domain::notification::{NewNotification, NotificationRecord};
use crate::domain::order::{Order, OrderId};
use crate::domain::payment::{PaymentLedgerEntry, PaymentMethod, PaymentRef};
use crate::domain::ports::{
    AddressStore, CartStore, InventoryStore, NotificationStore, OrderStore, PaymentLedger,
};
use crate::error::{Result, SettlementError};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

/// In-memory inventory ledger.
///
/// Each variant sits behind its own `Mutex`, so reservations against the same
/// SKU serialise while distinct SKUs proceed concurrently. The outer map lock
/// is only held long enough to fetch the entry, never across the
/// check-then-act.
#[derive(Default, Clone)]
pub struct InMemoryInventoryStore {
    variants: Arc<RwLock<HashMap<Sku, Arc<Mutex<InventoryVariant>>>>>,
}

impl InMemoryInventoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn entry(&self, sku: &str) -> Option<Arc<Mutex<InventoryVariant>>> {
        let variants = self.variants.read().await;
        variants.get(sku).cloned()
    }
}

#[async_trait]
impl InventoryStore for InMemoryInventoryStore {
    async fn put_variant(&self, variant: InventoryVariant) -> Result<()> {
        let mut variants = self.variants.write().await;
        variants.insert(variant.sku.clone(), Arc::new(Mutex::new(variant)));
        Ok(())
    }

    async fn get_variant(&self, sku: &str) -> Result<Option<InventoryVariant>> {
        match self.entry(sku).await {
            Some(slot) => Ok(Some(slot.lock().await.clone())),
            None => Ok(None),
        }
    }

    async fn reserve(&self, sku: &str, quantity: u32) -> Result<InventoryVariant> {
        let slot = self
            .entry(sku)
            .await
            .ok_or_else(|| SettlementError::ResourceNotFound {
                kind: "variant",
                key: sku.to_string(),
            })?;
        let mut variant = slot.lock().await;
        variant.reserve(quantity)?;
        Ok(variant.clone())
    }

    async fn release(&self, sku: &str, quantity: u32) -> Result<()> {
        match self.entry(sku).await {
            Some(slot) => {
                slot.lock().await.release(quantity);
            }
            None => {
                // Restock must never abort a committed cancellation.
                tracing::warn!(sku, "release for unknown SKU dropped");
            }
        }
        Ok(())
    }
}

#[derive(Default)]
struct OrderStoreInner {
    next_id: OrderId,
    orders: HashMap<OrderId, Order>,
}

/// In-memory order store with compare-and-swap status writes.
#[derive(Default, Clone)]
pub struct InMemoryOrderStore {
    inner: Arc<RwLock<OrderStoreInner>>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn sorted_by_id(mut orders: Vec<Order>) -> Vec<Order> {
    orders.sort_by_key(|o| o.id);
    orders
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn insert(&self, mut order: Order) -> Result<Order> {
        let mut inner = self.inner.write().await;
        inner.next_id += 1;
        order.id = inner.next_id;
        order.version = 1;
        inner.orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>> {
        let inner = self.inner.read().await;
        Ok(inner.orders.get(&id).cloned())
    }

    async fn get_by_external_id(&self, external_id: Uuid) -> Result<Option<Order>> {
        let inner = self.inner.read().await;
        Ok(inner
            .orders
            .values()
            .find(|o| o.external_id == external_id)
            .cloned())
    }

    async fn update_versioned(&self, mut order: Order, expected_version: u64) -> Result<Order> {
        let mut inner = self.inner.write().await;
        let current = inner
            .orders
            .get(&order.id)
            .ok_or_else(|| SettlementError::ResourceNotFound {
                kind: "order",
                key: order.id.to_string(),
            })?;
        if current.version != expected_version {
            return Err(SettlementError::ConcurrencyConflict);
        }
        order.version = expected_version + 1;
        inner.orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn delete(&self, id: OrderId) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner
            .orders
            .remove(&id)
            .ok_or_else(|| SettlementError::ResourceNotFound {
                kind: "order",
                key: id.to_string(),
            })?;
        Ok(())
    }

    async fn list_for_buyer(&self, buyer: UserId) -> Result<Vec<Order>> {
        let inner = self.inner.read().await;
        Ok(sorted_by_id(
            inner
                .orders
                .values()
                .filter(|o| o.buyer == buyer)
                .cloned()
                .collect(),
        ))
    }

    async fn list_for_seller(&self, seller: SellerId) -> Result<Vec<Order>> {
        let inner = self.inner.read().await;
        Ok(sorted_by_id(
            inner
                .orders
                .values()
                .filter(|o| o.seller == seller)
                .cloned()
                .collect(),
        ))
    }

    async fn list_all(&self) -> Result<Vec<Order>> {
        let inner = self.inner.read().await;
        Ok(sorted_by_id(inner.orders.values().cloned().collect()))
    }
}

#[derive(Default, Clone)]
pub struct InMemoryCartStore {
    carts: Arc<RwLock<HashMap<UserId, Cart>>>,
}

impl InMemoryCartStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CartStore for InMemoryCartStore {
    async fn load(&self, buyer: UserId) -> Result<Option<Cart>> {
        let carts = self.carts.read().await;
        Ok(carts.get(&buyer).cloned())
    }

    async fn put(&self, cart: Cart) -> Result<()> {
        let mut carts = self.carts.write().await;
        carts.insert(cart.buyer, cart);
        Ok(())
    }

    async fn clear(&self, buyer: UserId) -> Result<()> {
        let mut carts = self.carts.write().await;
        carts.insert(buyer, Cart::new(buyer));
        Ok(())
    }
}

#[derive(Default)]
struct AddressStoreInner {
    next_id: AddressId,
    addresses: HashMap<AddressId, Address>,
}

#[derive(Default, Clone)]
pub struct InMemoryAddressStore {
    inner: Arc<RwLock<AddressStoreInner>>,
}

impl InMemoryAddressStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AddressStore for InMemoryAddressStore {
    async fn resolve(&self, id: AddressId) -> Result<Option<Address>> {
        let inner = self.inner.read().await;
        Ok(inner.addresses.get(&id).cloned())
    }

    async fn save(&self, user: UserId, address: NewAddress) -> Result<Address> {
        let mut inner = self.inner.write().await;
        inner.next_id += 1;
        let saved = Address {
            id: inner.next_id,
            user,
            line: address.line,
            city: address.city,
        };
        inner.addresses.insert(saved.id, saved.clone());
        Ok(saved)
    }

    async fn first_for_user(&self, user: UserId) -> Result<Option<Address>> {
        let inner = self.inner.read().await;
        Ok(inner
            .addresses
            .values()
            .filter(|a| a.user == user)
            .min_by_key(|a| a.id)
            .cloned())
    }
}

#[derive(Default)]
struct PaymentLedgerInner {
    next_id: PaymentRef,
    entries: Vec<PaymentLedgerEntry>,
}

#[derive(Default, Clone)]
pub struct InMemoryPaymentLedger {
    inner: Arc<RwLock<PaymentLedgerInner>>,
}

impl InMemoryPaymentLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn entries(&self) -> Vec<PaymentLedgerEntry> {
        self.inner.read().await.entries.clone()
    }
}

#[async_trait]
impl PaymentLedger for InMemoryPaymentLedger {
    async fn open(
        &self,
        amount: Price,
        method: PaymentMethod,
        buyer: UserId,
    ) -> Result<PaymentRef> {
        let mut inner = self.inner.write().await;
        inner.next_id += 1;
        let entry = PaymentLedgerEntry {
            id: inner.next_id,
            amount,
            method,
            buyer,
        };
        inner.entries.push(entry);
        Ok(inner.next_id)
    }
}

#[derive(Default)]
struct NotificationStoreInner {
    next_id: u64,
    records: Vec<NotificationRecord>,
}

#[derive(Default, Clone)]
pub struct InMemoryNotificationStore {
    inner: Arc<RwLock<NotificationStoreInner>>,
}

impl InMemoryNotificationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NotificationStore for InMemoryNotificationStore {
    async fn append(&self, notification: NewNotification) -> Result<NotificationRecord> {
        let mut inner = self.inner.write().await;
        inner.next_id += 1;
        let record = NotificationRecord {
            id: inner.next_id,
            recipient: notification.recipient,
            message: notification.message,
            link: notification.link,
            is_read: false,
            created_at: Utc::now(),
        };
        inner.records.push(record.clone());
        Ok(record)
    }

    async fn list_for_recipient(&self, recipient: UserId) -> Result<Vec<NotificationRecord>> {
        let inner = self.inner.read().await;
        Ok(inner
            .records
            .iter()
            .filter(|r| r.recipient == recipient)
            .cloned()
            .collect())
    }

    async fn unread_count(&self, recipient: UserId) -> Result<u64> {
        let inner = self.inner.read().await;
        Ok(inner
            .records
            .iter()
            .filter(|r| r.recipient == recipient && !r.is_read)
            .count() as u64)
    }
}
