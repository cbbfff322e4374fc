use super::fanout::{FanoutEvent, Notifier};
use crate::domain::address::{AddressId, NewAddress};
use crate::domain::cart::{CartItem, partition_by_seller};
use crate::domain::identity::{Actor, SellerId};
use crate::domain::inventory::Sku;
use crate::domain::money::Price;
use crate::domain::notification::NotificationRecord;
use crate::domain::order::{Order, OrderId, OrderItem, OrderStatus};
use crate::domain::payment::PaymentMethod;
use crate::domain::ports::{
    AddressStoreRef, CartStoreRef, InventoryStoreRef, NotificationStoreRef, OrderStoreRef,
    PaymentLedgerRef,
};
use crate::error::{Result, SettlementError};
use uuid::Uuid;

/// Checkout parameters. Shipping target resolution prefers a new inline
/// address over a saved address id over the buyer's first saved address.
#[derive(Debug, Clone, Default)]
pub struct CreateOrderRequest {
    pub new_address: Option<NewAddress>,
    pub address_id: Option<AddressId>,
}

/// The order placement / inventory reservation / status-transition engine.
///
/// Owns handles to every collaborator port plus the post-commit notifier.
/// Every operation takes the acting principal explicitly.
pub struct SettlementEngine {
    orders: OrderStoreRef,
    inventory: InventoryStoreRef,
    carts: CartStoreRef,
    addresses: AddressStoreRef,
    payments: PaymentLedgerRef,
    notifications: NotificationStoreRef,
    notifier: Notifier,
}

/// One seller partition after the reserve phase, ready to commit.
struct PendingOrder {
    seller: SellerId,
    items: Vec<OrderItem>,
}

impl SettlementEngine {
    pub fn new(
        orders: OrderStoreRef,
        inventory: InventoryStoreRef,
        carts: CartStoreRef,
        addresses: AddressStoreRef,
        payments: PaymentLedgerRef,
        notifications: NotificationStoreRef,
        notifier: Notifier,
    ) -> Self {
        Self {
            orders,
            inventory,
            carts,
            addresses,
            payments,
            notifications,
            notifier,
        }
    }

    /// Settles the buyer's cart into one order per seller.
    ///
    /// Either every partition reserves, persists and pays, or nothing does:
    /// the reserve phase rolls back all reservations of this checkout on the
    /// first failure, and the cart is cleared only after the last partition
    /// committed.
    pub async fn create_order(
        &self,
        request: CreateOrderRequest,
        actor: &Actor,
    ) -> Result<Vec<Order>> {
        let cart = self
            .carts
            .load(actor.id)
            .await?
            .ok_or_else(|| SettlementError::ResourceNotFound {
                kind: "cart",
                key: actor.username.clone(),
            })?;

        let groups = partition_by_seller(&cart, actor)?;
        let shipping_address = self.resolve_shipping_address(&request, actor).await?;

        // Reserve phase: all partitions, rolling everything back on the
        // first failure so no partial checkout survives.
        let mut reserved: Vec<(Sku, u32)> = Vec::new();
        let mut pending: Vec<PendingOrder> = Vec::new();
        for (seller, items) in &groups {
            match self.reserve_partition(items, &mut reserved).await {
                Ok(snapshots) => pending.push(PendingOrder {
                    seller: *seller,
                    items: snapshots,
                }),
                Err(e) => {
                    self.rollback_reservations(&reserved).await;
                    return Err(e);
                }
            }
        }

        // Commit phase: one payment ledger entry per order, opened before
        // the order is persisted.
        let mut orders = Vec::with_capacity(pending.len());
        for partition in pending {
            match self
                .commit_partition(partition, shipping_address, actor)
                .await
            {
                Ok(order) => orders.push(order),
                Err(e) => {
                    self.rollback_reservations(&reserved).await;
                    self.rollback_orders(&orders).await;
                    return Err(e);
                }
            }
        }

        self.carts.clear(actor.id).await?;

        for order in &orders {
            self.notifier.publish(FanoutEvent::OrderCreated {
                order: order.clone(),
                buyer_name: actor.username.clone(),
            });
        }

        Ok(orders)
    }

    async fn reserve_partition(
        &self,
        items: &[CartItem],
        reserved: &mut Vec<(Sku, u32)>,
    ) -> Result<Vec<OrderItem>> {
        let mut snapshots = Vec::with_capacity(items.len());
        for item in items {
            let variant = self.inventory.reserve(&item.sku, item.quantity).await?;
            reserved.push((item.sku.clone(), item.quantity));
            snapshots.push(OrderItem::snapshot(item, &variant));
        }
        Ok(snapshots)
    }

    async fn commit_partition(
        &self,
        partition: PendingOrder,
        shipping_address: AddressId,
        actor: &Actor,
    ) -> Result<Order> {
        let total = partition
            .items
            .iter()
            .fold(Price::ZERO, |acc, i| acc + i.selling_price_at_purchase);
        let payment = self
            .payments
            .open(total, PaymentMethod::Vnpay, actor.id)
            .await?;
        let order = Order::build(
            actor.id,
            partition.seller,
            shipping_address,
            partition.items,
            payment,
        );
        self.orders.insert(order).await
    }

    async fn rollback_reservations(&self, reserved: &[(Sku, u32)]) {
        for (sku, quantity) in reserved {
            if let Err(e) = self.inventory.release(sku, *quantity).await {
                tracing::warn!(sku, error = %e, "failed to roll back reservation");
            }
        }
    }

    async fn rollback_orders(&self, orders: &[Order]) {
        for order in orders {
            if let Err(e) = self.orders.delete(order.id).await {
                tracing::warn!(order_id = order.id, error = %e, "failed to roll back order");
            }
        }
    }

    async fn resolve_shipping_address(
        &self,
        request: &CreateOrderRequest,
        actor: &Actor,
    ) -> Result<AddressId> {
        if let Some(new_address) = &request.new_address {
            let saved = self.addresses.save(actor.id, new_address.clone()).await?;
            return Ok(saved.id);
        }
        if let Some(id) = request.address_id {
            let address =
                self.addresses
                    .resolve(id)
                    .await?
                    .ok_or(SettlementError::ResourceNotFound {
                        kind: "address",
                        key: id.to_string(),
                    })?;
            return Ok(address.id);
        }
        let first = self.addresses.first_for_user(actor.id).await?;
        first.map(|a| a.id).ok_or(SettlementError::AddressNotFound)
    }

    pub async fn find_order(&self, id: OrderId, actor: &Actor) -> Result<Order> {
        let order = self
            .orders
            .get(id)
            .await?
            .ok_or_else(|| SettlementError::ResourceNotFound {
                kind: "order",
                key: id.to_string(),
            })?;
        if !order.viewable_by(actor) {
            return Err(SettlementError::AccessDenied(
                "you do not have permission to view this order".into(),
            ));
        }
        Ok(order)
    }

    pub async fn find_order_by_external_id(
        &self,
        external_id: Uuid,
        actor: &Actor,
    ) -> Result<Order> {
        let order = self
            .orders
            .get_by_external_id(external_id)
            .await?
            .ok_or_else(|| SettlementError::ResourceNotFound {
                kind: "order",
                key: external_id.to_string(),
            })?;
        if !order.viewable_by(actor) {
            return Err(SettlementError::AccessDenied(
                "you do not have permission to view this order".into(),
            ));
        }
        Ok(order)
    }

    pub async fn list_for_buyer(&self, actor: &Actor) -> Result<Vec<Order>> {
        self.orders.list_for_buyer(actor.id).await
    }

    pub async fn list_for_seller(&self, actor: &Actor) -> Result<Vec<Order>> {
        let seller = actor.seller_id.ok_or_else(|| {
            SettlementError::AccessDenied("actor has no seller profile".into())
        })?;
        self.orders.list_for_seller(seller).await
    }

    pub async fn list_all(&self, actor: &Actor) -> Result<Vec<Order>> {
        if !actor.is_admin {
            return Err(SettlementError::AccessDenied(
                "only admins may list all orders".into(),
            ));
        }
        self.orders.list_all().await
    }

    /// Forces the order into `new_status`.
    ///
    /// Admin or the owning seller only. The write is guarded by the version
    /// token read here: a concurrent writer who committed first wins and this
    /// call fails with `ConcurrencyConflict` instead of silently overwriting.
    pub async fn update_status(
        &self,
        external_id: Uuid,
        new_status: &str,
        actor: &Actor,
    ) -> Result<Order> {
        let status: OrderStatus = new_status.parse()?;
        let order = self
            .orders
            .get_by_external_id(external_id)
            .await?
            .ok_or_else(|| SettlementError::ResourceNotFound {
                kind: "order",
                key: external_id.to_string(),
            })?;
        if !order.updatable_by(actor) {
            return Err(SettlementError::AccessDenied(
                "only an admin or the order's seller may update its status".into(),
            ));
        }

        let expected = order.version;
        let mut updated = order;
        updated.status = status;
        let saved = self.orders.update_versioned(updated, expected).await?;

        self.notifier.publish(FanoutEvent::StatusChanged {
            order: saved.clone(),
        });
        Ok(saved)
    }

    /// Buyer-initiated cancellation with compensating restock.
    ///
    /// The status write goes through the same compare-and-swap as any other
    /// status change; only the winner restocks, so calling cancel twice can
    /// never restock twice (the second call fails on the status check).
    pub async fn cancel(&self, external_id: Uuid, actor: &Actor) -> Result<Order> {
        let order = self
            .orders
            .get_by_external_id(external_id)
            .await?
            .ok_or_else(|| SettlementError::ResourceNotFound {
                kind: "order",
                key: external_id.to_string(),
            })?;
        if order.buyer != actor.id {
            return Err(SettlementError::AccessDenied(
                "only the order's buyer may cancel it".into(),
            ));
        }
        if !order.status.is_cancellable() {
            return Err(SettlementError::CancellationNotAllowed);
        }

        let expected = order.version;
        let mut updated = order;
        updated.status = OrderStatus::Cancelled;
        let saved = self.orders.update_versioned(updated, expected).await?;

        // Restock strictly after winning the version race. The cancellation
        // is already committed, so a misbehaving restock adapter is logged
        // and skipped, never surfaced.
        for item in &saved.items {
            if let Err(e) = self.inventory.release(&item.sku, item.quantity).await {
                tracing::warn!(sku = %item.sku, error = %e, "failed to restock cancelled line");
            }
        }

        self.notifier.publish(FanoutEvent::OrderCancelled {
            order: saved.clone(),
        });
        Ok(saved)
    }

    /// Administrative hard delete. Bypasses the state machine and does not
    /// restock: this is a purge, not a cancellation.
    pub async fn delete(&self, id: OrderId, actor: &Actor) -> Result<()> {
        if !actor.is_admin {
            return Err(SettlementError::AccessDenied(
                "only admins may delete orders".into(),
            ));
        }
        self.orders.delete(id).await
    }

    /// Persisted notification feed for the acting user.
    pub async fn notifications(&self, actor: &Actor) -> Result<Vec<NotificationRecord>> {
        self.notifications.list_for_recipient(actor.id).await
    }

    pub async fn unread_notifications(&self, actor: &Actor) -> Result<u64> {
        self.notifications.unread_count(actor.id).await
    }
}
