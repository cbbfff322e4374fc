use bazaar::application::fanout::Notifier;
use bazaar::application::settlement::SettlementEngine;
use bazaar::domain::address::NewAddress;
use bazaar::domain::cart::{Cart, CartItem};
use bazaar::domain::identity::{Actor, SellerId};
use bazaar::domain::inventory::InventoryVariant;
use bazaar::domain::money::Price;
use bazaar::domain::ports::{
    AddressStore, AddressStoreRef, CartStore, CartStoreRef, InventoryStore, InventoryStoreRef,
    NotificationStoreRef, OrderStoreRef, PaymentLedgerRef, RealtimeChannelRef,
};
use bazaar::infrastructure::in_memory::{
    InMemoryAddressStore, InMemoryCartStore, InMemoryInventoryStore, InMemoryNotificationStore,
    InMemoryOrderStore, InMemoryPaymentLedger,
};
use bazaar::infrastructure::realtime::InMemoryRealtimeHub;
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Fully wired engine over in-memory adapters, with handles onto every store
/// so tests can inspect state and the realtime hub.
pub struct Harness {
    pub engine: SettlementEngine,
    pub inventory: Arc<InMemoryInventoryStore>,
    pub orders: Arc<InMemoryOrderStore>,
    pub carts: Arc<InMemoryCartStore>,
    pub addresses: Arc<InMemoryAddressStore>,
    pub payments: Arc<InMemoryPaymentLedger>,
    pub notifications: Arc<InMemoryNotificationStore>,
    pub hub: Arc<InMemoryRealtimeHub>,
    pub fanout_worker: JoinHandle<()>,
}

impl Harness {
    /// Drops the engine (closing the fan-out queue) and waits for the worker
    /// to drain. Clone any store handles you still need before calling this.
    pub async fn shutdown(self) {
        let Harness {
            engine,
            fanout_worker,
            ..
        } = self;
        drop(engine);
        let _ = fanout_worker.await;
    }

    pub async fn seed_variant(&self, variant: InventoryVariant) {
        self.inventory.put_variant(variant).await.unwrap();
    }

    /// Builds the buyer's cart from already-seeded variants.
    pub async fn seed_cart(&self, buyer: &Actor, lines: &[(&str, u32)]) {
        let mut cart = Cart::new(buyer.id);
        for (sku, quantity) in lines {
            let variant = self
                .inventory
                .get_variant(sku)
                .await
                .unwrap()
                .unwrap_or_else(|| panic!("variant {sku} not seeded"));
            cart.push(CartItem::from_variant(&variant, *quantity).unwrap());
        }
        self.carts.put(cart).await.unwrap();
    }

    pub async fn seed_address(&self, buyer: &Actor) -> u64 {
        self.addresses
            .save(
                buyer.id,
                NewAddress {
                    line: "1 Main St".into(),
                    city: "Hanoi".into(),
                },
            )
            .await
            .unwrap()
            .id
    }
}

pub fn harness() -> Harness {
    let inventory = Arc::new(InMemoryInventoryStore::new());
    let orders = Arc::new(InMemoryOrderStore::new());
    let carts = Arc::new(InMemoryCartStore::new());
    let addresses = Arc::new(InMemoryAddressStore::new());
    let payments = Arc::new(InMemoryPaymentLedger::new());
    let notifications = Arc::new(InMemoryNotificationStore::new());
    let hub = Arc::new(InMemoryRealtimeHub::new());

    let notifications_ref: NotificationStoreRef = notifications.clone();
    let realtime_ref: RealtimeChannelRef = hub.clone();
    let (notifier, fanout_worker) = Notifier::spawn(notifications_ref.clone(), realtime_ref);

    let orders_ref: OrderStoreRef = orders.clone();
    let inventory_ref: InventoryStoreRef = inventory.clone();
    let carts_ref: CartStoreRef = carts.clone();
    let addresses_ref: AddressStoreRef = addresses.clone();
    let payments_ref: PaymentLedgerRef = payments.clone();

    let engine = SettlementEngine::new(
        orders_ref,
        inventory_ref,
        carts_ref,
        addresses_ref,
        payments_ref,
        notifications_ref,
        notifier,
    );

    Harness {
        engine,
        inventory,
        orders,
        carts,
        addresses,
        payments,
        notifications,
        hub,
        fanout_worker,
    }
}

pub fn variant(
    sku: &str,
    seller: SellerId,
    available: u32,
    selling_price: Decimal,
) -> InventoryVariant {
    InventoryVariant {
        sku: sku.into(),
        seller,
        product_title: format!("Product {sku}"),
        color: "red".into(),
        size: "M".into(),
        price: Price::new(selling_price).unwrap(),
        selling_price: Price::new(selling_price).unwrap(),
        available,
        sold: 0,
    }
}
