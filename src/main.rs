use bazaar::application::fanout::Notifier;
use bazaar::application::settlement::{CreateOrderRequest, SettlementEngine};
use bazaar::domain::address::NewAddress;
use bazaar::domain::cart::{Cart, CartItem};
use bazaar::domain::identity::{Actor, UserId};
use bazaar::domain::inventory::InventoryVariant;
use bazaar::domain::money::Price;
use bazaar::domain::ports::{
    AddressStore, AddressStoreRef, CartStore, CartStoreRef, InventoryStore, InventoryStoreRef,
    NotificationStoreRef, OrderStoreRef, PaymentLedgerRef, RealtimeChannelRef,
};
use bazaar::error::{Result as SettlementResult, SettlementError};
use bazaar::infrastructure::in_memory::{
    InMemoryAddressStore, InMemoryCartStore, InMemoryInventoryStore, InMemoryNotificationStore,
    InMemoryOrderStore, InMemoryPaymentLedger,
};
use bazaar::infrastructure::realtime::InMemoryRealtimeHub;
use bazaar::interfaces::csv::order_writer::{OrderRow, OrderWriter};
use bazaar::interfaces::csv::script_reader::{ScriptCommand, ScriptReader};
use clap::Parser;
use miette::{IntoDiagnostic, Result};
use std::collections::HashMap;
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Settlement script CSV file
    script: PathBuf,
}

/// Maps script usernames to actors. The `admin` name is the admin; a name
/// becomes a seller the first time it stocks inventory.
#[derive(Default)]
struct Registry {
    next_id: UserId,
    actors: HashMap<String, Actor>,
}

impl Registry {
    fn actor(&mut self, name: &str, as_seller: bool) -> Actor {
        let next_id = &mut self.next_id;
        let actor = self.actors.entry(name.to_string()).or_insert_with(|| {
            *next_id += 1;
            if name == "admin" {
                Actor::admin(*next_id, name)
            } else {
                Actor::buyer(*next_id, name)
            }
        });
        if as_seller && actor.seller_id.is_none() && !actor.is_admin {
            actor.seller_id = Some(actor.id);
        }
        actor.clone()
    }

    fn username(&self, id: UserId) -> String {
        self.actors
            .values()
            .find(|a| a.id == id)
            .map(|a| a.username.clone())
            .unwrap_or_else(|| id.to_string())
    }
}

struct ScriptRunner {
    engine: SettlementEngine,
    inventory: Arc<InMemoryInventoryStore>,
    carts: Arc<InMemoryCartStore>,
    addresses: Arc<InMemoryAddressStore>,
    registry: Registry,
    /// External ids of created orders, in creation order, for ordinal refs.
    created: Vec<Uuid>,
}

impl ScriptRunner {
    fn order_ref(&self, ordinal: usize) -> SettlementResult<Uuid> {
        self.created
            .get(ordinal.wrapping_sub(1))
            .copied()
            .ok_or_else(|| SettlementError::ResourceNotFound {
                kind: "order",
                key: format!("#{ordinal}"),
            })
    }

    async fn run(&mut self, command: ScriptCommand) -> SettlementResult<()> {
        match command {
            ScriptCommand::Stock {
                seller,
                sku,
                title,
                color,
                size,
                quantity,
                price,
            } => {
                let actor = self.registry.actor(&seller, true);
                let price = Price::new(price)?;
                self.inventory
                    .put_variant(InventoryVariant {
                        sku,
                        seller: actor.id,
                        product_title: title,
                        color,
                        size,
                        price,
                        selling_price: price,
                        available: quantity,
                        sold: 0,
                    })
                    .await
            }
            ScriptCommand::Address { buyer, line, city } => {
                let actor = self.registry.actor(&buyer, false);
                self.addresses
                    .save(actor.id, NewAddress { line, city })
                    .await
                    .map(|_| ())
            }
            ScriptCommand::CartAdd {
                buyer,
                sku,
                quantity,
            } => {
                let actor = self.registry.actor(&buyer, false);
                let variant = self.inventory.get_variant(&sku).await?.ok_or(
                    SettlementError::ResourceNotFound {
                        kind: "variant",
                        key: sku,
                    },
                )?;
                let mut cart = self
                    .carts
                    .load(actor.id)
                    .await?
                    .unwrap_or_else(|| Cart::new(actor.id));
                cart.push(CartItem::from_variant(&variant, quantity)?);
                self.carts.put(cart).await
            }
            ScriptCommand::Checkout { buyer } => {
                let actor = self.registry.actor(&buyer, false);
                let orders = self
                    .engine
                    .create_order(CreateOrderRequest::default(), &actor)
                    .await?;
                self.created.extend(orders.iter().map(|o| o.external_id));
                Ok(())
            }
            ScriptCommand::Status {
                actor,
                order,
                status,
            } => {
                let actor = self.registry.actor(&actor, false);
                let external_id = self.order_ref(order)?;
                self.engine
                    .update_status(external_id, &status, &actor)
                    .await
                    .map(|_| ())
            }
            ScriptCommand::Cancel { buyer, order } => {
                let actor = self.registry.actor(&buyer, false);
                let external_id = self.order_ref(order)?;
                self.engine.cancel(external_id, &actor).await.map(|_| ())
            }
            ScriptCommand::Delete { actor, order } => {
                let actor = self.registry.actor(&actor, false);
                let external_id = self.order_ref(order)?;
                let found = self
                    .engine
                    .find_order_by_external_id(external_id, &actor)
                    .await?;
                self.engine.delete(found.id, &actor).await
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let inventory = Arc::new(InMemoryInventoryStore::new());
    let carts = Arc::new(InMemoryCartStore::new());
    let addresses = Arc::new(InMemoryAddressStore::new());
    let orders: OrderStoreRef = Arc::new(InMemoryOrderStore::new());
    let payments: PaymentLedgerRef = Arc::new(InMemoryPaymentLedger::new());
    let notifications: NotificationStoreRef = Arc::new(InMemoryNotificationStore::new());
    let realtime: RealtimeChannelRef = Arc::new(InMemoryRealtimeHub::new());

    let inventory_ref: InventoryStoreRef = inventory.clone();
    let carts_ref: CartStoreRef = carts.clone();
    let addresses_ref: AddressStoreRef = addresses.clone();

    let (notifier, fanout_worker) = Notifier::spawn(notifications.clone(), realtime);
    let engine = SettlementEngine::new(
        orders.clone(),
        inventory_ref,
        carts_ref,
        addresses_ref,
        payments,
        notifications,
        notifier,
    );

    let mut runner = ScriptRunner {
        engine,
        inventory,
        carts,
        addresses,
        registry: Registry::default(),
        created: Vec::new(),
    };

    let file = File::open(cli.script).into_diagnostic()?;
    let reader = ScriptReader::new(file);
    for command in reader.commands() {
        match command {
            Ok(command) => {
                if let Err(e) = runner.run(command).await {
                    eprintln!("error[{}]: {}", e.kind(), e);
                }
            }
            Err(e) => eprintln!("error[{}]: {}", e.kind(), e),
        }
    }

    // Every buyer and seller is known to the registry at this point; render
    // the final order table with names instead of ids.
    let admin = runner.registry.actor("admin", false);
    let settled = runner.engine.list_all(&admin).await.into_diagnostic()?;
    let rows = settled
        .into_iter()
        .map(|order| OrderRow {
            buyer: runner.registry.username(order.buyer),
            seller: runner.registry.username(order.seller),
            status: order.status.to_string(),
            total_price: order.total_price.to_string(),
            total_items: order.total_items,
        })
        .collect();

    // Dropping the runner (and with it the engine's notifier) lets the
    // fan-out worker drain and exit before we leave.
    drop(runner);
    let _ = fanout_worker.await;

    let stdout = io::stdout();
    let mut writer = OrderWriter::new(stdout.lock());
    writer.write_orders(rows).into_diagnostic()?;

    Ok(())
}
