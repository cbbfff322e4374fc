use super::address::AddressId;
use super::cart::CartItem;
use super::identity::{Actor, SellerId, UserId};
use super::inventory::{InventoryVariant, Sku};
use super::money::Price;
use super::payment::PaymentRef;
use crate::error::SettlementError;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

pub type OrderId = u64;

/// The order lifecycle. `Delivered` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Processing,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// A buyer may only cancel before the seller starts fulfilment.
    pub fn is_cancellable(self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Confirmed => "CONFIRMED",
            Self::Processing => "PROCESSING",
            Self::Delivered => "DELIVERED",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = SettlementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PENDING" => Ok(Self::Pending),
            "CONFIRMED" => Ok(Self::Confirmed),
            "PROCESSING" => Ok(Self::Processing),
            "DELIVERED" => Ok(Self::Delivered),
            "CANCELLED" => Ok(Self::Cancelled),
            other => Err(SettlementError::InvalidInput(format!(
                "unknown order status: {other}"
            ))),
        }
    }
}

/// Immutable snapshot of one purchased line.
///
/// Everything is denormalised at purchase time so later catalog edits cannot
/// rewrite order history. Prices are totals for the line's quantity, carried
/// over from the cart line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub sku: Sku,
    pub quantity: u32,
    pub price_at_purchase: Price,
    pub selling_price_at_purchase: Price,
    pub color: String,
    pub size: String,
    pub product_title: String,
}

impl OrderItem {
    /// Freezes one cart line against the variant it was reserved from.
    pub fn snapshot(item: &CartItem, variant: &InventoryVariant) -> Self {
        Self {
            sku: item.sku.clone(),
            quantity: item.quantity,
            price_at_purchase: item.price_at_add,
            selling_price_at_purchase: item.selling_price_at_add,
            color: variant.color.clone(),
            size: variant.size.clone(),
            product_title: variant.product_title.clone(),
        }
    }
}

/// One seller-scoped order. Immutable at creation apart from `status` and the
/// `version` concurrency token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Store-assigned internal id; 0 until inserted.
    pub id: OrderId,
    /// Stable external reference, randomly generated at build time.
    pub external_id: Uuid,
    pub buyer: UserId,
    pub seller: SellerId,
    pub shipping_address: AddressId,
    pub items: Vec<OrderItem>,
    pub total_price: Price,
    pub total_items: u32,
    pub status: OrderStatus,
    pub payment: PaymentRef,
    pub created_at: DateTime<Utc>,
    pub deliver_by: DateTime<Utc>,
    /// Optimistic concurrency token, bumped on every guarded write.
    pub version: u64,
}

impl Order {
    /// Builds the aggregate for one seller partition. Totals are running sums
    /// over the snapshotted lines; inventory must already be reserved.
    pub fn build(
        buyer: UserId,
        seller: SellerId,
        shipping_address: AddressId,
        items: Vec<OrderItem>,
        payment: PaymentRef,
    ) -> Self {
        let mut total_price = Price::ZERO;
        let mut total_items = 0u32;
        for item in &items {
            total_price += item.selling_price_at_purchase;
            total_items = total_items.saturating_add(item.quantity);
        }
        let created_at = Utc::now();
        Self {
            id: 0,
            external_id: Uuid::new_v4(),
            buyer,
            seller,
            shipping_address,
            items,
            total_price,
            total_items,
            status: OrderStatus::Pending,
            payment,
            created_at,
            deliver_by: created_at + Duration::days(7),
            version: 0,
        }
    }

    pub fn viewable_by(&self, actor: &Actor) -> bool {
        actor.is_admin || self.buyer == actor.id || actor.seller_id == Some(self.seller)
    }

    pub fn updatable_by(&self, actor: &Actor) -> bool {
        actor.is_admin || actor.seller_id == Some(self.seller)
    }
}
