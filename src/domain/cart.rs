use super::identity::{Actor, SellerId, UserId};
use super::inventory::{InventoryVariant, Sku};
use super::money::Price;
use crate::error::{Result, SettlementError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One cart line. Prices are totals for the line's quantity, captured from
/// the variant when the line was added so later catalog edits do not move
/// the cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub sku: Sku,
    pub seller: SellerId,
    pub quantity: u32,
    pub price_at_add: Price,
    pub selling_price_at_add: Price,
}

impl CartItem {
    pub fn from_variant(variant: &InventoryVariant, quantity: u32) -> Result<Self> {
        Ok(Self {
            sku: variant.sku.clone(),
            seller: variant.seller,
            quantity,
            price_at_add: variant.price.times(quantity)?,
            selling_price_at_add: variant.selling_price.times(quantity)?,
        })
    }
}

/// A buyer's cart. Ephemeral: cleared once every order of a checkout has
/// committed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    pub buyer: UserId,
    pub items: Vec<CartItem>,
    pub total_items: u32,
    pub total_selling_price: Price,
}

impl Cart {
    pub fn new(buyer: UserId) -> Self {
        Self {
            buyer,
            items: Vec::new(),
            total_items: 0,
            total_selling_price: Price::ZERO,
        }
    }

    /// `total_items` saturates rather than overflowing on pathological
    /// quantities.
    pub fn push(&mut self, item: CartItem) {
        self.total_items = self.total_items.saturating_add(item.quantity);
        self.total_selling_price += item.selling_price_at_add;
        self.items.push(item);
    }
}

/// Splits a cart into one group per seller.
///
/// Fails with `CartEmpty` on an empty cart, and with `AccessDenied` if any
/// group belongs to the acting buyer's own seller profile. The self-purchase
/// check runs over every group before the caller reserves anything, so a
/// partially self-owned cart can never partially commit.
pub fn partition_by_seller(
    cart: &Cart,
    actor: &Actor,
) -> Result<BTreeMap<SellerId, Vec<CartItem>>> {
    if cart.items.is_empty() {
        return Err(SettlementError::CartEmpty);
    }

    let mut groups: BTreeMap<SellerId, Vec<CartItem>> = BTreeMap::new();
    for item in &cart.items {
        groups.entry(item.seller).or_default().push(item.clone());
    }

    for seller in groups.keys() {
        if actor.seller_id == Some(*seller) {
            return Err(SettlementError::AccessDenied(format!(
                "sellers cannot purchase their own products (seller {seller} is in the cart)"
            )));
        }
    }

    Ok(groups)
}
