use super::identity::SellerId;
use super::money::Price;
use crate::error::{Result, SettlementError};
use serde::{Deserialize, Serialize};

pub type Sku = String;

/// One sellable product variant (colour + size combination) with its stock
/// counters.
///
/// `available` never goes negative; `sold` only grows except for the
/// compensating restock issued on cancellation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryVariant {
    pub sku: Sku,
    pub seller: SellerId,
    pub product_title: String,
    pub color: String,
    pub size: String,
    /// List price per unit.
    pub price: Price,
    /// Discounted price per unit, the one the buyer actually pays.
    pub selling_price: Price,
    pub available: u32,
    pub sold: u32,
}

impl InventoryVariant {
    /// Check-and-decrement for one reservation.
    ///
    /// Callers must hold the per-variant exclusive lock so the check and the
    /// decrement are one atomic step.
    pub fn reserve(&mut self, quantity: u32) -> Result<()> {
        if self.available < quantity {
            return Err(SettlementError::OutOfStock {
                sku: self.sku.clone(),
                available: self.available,
            });
        }
        self.available -= quantity;
        self.sold += quantity;
        Ok(())
    }

    /// Compensating restock. `sold` is clamped at zero rather than trusted to
    /// be balanced, so an over-release can never drive it negative.
    pub fn release(&mut self, quantity: u32) {
        self.available += quantity;
        self.sold = self.sold.saturating_sub(quantity);
    }
}
