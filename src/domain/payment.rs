use super::identity::UserId;
use super::money::Price;
use serde::{Deserialize, Serialize};

pub type PaymentRef = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentMethod {
    Vnpay,
    Cod,
}

/// Opaque ledger entry opened once per seller-split order, before the order
/// itself is persisted. Gateway settlement happens elsewhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentLedgerEntry {
    pub id: PaymentRef,
    pub amount: Price,
    pub method: PaymentMethod,
    pub buyer: UserId,
}
