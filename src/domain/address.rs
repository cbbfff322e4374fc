use super::identity::UserId;
use serde::{Deserialize, Serialize};

pub type AddressId = u64;

/// A saved shipping address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub id: AddressId,
    pub user: UserId,
    pub line: String,
    pub city: String,
}

/// An address supplied inline with a checkout request, not yet saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAddress {
    pub line: String,
    pub city: String,
}
