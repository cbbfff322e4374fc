pub mod address;
pub mod cart;
pub mod identity;
pub mod inventory;
pub mod money;
pub mod notification;
pub mod order;
pub mod payment;
pub mod ports;
