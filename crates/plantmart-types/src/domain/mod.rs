pub mod cart;
pub mod inventory;
pub mod order;
