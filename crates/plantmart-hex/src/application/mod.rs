pub mod cart_service;
pub mod order_placer;
pub mod order_service;

use plantmart_types::ports::cart_repository::CartRepository;
use plantmart_types::ports::inventory_store::InventoryStore;
use plantmart_types::ports::order_repository::OrderRepository;

/// The full storage surface the application layer runs against: cart and
/// order documents plus the shared stock counters.
pub trait Store: CartRepository + OrderRepository + InventoryStore + Clone {}

impl<T: CartRepository + OrderRepository + InventoryStore + Clone> Store for T {}

pub(crate) fn internal(e: plantmart_types::ports::RepoError) -> crate::errors::AppError {
    crate::errors::AppError::Internal(anyhow::anyhow!(e.to_string()))
}
