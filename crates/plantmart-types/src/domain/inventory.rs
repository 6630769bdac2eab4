use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A catalog plant as seen by the cart/order core: the price to validate
/// against and the stock counter to consume. Owned by the external catalog;
/// this core only reads it and decrements `stock` through the
/// [`InventoryStore`](crate::ports::inventory_store::InventoryStore) port.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: Uuid,
    pub name: String,
    pub price_cents: i64,
    pub stock: u32,
    /// Seller who listed the plant; scopes order status/tracking mutation.
    pub seller_id: Uuid,
}
