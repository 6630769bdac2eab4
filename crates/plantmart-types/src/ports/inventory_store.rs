use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::inventory::InventoryItem;
use crate::ports::RepoError;

/// Read/consume interface over the catalog's stock counters. The stock
/// counter is the only shared, contended resource in this core; all
/// consumption goes through the conditional `decrement` so it can never
/// go negative.
#[async_trait]
pub trait InventoryStore: Send + Sync + 'static {
    async fn get(&self, item_id: Uuid) -> Result<Option<InventoryItem>, RepoError>;

    /// Catalog-side seam; used by the owning catalog service and by tests
    /// to seed stock.
    async fn upsert(&self, item: InventoryItem) -> Result<(), RepoError>;

    /// Atomically subtracts `amount` from stock only if `stock >= amount`.
    /// Returns whether the decrement was applied; `false` means
    /// insufficient stock (or unknown item) and no change.
    async fn decrement(&self, item_id: Uuid, amount: u32) -> Result<bool, RepoError>;

    /// Adds stock back; the compensation step when a multi-line checkout
    /// fails partway.
    async fn increment(&self, item_id: Uuid, amount: u32) -> Result<(), RepoError>;
}
