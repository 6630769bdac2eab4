use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use plantmart_types::domain::cart::Cart;
use plantmart_types::domain::inventory::InventoryItem;
use plantmart_types::domain::order::Order;
use plantmart_types::ports::cart_repository::CartRepository;
use plantmart_types::ports::inventory_store::InventoryStore;
use plantmart_types::ports::order_repository::OrderRepository;
use plantmart_types::ports::RepoError;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone)]
pub struct InMemoryRepo {
    carts: Arc<DashMap<Uuid, Cart>>,
    orders: Arc<DashMap<Uuid, Order>>,
    inventory: Arc<DashMap<Uuid, InventoryItem>>,
}

impl InMemoryRepo {
    pub fn new() -> Self {
        Self {
            carts: Arc::new(DashMap::new()),
            orders: Arc::new(DashMap::new()),
            inventory: Arc::new(DashMap::new()),
        }
    }
}

impl Default for InMemoryRepo {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CartRepository for InMemoryRepo {
    async fn get(&self, owner_id: Uuid) -> Result<Option<Cart>, RepoError> {
        Ok(self.carts.get(&owner_id).map(|r| r.clone()))
    }

    async fn save(&self, mut cart: Cart) -> Result<Cart, RepoError> {
        let owner = cart
            .owner_id
            .ok_or_else(|| RepoError::DbError("cannot persist an ownerless cart".into()))?;
        // The entry guard holds the shard lock, so the version check and
        // the write are one atomic step.
        match self.carts.entry(owner) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().version != cart.version {
                    return Err(RepoError::VersionConflict(owner));
                }
                cart.version += 1;
                occupied.insert(cart.clone());
            }
            Entry::Vacant(vacant) => {
                if cart.version != 0 {
                    return Err(RepoError::VersionConflict(owner));
                }
                cart.version = 1;
                vacant.insert(cart.clone());
            }
        }
        Ok(cart)
    }
}

#[async_trait]
impl OrderRepository for InMemoryRepo {
    async fn create(&self, order: Order) -> Result<Order, RepoError> {
        self.orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Order>, RepoError> {
        Ok(self.orders.get(&id).map(|r| r.clone()))
    }

    async fn list_for_buyer(&self, buyer_id: Uuid) -> Result<Vec<Order>, RepoError> {
        let mut list: Vec<Order> = self
            .orders
            .iter()
            .filter(|kv| kv.value().buyer_id == buyer_id)
            .map(|kv| kv.value().clone())
            .collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(list)
    }

    async fn update(&self, order: Order) -> Result<Option<Order>, RepoError> {
        match self.orders.entry(order.id) {
            Entry::Occupied(mut occupied) => {
                occupied.insert(order.clone());
                Ok(Some(order))
            }
            Entry::Vacant(_) => Ok(None),
        }
    }
}

#[async_trait]
impl InventoryStore for InMemoryRepo {
    async fn get(&self, item_id: Uuid) -> Result<Option<InventoryItem>, RepoError> {
        Ok(self.inventory.get(&item_id).map(|r| r.clone()))
    }

    async fn upsert(&self, item: InventoryItem) -> Result<(), RepoError> {
        self.inventory.insert(item.id, item);
        Ok(())
    }

    async fn decrement(&self, item_id: Uuid, amount: u32) -> Result<bool, RepoError> {
        // get_mut pins the entry, so check-and-subtract cannot interleave
        // with another writer.
        match self.inventory.get_mut(&item_id) {
            Some(mut item) => {
                if item.stock >= amount {
                    item.stock -= amount;
                    Ok(true)
                } else {
                    Ok(false)
                }
            }
            None => Ok(false),
        }
    }

    async fn increment(&self, item_id: Uuid, amount: u32) -> Result<(), RepoError> {
        match self.inventory.get_mut(&item_id) {
            Some(mut item) => {
                item.stock += amount;
                Ok(())
            }
            None => Err(RepoError::DbError(format!(
                "cannot restock unknown item {item_id}"
            ))),
        }
    }
}
