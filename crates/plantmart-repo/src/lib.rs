#[cfg(not(any(feature = "memory", feature = "sqlite")))]
compile_error!("Enable a repo feature: `memory` or `sqlite`.");

use plantmart_types::domain::cart::Cart;
use plantmart_types::domain::inventory::InventoryItem;
use plantmart_types::domain::order::Order;
use plantmart_types::ports::cart_repository::CartRepository;
use plantmart_types::ports::inventory_store::InventoryStore;
use plantmart_types::ports::order_repository::OrderRepository;
use plantmart_types::ports::RepoError;
use uuid::Uuid;

#[cfg(feature = "memory")]
pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;

/// Feature-selected storage backend implementing all three ports. When both
/// features are enabled the sqlite backend is authoritative.
#[derive(Clone)]
pub struct Repo {
    #[cfg(all(feature = "memory", not(feature = "sqlite")))]
    memory: memory::InMemoryRepo,
    #[cfg(feature = "sqlite")]
    sqlite: sqlite::SqliteRepo,
}

pub async fn build_repo(url: Option<&str>) -> anyhow::Result<Repo> {
    Repo::build_repo(url).await
}

impl Repo {
    #[cfg(all(feature = "memory", not(feature = "sqlite")))]
    pub async fn build_repo(_: Option<&str>) -> anyhow::Result<Self> {
        Ok(Self {
            memory: memory::InMemoryRepo::new(),
        })
    }

    #[cfg(feature = "sqlite")]
    pub async fn build_repo(database_url: Option<&str>) -> anyhow::Result<Self> {
        let url = database_url.unwrap_or("sqlite://plantmart.db");
        let sqlite = sqlite::SqliteRepo::new(url).await?;
        Ok(Self { sqlite })
    }
}

impl Repo {
    #[cfg(all(feature = "memory", not(feature = "sqlite")))]
    fn backend(&self) -> &memory::InMemoryRepo {
        &self.memory
    }

    #[cfg(feature = "sqlite")]
    fn backend(&self) -> &sqlite::SqliteRepo {
        &self.sqlite
    }
}

#[async_trait::async_trait]
impl CartRepository for Repo {
    async fn get(&self, owner_id: Uuid) -> Result<Option<Cart>, RepoError> {
        CartRepository::get(self.backend(), owner_id).await
    }

    async fn save(&self, cart: Cart) -> Result<Cart, RepoError> {
        self.backend().save(cart).await
    }
}

#[async_trait::async_trait]
impl OrderRepository for Repo {
    async fn create(&self, order: Order) -> Result<Order, RepoError> {
        self.backend().create(order).await
    }

    async fn get(&self, id: Uuid) -> Result<Option<Order>, RepoError> {
        OrderRepository::get(self.backend(), id).await
    }

    async fn list_for_buyer(&self, buyer_id: Uuid) -> Result<Vec<Order>, RepoError> {
        self.backend().list_for_buyer(buyer_id).await
    }

    async fn update(&self, order: Order) -> Result<Option<Order>, RepoError> {
        self.backend().update(order).await
    }
}

#[async_trait::async_trait]
impl InventoryStore for Repo {
    async fn get(&self, item_id: Uuid) -> Result<Option<InventoryItem>, RepoError> {
        InventoryStore::get(self.backend(), item_id).await
    }

    async fn upsert(&self, item: InventoryItem) -> Result<(), RepoError> {
        self.backend().upsert(item).await
    }

    async fn decrement(&self, item_id: Uuid, amount: u32) -> Result<bool, RepoError> {
        self.backend().decrement(item_id, amount).await
    }

    async fn increment(&self, item_id: Uuid, amount: u32) -> Result<(), RepoError> {
        self.backend().increment(item_id, amount).await
    }
}
