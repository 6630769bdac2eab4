use async_trait::async_trait;
use chrono::{DateTime, Utc};
use plantmart_types::domain::cart::{Cart, CartLine};
use plantmart_types::domain::inventory::InventoryItem;
use plantmart_types::domain::order::{
    Order, OrderLine, OrderStatus, PaymentMethod, PaymentStatus, TrackingInfo,
};
use plantmart_types::ports::cart_repository::CartRepository;
use plantmart_types::ports::inventory_store::InventoryStore;
use plantmart_types::ports::order_repository::OrderRepository;
use plantmart_types::ports::RepoError;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{FromRow, SqlitePool};
use std::str::FromStr;
use uuid::Uuid;

#[derive(Clone)]
pub struct SqliteRepo {
    pool: SqlitePool,
}

fn db_err(e: impl std::fmt::Display) -> RepoError {
    RepoError::DbError(e.to_string())
}

fn parse_uuid(s: &str) -> Result<Uuid, RepoError> {
    Uuid::parse_str(s).map_err(db_err)
}

fn parse_time(s: &str) -> Result<DateTime<Utc>, RepoError> {
    Ok(DateTime::parse_from_rfc3339(s)
        .map_err(db_err)?
        .with_timezone(&Utc))
}

#[derive(FromRow)]
struct DbCart {
    owner_id: String,
    lines_json: String,
    version: i64,
    updated_at: String,
}

impl DbCart {
    fn into_cart(self) -> Result<Cart, RepoError> {
        let lines: Vec<CartLine> = serde_json::from_str(&self.lines_json).map_err(db_err)?;
        Ok(Cart {
            owner_id: Some(parse_uuid(&self.owner_id)?),
            lines,
            version: self.version as u64,
            updated_at: parse_time(&self.updated_at)?,
        })
    }
}

#[derive(FromRow)]
struct DbOrder {
    id: String,
    buyer_id: String,
    lines_json: String,
    total_cents: i64,
    payment_method: String,
    payment_status: String,
    order_status: String,
    shipping_address: String,
    tracking_json: Option<String>,
    payment_ref: Option<String>,
    created_at: String,
    updated_at: String,
}

impl DbOrder {
    fn into_order(self) -> Result<Order, RepoError> {
        let payment_method = match self.payment_method.as_str() {
            "Online" => PaymentMethod::Online,
            _ => PaymentMethod::CashOnDelivery,
        };
        let payment_status = match self.payment_status.as_str() {
            "Paid" => PaymentStatus::Paid,
            _ => PaymentStatus::Pending,
        };
        let order_status = match self.order_status.as_str() {
            "Shipped" => OrderStatus::Shipped,
            "Delivered" => OrderStatus::Delivered,
            _ => OrderStatus::Processing,
        };
        let lines: Vec<OrderLine> = serde_json::from_str(&self.lines_json).map_err(db_err)?;
        let tracking: Option<TrackingInfo> = self
            .tracking_json
            .as_deref()
            .map(serde_json::from_str)
            .transpose()
            .map_err(db_err)?;
        Ok(Order {
            id: parse_uuid(&self.id)?,
            buyer_id: parse_uuid(&self.buyer_id)?,
            lines,
            total_cents: self.total_cents,
            payment_method,
            payment_status,
            order_status,
            shipping_address: self.shipping_address,
            tracking,
            payment_ref: self.payment_ref,
            created_at: parse_time(&self.created_at)?,
            updated_at: parse_time(&self.updated_at)?,
        })
    }
}

#[derive(FromRow)]
struct DbInventoryItem {
    id: String,
    name: String,
    price_cents: i64,
    stock: i64,
    seller_id: String,
}

impl DbInventoryItem {
    fn into_item(self) -> Result<InventoryItem, RepoError> {
        Ok(InventoryItem {
            id: parse_uuid(&self.id)?,
            name: self.name,
            price_cents: self.price_cents,
            stock: self.stock.max(0) as u32,
            seller_id: parse_uuid(&self.seller_id)?,
        })
    }
}

impl SqliteRepo {
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        // Ensure on-disk SQLite target directory exists (no-op for in-memory).
        if let Some(path) = database_url.strip_prefix("sqlite://") {
            if path != ":memory:" {
                let p = std::path::Path::new(path);
                if let Some(parent) = p.parent() {
                    if !parent.as_os_str().is_empty() {
                        tokio::fs::create_dir_all(parent).await?;
                    }
                }
            }
        }

        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePool::connect_with(options).await?;

        for ddl in [
            include_str!("../migrations/0001_create_carts.sql"),
            include_str!("../migrations/0002_create_orders.sql"),
            include_str!("../migrations/0003_create_inventory.sql"),
        ] {
            sqlx::query(ddl).execute(&pool).await?;
        }

        Ok(Self { pool })
    }
}

#[async_trait]
impl CartRepository for SqliteRepo {
    async fn get(&self, owner_id: Uuid) -> Result<Option<Cart>, RepoError> {
        let row: Option<DbCart> = sqlx::query_as(
            "SELECT owner_id, lines_json, version, updated_at FROM carts WHERE owner_id = ?",
        )
        .bind(owner_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        row.map(|r| r.into_cart()).transpose()
    }

    async fn save(&self, mut cart: Cart) -> Result<Cart, RepoError> {
        let owner = cart
            .owner_id
            .ok_or_else(|| RepoError::DbError("cannot persist an ownerless cart".into()))?;
        let lines_json = serde_json::to_string(&cart.lines).map_err(db_err)?;
        let next = cart.version as i64 + 1;

        let updated = sqlx::query(
            "UPDATE carts SET lines_json = ?, version = ?, updated_at = ?
             WHERE owner_id = ? AND version = ?",
        )
        .bind(&lines_json)
        .bind(next)
        .bind(Utc::now().to_rfc3339())
        .bind(owner.to_string())
        .bind(cart.version as i64)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        if updated.rows_affected() == 0 {
            if cart.version != 0 {
                return Err(RepoError::VersionConflict(owner));
            }
            // First write for this owner; a concurrent first write shows up
            // as a primary-key violation and is reported as a conflict.
            // Anything else is a real DB failure.
            sqlx::query(
                "INSERT INTO carts (owner_id, lines_json, version, updated_at)
                 VALUES (?, ?, ?, ?)",
            )
            .bind(owner.to_string())
            .bind(&lines_json)
            .bind(1i64)
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db) if db.is_unique_violation() => {
                    RepoError::VersionConflict(owner)
                }
                _ => db_err(e),
            })?;
        }

        cart.version += 1;
        Ok(cart)
    }
}

#[async_trait]
impl OrderRepository for SqliteRepo {
    async fn create(&self, order: Order) -> Result<Order, RepoError> {
        let lines_json = serde_json::to_string(&order.lines).map_err(db_err)?;
        let tracking_json = order
            .tracking
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(db_err)?;
        sqlx::query(
            "INSERT INTO orders (id, buyer_id, lines_json, total_cents, payment_method,
                                 payment_status, order_status, shipping_address,
                                 tracking_json, payment_ref, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(order.id.to_string())
        .bind(order.buyer_id.to_string())
        .bind(lines_json)
        .bind(order.total_cents)
        .bind(format!("{:?}", order.payment_method))
        .bind(format!("{:?}", order.payment_status))
        .bind(format!("{:?}", order.order_status))
        .bind(&order.shipping_address)
        .bind(tracking_json)
        .bind(&order.payment_ref)
        .bind(order.created_at.to_rfc3339())
        .bind(order.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(order)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Order>, RepoError> {
        let row: Option<DbOrder> = sqlx::query_as(
            "SELECT id, buyer_id, lines_json, total_cents, payment_method, payment_status,
                    order_status, shipping_address, tracking_json, payment_ref,
                    created_at, updated_at
             FROM orders WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        row.map(|r| r.into_order()).transpose()
    }

    async fn list_for_buyer(&self, buyer_id: Uuid) -> Result<Vec<Order>, RepoError> {
        let rows: Vec<DbOrder> = sqlx::query_as(
            "SELECT id, buyer_id, lines_json, total_cents, payment_method, payment_status,
                    order_status, shipping_address, tracking_json, payment_ref,
                    created_at, updated_at
             FROM orders WHERE buyer_id = ? ORDER BY created_at DESC",
        )
        .bind(buyer_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        rows.into_iter().map(|r| r.into_order()).collect()
    }

    async fn update(&self, order: Order) -> Result<Option<Order>, RepoError> {
        let tracking_json = order
            .tracking
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(db_err)?;
        let updated = sqlx::query(
            "UPDATE orders SET payment_status = ?, order_status = ?, tracking_json = ?,
                               payment_ref = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(format!("{:?}", order.payment_status))
        .bind(format!("{:?}", order.order_status))
        .bind(tracking_json)
        .bind(&order.payment_ref)
        .bind(order.updated_at.to_rfc3339())
        .bind(order.id.to_string())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        if updated.rows_affected() == 0 {
            return Ok(None);
        }
        Ok(Some(order))
    }
}

#[async_trait]
impl InventoryStore for SqliteRepo {
    async fn get(&self, item_id: Uuid) -> Result<Option<InventoryItem>, RepoError> {
        let row: Option<DbInventoryItem> = sqlx::query_as(
            "SELECT id, name, price_cents, stock, seller_id FROM inventory WHERE id = ?",
        )
        .bind(item_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        row.map(|r| r.into_item()).transpose()
    }

    async fn upsert(&self, item: InventoryItem) -> Result<(), RepoError> {
        sqlx::query(
            "INSERT INTO inventory (id, name, price_cents, stock, seller_id)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 name = excluded.name,
                 price_cents = excluded.price_cents,
                 stock = excluded.stock,
                 seller_id = excluded.seller_id",
        )
        .bind(item.id.to_string())
        .bind(&item.name)
        .bind(item.price_cents)
        .bind(i64::from(item.stock))
        .bind(item.seller_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn decrement(&self, item_id: Uuid, amount: u32) -> Result<bool, RepoError> {
        // Conditional subtract in one statement: stock can never go below
        // zero no matter how many writers race.
        let res = sqlx::query("UPDATE inventory SET stock = stock - ? WHERE id = ? AND stock >= ?")
            .bind(i64::from(amount))
            .bind(item_id.to_string())
            .bind(i64::from(amount))
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(res.rows_affected() > 0)
    }

    async fn increment(&self, item_id: Uuid, amount: u32) -> Result<(), RepoError> {
        let res = sqlx::query("UPDATE inventory SET stock = stock + ? WHERE id = ?")
            .bind(i64::from(amount))
            .bind(item_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        if res.rows_affected() == 0 {
            return Err(RepoError::DbError(format!(
                "cannot restock unknown item {item_id}"
            )));
        }
        Ok(())
    }
}
