use crate::application::{internal, Store};
use crate::errors::AppError;
use plantmart_types::domain::order::{Order, OrderStatus, TrackingInfo};
use plantmart_types::ports::inventory_store::InventoryStore;
use plantmart_types::ports::order_repository::OrderRepository;
use uuid::Uuid;

/// Read and lifecycle operations on existing orders. Status and tracking
/// mutation is seller-scoped: the caller must be the seller of at least
/// one plant referenced by the order.
pub struct OrderService<R: Store> {
    repo: R,
}

impl<R: Store> OrderService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Visible to the buyer who placed it and to sellers of referenced
    /// plants; everyone else gets `Forbidden`.
    pub async fn get_order(&self, caller: Uuid, id: Uuid) -> Result<Order, AppError> {
        let order = self.fetch(id).await?;
        if order.buyer_id != caller && !self.caller_sells_into(caller, &order).await? {
            return Err(AppError::Forbidden(format!(
                "order {id} does not involve caller"
            )));
        }
        Ok(order)
    }

    pub async fn list_orders(&self, buyer_id: Uuid) -> Result<Vec<Order>, AppError> {
        self.repo.list_for_buyer(buyer_id).await.map_err(internal)
    }

    pub async fn update_status(
        &self,
        caller: Uuid,
        id: Uuid,
        status: OrderStatus,
    ) -> Result<Order, AppError> {
        let mut order = self.fetch(id).await?;
        self.require_seller(caller, &order).await?;
        order
            .advance_status(status)
            .map_err(|e| AppError::Validation(e.to_string()))?;
        self.persist(order).await
    }

    pub async fn update_tracking(
        &self,
        caller: Uuid,
        id: Uuid,
        patch: TrackingInfo,
    ) -> Result<Order, AppError> {
        let mut order = self.fetch(id).await?;
        self.require_seller(caller, &order).await?;
        order.merge_tracking(patch);
        self.persist(order).await
    }

    /// Payment-collaborator seam: flips the order to Paid exactly once,
    /// recording the gateway's reference.
    pub async fn confirm_payment(&self, id: Uuid, payment_ref: String) -> Result<Order, AppError> {
        let mut order = self.fetch(id).await?;
        order
            .confirm_payment(payment_ref)
            .map_err(|e| AppError::Validation(e.to_string()))?;
        self.persist(order).await
    }

    async fn fetch(&self, id: Uuid) -> Result<Order, AppError> {
        OrderRepository::get(&self.repo, id)
            .await
            .map_err(internal)?
            .ok_or_else(|| AppError::NotFound(format!("order {id}")))
    }

    async fn persist(&self, order: Order) -> Result<Order, AppError> {
        self.repo
            .update(order)
            .await
            .map_err(internal)?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("order vanished during update")))
    }

    async fn require_seller(&self, caller: Uuid, order: &Order) -> Result<(), AppError> {
        if self.caller_sells_into(caller, order).await? {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!(
                "caller sells no plant referenced by order {}",
                order.id
            )))
        }
    }

    async fn caller_sells_into(&self, caller: Uuid, order: &Order) -> Result<bool, AppError> {
        for line in &order.lines {
            let item = InventoryStore::get(&self.repo, line.item_id)
                .await
                .map_err(internal)?;
            if item.is_some_and(|i| i.seller_id == caller) {
                return Ok(true);
            }
        }
        Ok(false)
    }
}
