use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::order::Order;
use crate::ports::RepoError;

#[async_trait]
pub trait OrderRepository: Send + Sync + 'static {
    async fn create(&self, order: Order) -> Result<Order, RepoError>;
    async fn get(&self, id: Uuid) -> Result<Option<Order>, RepoError>;
    async fn list_for_buyer(&self, buyer_id: Uuid) -> Result<Vec<Order>, RepoError>;

    /// Persists status/tracking/payment changes made through the domain's
    /// transition methods. Returns `None` if the order does not exist.
    async fn update(&self, order: Order) -> Result<Option<Order>, RepoError>;
}
