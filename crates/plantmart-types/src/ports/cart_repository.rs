use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::cart::Cart;
use crate::ports::RepoError;

/// Authoritative per-owner cart storage. One document per owner, created
/// lazily on first save and never deleted, only emptied.
#[async_trait]
pub trait CartRepository: Send + Sync + 'static {
    async fn get(&self, owner_id: Uuid) -> Result<Option<Cart>, RepoError>;

    /// Conditional write: succeeds only when the stored version still
    /// equals `cart.version` (an absent document counts as version 0).
    /// Bumps the version and returns the stored cart; a concurrent write
    /// in between yields `RepoError::VersionConflict`.
    async fn save(&self, cart: Cart) -> Result<Cart, RepoError>;
}
