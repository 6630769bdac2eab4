use crate::application::{internal, Store};
use crate::errors::AppError;
use plantmart_types::domain::cart::{Cart, CartLine};
use plantmart_types::ports::cart_repository::CartRepository;
use plantmart_types::ports::inventory_store::InventoryStore;
use plantmart_types::ports::RepoError;
use uuid::Uuid;

/// Bounded retries when a versioned cart write loses a race with another
/// session of the same owner.
const MAX_SAVE_ATTEMPTS: usize = 3;

/// Server-side authority over per-owner carts. Every mutation is validated
/// against the current catalog stock before the cart document is written;
/// writes are conditional on the version read so concurrent sessions
/// conflict loudly instead of losing updates.
pub struct CartService<R: Store> {
    repo: R,
}

impl<R: Store> CartService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// An owner with no stored cart gets an empty one; the document itself
    /// is created lazily on first mutation.
    pub async fn get_cart(&self, owner_id: Uuid) -> Result<Cart, AppError> {
        Ok(self
            .load(owner_id)
            .await?
            .unwrap_or_else(|| Cart::for_owner(owner_id)))
    }

    pub async fn add(&self, owner_id: Uuid, item_id: Uuid, quantity: u32) -> Result<Cart, AppError> {
        if quantity == 0 {
            return Err(AppError::Validation("quantity must be > 0".into()));
        }
        for _ in 0..MAX_SAVE_ATTEMPTS {
            let mut cart = self.get_cart(owner_id).await?;
            let item = InventoryStore::get(&self.repo, item_id)
                .await
                .map_err(internal)?
                .ok_or_else(|| AppError::NotFound(format!("plant {item_id}")))?;
            // Checked add: a sum past u32::MAX can never fit in stock either.
            let held = cart.quantity_of(item_id);
            match held.checked_add(quantity) {
                Some(merged) if merged <= item.stock => {}
                _ => {
                    return Err(AppError::StockExceeded {
                        item_id,
                        requested: held.saturating_add(quantity),
                        available: item.stock,
                    });
                }
            }
            let line = CartLine::new(item_id, quantity, item.price_cents)
                .map_err(|e| AppError::Validation(e.to_string()))?;
            cart.add(line);
            match self.repo.save(cart).await {
                Ok(stored) => return Ok(stored),
                Err(RepoError::VersionConflict(_)) => {
                    tracing::debug!(%owner_id, "cart write raced another session, retrying");
                }
                Err(e) => return Err(internal(e)),
            }
        }
        Err(AppError::Internal(anyhow::anyhow!(
            "cart contention for owner {owner_id}"
        )))
    }

    /// Sets a line's quantity. Zero removes the line; anything else must
    /// fit within current stock. The line has to exist already.
    pub async fn update(
        &self,
        owner_id: Uuid,
        item_id: Uuid,
        quantity: u32,
    ) -> Result<Cart, AppError> {
        for _ in 0..MAX_SAVE_ATTEMPTS {
            let mut cart = self.get_cart(owner_id).await?;
            if cart.line(item_id).is_none() {
                return Err(AppError::NotFound(format!("cart line for plant {item_id}")));
            }
            if quantity > 0 {
                let item = InventoryStore::get(&self.repo, item_id)
                    .await
                    .map_err(internal)?
                    .ok_or_else(|| AppError::NotFound(format!("plant {item_id}")))?;
                if quantity > item.stock {
                    return Err(AppError::StockExceeded {
                        item_id,
                        requested: quantity,
                        available: item.stock,
                    });
                }
            }
            cart.update_quantity(item_id, quantity);
            match self.repo.save(cart).await {
                Ok(stored) => return Ok(stored),
                Err(RepoError::VersionConflict(_)) => {
                    tracing::debug!(%owner_id, "cart write raced another session, retrying");
                }
                Err(e) => return Err(internal(e)),
            }
        }
        Err(AppError::Internal(anyhow::anyhow!(
            "cart contention for owner {owner_id}"
        )))
    }

    /// Removing an absent line is a successful no-op.
    pub async fn remove(&self, owner_id: Uuid, item_id: Uuid) -> Result<Cart, AppError> {
        for _ in 0..MAX_SAVE_ATTEMPTS {
            let mut cart = self.get_cart(owner_id).await?;
            if !cart.remove(item_id) {
                return Ok(cart);
            }
            match self.repo.save(cart).await {
                Ok(stored) => return Ok(stored),
                Err(RepoError::VersionConflict(_)) => {
                    tracing::debug!(%owner_id, "cart write raced another session, retrying");
                }
                Err(e) => return Err(internal(e)),
            }
        }
        Err(AppError::Internal(anyhow::anyhow!(
            "cart contention for owner {owner_id}"
        )))
    }

    /// Empties the cart; the document survives (an authenticated cart is
    /// never deleted, only emptied).
    pub async fn clear(&self, owner_id: Uuid) -> Result<Cart, AppError> {
        for _ in 0..MAX_SAVE_ATTEMPTS {
            let mut cart = self.get_cart(owner_id).await?;
            if cart.is_empty() {
                return Ok(cart);
            }
            cart.clear();
            match self.repo.save(cart).await {
                Ok(stored) => return Ok(stored),
                Err(RepoError::VersionConflict(_)) => {
                    tracing::debug!(%owner_id, "cart write raced another session, retrying");
                }
                Err(e) => return Err(internal(e)),
            }
        }
        Err(AppError::Internal(anyhow::anyhow!(
            "cart contention for owner {owner_id}"
        )))
    }

    async fn load(&self, owner_id: Uuid) -> Result<Option<Cart>, AppError> {
        CartRepository::get(&self.repo, owner_id)
            .await
            .map_err(internal)
    }
}
