use std::collections::VecDeque;
use std::fs;
use std::path::PathBuf;

use plantmart_types::domain::cart::{Cart, CartLine};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::reconcile::{reconcile, ReconcilePolicy, ReconcileReport};
use crate::PlantmartClient;

/// Durable local medium for the anonymous cart. Injectable so the store
/// logic never touches ambient global state directly.
pub trait CartStorage {
    fn load(&self) -> anyhow::Result<Option<Cart>>;
    fn save(&self, cart: &Cart) -> anyhow::Result<()>;
    fn clear(&self) -> anyhow::Result<()>;
}

/// JSON-file-backed storage, the browser-local-storage analogue.
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CartStorage for JsonFileStorage {
    fn load(&self) -> anyhow::Result<Option<Cart>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&self.path)?;
        Ok(Some(serde_json::from_str(&raw)?))
    }

    fn save(&self, cart: &Cart) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, serde_json::to_string(cart)?)?;
        Ok(())
    }

    fn clear(&self) -> anyhow::Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

/// One outgoing cart sync call. Queued in transition order and flushed the
/// same way, so the server never sees this session's writes out of order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CartMutation {
    Add { item_id: Uuid, quantity: u32 },
    Update { item_id: Uuid, quantity: u32 },
    Remove { item_id: Uuid },
    Clear,
}

/// The client-side cart: transitions are synchronous and optimistic, the
/// matching server sync is asynchronous and best-effort. While anonymous,
/// state mirrors to [`CartStorage`]; once authenticated, transitions queue
/// [`CartMutation`]s for `flush`.
pub struct CartStore<S: CartStorage> {
    cart: Cart,
    storage: S,
    pending: VecDeque<CartMutation>,
}

impl<S: CartStorage> CartStore<S> {
    /// Loads the persisted anonymous cart, or starts empty. A corrupt or
    /// unreadable medium is not fatal; the user just starts fresh.
    pub fn open(storage: S) -> Self {
        let cart = match storage.load() {
            Ok(Some(cart)) => cart,
            Ok(None) => Cart::anonymous(),
            Err(e) => {
                tracing::warn!(error = %e, "failed to load local cart, starting empty");
                Cart::anonymous()
            }
        };
        Self {
            cart,
            storage,
            pending: VecDeque::new(),
        }
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    pub fn is_authenticated(&self) -> bool {
        self.cart.owner_id.is_some()
    }

    pub fn pending(&self) -> impl Iterator<Item = &CartMutation> {
        self.pending.iter()
    }

    /// Replaces the whole line set (loading a snapshot). Not synced: the
    /// snapshot already came from an authoritative source.
    pub fn set_lines(&mut self, lines: Vec<CartLine>) {
        self.cart.set_lines(lines);
        self.persist_if_anonymous();
    }

    pub fn add(&mut self, line: CartLine) {
        let mutation = CartMutation::Add {
            item_id: line.item_id,
            quantity: line.quantity,
        };
        self.cart.add(line);
        self.after_transition(mutation);
    }

    pub fn update_quantity(&mut self, item_id: Uuid, quantity: u32) {
        self.cart.update_quantity(item_id, quantity);
        self.after_transition(CartMutation::Update { item_id, quantity });
    }

    pub fn remove(&mut self, item_id: Uuid) {
        self.cart.remove(item_id);
        self.after_transition(CartMutation::Remove { item_id });
    }

    pub fn clear(&mut self) {
        self.cart.clear();
        self.after_transition(CartMutation::Clear);
    }

    /// Pushes queued mutations to the server in order. Best-effort: a
    /// failed push is logged and dropped, and the optimistic local cart
    /// stays the visible truth.
    pub async fn flush(&mut self, client: &PlantmartClient) {
        while let Some(mutation) = self.pending.pop_front() {
            if let Err(e) = client.apply(&mutation).await {
                tracing::warn!(?mutation, error = %e, "cart sync push failed, keeping local state");
            }
        }
    }

    /// The anonymous-to-authenticated transition: reconciles this store
    /// against the server cart under `policy`, adopts the converged cart,
    /// and destroys the anonymous local copy.
    pub async fn login(
        &mut self,
        owner_id: Uuid,
        client: &PlantmartClient,
        policy: ReconcilePolicy,
    ) -> anyhow::Result<ReconcileReport> {
        let (converged, report) = reconcile(&self.cart, client, policy).await?;
        self.cart = converged;
        self.cart.owner_id = Some(owner_id);
        self.pending.clear();
        if let Err(e) = self.storage.clear() {
            tracing::warn!(error = %e, "failed to clear local cart storage after login");
        }
        Ok(report)
    }

    fn after_transition(&mut self, mutation: CartMutation) {
        if self.is_authenticated() {
            self.pending.push_back(mutation);
        } else {
            self.persist_if_anonymous();
        }
    }

    fn persist_if_anonymous(&self) {
        if self.is_authenticated() {
            return;
        }
        if let Err(e) = self.storage.save(&self.cart) {
            tracing::warn!(error = %e, "failed to persist local cart, keeping in-memory state");
        }
    }
}
