use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single cart line. Built once at the boundary; a `CartLine` that exists
/// is always well-formed, so the reducer and service code never re-check it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CartLine {
    pub item_id: Uuid,
    pub quantity: u32,
    /// Unit price snapshot taken when the line was first added.
    pub unit_price_cents: i64,
}

impl CartLine {
    pub fn new(item_id: Uuid, quantity: u32, unit_price_cents: i64) -> anyhow::Result<Self> {
        if quantity == 0 {
            anyhow::bail!("line quantity must be > 0");
        }
        if unit_price_cents < 0 {
            anyhow::bail!("unit price must be >= 0");
        }
        Ok(Self {
            item_id,
            quantity,
            unit_price_cents,
        })
    }
}

/// The mutable collection of lines owned by either no identity (anonymous,
/// local-only) or exactly one buyer.
///
/// All transitions keep the invariant of at most one line per `item_id`:
/// adding an item already present merges quantities instead of duplicating
/// the line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cart {
    pub owner_id: Option<Uuid>,
    pub lines: Vec<CartLine>,
    /// Bumped by the repository on every authoritative write; lets a write
    /// that raced another session fail loudly instead of silently losing.
    pub version: u64,
    pub updated_at: DateTime<Utc>,
}

impl Cart {
    pub fn anonymous() -> Self {
        Self {
            owner_id: None,
            lines: Vec::new(),
            version: 0,
            updated_at: Utc::now(),
        }
    }

    pub fn for_owner(owner_id: Uuid) -> Self {
        Self {
            owner_id: Some(owner_id),
            lines: Vec::new(),
            version: 0,
            updated_at: Utc::now(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn line(&self, item_id: Uuid) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.item_id == item_id)
    }

    pub fn quantity_of(&self, item_id: Uuid) -> u32 {
        self.line(item_id).map_or(0, |l| l.quantity)
    }

    /// Replaces the whole line set (loading a snapshot).
    pub fn set_lines(&mut self, lines: Vec<CartLine>) {
        self.lines = lines;
        self.touch();
    }

    /// Merges into an existing line or appends a new one. The merged line
    /// keeps the price snapshot from its first add.
    pub fn add(&mut self, line: CartLine) {
        match self.lines.iter_mut().find(|l| l.item_id == line.item_id) {
            Some(existing) => existing.quantity += line.quantity,
            None => self.lines.push(line),
        }
        self.touch();
    }

    /// Sets a line's quantity; zero removes the line. Returns whether a
    /// line for `item_id` existed.
    pub fn update_quantity(&mut self, item_id: Uuid, quantity: u32) -> bool {
        if quantity == 0 {
            return self.remove(item_id);
        }
        match self.lines.iter_mut().find(|l| l.item_id == item_id) {
            Some(line) => {
                line.quantity = quantity;
                self.touch();
                true
            }
            None => false,
        }
    }

    /// Removes the line if present. Removing an absent line is a no-op,
    /// not an error.
    pub fn remove(&mut self, item_id: Uuid) -> bool {
        let before = self.lines.len();
        self.lines.retain(|l| l.item_id != item_id);
        let removed = self.lines.len() < before;
        if removed {
            self.touch();
        }
        removed
    }

    pub fn clear(&mut self) {
        self.lines.clear();
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
