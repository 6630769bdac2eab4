use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PaymentMethod {
    CashOnDelivery,
    Online,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PaymentStatus {
    Pending,
    Paid,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OrderStatus {
    Processing,
    Shipped,
    Delivered,
}

impl std::str::FromStr for PaymentMethod {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CashOnDelivery" => Ok(Self::CashOnDelivery),
            "Online" => Ok(Self::Online),
            other => anyhow::bail!("unrecognized payment method '{other}'"),
        }
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Processing" => Ok(Self::Processing),
            "Shipped" => Ok(Self::Shipped),
            "Delivered" => Ok(Self::Delivered),
            other => anyhow::bail!("unrecognized order status '{other}'"),
        }
    }
}

impl OrderStatus {
    fn rank(self) -> u8 {
        match self {
            Self::Processing => 0,
            Self::Shipped => 1,
            Self::Delivered => 2,
        }
    }
}

/// A checkout line frozen at order time. `unit_price_cents` is the price
/// the buyer saw and the catalog confirmed; later catalog price changes
/// never touch it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderLine {
    pub item_id: Uuid,
    pub quantity: u32,
    pub unit_price_cents: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrackingInfo {
    pub carrier: Option<String>,
    pub tracking_number: Option<String>,
    pub note: Option<String>,
}

impl TrackingInfo {
    /// Field-wise merge: only fields present in `patch` overwrite.
    pub fn apply(&mut self, patch: TrackingInfo) {
        if patch.carrier.is_some() {
            self.carrier = patch.carrier;
        }
        if patch.tracking_number.is_some() {
            self.tracking_number = patch.tracking_number;
        }
        if patch.note.is_some() {
            self.note = patch.note;
        }
    }
}

/// An immutable record of a completed checkout. Only the status fields and
/// tracking block ever change after creation, each strictly forward.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub buyer_id: Uuid,
    pub lines: Vec<OrderLine>,
    pub total_cents: i64,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub order_status: OrderStatus,
    pub shipping_address: String,
    pub tracking: Option<TrackingInfo>,
    pub payment_ref: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Builds a new order in its initial state. The declared total must
    /// equal the recomputed line sum exactly (prices are integer cents, so
    /// there is no rounding slack to tolerate).
    pub fn new(
        buyer_id: Uuid,
        lines: Vec<OrderLine>,
        total_cents: i64,
        payment_method: PaymentMethod,
        shipping_address: String,
    ) -> anyhow::Result<Self> {
        if lines.is_empty() {
            anyhow::bail!("order lines empty");
        }
        if total_cents <= 0 {
            anyhow::bail!("order total must be > 0");
        }
        if shipping_address.trim().is_empty() {
            anyhow::bail!("shipping address empty");
        }
        for line in &lines {
            if line.quantity == 0 {
                anyhow::bail!("line quantity must be > 0");
            }
        }
        let computed: i64 = lines
            .iter()
            .map(|l| l.unit_price_cents * i64::from(l.quantity))
            .sum();
        if computed != total_cents {
            anyhow::bail!(
                "declared total {} does not match line sum {}",
                total_cents,
                computed
            );
        }
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            buyer_id,
            lines,
            total_cents,
            payment_method,
            payment_status: PaymentStatus::Pending,
            order_status: OrderStatus::Processing,
            shipping_address,
            tracking: None,
            payment_ref: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Moves `order_status` strictly forward along
    /// Processing -> Shipped -> Delivered. Backward moves and no-op
    /// transitions are rejected.
    pub fn advance_status(&mut self, to: OrderStatus) -> anyhow::Result<()> {
        if to.rank() <= self.order_status.rank() {
            anyhow::bail!(
                "cannot move order status from {:?} to {:?}",
                self.order_status,
                to
            );
        }
        self.order_status = to;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// One-way Pending -> Paid, driven by the payment collaborator.
    pub fn confirm_payment(&mut self, payment_ref: String) -> anyhow::Result<()> {
        if self.payment_status == PaymentStatus::Paid {
            anyhow::bail!("order {} is already paid", self.id);
        }
        self.payment_status = PaymentStatus::Paid;
        self.payment_ref = Some(payment_ref);
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn merge_tracking(&mut self, patch: TrackingInfo) {
        self.tracking.get_or_insert_with(TrackingInfo::default).apply(patch);
        self.updated_at = Utc::now();
    }
}
