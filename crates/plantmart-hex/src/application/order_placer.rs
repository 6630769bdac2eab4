use crate::application::{internal, Store};
use crate::errors::AppError;
use plantmart_types::domain::order::{Order, OrderLine, PaymentMethod};
use plantmart_types::ports::inventory_store::InventoryStore;
use std::collections::HashSet;
use uuid::Uuid;

/// A checkout submission: the snapshot of selected cart lines plus the
/// total the client computed from them.
#[derive(Debug, Clone)]
pub struct OrderDraft {
    pub lines: Vec<DraftLine>,
    pub total_cents: i64,
    pub payment_method: PaymentMethod,
    pub shipping_address: String,
}

#[derive(Debug, Clone)]
pub struct DraftLine {
    pub item_id: Uuid,
    pub quantity: u32,
    pub unit_price_cents: i64,
}

/// The sole consumer of inventory. `place` validates everything before any
/// mutation, then runs the decrement-and-persist sequence as one
/// all-or-nothing unit: a line whose conditional decrement fails, or a
/// failed order insert, rolls back every decrement already applied.
pub struct OrderPlacer<R: Store> {
    repo: R,
}

impl<R: Store> OrderPlacer<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub async fn place(&self, buyer_id: Uuid, draft: OrderDraft) -> Result<Order, AppError> {
        self.check_shape(&draft)?;
        self.check_lines(&draft).await?;
        check_total(&draft)?;

        // Consume stock first; each decrement is conditional, so a line
        // that lost a race with a concurrent checkout fails here rather
        // than driving the counter negative.
        let mut consumed: Vec<(Uuid, u32)> = Vec::with_capacity(draft.lines.len());
        for line in &draft.lines {
            match self.repo.decrement(line.item_id, line.quantity).await {
                Ok(true) => consumed.push((line.item_id, line.quantity)),
                Ok(false) => {
                    let available = InventoryStore::get(&self.repo, line.item_id)
                        .await
                        .map_err(internal)?
                        .map_or(0, |i| i.stock);
                    self.release(&consumed).await;
                    return Err(AppError::InsufficientStock {
                        item_id: line.item_id,
                        requested: line.quantity,
                        available,
                    });
                }
                Err(e) => {
                    self.release(&consumed).await;
                    return Err(internal(e));
                }
            }
        }

        let lines = draft
            .lines
            .iter()
            .map(|l| OrderLine {
                item_id: l.item_id,
                quantity: l.quantity,
                unit_price_cents: l.unit_price_cents,
            })
            .collect();
        let order = match Order::new(
            buyer_id,
            lines,
            draft.total_cents,
            draft.payment_method,
            draft.shipping_address,
        ) {
            Ok(order) => order,
            Err(e) => {
                self.release(&consumed).await;
                return Err(AppError::Validation(e.to_string()));
            }
        };

        match self.repo.create(order).await {
            Ok(order) => {
                tracing::info!(order_id = %order.id, %buyer_id, total_cents = order.total_cents, "order placed");
                Ok(order)
            }
            Err(e) => {
                self.release(&consumed).await;
                Err(internal(e))
            }
        }
    }

    fn check_shape(&self, draft: &OrderDraft) -> Result<(), AppError> {
        if draft.lines.is_empty() {
            return Err(AppError::Validation("order lines empty".into()));
        }
        if draft.total_cents <= 0 {
            return Err(AppError::Validation("order total must be > 0".into()));
        }
        if draft.shipping_address.trim().is_empty() {
            return Err(AppError::Validation("shipping address empty".into()));
        }
        let mut seen = HashSet::new();
        for line in &draft.lines {
            if line.quantity == 0 {
                return Err(AppError::Validation("line quantity must be > 0".into()));
            }
            if !seen.insert(line.item_id) {
                return Err(AppError::Validation(format!(
                    "duplicate line for plant {}",
                    line.item_id
                )));
            }
        }
        Ok(())
    }

    async fn check_lines(&self, draft: &OrderDraft) -> Result<(), AppError> {
        for line in &draft.lines {
            let item = InventoryStore::get(&self.repo, line.item_id)
                .await
                .map_err(internal)?
                .ok_or_else(|| AppError::NotFound(format!("plant {}", line.item_id)))?;
            if line.quantity > item.stock {
                return Err(AppError::InsufficientStock {
                    item_id: line.item_id,
                    requested: line.quantity,
                    available: item.stock,
                });
            }
            if line.unit_price_cents != item.price_cents {
                return Err(AppError::PriceMismatch {
                    item_id: line.item_id,
                    submitted_cents: line.unit_price_cents,
                    catalog_cents: item.price_cents,
                });
            }
        }
        Ok(())
    }

    /// Compensation: give back what was already taken. A failure here is
    /// logged and swallowed; the original error is what the caller sees.
    async fn release(&self, consumed: &[(Uuid, u32)]) {
        for (item_id, quantity) in consumed {
            if let Err(e) = self.repo.increment(*item_id, *quantity).await {
                tracing::error!(%item_id, quantity, error = %e, "failed to restore stock after aborted checkout");
            }
        }
    }
}

fn check_total(draft: &OrderDraft) -> Result<(), AppError> {
    let computed: i64 = draft
        .lines
        .iter()
        .map(|l| l.unit_price_cents * i64::from(l.quantity))
        .sum();
    if computed != draft.total_cents {
        return Err(AppError::AmountMismatch {
            declared_cents: draft.total_cents,
            computed_cents: computed,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use plantmart_repo::memory::InMemoryRepo;
    use plantmart_types::domain::inventory::InventoryItem;
    use std::sync::Arc;

    async fn seed(repo: &InMemoryRepo, stock: u32, price_cents: i64) -> Uuid {
        let item = InventoryItem {
            id: Uuid::new_v4(),
            name: "Pothos".into(),
            price_cents,
            stock,
            seller_id: Uuid::new_v4(),
        };
        repo.upsert(item.clone()).await.unwrap();
        item.id
    }

    async fn stock_of(repo: &InMemoryRepo, item_id: Uuid) -> u32 {
        InventoryStore::get(repo, item_id)
            .await
            .unwrap()
            .unwrap()
            .stock
    }

    fn draft(lines: Vec<DraftLine>, total: i64) -> OrderDraft {
        OrderDraft {
            lines,
            total_cents: total,
            payment_method: PaymentMethod::Online,
            shipping_address: "5 Palm Grove".into(),
        }
    }

    #[tokio::test]
    async fn successful_checkout_consumes_exact_stock() {
        let repo = InMemoryRepo::new();
        let placer = OrderPlacer::new(repo.clone());
        let buyer = Uuid::new_v4();
        let a = seed(&repo, 5, 1000).await;
        let b = seed(&repo, 2, 250).await;

        let order = placer
            .place(
                buyer,
                draft(
                    vec![
                        DraftLine {
                            item_id: a,
                            quantity: 3,
                            unit_price_cents: 1000,
                        },
                        DraftLine {
                            item_id: b,
                            quantity: 1,
                            unit_price_cents: 250,
                        },
                    ],
                    3250,
                ),
            )
            .await
            .unwrap();

        assert_eq!(order.total_cents, 3250);
        assert_eq!(stock_of(&repo, a).await, 2);
        assert_eq!(stock_of(&repo, b).await, 1);
    }

    #[tokio::test]
    async fn oversell_is_rejected_and_no_stock_moves() {
        let repo = InMemoryRepo::new();
        let placer = OrderPlacer::new(repo.clone());
        let ok = seed(&repo, 5, 1000).await;
        let scarce = seed(&repo, 5, 400).await;

        let res = placer
            .place(
                Uuid::new_v4(),
                draft(
                    vec![
                        DraftLine {
                            item_id: ok,
                            quantity: 2,
                            unit_price_cents: 1000,
                        },
                        DraftLine {
                            item_id: scarce,
                            quantity: 6,
                            unit_price_cents: 400,
                        },
                    ],
                    4400,
                ),
            )
            .await;

        assert!(matches!(res, Err(AppError::InsufficientStock { .. })));
        // The line that would have validated is untouched too.
        assert_eq!(stock_of(&repo, ok).await, 5);
        assert_eq!(stock_of(&repo, scarce).await, 5);
    }

    #[tokio::test]
    async fn stale_price_is_rejected_before_any_mutation() {
        let repo = InMemoryRepo::new();
        let placer = OrderPlacer::new(repo.clone());
        let item = seed(&repo, 5, 1200).await;

        let res = placer
            .place(
                Uuid::new_v4(),
                draft(
                    vec![DraftLine {
                        item_id: item,
                        quantity: 1,
                        unit_price_cents: 1000,
                    }],
                    1000,
                ),
            )
            .await;

        assert!(matches!(res, Err(AppError::PriceMismatch { .. })));
        assert_eq!(stock_of(&repo, item).await, 5);
    }

    #[tokio::test]
    async fn declared_total_must_match_line_sum() {
        let repo = InMemoryRepo::new();
        let placer = OrderPlacer::new(repo.clone());
        let item = seed(&repo, 5, 1000).await;

        let res = placer
            .place(
                Uuid::new_v4(),
                draft(
                    vec![DraftLine {
                        item_id: item,
                        quantity: 2,
                        unit_price_cents: 1000,
                    }],
                    1999,
                ),
            )
            .await;

        assert!(matches!(res, Err(AppError::AmountMismatch { .. })));
        assert_eq!(stock_of(&repo, item).await, 5);
    }

    #[tokio::test]
    async fn shape_validation_failures() {
        let repo = InMemoryRepo::new();
        let placer = OrderPlacer::new(repo.clone());
        let buyer = Uuid::new_v4();
        let item = seed(&repo, 5, 1000).await;

        let empty = placer.place(buyer, draft(vec![], 100)).await;
        assert!(matches!(empty, Err(AppError::Validation(_))));

        let mut blank_address = draft(
            vec![DraftLine {
                item_id: item,
                quantity: 1,
                unit_price_cents: 1000,
            }],
            1000,
        );
        blank_address.shipping_address = "  ".into();
        let res = placer.place(buyer, blank_address).await;
        assert!(matches!(res, Err(AppError::Validation(_))));

        let dup = draft(
            vec![
                DraftLine {
                    item_id: item,
                    quantity: 1,
                    unit_price_cents: 1000,
                },
                DraftLine {
                    item_id: item,
                    quantity: 2,
                    unit_price_cents: 1000,
                },
            ],
            3000,
        );
        let res = placer.place(buyer, dup).await;
        assert!(matches!(res, Err(AppError::Validation(_))));

        let unknown = placer
            .place(
                buyer,
                draft(
                    vec![DraftLine {
                        item_id: Uuid::new_v4(),
                        quantity: 1,
                        unit_price_cents: 1000,
                    }],
                    1000,
                ),
            )
            .await;
        assert!(matches!(unknown, Err(AppError::NotFound(_))));
    }

    // Two checkouts race for 3 of 5 units each: exactly one may win and the
    // counter must end at 2, never below zero.
    #[tokio::test]
    async fn concurrent_checkouts_cannot_oversell() {
        let repo = InMemoryRepo::new();
        let placer = Arc::new(OrderPlacer::new(repo.clone()));
        let item = seed(&repo, 5, 800).await;

        let make = |placer: Arc<OrderPlacer<InMemoryRepo>>| {
            tokio::spawn(async move {
                placer
                    .place(
                        Uuid::new_v4(),
                        OrderDraft {
                            lines: vec![DraftLine {
                                item_id: item,
                                quantity: 3,
                                unit_price_cents: 800,
                            }],
                            total_cents: 2400,
                            payment_method: PaymentMethod::CashOnDelivery,
                            shipping_address: "9 Orchid Street".into(),
                        },
                    )
                    .await
            })
        };

        let (a, b) = tokio::join!(make(placer.clone()), make(placer));
        let results = [a.unwrap(), b.unwrap()];
        let wins = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(wins, 1);
        assert!(results
            .iter()
            .any(|r| matches!(r, Err(AppError::InsufficientStock { .. }))));
        assert_eq!(stock_of(&repo, item).await, 2);
    }
}
