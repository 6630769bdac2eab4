use plantmart_types::domain::cart::Cart;

use crate::store::CartMutation;
use crate::PlantmartClient;

/// Conflict-resolution rule for the login-time merge. The classic behavior
/// is local-wins: the device logging in dictates the server cart. Server-
/// wins is offered for deployments that would rather not resurrect lines
/// deleted from another device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReconcilePolicy {
    #[default]
    LocalWins,
    ServerWins,
}

/// What the merge actually did, for surfacing to the caller.
#[derive(Debug, Clone, Default)]
pub struct ReconcileReport {
    pub mutations: Vec<CartMutation>,
}

/// Corrective calls that force the server cart to equal `local`: adds for
/// local-only lines, updates (to the local quantity) where both sides
/// differ, removes for server-only lines.
pub fn diff_carts(local: &Cart, server: &Cart) -> Vec<CartMutation> {
    let mut mutations = Vec::new();
    for line in &local.lines {
        match server.line(line.item_id) {
            None => mutations.push(CartMutation::Add {
                item_id: line.item_id,
                quantity: line.quantity,
            }),
            Some(existing) if existing.quantity != line.quantity => {
                mutations.push(CartMutation::Update {
                    item_id: line.item_id,
                    quantity: line.quantity,
                })
            }
            Some(_) => {}
        }
    }
    for line in &server.lines {
        if local.line(line.item_id).is_none() {
            mutations.push(CartMutation::Remove {
                item_id: line.item_id,
            });
        }
    }
    mutations
}

/// Runs the one-shot merge for a fresh authentication and returns the
/// converged cart as the server now holds it.
pub async fn reconcile(
    local: &Cart,
    client: &PlantmartClient,
    policy: ReconcilePolicy,
) -> anyhow::Result<(Cart, ReconcileReport)> {
    let server = client.get_cart().await?;
    match policy {
        ReconcilePolicy::LocalWins => {
            let mutations = diff_carts(local, &server);
            let mut converged = server;
            for mutation in &mutations {
                converged = client.apply(mutation).await?;
            }
            Ok((converged, ReconcileReport { mutations }))
        }
        ReconcilePolicy::ServerWins => Ok((server, ReconcileReport::default())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plantmart_types::domain::cart::CartLine;
    use uuid::Uuid;

    fn cart_with(lines: Vec<(Uuid, u32)>) -> Cart {
        let mut cart = Cart::anonymous();
        for (item_id, qty) in lines {
            cart.add(CartLine::new(item_id, qty, 1000).unwrap());
        }
        cart
    }

    // Anonymous {A: 2} against an empty server cart: one add, nothing else.
    #[test]
    fn diff_against_empty_server_is_all_adds() {
        let a = Uuid::new_v4();
        let local = cart_with(vec![(a, 2)]);
        let server = Cart::anonymous();

        let mutations = diff_carts(&local, &server);
        assert_eq!(
            mutations,
            vec![CartMutation::Add {
                item_id: a,
                quantity: 2
            }]
        );
    }

    // Local {A: 3} vs server {A: 1, B: 2}: update A to the local quantity,
    // remove B. Local wins wholesale.
    #[test]
    fn diff_updates_and_removes_to_match_local() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let local = cart_with(vec![(a, 3)]);
        let server = cart_with(vec![(a, 1), (b, 2)]);

        let mutations = diff_carts(&local, &server);
        assert_eq!(mutations.len(), 2);
        assert!(mutations.contains(&CartMutation::Update {
            item_id: a,
            quantity: 3
        }));
        assert!(mutations.contains(&CartMutation::Remove { item_id: b }));
    }

    #[test]
    fn identical_carts_need_no_calls() {
        let a = Uuid::new_v4();
        let local = cart_with(vec![(a, 2)]);
        let server = cart_with(vec![(a, 2)]);
        assert!(diff_carts(&local, &server).is_empty());
    }
}
