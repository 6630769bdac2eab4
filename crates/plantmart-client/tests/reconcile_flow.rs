use plantmart_client::reconcile::ReconcilePolicy;
use plantmart_client::store::{CartStorage, CartStore, JsonFileStorage};
use plantmart_client::PlantmartClient;
use plantmart_hex::inbound::http::{HttpServer, HttpServerConfig};
use plantmart_repo::memory::InMemoryRepo;
use plantmart_types::domain::cart::CartLine;
use plantmart_types::domain::inventory::InventoryItem;
use plantmart_types::ports::inventory_store::InventoryStore;
use uuid::Uuid;

fn find_free_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

async fn start_server(repo: InMemoryRepo) -> String {
    let port = find_free_port();
    let config = HttpServerConfig {
        port: port.to_string(),
    };
    let server = HttpServer::new(repo, config).await.unwrap();
    tokio::spawn(async move {
        server.run().await.expect("server run");
    });
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    format!("http://127.0.0.1:{}", port)
}

async fn seed(repo: &InMemoryRepo, price_cents: i64, stock: u32) -> Uuid {
    let item = InventoryItem {
        id: Uuid::new_v4(),
        name: "String of pearls".into(),
        price_cents,
        stock,
        seller_id: Uuid::new_v4(),
    };
    repo.upsert(item.clone()).await.unwrap();
    item.id
}

fn client_for(addr: &str, user: Uuid) -> PlantmartClient {
    PlantmartClient::builder(addr)
        .unwrap()
        .with_user(user)
        .unwrap()
        .build()
        .unwrap()
}

// Local {A: 3} against server {A: 1, B: 2}: after login the server cart
// must equal the local one, quantities included.
#[tokio::test]
async fn login_reconciliation_local_wins_end_to_end() {
    let repo = InMemoryRepo::new();
    let a = seed(&repo, 1000, 10).await;
    let b = seed(&repo, 500, 10).await;
    let addr = start_server(repo).await;

    let user = Uuid::new_v4();
    let client = client_for(&addr, user);

    // Cart left over from an earlier authenticated session.
    client.add_item(a, 1).await.unwrap();
    client.add_item(b, 2).await.unwrap();

    // Fresh anonymous session on this device.
    let dir = tempfile::tempdir().unwrap();
    let mut store = CartStore::open(JsonFileStorage::new(dir.path().join("cart.json")));
    store.add(CartLine::new(a, 3, 1000).unwrap());

    let report = store
        .login(user, &client, ReconcilePolicy::LocalWins)
        .await
        .unwrap();
    assert_eq!(report.mutations.len(), 2);

    let server_cart = client.get_cart().await.unwrap();
    assert_eq!(server_cart.lines.len(), 1);
    assert_eq!(server_cart.quantity_of(a), 3);
    assert_eq!(server_cart.quantity_of(b), 0);

    assert!(store.is_authenticated());
    assert_eq!(store.cart().quantity_of(a), 3);

    // The anonymous local copy was merged away.
    assert!(JsonFileStorage::new(dir.path().join("cart.json"))
        .load()
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn login_reconciliation_server_wins_adopts_snapshot() {
    let repo = InMemoryRepo::new();
    let a = seed(&repo, 1000, 10).await;
    let b = seed(&repo, 500, 10).await;
    let addr = start_server(repo).await;

    let user = Uuid::new_v4();
    let client = client_for(&addr, user);
    client.add_item(b, 2).await.unwrap();

    let dir = tempfile::tempdir().unwrap();
    let mut store = CartStore::open(JsonFileStorage::new(dir.path().join("cart.json")));
    store.add(CartLine::new(a, 3, 1000).unwrap());

    let report = store
        .login(user, &client, ReconcilePolicy::ServerWins)
        .await
        .unwrap();
    assert!(report.mutations.is_empty());

    // No corrective calls: the server cart is untouched and the local
    // store adopted it.
    assert_eq!(store.cart().quantity_of(b), 2);
    assert_eq!(store.cart().quantity_of(a), 0);
    let server_cart = client.get_cart().await.unwrap();
    assert_eq!(server_cart.quantity_of(b), 2);
}

// After login, transitions queue in order and flush pushes them the same
// way; the server converges on the optimistic local state.
#[tokio::test]
async fn authenticated_mutations_flush_in_order() {
    let repo = InMemoryRepo::new();
    let a = seed(&repo, 800, 10).await;
    let b = seed(&repo, 300, 10).await;
    let addr = start_server(repo).await;

    let user = Uuid::new_v4();
    let client = client_for(&addr, user);

    let dir = tempfile::tempdir().unwrap();
    let mut store = CartStore::open(JsonFileStorage::new(dir.path().join("cart.json")));
    store
        .login(user, &client, ReconcilePolicy::LocalWins)
        .await
        .unwrap();

    store.add(CartLine::new(a, 2, 800).unwrap());
    store.add(CartLine::new(b, 1, 300).unwrap());
    store.update_quantity(a, 5);
    store.remove(b);
    assert_eq!(store.pending().count(), 4);

    store.flush(&client).await;
    assert_eq!(store.pending().count(), 0);

    let server_cart = client.get_cart().await.unwrap();
    assert_eq!(server_cart.quantity_of(a), 5);
    assert_eq!(server_cart.quantity_of(b), 0);
    assert_eq!(server_cart.lines.len(), 1);
}
