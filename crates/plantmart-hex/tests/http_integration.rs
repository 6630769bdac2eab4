use plantmart_hex::inbound::http::{HttpServer, HttpServerConfig};
use plantmart_repo::memory::InMemoryRepo;
use plantmart_types::domain::cart::Cart;
use plantmart_types::domain::inventory::InventoryItem;
use plantmart_types::domain::order::Order;
use plantmart_types::ports::inventory_store::InventoryStore;
use serde_json::{json, Value};
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
    // Give the server a moment to start.
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    format!("http://127.0.0.1:{}", port)
}

async fn seed(repo: &InMemoryRepo, price_cents: i64, stock: u32, seller: Uuid) -> Uuid {
    let item = InventoryItem {
        id: Uuid::new_v4(),
        name: "Peace lily".into(),
        price_cents,
        stock,
        seller_id: seller,
    };
    repo.upsert(item.clone()).await.unwrap();
    item.id
}

#[tokio::test]
async fn cart_and_checkout_over_http() {
    let repo = InMemoryRepo::new();
    let seller = Uuid::new_v4();
    let item = seed(&repo, 1500, 6, seller).await;
    let addr = start_server(repo.clone()).await;

    let buyer = Uuid::new_v4();
    let client = reqwest::Client::new();

    let empty: Cart = client
        .get(format!("{}/cart", addr))
        .header("x-user-id", buyer.to_string())
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(empty.lines.is_empty());

    let res = client
        .post(format!("{}/cart/items", addr))
        .header("x-user-id", buyer.to_string())
        .json(&json!({ "item_id": item, "quantity": 4 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::OK);
    let cart: Cart = res.json().await.unwrap();
    assert_eq!(cart.quantity_of(item), 4);
    assert_eq!(cart.lines[0].unit_price_cents, 1500);

    let res = client
        .patch(format!("{}/cart/items/{}", addr, item))
        .header("x-user-id", buyer.to_string())
        .json(&json!({ "quantity": 2 }))
        .send()
        .await
        .unwrap();
    let cart: Cart = res.json().await.unwrap();
    assert_eq!(cart.quantity_of(item), 2);

    let res = client
        .post(format!("{}/orders", addr))
        .header("x-user-id", buyer.to_string())
        .json(&json!({
            "lines": [{ "item_id": item, "quantity": 2, "unit_price_cents": 1500 }],
            "total_cents": 3000,
            "payment_method": "Online",
            "shipping_address": "10 Rose Hill"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::CREATED);
    let order: Order = res.json().await.unwrap();
    assert_eq!(order.total_cents, 3000);

    let left = InventoryStore::get(&repo, item).await.unwrap().unwrap();
    assert_eq!(left.stock, 4);

    let fetched: Order = client
        .get(format!("{}/orders/{}", addr, order.id))
        .header("x-user-id", buyer.to_string())
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fetched.buyer_id, buyer);

    let res = client
        .patch(format!("{}/orders/{}/status", addr, order.id))
        .header("x-user-id", seller.to_string())
        .json(&json!({ "status": "Shipped" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::OK);

    let res = client
        .patch(format!("{}/orders/{}/tracking", addr, order.id))
        .header("x-user-id", seller.to_string())
        .json(&json!({ "carrier": "GreenPost", "tracking_number": "GP-100" }))
        .send()
        .await
        .unwrap();
    let tracked: Order = res.json().await.unwrap();
    assert_eq!(tracked.tracking.unwrap().carrier.as_deref(), Some("GreenPost"));

    let res = client
        .post(format!("{}/orders/{}/payment", addr, order.id))
        .json(&json!({ "payment_ref": "gw-500" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::OK);
}

async fn error_code(res: reqwest::Response) -> String {
    let body: Value = res.json().await.unwrap();
    body["code"].as_str().unwrap_or_default().to_string()
}

#[tokio::test]
async fn error_taxonomy_over_http() {
    let repo = InMemoryRepo::new();
    let seller = Uuid::new_v4();
    let item = seed(&repo, 1200, 5, seller).await;
    let addr = start_server(repo.clone()).await;

    let buyer = Uuid::new_v4();
    let client = reqwest::Client::new();

    // Identity required.
    let res = client.get(format!("{}/cart", addr)).send().await.unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::UNAUTHORIZED);

    // Unknown plant.
    let res = client
        .post(format!("{}/cart/items", addr))
        .header("x-user-id", buyer.to_string())
        .json(&json!({ "item_id": Uuid::new_v4(), "quantity": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::NOT_FOUND);
    assert_eq!(error_code(res).await, "NotFound");

    // More than the shelf holds.
    let res = client
        .post(format!("{}/cart/items", addr))
        .header("x-user-id", buyer.to_string())
        .json(&json!({ "item_id": item, "quantity": 6 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::BAD_REQUEST);
    assert_eq!(error_code(res).await, "StockExceeded");

    // Stale client price cache.
    let res = client
        .post(format!("{}/orders", addr))
        .header("x-user-id", buyer.to_string())
        .json(&json!({
            "lines": [{ "item_id": item, "quantity": 1, "unit_price_cents": 1000 }],
            "total_cents": 1000,
            "payment_method": "Online",
            "shipping_address": "1 Vine Street"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::BAD_REQUEST);
    assert_eq!(error_code(res).await, "PriceMismatch");

    // Declared total disagrees with the line sum.
    let res = client
        .post(format!("{}/orders", addr))
        .header("x-user-id", buyer.to_string())
        .json(&json!({
            "lines": [{ "item_id": item, "quantity": 2, "unit_price_cents": 1200 }],
            "total_cents": 2000,
            "payment_method": "Online",
            "shipping_address": "1 Vine Street"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::BAD_REQUEST);
    assert_eq!(error_code(res).await, "AmountMismatch");

    // Unrecognized payment method is part of shape validation.
    let res = client
        .post(format!("{}/orders", addr))
        .header("x-user-id", buyer.to_string())
        .json(&json!({
            "lines": [{ "item_id": item, "quantity": 1, "unit_price_cents": 1200 }],
            "total_cents": 1200,
            "payment_method": "Barter",
            "shipping_address": "1 Vine Street"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::BAD_REQUEST);
    assert_eq!(error_code(res).await, "ValidationError");

    // Stock untouched by any of the rejected calls.
    let untouched = InventoryStore::get(&repo, item).await.unwrap().unwrap();
    assert_eq!(untouched.stock, 5);

    // Foreign caller cannot mutate an order they sell nothing into.
    let res = client
        .post(format!("{}/orders", addr))
        .header("x-user-id", buyer.to_string())
        .json(&json!({
            "lines": [{ "item_id": item, "quantity": 1, "unit_price_cents": 1200 }],
            "total_cents": 1200,
            "payment_method": "CashOnDelivery",
            "shipping_address": "1 Vine Street"
        }))
        .send()
        .await
        .unwrap();
    let order: Order = res.json().await.unwrap();
    let res = client
        .patch(format!("{}/orders/{}/status", addr, order.id))
        .header("x-user-id", Uuid::new_v4().to_string())
        .json(&json!({ "status": "Shipped" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::FORBIDDEN);
}
