///  To run :
///  cargo r --example client_walkthrough
use plantmart_client::{CreateOrderRequest, OrderLineRequest, PlantmartClient};
use plantmart_hex::inbound::http::{HttpServer, HttpServerConfig};
use plantmart_repo::build_repo;
use plantmart_types::domain::inventory::InventoryItem;
use plantmart_types::domain::order::{OrderStatus, PaymentMethod};
use plantmart_types::ports::inventory_store::InventoryStore;
use tempfile::tempdir;
use uuid::Uuid;

fn find_free_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Start server on an ephemeral port.
    let port = find_free_port();
    let addr = format!("http://127.0.0.1:{port}/");

    // Temp file-backed SQLite DB so multiple connections see the same data.
    let tmp = tempdir()?;
    let db_path = tmp.path().join("plantmart.db");
    let db_url = format!("sqlite://{}", db_path.display());
    let repo = build_repo(Some(&db_url)).await?;

    // Seed one catalog plant; the catalog service owns this in production.
    let seller = Uuid::new_v4();
    let monstera = InventoryItem {
        id: Uuid::new_v4(),
        name: "Monstera deliciosa".into(),
        price_cents: 2400,
        stock: 6,
        seller_id: seller,
    };
    repo.upsert(monstera.clone()).await?;

    let server = HttpServer::new(
        repo,
        HttpServerConfig {
            port: port.to_string(),
        },
    )
    .await?;
    let handle = tokio::spawn(async move {
        server.run().await.expect("server run");
    });
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    // Use the client against the running server.
    let buyer = Uuid::new_v4();
    let client = PlantmartClient::builder(&addr)?.with_user(buyer)?.build()?;

    let cart = client.add_item(monstera.id, 2).await?;
    println!(
        "Cart holds {} x {}",
        cart.quantity_of(monstera.id),
        monstera.name
    );

    let cart = client.update_item(monstera.id, 3).await?;
    println!("Adjusted to {}", cart.quantity_of(monstera.id));

    let order = client
        .create_order(CreateOrderRequest {
            lines: cart
                .lines
                .iter()
                .map(|l| OrderLineRequest {
                    item_id: l.item_id,
                    quantity: l.quantity,
                    unit_price_cents: l.unit_price_cents,
                })
                .collect(),
            total_cents: 3 * 2400,
            payment_method: PaymentMethod::Online,
            shipping_address: "14 Trellis Row".into(),
        })
        .await?;
    println!("Placed order id={} total={}c", order.id, order.total_cents);
    assert_eq!(order.order_status, OrderStatus::Processing);

    let cart = client.clear_cart().await?;
    assert!(cart.is_empty());

    let fetched = client.get_order(order.id).await?;
    println!("Fetched order status={:?}", fetched.order_status);
    assert_eq!(fetched.buyer_id, buyer);

    let listed = client.list_orders().await?;
    println!("Buyer has {} order(s)", listed.len());

    handle.abort();
    Ok(())
}
