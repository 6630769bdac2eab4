use axum::{
    routing::{delete, get, patch, post},
    serve, Json, Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::application::cart_service::CartService;
use crate::application::order_placer::OrderPlacer;
use crate::application::order_service::OrderService;
use crate::application::Store;
use crate::inbound::http::{cart, orders};

#[derive(Clone)]
pub struct HttpServerConfig {
    pub port: String,
}

pub struct AppState<R: Store> {
    pub carts: CartService<R>,
    pub placer: OrderPlacer<R>,
    pub orders: OrderService<R>,
}

pub struct HttpServer<R: Store> {
    pub state: Arc<AppState<R>>,
    pub config: HttpServerConfig,
}

impl<R: Store> HttpServer<R> {
    pub async fn new(repo: R, config: HttpServerConfig) -> anyhow::Result<Self> {
        let state = Arc::new(AppState {
            carts: CartService::new(repo.clone()),
            placer: OrderPlacer::new(repo.clone()),
            orders: OrderService::new(repo),
        });
        Ok(Self { state, config })
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let trace_layer = TraceLayer::new_for_http()
            .make_span_with(|request: &axum::extract::Request<_>| {
                let uri = request.uri().to_string();
                let request_id = Uuid::new_v4();
                tracing::info_span!(
                    "http_request",
                    %request_id,
                    method = %request.method(),
                    uri
                )
            })
            .on_request(
                |request: &axum::extract::Request<_>, span: &tracing::Span| {
                    tracing::info!(
                        parent: span,
                        method = %request.method(),
                        uri = %request.uri(),
                        "request"
                    );
                },
            )
            .on_response(
                |response: &axum::response::Response, latency: Duration, span: &tracing::Span| {
                    tracing::info!(
                        parent: span,
                        status = %response.status(),
                        latency_ms = %latency.as_millis(),
                        "response"
                    );
                },
            );

        let app = Router::new()
            .route("/health", get(health))
            .route("/cart", get(cart::get_cart::<R>))
            .route("/cart", delete(cart::clear_cart::<R>))
            .route("/cart/items", post(cart::add_item::<R>))
            .route("/cart/items/{item_id}", patch(cart::update_item::<R>))
            .route("/cart/items/{item_id}", delete(cart::remove_item::<R>))
            .route("/orders", post(orders::create_order::<R>))
            .route("/orders", get(orders::list_orders::<R>))
            .route("/orders/{id}", get(orders::get_order::<R>))
            .route("/orders/{id}/status", patch(orders::update_status::<R>))
            .route("/orders/{id}/tracking", patch(orders::update_tracking::<R>))
            .route("/orders/{id}/payment", post(orders::confirm_payment::<R>))
            .layer(trace_layer)
            .with_state(self.state);

        let addr: SocketAddr = format!("0.0.0.0:{}", self.config.port).parse()?;
        tracing::info!("starting server on {}", addr);
        let listener = tokio::net::TcpListener::bind(addr).await?;
        serve(listener, app.into_make_service()).await?;
        Ok(())
    }
}

async fn health() -> (axum::http::StatusCode, Json<serde_json::Value>) {
    (
        axum::http::StatusCode::OK,
        Json(serde_json::json!({ "status": "ok" })),
    )
}
