//! plantmart-client: buyer-side HTTP client, the local cart store, and the
//! login-time cart reconciler.

use std::time::Duration;

use anyhow::Context;
use plantmart_types::domain::cart::Cart;
use plantmart_types::domain::order::{Order, PaymentMethod};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod reconcile;
pub mod store;

use store::CartMutation;

/// Applied when the builder is given no explicit timeout; no call to the
/// marketplace should hang unbounded.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct PlantmartClientBuilder {
    base: Url,
    headers: HeaderMap,
    timeout: Option<Duration>,
    client: Option<reqwest::Client>,
}

#[derive(Clone)]
pub struct PlantmartClient {
    base: Url,
    client: reqwest::Client,
}

impl PlantmartClient {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        Self::builder(base_url)?.build()
    }

    pub fn builder(base_url: &str) -> anyhow::Result<PlantmartClientBuilder> {
        let base = Url::parse(base_url).context("invalid base url")?;
        Ok(PlantmartClientBuilder {
            base,
            headers: HeaderMap::new(),
            timeout: None,
            client: None,
        })
    }

    fn url(&self, path: &str) -> anyhow::Result<Url> {
        self.base.join(path).context("failed to join url")
    }

    pub async fn get_cart(&self) -> anyhow::Result<Cart> {
        let res = self
            .client
            .get(self.url("cart")?)
            .send()
            .await?
            .error_for_status()?;
        Ok(res.json().await?)
    }

    pub async fn add_item(&self, item_id: Uuid, quantity: u32) -> anyhow::Result<Cart> {
        let res = self
            .client
            .post(self.url("cart/items")?)
            .json(&AddItemRequest { item_id, quantity })
            .send()
            .await?
            .error_for_status()?;
        Ok(res.json().await?)
    }

    pub async fn update_item(&self, item_id: Uuid, quantity: u32) -> anyhow::Result<Cart> {
        let res = self
            .client
            .patch(self.url(&format!("cart/items/{item_id}"))?)
            .json(&UpdateItemRequest { quantity })
            .send()
            .await?
            .error_for_status()?;
        Ok(res.json().await?)
    }

    pub async fn remove_item(&self, item_id: Uuid) -> anyhow::Result<Cart> {
        let res = self
            .client
            .delete(self.url(&format!("cart/items/{item_id}"))?)
            .send()
            .await?
            .error_for_status()?;
        Ok(res.json().await?)
    }

    pub async fn clear_cart(&self) -> anyhow::Result<Cart> {
        let res = self
            .client
            .delete(self.url("cart")?)
            .send()
            .await?
            .error_for_status()?;
        Ok(res.json().await?)
    }

    /// One corrective reconciliation call, dispatched by mutation kind.
    pub async fn apply(&self, mutation: &CartMutation) -> anyhow::Result<Cart> {
        match mutation {
            CartMutation::Add { item_id, quantity } => self.add_item(*item_id, *quantity).await,
            CartMutation::Update { item_id, quantity } => {
                self.update_item(*item_id, *quantity).await
            }
            CartMutation::Remove { item_id } => self.remove_item(*item_id).await,
            CartMutation::Clear => self.clear_cart().await,
        }
    }

    pub async fn create_order(&self, req: CreateOrderRequest) -> anyhow::Result<Order> {
        let res = self
            .client
            .post(self.url("orders")?)
            .json(&req)
            .send()
            .await?
            .error_for_status()?;
        Ok(res.json().await?)
    }

    pub async fn get_order(&self, id: Uuid) -> anyhow::Result<Order> {
        let res = self
            .client
            .get(self.url(&format!("orders/{id}"))?)
            .send()
            .await?
            .error_for_status()?;
        Ok(res.json().await?)
    }

    pub async fn list_orders(&self) -> anyhow::Result<Vec<Order>> {
        let res = self
            .client
            .get(self.url("orders")?)
            .send()
            .await?
            .error_for_status()?;
        Ok(res.json().await?)
    }
}

impl PlantmartClientBuilder {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Attaches the authenticated identity every request will carry.
    pub fn with_user(self, user_id: Uuid) -> anyhow::Result<Self> {
        self.with_header("x-user-id", user_id.to_string())
    }

    pub fn with_header(
        mut self,
        key: impl AsRef<str>,
        value: impl AsRef<str>,
    ) -> anyhow::Result<Self> {
        let header_name =
            HeaderName::from_bytes(key.as_ref().as_bytes()).context("invalid header name")?;
        let header_value = HeaderValue::from_str(value.as_ref()).context("invalid header value")?;
        self.headers.insert(header_name, header_value);
        Ok(self)
    }

    pub fn with_reqwest_client(mut self, client: reqwest::Client) -> Self {
        self.client = Some(client);
        self
    }

    pub fn build(self) -> anyhow::Result<PlantmartClient> {
        if let Some(client) = self.client {
            return Ok(PlantmartClient {
                base: self.base,
                client,
            });
        }

        let mut builder = reqwest::Client::builder();
        if !self.headers.is_empty() {
            builder = builder.default_headers(self.headers);
        }
        builder = builder.timeout(self.timeout.unwrap_or(DEFAULT_TIMEOUT));
        let client = builder.build()?;
        Ok(PlantmartClient {
            base: self.base,
            client,
        })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AddItemRequest {
    pub item_id: Uuid,
    pub quantity: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct UpdateItemRequest {
    pub quantity: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct OrderLineRequest {
    pub item_id: Uuid,
    pub quantity: u32,
    pub unit_price_cents: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CreateOrderRequest {
    pub lines: Vec<OrderLineRequest>,
    pub total_cents: i64,
    pub payment_method: PaymentMethod,
    pub shipping_address: String,
}
