//! Typed async client for the order service HTTP API.

use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub item: String,
    pub quantity: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRequest {
    pub item: String,
    pub quantity: u32,
}

#[derive(Debug, Deserialize)]
struct CreatedBody {
    id: String,
}

#[derive(Debug, Deserialize)]
struct OrderBody {
    order: Order,
}

#[derive(Debug, Deserialize)]
struct DeletedBody {
    success: bool,
}

#[derive(Debug, Deserialize)]
struct ListBody {
    orders: Vec<Order>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("service returned {status}: {message}")]
    Api { status: StatusCode, message: String },
}

impl ClientError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Transport(e) => e.status(),
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

pub struct OrderClient {
    client: Client,
    base_url: String,
    admin_key: Option<String>,
}

impl OrderClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            admin_key: None,
        }
    }

    /// Attach the bearer token used for `/admin` calls.
    pub fn with_admin_key(mut self, key: &str) -> Self {
        self.admin_key = Some(key.to_string());
        self
    }

    pub async fn create_order(&self, item: &str, quantity: u32) -> ClientResult<String> {
        let resp = self
            .client
            .post(self.url("/v1/orders"))
            .json(&OrderRequest {
                item: item.to_string(),
                quantity,
            })
            .send()
            .await?;
        let body: CreatedBody = decode(resp).await?;
        Ok(body.id)
    }

    pub async fn get_order(&self, id: &str) -> ClientResult<Order> {
        let resp = self
            .client
            .get(self.url(&format!("/v1/orders/{}", id)))
            .send()
            .await?;
        let body: OrderBody = decode(resp).await?;
        Ok(body.order)
    }

    pub async fn update_order(&self, id: &str, item: &str, quantity: u32) -> ClientResult<Order> {
        let resp = self
            .client
            .put(self.url(&format!("/v1/orders/{}", id)))
            .json(&OrderRequest {
                item: item.to_string(),
                quantity,
            })
            .send()
            .await?;
        let body: OrderBody = decode(resp).await?;
        Ok(body.order)
    }

    pub async fn delete_order(&self, id: &str) -> ClientResult<bool> {
        let resp = self
            .client
            .delete(self.url(&format!("/v1/orders/{}", id)))
            .send()
            .await?;
        let body: DeletedBody = decode(resp).await?;
        Ok(body.success)
    }

    pub async fn list_orders(&self) -> ClientResult<Vec<Order>> {
        let resp = self.client.get(self.url("/v1/orders")).send().await?;
        let body: ListBody = decode(resp).await?;
        Ok(body.orders)
    }

    pub async fn health(&self) -> ClientResult<serde_json::Value> {
        let resp = self.client.get(self.url("/health")).send().await?;
        decode(resp).await
    }

    /// GET an admin endpoint, e.g. `"status"` or `"dead-letters"`.
    pub async fn admin_get(&self, endpoint: &str) -> ClientResult<serde_json::Value> {
        let resp = self
            .admin(self.client.get(self.url(&format!("/admin/{}", endpoint))))
            .send()
            .await?;
        decode(resp).await
    }

    /// Redeliver parked events; returns how many went out.
    pub async fn redrive_dead_letters(&self) -> ClientResult<usize> {
        let resp = self
            .admin(self.client.post(self.url("/admin/dead-letters/redrive")))
            .send()
            .await?;
        let body: serde_json::Value = decode(resp).await?;
        Ok(body["redelivered"].as_u64().unwrap_or(0) as usize)
    }

    /// Send a raw request body to a path, for callers that need the response.
    pub async fn send_raw(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Option<String>,
    ) -> Result<Response, reqwest::Error> {
        let mut request = self
            .client
            .request(method, self.url(path))
            .header(reqwest::header::CONTENT_TYPE, "application/json");
        if let Some(body) = body {
            request = request.body(body);
        }
        request.send().await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn admin(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.admin_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }
}

async fn decode<T: DeserializeOwned>(resp: Response) -> ClientResult<T> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp.json().await?);
    }

    let text = resp.text().await?;
    let message = serde_json::from_str::<ErrorBody>(&text)
        .map(|body| body.error)
        .unwrap_or(text);
    Err(ClientError::Api { status, message })
}
