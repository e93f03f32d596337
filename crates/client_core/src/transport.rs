use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use shared::protocol::{RpcRequest, RpcResponse};
use tracing::debug;
use url::Url;

/// The single request/response channel to the wallet or node.
#[async_trait]
pub trait RpcTransport: Send + Sync {
    async fn request(&self, method: &str, params: Value) -> Result<Value>;
}

pub struct HttpTransport {
    http: Client,
    endpoint: Url,
    next_id: AtomicU64,
}

impl HttpTransport {
    pub fn new(endpoint: &str) -> Result<Self> {
        let endpoint =
            Url::parse(endpoint.trim()).with_context(|| format!("invalid rpc url: {endpoint}"))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(anyhow!(
                "rpc url must start with http:// or https://, got {endpoint}"
            ));
        }
        Ok(Self {
            http: Client::new(),
            endpoint,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl RpcTransport for HttpTransport {
    async fn request(&self, method: &str, params: Value) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        debug!(method, id, "rpc: request");
        let res = self
            .http
            .post(self.endpoint.clone())
            .json(&RpcRequest::new(id, method, params))
            .send()
            .await
            .with_context(|| format!("failed to reach rpc endpoint {}", self.endpoint))?
            .error_for_status()?;
        let body: RpcResponse = res
            .json()
            .await
            .with_context(|| format!("malformed rpc response to {method}"))?;
        Ok(body.into_result()?)
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
