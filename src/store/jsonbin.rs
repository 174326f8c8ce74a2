//! Hosted JSON bin adapter.
//!
//! The store wraps read responses in a `record` envelope and replaces the
//! document wholesale on PUT. An optional static access key is attached as
//! `X-Access-Key` on every request.

use serde_json::Value;

use super::{DocumentStore, StoreError};

const ACCESS_KEY_HEADER: &str = "X-Access-Key";

pub struct JsonBinStore {
    client: reqwest::Client,
    url: String,
    access_key: Option<String>,
}

impl JsonBinStore {
    pub fn new(client: reqwest::Client, url: impl Into<String>, access_key: Option<String>) -> Self {
        Self {
            client,
            url: url.into(),
            access_key,
        }
    }

    fn authed(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.access_key {
            Some(key) => request.header(ACCESS_KEY_HEADER, key),
            None => request,
        }
    }
}

/// Unwrap the store's `{ "record": ... }` read envelope, tolerating stores
/// that return the bare payload.
fn unwrap_record(body: Value) -> Value {
    match body {
        Value::Object(mut map) if map.contains_key("record") => {
            map.remove("record").unwrap_or(Value::Null)
        }
        other => other,
    }
}

#[async_trait::async_trait]
impl DocumentStore for JsonBinStore {
    async fn read(&self) -> Result<Value, StoreError> {
        let response = self
            .authed(self.client.get(&self.url))
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), %detail, "document store read failed");
            return Err(StoreError::Status {
                status: status.as_u16(),
                detail,
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))?;
        Ok(unwrap_record(body))
    }

    async fn replace(&self, document: &Value) -> Result<(), StoreError> {
        let response = self
            .authed(self.client.put(&self.url).json(document))
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), %detail, "document store write failed");
            return Err(StoreError::Status {
                status: status.as_u16(),
                detail,
            });
        }
        Ok(())
    }
}
