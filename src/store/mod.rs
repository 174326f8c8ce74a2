//! Port onto the external JSON document store.

pub mod jsonbin;
pub mod memory;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Read/replace access to one hosted JSON document ("bin"). The whole
/// document is the unit of both operations; there is no per-record
/// addressing and no compare-and-swap; last writer wins.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch the current document payload.
    async fn read(&self) -> Result<Value, StoreError>;

    /// Replace the document wholesale.
    async fn replace(&self, document: &Value) -> Result<(), StoreError>;
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document store request failed: {0}")]
    Transport(String),

    #[error("document store returned {status}: {detail}")]
    Status { status: u16, detail: String },

    #[error("document payload could not be decoded: {0}")]
    Decode(String),
}
