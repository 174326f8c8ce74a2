//! Payment provider port and wire types.

pub mod stripe;

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::domain::cart::ManifestItem;

/// Hosted providers cap each metadata value at 500 characters; manifests
/// are chunked below the cap so large carts survive the round trip intact.
pub const METADATA_VALUE_LIMIT: usize = 450;

const MANIFEST_KEY: &str = "cart_items";

/// One trusted line item for the provider's hosted checkout page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionLineItem {
    pub product_id: String,
    pub name: String,
    pub image: Option<String>,
    /// Unit price in minor currency units (pence).
    pub unit_amount: i64,
    pub quantity: u32,
}

/// Flat shipping option offered on the hosted page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShippingRate {
    pub display_name: String,
    pub amount_minor: i64,
}

/// Everything the gateway needs to open a hosted checkout session.
#[derive(Clone, Debug)]
pub struct SessionRequest {
    pub line_items: Vec<SessionLineItem>,
    pub currency: String,
    pub success_url: String,
    pub cancel_url: String,
    pub shipping: Option<ShippingRate>,
    pub metadata: BTreeMap<String, String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    pub url: String,
}

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("payment provider secret key is not configured")]
    MissingCredentials,

    #[error("payment provider request failed: {0}")]
    Transport(String),

    #[error("payment provider returned {status}: {detail}")]
    Status { status: u16, detail: String },

    #[error("payment provider response could not be decoded: {0}")]
    Decode(String),
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_session(&self, request: SessionRequest)
        -> Result<CheckoutSession, PaymentError>;
}

/// Provider event envelope delivered to the webhook endpoint.
#[derive(Clone, Debug, Deserialize)]
pub struct WebhookEvent {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: WebhookData,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct WebhookData {
    #[serde(default)]
    pub object: SessionObject,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct SessionObject {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

/// Serialize a cart manifest into one or more metadata values, each below
/// the provider's per-value cap. The first chunk keeps the bare key so the
/// single-chunk case reads exactly like the legacy format.
pub fn manifest_metadata(
    items: &[ManifestItem],
) -> Result<BTreeMap<String, String>, serde_json::Error> {
    let serialized = serde_json::to_string(items)?;
    let mut metadata = BTreeMap::new();
    for (index, chunk) in chunk_str(&serialized, METADATA_VALUE_LIMIT).into_iter().enumerate() {
        let key = if index == 0 {
            MANIFEST_KEY.to_string()
        } else {
            format!("{MANIFEST_KEY}_{}", index + 1)
        };
        metadata.insert(key, chunk);
    }
    Ok(metadata)
}

/// Reassemble a manifest from session metadata. Falls back to the legacy
/// single-item `productId`/`quantity` keys when no manifest is present.
pub fn manifest_from_metadata(metadata: &HashMap<String, String>) -> Vec<ManifestItem> {
    let mut serialized = String::new();
    if let Some(first) = metadata.get(MANIFEST_KEY) {
        serialized.push_str(first);
        let mut index = 2;
        while let Some(chunk) = metadata.get(&format!("{MANIFEST_KEY}_{index}")) {
            serialized.push_str(chunk);
            index += 1;
        }
    }
    if !serialized.is_empty() {
        match serde_json::from_str::<Vec<ManifestItem>>(&serialized) {
            Ok(items) => return items,
            Err(err) => {
                tracing::error!(%err, "failed to parse cart manifest from session metadata");
            }
        }
    }

    if let Some(product_id) = metadata.get("productId") {
        let quantity = metadata
            .get("quantity")
            .and_then(|q| q.parse().ok())
            .unwrap_or(1);
        return vec![ManifestItem {
            id: product_id.clone(),
            quantity,
        }];
    }
    Vec::new()
}

/// Split on char boundaries so a chunk never exceeds `max_bytes`.
fn chunk_str(s: &str, max_bytes: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    for ch in s.chars() {
        if current.len() + ch.len_utf8() > max_bytes && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
        }
        current.push(ch);
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}
