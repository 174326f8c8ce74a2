//! Client-submitted cart lines. Everything here is untrusted input.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// One basket line as submitted by the storefront. The optional cached
/// display fields are never trusted for pricing; the repository price is
/// authoritative (see `checkout::price_cart`).
#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
pub struct CartLine {
    #[validate(length(min = 1, message = "cart line is missing a product id"))]
    pub id: String,
    #[validate(range(min = 1, message = "quantity must be at least 1"))]
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// Compact `{id, quantity}` pair attached to a checkout session and
/// replayed by the payment-completion handler.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestItem {
    pub id: String,
    pub quantity: u32,
}

/// Merge duplicate product ids, summing quantities. First-occurrence order
/// is preserved so provider line items match the basket.
pub fn normalize(lines: &[CartLine]) -> Vec<CartLine> {
    let mut merged: Vec<CartLine> = Vec::with_capacity(lines.len());
    for line in lines {
        if let Some(existing) = merged.iter_mut().find(|l| l.id == line.id) {
            existing.quantity = existing.quantity.saturating_add(line.quantity);
        } else {
            merged.push(line.clone());
        }
    }
    merged
}
