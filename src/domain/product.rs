//! Product records as stored in the inventory document.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::value_objects::Quantity;

/// Merchandising tag. Informational only; never consulted by checkout
/// validation. Tags outside the known set round-trip unchanged.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Singles,
    Sealed,
    Accessories,
    Prints,
    #[serde(untagged)]
    Other(String),
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(default)]
    pub id: String,
    pub title: String,
    /// Authoritative unit price in major currency units.
    #[serde(default)]
    pub price: Decimal,
    /// Authoritative available quantity. Never negative.
    #[serde(default)]
    pub stock: Quantity,
    /// Derived flag, recomputed on every mutation.
    #[serde(default)]
    pub available: bool,
    /// Purchasable at zero stock, fulfilled later.
    #[serde(default)]
    pub pre_order: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Fields this service does not model are carried through writes
    /// untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Product {
    /// In stock, or pre-orderable at zero stock.
    pub fn is_available(&self) -> bool {
        !self.stock.is_zero() || self.pre_order
    }

    /// Recompute the stored `available` flag after a mutation.
    pub fn refresh_availability(&mut self) {
        self.available = self.is_available();
    }

    /// Whether `quantity` can be purchased right now. Pre-order records
    /// accept any quantity; otherwise stock on hand is the ceiling.
    pub fn can_fulfil(&self, quantity: u32) -> bool {
        self.pre_order || quantity <= self.stock.value()
    }
}
