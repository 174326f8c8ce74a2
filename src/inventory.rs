//! Inventory repository: whole-document read-modify-write against the
//! document store.
//!
//! Every mutation is load → locate/validate → mutate in memory → persist.
//! The persist replaces the entire document unconditionally, so concurrent
//! writers race and the last one wins; that is the store's contract, not
//! something this layer can fix.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::cart::ManifestItem;
use crate::domain::product::Product;
use crate::domain::value_objects::Quantity;
use crate::error::{Result, StorefrontError};
use crate::store::DocumentStore;

/// Ceiling on the processed-session ledger; oldest entries are evicted.
const PROCESSED_SESSIONS_CAP: usize = 200;

/// The entire inventory as one aggregate document.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryDocument {
    #[serde(default)]
    pub products: Vec<Product>,
    /// Payment sessions whose stock effect has already been applied.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub processed_sessions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Top-level fields this service does not model, carried through
    /// writes untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl InventoryDocument {
    pub fn find(&self, id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    fn find_mut(&mut self, id: &str) -> Option<&mut Product> {
        self.products.iter_mut().find(|p| p.id == id)
    }
}

/// Summary returned by stock mutations; the shape the admin dashboard and
/// webhook logging consume.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockAdjustment {
    pub id: String,
    pub title: String,
    pub old_stock: u32,
    pub new_stock: u32,
    pub available: bool,
}

/// Outcome of one manifest line during payment completion.
#[derive(Clone, Debug, Serialize)]
pub struct LineOutcome {
    pub id: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub enum SessionApplication {
    /// The session id was already in the ledger; nothing was changed.
    AlreadyProcessed,
    Applied(Vec<LineOutcome>),
}

enum StockChange {
    Delta(i64),
    Set(u32),
}

fn adjust_stock(
    document: &mut InventoryDocument,
    id: &str,
    change: StockChange,
) -> Result<StockAdjustment> {
    let product = document
        .find_mut(id)
        .ok_or_else(|| StorefrontError::ProductNotFound(id.to_string()))?;

    let old_stock = product.stock.value();
    let new_stock = match change {
        StockChange::Set(value) => value,
        StockChange::Delta(delta) => {
            let next = i64::from(old_stock).checked_add(delta).ok_or_else(|| {
                StorefrontError::Validation("stock delta out of range".to_string())
            })?;
            if next < 0 {
                return Err(StorefrontError::InsufficientStock {
                    id: product.id.clone(),
                    title: product.title.clone(),
                    available: old_stock,
                    requested: delta.unsigned_abs(),
                });
            }
            u32::try_from(next)
                .map_err(|_| StorefrontError::Validation("stock delta out of range".to_string()))?
        }
    };

    product.stock = Quantity::new(new_stock);
    product.refresh_availability();
    Ok(StockAdjustment {
        id: product.id.clone(),
        title: product.title.clone(),
        old_stock,
        new_stock,
        available: product.available,
    })
}

#[derive(Clone)]
pub struct InventoryRepository {
    store: Arc<dyn DocumentStore>,
}

impl InventoryRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn load(&self) -> Result<InventoryDocument> {
        let raw = self.store.read().await?;
        serde_json::from_value(raw)
            .map_err(|e| StorefrontError::Internal(format!("inventory document is malformed: {e}")))
    }

    /// Write the whole document back, stamping `updatedAt`. Overwrites
    /// prior content unconditionally.
    pub async fn persist(&self, mut document: InventoryDocument) -> Result<InventoryDocument> {
        document.updated_at = Some(Utc::now());
        let raw = serde_json::to_value(&document)
            .map_err(|e| StorefrontError::Internal(e.to_string()))?;
        self.store.replace(&raw).await?;
        Ok(document)
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Product> {
        let document = self.load().await?;
        document
            .find(id)
            .cloned()
            .ok_or_else(|| StorefrontError::ProductNotFound(id.to_string()))
    }

    /// Signed stock adjustment. Rejected before persistence when the delta
    /// would drive stock negative.
    pub async fn apply_delta(&self, id: &str, delta: i64) -> Result<StockAdjustment> {
        let mut document = self.load().await?;
        let adjustment = adjust_stock(&mut document, id, StockChange::Delta(delta))?;
        self.persist(document).await?;
        tracing::info!(
            product = %adjustment.id,
            old = adjustment.old_stock,
            new = adjustment.new_stock,
            "stock adjusted"
        );
        Ok(adjustment)
    }

    /// Absolute stock set, for admin restocks.
    pub async fn set_stock(&self, id: &str, value: u32) -> Result<StockAdjustment> {
        let mut document = self.load().await?;
        let adjustment = adjust_stock(&mut document, id, StockChange::Set(value))?;
        self.persist(document).await?;
        tracing::info!(
            product = %adjustment.id,
            old = adjustment.old_stock,
            new = adjustment.new_stock,
            "stock set"
        );
        Ok(adjustment)
    }

    /// Append a new record, assigning a time-ordered id when none was
    /// supplied. Stock and price default to zero via the wire format.
    pub async fn create(&self, mut record: Product) -> Result<Product> {
        let mut document = self.load().await?;
        if record.id.is_empty() {
            record.id = uuid::Uuid::now_v7().to_string();
        } else if document.find(&record.id).is_some() {
            return Err(StorefrontError::Validation(format!(
                "product {} already exists",
                record.id
            )));
        }
        record.refresh_availability();
        document.products.push(record.clone());
        self.persist(document).await?;
        tracing::info!(product = %record.id, "product created");
        Ok(record)
    }

    /// Full replace of all mutable fields by id.
    pub async fn update(&self, record: Product) -> Result<Product> {
        let mut document = self.load().await?;
        let existing = document
            .find_mut(&record.id)
            .ok_or_else(|| StorefrontError::ProductNotFound(record.id.clone()))?;
        existing.title = record.title;
        existing.price = record.price;
        existing.stock = record.stock;
        existing.pre_order = record.pre_order;
        existing.category = record.category;
        existing.image = record.image;
        existing.refresh_availability();
        let updated = existing.clone();
        self.persist(document).await?;
        tracing::info!(product = %updated.id, "product updated");
        Ok(updated)
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        let mut document = self.load().await?;
        let before = document.products.len();
        document.products.retain(|p| p.id != id);
        if document.products.len() == before {
            return Err(StorefrontError::ProductNotFound(id.to_string()));
        }
        self.persist(document).await?;
        tracing::info!(product = %id, "product deleted");
        Ok(())
    }

    /// Apply a completed payment session's stock decrements exactly once.
    ///
    /// One load, one persist. Each line is applied independently: a line
    /// that would overdraw is recorded as failed and does not abort the
    /// others. The session id joins the processed ledger either way, so a
    /// redelivered notification is a no-op.
    pub async fn apply_completed_session(
        &self,
        session_id: &str,
        lines: &[ManifestItem],
    ) -> Result<SessionApplication> {
        let mut document = self.load().await?;
        if document.processed_sessions.iter().any(|s| s == session_id) {
            return Ok(SessionApplication::AlreadyProcessed);
        }

        let mut outcomes = Vec::with_capacity(lines.len());
        for line in lines {
            let change = StockChange::Delta(-i64::from(line.quantity));
            match adjust_stock(&mut document, &line.id, change) {
                Ok(_) => outcomes.push(LineOutcome {
                    id: line.id.clone(),
                    success: true,
                    error: None,
                }),
                Err(err) => outcomes.push(LineOutcome {
                    id: line.id.clone(),
                    success: false,
                    error: Some(err.to_string()),
                }),
            }
        }

        document.processed_sessions.push(session_id.to_string());
        if document.processed_sessions.len() > PROCESSED_SESSIONS_CAP {
            let excess = document.processed_sessions.len() - PROCESSED_SESSIONS_CAP;
            document.processed_sessions.drain(..excess);
        }
        self.persist(document).await?;
        Ok(SessionApplication::Applied(outcomes))
    }
}
