//! Checkout session builder: validates a submitted basket against the
//! inventory and opens a hosted payment session.
//!
//! One validation policy applies everywhere: server price always wins, an
//! unresolved id fails the whole basket, and `preOrder` alone gates the
//! zero-stock purchase path. Stock is never touched here; decrements happen
//! when the provider confirms payment.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::domain::cart::{self, CartLine, ManifestItem};
use crate::domain::value_objects::Money;
use crate::error::{Result, StorefrontError};
use crate::inventory::{InventoryDocument, InventoryRepository};
use crate::payments::{
    self, CheckoutSession, PaymentGateway, SessionLineItem, SessionRequest, ShippingRate,
};

/// A cart line priced from the repository record. Client-submitted prices
/// never reach this type.
#[derive(Clone, Debug)]
pub struct PricedLine {
    pub product_id: String,
    pub name: String,
    pub image: Option<String>,
    pub unit_price: Money,
    pub quantity: u32,
}

impl PricedLine {
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }
}

#[derive(Clone, Debug)]
pub struct Quote {
    pub lines: Vec<PricedLine>,
    pub total: Money,
}

/// Validate and price a basket against a loaded inventory document.
/// Duplicate ids are merged before validation so a split line cannot dodge
/// the stock ceiling.
pub fn price_cart(
    document: &InventoryDocument,
    lines: &[CartLine],
    currency: &str,
) -> Result<Quote> {
    let merged = cart::normalize(lines);
    if merged.is_empty() {
        return Err(StorefrontError::Validation("cart is empty".to_string()));
    }

    let mut priced = Vec::with_capacity(merged.len());
    for line in &merged {
        let record = document
            .find(&line.id)
            .ok_or_else(|| StorefrontError::ProductNotFound(line.id.clone()))?;

        if !record.can_fulfil(line.quantity) {
            return Err(StorefrontError::InsufficientStock {
                id: record.id.clone(),
                title: record.title.clone(),
                available: record.stock.value(),
                requested: u64::from(line.quantity),
            });
        }

        if let Some(client_price) = line.price {
            if client_price != record.price {
                tracing::warn!(
                    product = %record.id,
                    %client_price,
                    server_price = %record.price,
                    "client-submitted price ignored"
                );
            }
        }

        priced.push(PricedLine {
            product_id: record.id.clone(),
            name: record.title.clone(),
            image: record.image.clone(),
            unit_price: Money::new(record.price, currency),
            quantity: line.quantity,
        });
    }

    let total = priced
        .iter()
        .try_fold(Money::zero(currency), |acc, line| acc.add(&line.line_total()))
        .map_err(|e| StorefrontError::Internal(e.to_string()))?;
    Ok(Quote { lines: priced, total })
}

pub struct CheckoutService {
    repo: InventoryRepository,
    gateway: Arc<dyn PaymentGateway>,
    currency: String,
    success_url: String,
    cancel_url: String,
    shipping: Option<ShippingRate>,
}

impl CheckoutService {
    pub fn new(
        repo: InventoryRepository,
        gateway: Arc<dyn PaymentGateway>,
        config: &AppConfig,
    ) -> Self {
        let shipping = (config.shipping_pence > 0).then(|| ShippingRate {
            display_name: "UK Mainland Shipping".to_string(),
            amount_minor: config.shipping_pence,
        });
        Self {
            repo,
            gateway,
            currency: config.currency.clone(),
            success_url: config.success_url(),
            cancel_url: config.cancel_url(),
            shipping,
        }
    }

    /// Validate the basket, price it from the repository, and open a hosted
    /// checkout session carrying the full cart manifest as metadata.
    pub async fn create_session(&self, lines: &[CartLine]) -> Result<CheckoutSession> {
        let document = self.repo.load().await?;
        let quote = price_cart(&document, lines, &self.currency)?;

        let manifest: Vec<ManifestItem> = quote
            .lines
            .iter()
            .map(|line| ManifestItem {
                id: line.product_id.clone(),
                quantity: line.quantity,
            })
            .collect();
        let metadata = payments::manifest_metadata(&manifest).map_err(|e| {
            StorefrontError::Internal(format!("failed to serialize cart manifest: {e}"))
        })?;

        let mut line_items = Vec::with_capacity(quote.lines.len());
        for line in &quote.lines {
            let unit_amount = line.unit_price.minor_units().ok_or_else(|| {
                StorefrontError::Validation(format!("price out of range for {}", line.product_id))
            })?;
            line_items.push(SessionLineItem {
                product_id: line.product_id.clone(),
                name: line.name.clone(),
                image: line.image.clone(),
                unit_amount,
                quantity: line.quantity,
            });
        }

        tracing::info!(
            items = line_items.len(),
            total = %quote.total.amount(),
            "creating checkout session"
        );
        self.gateway
            .create_session(SessionRequest {
                line_items,
                currency: self.currency.clone(),
                success_url: self.success_url.clone(),
                cancel_url: self.cancel_url.clone(),
                shipping: self.shipping.clone(),
                metadata,
            })
            .await
            .map_err(Into::into)
    }
}
