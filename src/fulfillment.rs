//! Payment completion handling: applies a confirmed session's stock
//! decrements.
//!
//! The provider retries a notification it considers failed, so this layer
//! acknowledges every well-formed event. Stock failures are logged and left
//! for manual correction rather than surfaced as webhook errors.

use crate::inventory::{InventoryRepository, SessionApplication};
use crate::payments::{self, WebhookEvent};

const CHECKOUT_COMPLETED: &str = "checkout.session.completed";
const PAYMENT_SUCCEEDED: &str = "payment_intent.succeeded";

pub struct FulfillmentService {
    repo: InventoryRepository,
}

impl FulfillmentService {
    pub fn new(repo: InventoryRepository) -> Self {
        Self { repo }
    }

    pub async fn handle_event(&self, event: WebhookEvent) {
        match event.kind.as_str() {
            CHECKOUT_COMPLETED => self.handle_completed(event).await,
            PAYMENT_SUCCEEDED => {
                tracing::info!(payment = %event.data.object.id, "payment succeeded");
            }
            other => tracing::info!(kind = other, "unhandled webhook event"),
        }
    }

    async fn handle_completed(&self, event: WebhookEvent) {
        let session = event.data.object;
        let manifest = payments::manifest_from_metadata(&session.metadata);
        if manifest.is_empty() {
            tracing::warn!(session = %session.id, "completed session carries no cart manifest");
            return;
        }

        tracing::info!(
            session = %session.id,
            items = manifest.len(),
            "applying completed session"
        );
        match self.repo.apply_completed_session(&session.id, &manifest).await {
            Ok(SessionApplication::AlreadyProcessed) => {
                tracing::info!(session = %session.id, "session already processed, skipping");
            }
            Ok(SessionApplication::Applied(outcomes)) => {
                let failed = outcomes.iter().filter(|o| !o.success).count();
                for outcome in outcomes.iter().filter(|o| !o.success) {
                    tracing::error!(
                        session = %session.id,
                        product = %outcome.id,
                        error = outcome.error.as_deref().unwrap_or("unknown"),
                        "stock decrement failed"
                    );
                }
                if failed > 0 {
                    tracing::error!(
                        session = %session.id,
                        failed,
                        "some stock decrements failed; inventory needs manual correction"
                    );
                }
            }
            Err(err) => {
                tracing::error!(session = %session.id, %err, "failed to apply completed session");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::InventoryRepository;
    use crate::store::memory::InMemoryStore;
    use serde_json::json;
    use std::sync::Arc;

    fn service(document: serde_json::Value) -> (FulfillmentService, InventoryRepository) {
        let store = Arc::new(InMemoryStore::new(document));
        let repo = InventoryRepository::new(store);
        (FulfillmentService::new(repo.clone()), repo)
    }

    fn completed_event(session_id: &str, manifest: &str) -> WebhookEvent {
        serde_json::from_value(json!({
            "type": "checkout.session.completed",
            "data": {"object": {"id": session_id, "metadata": {"cart_items": manifest}}}
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_completed_event_decrements_stock() {
        let (service, repo) = service(json!({
            "products": [{"id": "card-1", "title": "Fury Dragon", "price": 10.0, "stock": 5,
                          "available": true}]
        }));

        let event = completed_event("cs_1", r#"[{"id":"card-1","quantity":2}]"#);
        service.handle_event(event).await;
        assert_eq!(repo.find_by_id("card-1").await.unwrap().stock.value(), 3);
    }

    #[tokio::test]
    async fn test_duplicate_notification_is_a_no_op() {
        let (service, repo) = service(json!({
            "products": [{"id": "card-1", "title": "Fury Dragon", "price": 10.0, "stock": 5,
                          "available": true}]
        }));

        let event = completed_event("cs_1", r#"[{"id":"card-1","quantity":2}]"#);
        service.handle_event(event.clone()).await;
        service.handle_event(event).await;
        assert_eq!(repo.find_by_id("card-1").await.unwrap().stock.value(), 3);
    }

    #[tokio::test]
    async fn test_unhandled_event_changes_nothing() {
        let (service, repo) = service(json!({
            "products": [{"id": "card-1", "title": "Fury Dragon", "price": 10.0, "stock": 5,
                          "available": true}]
        }));

        let event: WebhookEvent = serde_json::from_value(json!({
            "type": "invoice.paid",
            "data": {"object": {"id": "in_1"}}
        }))
        .unwrap();
        service.handle_event(event).await;
        assert_eq!(repo.find_by_id("card-1").await.unwrap().stock.value(), 5);
    }
}
