//! HTTP surface: shared state, router, and the storefront's routes.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use validator::Validate;

use crate::checkout::CheckoutService;
use crate::domain::cart::CartLine;
use crate::domain::product::Product;
use crate::error::{Result, StorefrontError};
use crate::fulfillment::FulfillmentService;
use crate::inventory::InventoryRepository;
use crate::payments::WebhookEvent;

#[derive(Clone)]
pub struct AppState {
    pub inventory: InventoryRepository,
    pub checkout: Arc<CheckoutService>,
    pub fulfillment: Arc<FulfillmentService>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/inventory", get(get_inventory).post(mutate_inventory))
        .route("/create-checkout-session", post(create_checkout_session))
        .route("/stripe-webhook", post(stripe_webhook))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({"status": "healthy", "service": "cardfront"}))
}

#[derive(Debug, Serialize)]
struct ProductList {
    products: Vec<Product>,
}

async fn get_inventory(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let document = state.inventory.load().await?;
    Ok((
        [(header::CACHE_CONTROL, "no-cache, no-store, must-revalidate")],
        Json(ProductList {
            products: document.products,
        }),
    ))
}

/// Admin mutations arrive as `{action, ...}` on the inventory endpoint.
#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
enum InventoryCommand {
    Adjust {
        #[serde(rename = "productId")]
        product_id: String,
        delta: i64,
    },
    Set {
        #[serde(rename = "productId")]
        product_id: String,
        stock: u32,
    },
    Create {
        product: Product,
    },
    Update {
        product: Product,
    },
    Delete {
        #[serde(rename = "productId")]
        product_id: String,
    },
}

async fn mutate_inventory(
    State(state): State<AppState>,
    Json(command): Json<InventoryCommand>,
) -> Result<Response> {
    let response = match command {
        InventoryCommand::Adjust { product_id, delta } => {
            let adjustment = state.inventory.apply_delta(&product_id, delta).await?;
            Json(serde_json::json!({"success": true, "product": adjustment})).into_response()
        }
        InventoryCommand::Set { product_id, stock } => {
            let adjustment = state.inventory.set_stock(&product_id, stock).await?;
            Json(serde_json::json!({"success": true, "product": adjustment})).into_response()
        }
        InventoryCommand::Create { product } => {
            let created = state.inventory.create(product).await?;
            (StatusCode::CREATED, Json(created)).into_response()
        }
        InventoryCommand::Update { product } => {
            Json(state.inventory.update(product).await?).into_response()
        }
        InventoryCommand::Delete { product_id } => {
            state.inventory.delete(&product_id).await?;
            StatusCode::NO_CONTENT.into_response()
        }
    };
    Ok(response)
}

#[derive(Debug, Deserialize, Validate)]
struct CheckoutRequest {
    #[validate(length(min = 1, message = "cart is empty"))]
    cart: Vec<CartLine>,
}

#[derive(Debug, Serialize)]
struct CheckoutResponse {
    url: String,
}

async fn create_checkout_session(
    State(state): State<AppState>,
    Json(request): Json<CheckoutRequest>,
) -> Result<Json<CheckoutResponse>> {
    request
        .validate()
        .map_err(|e| StorefrontError::Validation(e.to_string()))?;
    for line in &request.cart {
        line.validate()
            .map_err(|e| StorefrontError::Validation(e.to_string()))?;
    }

    let session = state.checkout.create_session(&request.cart).await?;
    Ok(Json(CheckoutResponse { url: session.url }))
}

async fn stripe_webhook(
    State(state): State<AppState>,
    Json(event): Json<WebhookEvent>,
) -> Result<Json<serde_json::Value>> {
    tracing::info!(kind = %event.kind, "webhook event received");
    state.fulfillment.handle_event(event).await;
    Ok(Json(serde_json::json!({"received": true})))
}
