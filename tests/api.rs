//! End-to-end tests for the storefront HTTP surface, driven through the
//! axum router with an in-memory document store and a recording payment
//! gateway.

use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use cardfront::checkout::CheckoutService;
use cardfront::config::AppConfig;
use cardfront::fulfillment::FulfillmentService;
use cardfront::http::{router, AppState};
use cardfront::inventory::InventoryRepository;
use cardfront::payments::{
    manifest_from_metadata, CheckoutSession, PaymentError, PaymentGateway, SessionRequest,
};
use cardfront::store::memory::InMemoryStore;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

/// Records every session request and hands back a fixed redirect URL.
#[derive(Default)]
struct RecordingGateway {
    calls: Mutex<Vec<SessionRequest>>,
}

impl RecordingGateway {
    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn last_call(&self) -> SessionRequest {
        self.calls.lock().unwrap().last().cloned().unwrap()
    }
}

#[async_trait::async_trait]
impl PaymentGateway for RecordingGateway {
    async fn create_session(
        &self,
        request: SessionRequest,
    ) -> Result<CheckoutSession, PaymentError> {
        self.calls.lock().unwrap().push(request);
        Ok(CheckoutSession {
            id: "cs_test_1".to_string(),
            url: "https://checkout.example/pay/cs_test_1".to_string(),
        })
    }
}

fn seed() -> Value {
    json!({
        "products": [
            {"id": "card-1", "title": "Fury Dragon", "price": 10.0, "stock": 5,
             "available": true, "preOrder": false, "category": "singles",
             "image": "https://img.example/card-1.png"},
            {"id": "pre-1", "title": "Chaos Legend", "price": 25.0, "stock": 0,
             "available": true, "preOrder": true, "category": "singles"},
        ]
    })
}

fn test_state(document: Value) -> (AppState, Arc<InMemoryStore>, Arc<RecordingGateway>) {
    let store = Arc::new(InMemoryStore::new(document));
    let gateway = Arc::new(RecordingGateway::default());
    let inventory = InventoryRepository::new(store.clone());
    let config = AppConfig {
        bin_url: "http://unused.example".to_string(),
        bin_access_key: None,
        stripe_secret_key: Some("sk_test_unused".to_string()),
        site_url: "http://localhost:8888".to_string(),
        currency: "gbp".to_string(),
        shipping_pence: 350,
        port: 0,
    };
    let state = AppState {
        checkout: Arc::new(CheckoutService::new(
            inventory.clone(),
            gateway.clone(),
            &config,
        )),
        fulfillment: Arc::new(FulfillmentService::new(inventory.clone())),
        inventory,
    };
    (state, store, gateway)
}

async fn send(state: AppState, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let app = router(state);
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn stock_of(body: &Value, id: &str) -> u64 {
    body["products"]
        .as_array()
        .unwrap()
        .iter()
        .find(|p| p["id"] == id)
        .unwrap()["stock"]
        .as_u64()
        .unwrap()
}

#[tokio::test]
async fn checkout_succeeds_with_server_prices() {
    let (state, _, gateway) = test_state(seed());
    let cart = json!({"cart": [{"id": "card-1", "quantity": 5, "price": 0.01}]});

    let (status, body) = send(state, "POST", "/create-checkout-session", Some(cart)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["url"], "https://checkout.example/pay/cs_test_1");

    assert_eq!(gateway.call_count(), 1);
    let request = gateway.last_call();
    // 5 × £10.00, priced from the repository; the client's 0.01 is ignored.
    assert_eq!(request.line_items[0].unit_amount, 1000);
    assert_eq!(request.line_items[0].quantity, 5);
    assert_eq!(request.line_items[0].name, "Fury Dragon");

    let manifest = manifest_from_metadata(&request.metadata.into_iter().collect());
    assert_eq!(manifest.len(), 1);
    assert_eq!(manifest[0].id, "card-1");
    assert_eq!(manifest[0].quantity, 5);
}

#[tokio::test]
async fn checkout_does_not_touch_stock() {
    let (state, store, _) = test_state(seed());
    let before = store.snapshot();
    let cart = json!({"cart": [{"id": "card-1", "quantity": 2}]});

    let (status, _) = send(state, "POST", "/create-checkout-session", Some(cart)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(store.snapshot(), before);
}

#[tokio::test]
async fn empty_cart_is_rejected_before_the_provider() {
    let (state, _, gateway) = test_state(seed());
    let (status, body) = send(
        state,
        "POST",
        "/create-checkout-session",
        Some(json!({"cart": []})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 400);
    assert_eq!(gateway.call_count(), 0);
}

#[tokio::test]
async fn unknown_product_is_rejected_before_the_provider() {
    let (state, _, gateway) = test_state(seed());
    let cart = json!({"cart": [{"id": "ghost", "quantity": 1}]});

    let (status, body) = send(state, "POST", "/create-checkout-session", Some(cart)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("ghost"));
    assert_eq!(gateway.call_count(), 0);
}

#[tokio::test]
async fn overdrawn_cart_is_a_conflict() {
    let (state, _, gateway) = test_state(seed());
    let cart = json!({"cart": [{"id": "card-1", "quantity": 6}]});

    let (status, body) = send(state, "POST", "/create-checkout-session", Some(cart)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["metadata"]["currentStock"], 5);
    assert_eq!(body["metadata"]["requested"], 6);
    assert_eq!(gateway.call_count(), 0);
}

#[tokio::test]
async fn pre_order_checkout_sells_past_zero_stock() {
    let (state, _, gateway) = test_state(seed());
    let cart = json!({"cart": [{"id": "pre-1", "quantity": 3}]});

    let (status, _) = send(state, "POST", "/create-checkout-session", Some(cart)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(gateway.call_count(), 1);
}

#[tokio::test]
async fn webhook_decrements_stock_once() {
    let (state, _, _) = test_state(seed());
    let event = json!({
        "type": "checkout.session.completed",
        "data": {"object": {"id": "cs_live_1",
                 "metadata": {"cart_items": "[{\"id\":\"card-1\",\"quantity\":2}]"}}}
    });

    let (status, body) = send(state.clone(), "POST", "/stripe-webhook", Some(event.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["received"], true);

    let (_, inventory) = send(state.clone(), "GET", "/inventory", None).await;
    assert_eq!(stock_of(&inventory, "card-1"), 3);

    // Redelivery of the same session id is a no-op.
    send(state.clone(), "POST", "/stripe-webhook", Some(event)).await;
    let (_, inventory) = send(state, "GET", "/inventory", None).await;
    assert_eq!(stock_of(&inventory, "card-1"), 3);
}

#[tokio::test]
async fn webhook_acks_unhandled_events() {
    let (state, store, _) = test_state(seed());
    let before = store.snapshot();
    let event = json!({"type": "invoice.paid", "data": {"object": {"id": "in_1"}}});

    let (status, body) = send(state, "POST", "/stripe-webhook", Some(event)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["received"], true);
    assert_eq!(store.snapshot(), before);
}

#[tokio::test]
async fn inventory_adjust_and_set_round_trip() {
    let (state, _, _) = test_state(seed());

    let adjust = json!({"action": "adjust", "productId": "card-1", "delta": -2});
    let (status, body) = send(state.clone(), "POST", "/inventory", Some(adjust)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["product"]["oldStock"], 5);
    assert_eq!(body["product"]["newStock"], 3);

    let overdraw = json!({"action": "adjust", "productId": "card-1", "delta": -4});
    let (status, _) = send(state.clone(), "POST", "/inventory", Some(overdraw)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let set = json!({"action": "set", "productId": "card-1", "stock": 10});
    let (status, body) = send(state.clone(), "POST", "/inventory", Some(set)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["product"]["newStock"], 10);

    let (_, inventory) = send(state, "GET", "/inventory", None).await;
    assert_eq!(stock_of(&inventory, "card-1"), 10);
}

#[tokio::test]
async fn inventory_product_lifecycle() {
    let (state, _, _) = test_state(json!({"products": []}));

    let create = json!({"action": "create",
                        "product": {"title": "Playmat", "price": 12.5, "stock": 4,
                                    "category": "accessories"}});
    let (status, created) = send(state.clone(), "POST", "/inventory", Some(create)).await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["id"].as_str().unwrap().to_string();
    assert_eq!(created["available"], true);

    let update = json!({"action": "update",
                        "product": {"id": id.clone(), "title": "Playmat XL", "price": 15.0,
                                    "stock": 0, "preOrder": false,
                                    "category": "accessories"}});
    let (status, updated) = send(state.clone(), "POST", "/inventory", Some(update)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["title"], "Playmat XL");
    assert_eq!(updated["available"], false);

    let delete = json!({"action": "delete", "productId": id.clone()});
    let (status, _) = send(state.clone(), "POST", "/inventory", Some(delete)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let delete_again = json!({"action": "delete", "productId": id});
    let (status, _) = send(state, "POST", "/inventory", Some(delete_again)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn health_reports_service_name() {
    let (state, _, _) = test_state(seed());
    let (status, body) = send(state, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["service"], "cardfront");
}
