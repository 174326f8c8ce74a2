//! Cardfront - storefront service for trading-card products.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use cardfront::checkout::CheckoutService;
use cardfront::config::AppConfig;
use cardfront::fulfillment::FulfillmentService;
use cardfront::http::{self, AppState};
use cardfront::inventory::InventoryRepository;
use cardfront::payments::stripe::StripeGateway;
use cardfront::store::jsonbin::JsonBinStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()?;

    let store = Arc::new(JsonBinStore::new(
        client.clone(),
        config.bin_url.clone(),
        config.bin_access_key.clone(),
    ));
    let gateway = Arc::new(StripeGateway::new(client, config.stripe_secret_key.clone()));
    let inventory = InventoryRepository::new(store);
    let state = AppState {
        checkout: Arc::new(CheckoutService::new(inventory.clone(), gateway, &config)),
        fulfillment: Arc::new(FulfillmentService::new(inventory.clone())),
        inventory,
    };

    let app = http::router(state);
    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("🚀 Cardfront storefront listening on {}", addr);
    axum::serve(tokio::net::TcpListener::bind(&addr).await?, app).await?;
    Ok(())
}
