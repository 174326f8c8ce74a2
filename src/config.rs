//! Environment-derived configuration.
//!
//! All external collaborators (document store, payment provider) and the
//! public site URL are supplied through the environment; `.env` files are
//! honored by the binary before this runs.

use crate::error::{Result, StorefrontError};

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Full URL of the hosted inventory document ("bin").
    pub bin_url: String,
    /// Static access key for the document store, sent as `X-Access-Key`.
    pub bin_access_key: Option<String>,
    /// Payment provider secret. Absence is tolerated at startup and
    /// rejected at checkout time.
    pub stripe_secret_key: Option<String>,
    /// Public base URL used to build success/cancel redirects.
    pub site_url: String,
    pub currency: String,
    /// Flat shipping rate in minor units; 0 disables the shipping option.
    pub shipping_pence: i64,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let bin_url = std::env::var("JSONBIN_BIN_URL")
            .map_err(|_| StorefrontError::Configuration("JSONBIN_BIN_URL is not set".to_string()))?;

        let bin_access_key = std::env::var("JSONBIN_API_KEY").ok();
        if bin_access_key.is_none() {
            tracing::warn!("JSONBIN_API_KEY not set; document store requests will be unauthenticated");
        }

        let stripe_secret_key = std::env::var("STRIPE_SECRET_KEY").ok();
        if stripe_secret_key.is_none() {
            tracing::warn!("STRIPE_SECRET_KEY not set; checkout session creation will fail");
        }

        let site_url =
            std::env::var("SITE_URL").unwrap_or_else(|_| "http://localhost:8888".to_string());
        let currency = std::env::var("CURRENCY").unwrap_or_else(|_| "gbp".to_string());

        let shipping_pence = match std::env::var("SHIPPING_PENCE") {
            Ok(raw) => raw.parse().map_err(|_| {
                StorefrontError::Configuration("SHIPPING_PENCE must be an integer".to_string())
            })?,
            Err(_) => 350,
        };
        let port = match std::env::var("PORT") {
            Ok(raw) => raw.parse().map_err(|_| {
                StorefrontError::Configuration("PORT must be a number".to_string())
            })?,
            Err(_) => 8888,
        };

        Ok(Self {
            bin_url,
            bin_access_key,
            stripe_secret_key,
            site_url,
            currency,
            shipping_pence,
            port,
        })
    }

    /// Redirect target after a completed payment. The provider substitutes
    /// the session id placeholder itself.
    pub fn success_url(&self) -> String {
        format!(
            "{}/success.html?session_id={{CHECKOUT_SESSION_ID}}",
            self.site_url.trim_end_matches('/')
        )
    }

    pub fn cancel_url(&self) -> String {
        format!("{}/?cancelled=true", self.site_url.trim_end_matches('/'))
    }
}
