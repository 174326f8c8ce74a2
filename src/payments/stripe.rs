//! Hosted checkout adapter for the payment provider.
//!
//! Sessions are created against the provider's form-encoded REST endpoint
//! with a bearer secret key; the hosted page handles card entry, GB-only
//! shipping addresses, and the configured flat shipping rate.

use super::{CheckoutSession, PaymentError, PaymentGateway, SessionRequest};

const CHECKOUT_SESSIONS_URL: &str = "https://api.stripe.com/v1/checkout/sessions";

pub struct StripeGateway {
    client: reqwest::Client,
    secret_key: Option<String>,
    endpoint: String,
}

impl StripeGateway {
    pub fn new(client: reqwest::Client, secret_key: Option<String>) -> Self {
        Self {
            client,
            secret_key,
            endpoint: CHECKOUT_SESSIONS_URL.to_string(),
        }
    }
}

/// Flatten a session request into the provider's bracketed form encoding.
fn encode_form(request: &SessionRequest) -> Vec<(String, String)> {
    let mut form = vec![
        ("mode".to_string(), "payment".to_string()),
        ("payment_method_types[0]".to_string(), "card".to_string()),
        ("success_url".to_string(), request.success_url.clone()),
        ("cancel_url".to_string(), request.cancel_url.clone()),
        (
            "billing_address_collection".to_string(),
            "required".to_string(),
        ),
        (
            "shipping_address_collection[allowed_countries][0]".to_string(),
            "GB".to_string(),
        ),
    ];

    for (i, item) in request.line_items.iter().enumerate() {
        form.push((format!("line_items[{i}][quantity]"), item.quantity.to_string()));
        form.push((
            format!("line_items[{i}][price_data][currency]"),
            request.currency.clone(),
        ));
        form.push((
            format!("line_items[{i}][price_data][unit_amount]"),
            item.unit_amount.to_string(),
        ));
        form.push((
            format!("line_items[{i}][price_data][product_data][name]"),
            item.name.clone(),
        ));
        form.push((
            format!("line_items[{i}][price_data][product_data][metadata][productId]"),
            item.product_id.clone(),
        ));
        if let Some(image) = &item.image {
            form.push((
                format!("line_items[{i}][price_data][product_data][images][0]"),
                image.clone(),
            ));
        }
    }

    if let Some(shipping) = &request.shipping {
        form.push((
            "shipping_options[0][shipping_rate_data][type]".to_string(),
            "fixed_amount".to_string(),
        ));
        form.push((
            "shipping_options[0][shipping_rate_data][display_name]".to_string(),
            shipping.display_name.clone(),
        ));
        form.push((
            "shipping_options[0][shipping_rate_data][fixed_amount][amount]".to_string(),
            shipping.amount_minor.to_string(),
        ));
        form.push((
            "shipping_options[0][shipping_rate_data][fixed_amount][currency]".to_string(),
            request.currency.clone(),
        ));
    }

    for (key, value) in &request.metadata {
        form.push((format!("metadata[{key}]"), value.clone()));
    }
    form
}

#[async_trait::async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_session(
        &self,
        request: SessionRequest,
    ) -> Result<CheckoutSession, PaymentError> {
        let secret = self
            .secret_key
            .as_deref()
            .ok_or(PaymentError::MissingCredentials)?;

        let form = encode_form(&request);
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(secret)
            .form(&form)
            .send()
            .await
            .map_err(|e| PaymentError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), %detail, "checkout session creation failed");
            return Err(PaymentError::Status {
                status: status.as_u16(),
                detail,
            });
        }

        let session: CheckoutSession = response
            .json()
            .await
            .map_err(|e| PaymentError::Decode(e.to_string()))?;
        tracing::info!(session = %session.id, "checkout session created");
        Ok(session)
    }
}
