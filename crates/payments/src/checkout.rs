//! Hosted checkout session client.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sprout_common::{Error, Result};
use tracing::{debug, info};

/// A single purchasable line item on the hosted checkout page.
#[derive(Debug, Clone, Serialize)]
pub struct LineItem {
    pub name: String,
    pub description: String,
    /// Amount in minor currency units (cents).
    pub unit_amount_cents: i64,
    pub currency: String,
}

/// Request to create a hosted checkout session.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutRequest {
    pub line_item: LineItem,
    pub success_url: String,
    pub cancel_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,
    /// Opaque metadata echoed back on the completion webhook. Carries the
    /// registration id so settlement can correlate the notification.
    pub metadata: HashMap<String, String>,
}

/// A created checkout session: the id is stored on the registration row,
/// the URL is where the parent gets redirected.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    pub url: String,
}

/// Creates hosted checkout sessions with the payment processor.
#[async_trait]
pub trait CheckoutProvider: Send + Sync {
    async fn create_session(&self, request: &CheckoutRequest) -> Result<CheckoutSession>;
}

/// HTTP client for the processor's checkout-session API.
pub struct HttpCheckoutClient {
    http: reqwest::Client,
    base_url: String,
    secret_key: String,
}

impl HttpCheckoutClient {
    pub fn new(base_url: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            secret_key: secret_key.into(),
        }
    }
}

#[async_trait]
impl CheckoutProvider for HttpCheckoutClient {
    async fn create_session(&self, request: &CheckoutRequest) -> Result<CheckoutSession> {
        let url = format!("{}/v1/checkout/sessions", self.base_url);
        debug!("Creating checkout session for {}", request.line_item.name);

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.secret_key)
            .json(request)
            .send()
            .await
            .map_err(|e| Error::Payment(format!("checkout session request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Payment(format!(
                "checkout session rejected: {status} {body}"
            )));
        }

        let session: CheckoutSession = response
            .json()
            .await
            .map_err(|e| Error::Payment(format!("malformed checkout session response: {e}")))?;

        info!("Created checkout session: {}", session.id);
        Ok(session)
    }
}
