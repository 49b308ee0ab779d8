//! Payment processor webhook.
//!
//! Signature failures get a 400 so the processor retries with a fresh
//! signature. Everything after verification is acknowledged, even when
//! settlement fails internally; the conditional status update makes the
//! eventual retry (or manual replay) safe.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use sprout_common::Error;
use sprout_payments::webhook::{self, SIGNATURE_HEADER};
use tracing::{error, warn};

use crate::handlers::ApiError;
use crate::AppState;

pub async fn payment_webhook_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or(Error::InvalidSignature)?;

    webhook::verify_signature(
        &state.config.webhook_secret,
        &body,
        signature,
        Utc::now().timestamp(),
    )?;

    match webhook::parse_event(&body) {
        Ok(event) => {
            if let Err(e) = state.settlement.handle_webhook_event(&event).await {
                error!("Webhook settlement failed: {}", e);
            }
        }
        Err(e) => {
            warn!("Unparseable webhook payload: {}", e);
        }
    }

    Ok(Json(serde_json::json!({ "received": true })))
}
