//! Class registration endpoints for parents.

use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

use crate::handlers::ApiError;
use crate::registration::RegisterForClass;
use crate::session::Actor;
use crate::AppState;

/// `POST /api/register-for-class`. Card payments come back with a hosted
/// checkout URL to redirect to; charter registrations are complete and
/// awaiting admin approval.
pub async fn register_for_class_handler(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Json(payload): Json<RegisterForClass>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = state.registrations.register(&actor, &payload).await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "registrationId": outcome.registration_id,
        "checkoutUrl": outcome.checkout_url,
    })))
}

/// The calling parent's registrations, newest first, with class and
/// student names joined in.
pub async fn list_registrations_handler(
    State(state): State<Arc<AppState>>,
    actor: Actor,
) -> Result<impl IntoResponse, ApiError> {
    let registrations = state
        .storage
        .list_registrations_for_parent(&actor.account_id)
        .await?;
    Ok(Json(registrations))
}
