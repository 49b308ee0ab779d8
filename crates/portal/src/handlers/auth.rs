//! Parent signup and login. Both return a signed bearer token.

use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use sprout_common::Error;
use tracing::info;
use validator::Validate;

use crate::handlers::{validate_payload, ApiError};
use crate::models::{new_id, Account, Role};
use crate::notify;
use crate::session;
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterPayload {
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    #[validate(length(min = 1, message = "Name is required"))]
    pub full_name: String,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Parent signup. Always creates a `parent` role account; staff accounts
/// are provisioned out of band.
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterPayload>,
) -> Result<impl IntoResponse, ApiError> {
    validate_payload(&payload)?;

    let account = Account {
        id: new_id(),
        email: payload.email.trim().to_lowercase(),
        password_hash: session::hash_password(&payload.password, &state.config.password_salt),
        full_name: Some(payload.full_name.clone()),
        phone: payload.phone,
        role: Role::Parent,
        created_at: Utc::now(),
    };
    state.storage.insert_account(&account).await?;
    info!("Account created: {}", account.id);

    notify::send_best_effort(
        state.email.as_ref(),
        notify::welcome_email(&account.email, &payload.full_name),
    )
    .await;

    let token = session::issue_token(
        &state.config.session_secret,
        &account.id,
        account.role,
        Utc::now(),
    );
    Ok(Json(serde_json::json!({
        "success": true,
        "token": token,
        "account": account,
    })))
}

#[derive(Debug, Deserialize)]
pub struct LoginPayload {
    pub email: String,
    pub password: String,
}

pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let account = state
        .storage
        .find_account_by_email(&payload.email.trim().to_lowercase())
        .await?;

    // One rejection for both unknown email and wrong password.
    let Some(account) = account else {
        return Err(Error::NotAuthenticated.into());
    };
    if !session::verify_password(
        &payload.password,
        &state.config.password_salt,
        &account.password_hash,
    ) {
        return Err(Error::NotAuthenticated.into());
    }

    let token = session::issue_token(
        &state.config.session_secret,
        &account.id,
        account.role,
        Utc::now(),
    );
    Ok(Json(serde_json::json!({
        "success": true,
        "token": token,
        "account": account,
    })))
}
