//! HTTP handlers.
//!
//! Every handler returns `Result<_, ApiError>`; domain errors map onto
//! status codes in one place so the storage and service layers never see
//! HTTP types.

pub mod admin;
pub mod auth;
pub mod public;
pub mod registrations;
pub mod students;
pub mod webhook;

use std::sync::Arc;

use axum::extract::{FromRequestParts, OptionalFromRequestParts};
use axum::http::{header, request::Parts, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use sprout_common::{Error, FieldError};
use tracing::error;
use validator::ValidationErrors;

use crate::session::{self, Actor};
use crate::AppState;

/// API Error type
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub fields: Vec<FieldError>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            fields: Vec::new(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = serde_json::json!({
            "success": false,
            "error": self.message,
        });
        if !self.fields.is_empty() {
            body["fields"] = serde_json::json!(self.fields);
        }

        (self.status, Json(body)).into_response()
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let status = match &err {
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::ClassFull | Error::AlreadyRegistered | Error::InvalidTransition { .. } => {
                StatusCode::CONFLICT
            }
            Error::NotAuthenticated => StatusCode::UNAUTHORIZED,
            Error::NotAuthorized => StatusCode::FORBIDDEN,
            Error::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Error::InvalidSignature => StatusCode::BAD_REQUEST,
            Error::Payment(_) => StatusCode::BAD_GATEWAY,
            Error::Email(_)
            | Error::Database(_)
            | Error::JsonSerialization(_)
            | Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        match err {
            Error::Validation(fields) => ApiError {
                status,
                message: "Invalid input".to_string(),
                fields,
            },
            // Internal detail stays in the logs, not the response.
            Error::Database(_) | Error::JsonSerialization(_) | Error::Other(_) => {
                error!("Internal error: {}", err);
                ApiError::new(status, "Internal server error")
            }
            Error::Payment(detail) => {
                error!("Payment processor error: {}", detail);
                ApiError::new(status, "Payment processing failed")
            }
            other => ApiError::new(status, other.to_string()),
        }
    }
}

/// Flatten `validator` derive output into our field-error list.
pub fn validation_errors(result: Result<(), ValidationErrors>) -> Vec<FieldError> {
    let Err(errors) = result else {
        return Vec::new();
    };
    let mut fields = Vec::new();
    for (field, errs) in errors.field_errors() {
        for err in errs {
            let message = err
                .message
                .as_deref()
                .map(str::to_string)
                .unwrap_or_else(|| format!("{field} is invalid"));
            fields.push(FieldError::new(field.to_string(), message));
        }
    }
    fields
}

/// Reject a payload with 422 unless it passes schema validation.
pub fn validate_payload<T: validator::Validate>(payload: &T) -> Result<(), ApiError> {
    let fields = validation_errors(payload.validate());
    if fields.is_empty() {
        Ok(())
    } else {
        Err(Error::Validation(fields).into())
    }
}

/// Bearer-token authentication for every protected route.
impl FromRequestParts<Arc<AppState>> for Actor {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or(Error::NotAuthenticated)?;

        session::verify_token(&state.config.session_secret, token, Utc::now())
            .ok_or_else(|| Error::NotAuthenticated.into())
    }
}

/// A missing or bad token is simply an anonymous caller on routes that
/// allow one.
impl OptionalFromRequestParts<Arc<AppState>> for Actor {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(
            <Actor as FromRequestParts<Arc<AppState>>>::from_request_parts(parts, state)
                .await
                .ok(),
        )
    }
}

/// Admins only.
pub fn require_admin(actor: &Actor) -> Result<(), ApiError> {
    if actor.is_admin() {
        Ok(())
    } else {
        Err(Error::NotAuthorized.into())
    }
}

/// Admins and instructors.
pub fn require_staff(actor: &Actor) -> Result<(), ApiError> {
    if actor.is_staff() {
        Ok(())
    } else {
        Err(Error::NotAuthorized.into())
    }
}
