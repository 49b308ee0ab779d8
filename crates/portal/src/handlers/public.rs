//! Unauthenticated routes: the catalog, site content, and the two
//! public intake forms.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::response::{Html, IntoResponse};
use axum::Json;
use serde::Deserialize;
use sprout_common::Error;
use sqlx::types::Json as SqlJson;
use tracing::info;
use validator::Validate;

use crate::handlers::{validate_payload, ApiError};
use crate::models::{new_id, ContactSubmission, VolunteerApplication, VolunteerStatus};
use crate::session::Actor;
use crate::sponsorship::SponsorCheckout;
use crate::storage::{CatalogFilter, CatalogKind};
use crate::AppState;

/// Health check endpoint
pub async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "sprout-portal"
    }))
}

#[derive(Debug, Deserialize)]
pub struct ClassesQuery {
    pub kind: Option<String>,
    pub grade: Option<String>,
}

/// Published upcoming classes. An unrecognized `kind` is ignored rather
/// than rejected.
pub async fn list_classes_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ClassesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = CatalogFilter {
        kind: query.kind.as_deref().and_then(CatalogKind::parse),
        grade: query.grade.filter(|g| !g.is_empty()),
    };
    let classes = state.storage.list_published_classes(&filter).await?;
    Ok(Json(classes))
}

/// Class detail. Unpublished classes are visible to staff only; everyone
/// else gets the same 404 as a nonexistent id.
pub async fn get_class_handler(
    State(state): State<Arc<AppState>>,
    actor: Option<Actor>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let class = state.storage.get_class(&id).await?;
    let is_staff = actor.as_ref().is_some_and(Actor::is_staff);
    if !class.is_published && !is_staff {
        return Err(Error::NotFound("Class").into());
    }
    Ok(Json(class))
}

pub async fn list_events_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let events = state.storage.list_published_events().await?;
    Ok(Json(events))
}

pub async fn list_blog_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let posts = state.storage.list_published_posts().await?;
    Ok(Json(posts))
}

pub async fn get_blog_post_handler(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let post = state.storage.get_published_post_by_slug(&slug).await?;
    Ok(Json(post))
}

pub async fn list_gallery_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let items = state.storage.list_published_gallery().await?;
    Ok(Json(items))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ContactPayload {
    #[validate(length(min = 1, message = "First name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, message = "Last name is required"))]
    pub last_name: String,
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[validate(length(min = 1, message = "Message is required"))]
    pub message: String,
}

pub async fn contact_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ContactPayload>,
) -> Result<impl IntoResponse, ApiError> {
    validate_payload(&payload)?;

    let submission = ContactSubmission {
        id: new_id(),
        first_name: payload.first_name,
        last_name: payload.last_name,
        email: payload.email,
        phone: payload.phone,
        subject: payload.subject,
        message: payload.message,
        is_read: false,
        created_at: chrono::Utc::now(),
    };
    state.storage.insert_contact_submission(&submission).await?;
    info!("Contact submission received: {}", submission.id);

    Ok(Json(serde_json::json!({ "success": true })))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct VolunteerPayload {
    #[validate(length(min = 1, message = "First name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, message = "Last name is required"))]
    pub last_name: String,
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub availability: Vec<String>,
    #[serde(default)]
    pub experience: Option<String>,
    #[serde(default)]
    pub motivation: Option<String>,
}

pub async fn volunteer_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<VolunteerPayload>,
) -> Result<impl IntoResponse, ApiError> {
    validate_payload(&payload)?;

    let application = VolunteerApplication {
        id: new_id(),
        first_name: payload.first_name,
        last_name: payload.last_name,
        email: payload.email,
        phone: payload.phone,
        availability: SqlJson(payload.availability),
        experience: payload.experience,
        motivation: payload.motivation,
        status: VolunteerStatus::Pending,
        created_at: chrono::Utc::now(),
    };
    state
        .storage
        .insert_volunteer_application(&application)
        .await?;
    info!("Volunteer application received: {}", application.id);

    Ok(Json(serde_json::json!({ "success": true })))
}

/// Start a sponsorship checkout. Open to anonymous callers; the
/// sponsorship row is recorded when the payment settles.
pub async fn sponsor_checkout_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SponsorCheckout>,
) -> Result<impl IntoResponse, ApiError> {
    validate_payload(&payload)?;

    let session = state.sponsorships.start_checkout(&payload).await?;
    Ok(Json(serde_json::json!({
        "sessionId": session.id,
        "url": session.url,
    })))
}

#[derive(Debug, Deserialize)]
pub struct CheckoutCancelQuery {
    pub registration_id: Option<String>,
}

/// Landing page for a checkout the parent backed out of. The pending row
/// is deleted and its seat released; a settled registration is untouched.
pub async fn checkout_cancel_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CheckoutCancelQuery>,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(registration_id) = query.registration_id.filter(|id| !id.is_empty()) {
        let cancelled = state.settlement.cancel_checkout(&registration_id).await?;
        if cancelled {
            info!("Registration {} cancelled at checkout", registration_id);
        }
    }

    Ok(Html(
        "<!DOCTYPE html><html><head><title>Checkout Cancelled</title></head>\
         <body><h1>Checkout cancelled</h1>\
         <p>Your registration was not completed and no payment was taken. \
         The spot has been released; you can register again any time.</p>\
         </body></html>",
    ))
}
