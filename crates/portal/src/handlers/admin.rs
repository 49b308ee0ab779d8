//! Back-office routes.
//!
//! Content management (classes, events, blog) is open to admins and
//! instructors; registrations, messages, and volunteer decisions are
//! admin only.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use sprout_common::Error;
use sqlx::types::Json as SqlJson;
use tracing::info;
use validator::Validate;

use crate::handlers::{require_admin, require_staff, validate_payload, ApiError};
use crate::models::{new_id, BlogPost, ClassOffering, Event, VolunteerStatus};
use crate::session::Actor;
use crate::AppState;

// --- registrations ---

pub async fn list_registrations_handler(
    State(state): State<Arc<AppState>>,
    actor: Actor,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&actor)?;
    let registrations = state.storage.list_registrations().await?;
    Ok(Json(registrations))
}

/// Approve a charter-funded registration. Only valid from
/// `charter_pending`; anything else is a 409.
pub async fn approve_registration_handler(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&actor)?;
    state.settlement.approve_charter(&id).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}

/// Reject a charter-funded registration, releasing its held seat.
pub async fn reject_registration_handler(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&actor)?;
    state.settlement.reject_charter(&id).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}

// --- classes ---

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ClassPayload {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub grade_levels: Vec<String>,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[validate(length(min = 1, message = "Start time is required"))]
    pub start_time: String,
    #[validate(length(min = 1, message = "End time is required"))]
    pub end_time: String,
    #[validate(range(min = 0, message = "Price cannot be negative"))]
    pub price_cents: i64,
    #[serde(default)]
    pub charter_price_cents: Option<i64>,
    #[serde(default)]
    pub one_on_one_price_cents: Option<i64>,
    #[validate(range(min = 1, message = "Class needs at least one spot"))]
    pub max_spots: i64,
    #[serde(default)]
    pub is_online: bool,
    #[serde(default)]
    pub meeting_link: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub allows_one_on_one: bool,
    #[serde(default)]
    pub is_published: bool,
}

pub async fn admin_list_classes_handler(
    State(state): State<Arc<AppState>>,
    actor: Actor,
) -> Result<impl IntoResponse, ApiError> {
    require_staff(&actor)?;
    let classes = state.storage.list_classes().await?;
    Ok(Json(classes))
}

pub async fn create_class_handler(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Json(payload): Json<ClassPayload>,
) -> Result<impl IntoResponse, ApiError> {
    require_staff(&actor)?;
    validate_payload(&payload)?;

    let now = Utc::now();
    let class = ClassOffering {
        id: new_id(),
        name: payload.name,
        description: payload.description,
        grade_levels: SqlJson(payload.grade_levels),
        start_date: payload.start_date,
        end_date: payload.end_date,
        start_time: payload.start_time,
        end_time: payload.end_time,
        price_cents: payload.price_cents,
        charter_price_cents: payload.charter_price_cents,
        one_on_one_price_cents: payload.one_on_one_price_cents,
        max_spots: payload.max_spots,
        spots_taken: 0,
        is_online: payload.is_online,
        meeting_link: payload.meeting_link,
        location: payload.location,
        allows_one_on_one: payload.allows_one_on_one,
        is_published: payload.is_published,
        created_at: now,
        updated_at: now,
    };
    state.storage.insert_class(&class).await?;
    Ok(Json(class))
}

pub async fn update_class_handler(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<String>,
    Json(payload): Json<ClassPayload>,
) -> Result<impl IntoResponse, ApiError> {
    require_staff(&actor)?;
    validate_payload(&payload)?;

    // spots_taken and created_at carry over from the stored row; the
    // update statement never touches them.
    let existing = state.storage.get_class(&id).await?;
    let class = ClassOffering {
        id,
        name: payload.name,
        description: payload.description,
        grade_levels: SqlJson(payload.grade_levels),
        start_date: payload.start_date,
        end_date: payload.end_date,
        start_time: payload.start_time,
        end_time: payload.end_time,
        price_cents: payload.price_cents,
        charter_price_cents: payload.charter_price_cents,
        one_on_one_price_cents: payload.one_on_one_price_cents,
        max_spots: payload.max_spots,
        spots_taken: existing.spots_taken,
        is_online: payload.is_online,
        meeting_link: payload.meeting_link,
        location: payload.location,
        allows_one_on_one: payload.allows_one_on_one,
        is_published: payload.is_published,
        created_at: existing.created_at,
        updated_at: Utc::now(),
    };
    state.storage.update_class(&class).await?;

    let class = state.storage.get_class(&class.id).await?;
    Ok(Json(class))
}

pub async fn delete_class_handler(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    require_staff(&actor)?;
    state.storage.delete_class(&id).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}

// --- events ---

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EventPayload {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub event_date: NaiveDate,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub is_online: bool,
    #[serde(default = "default_true")]
    pub is_free: bool,
    #[serde(default)]
    pub price_cents: Option<i64>,
    #[serde(default)]
    pub max_attendees: Option<i64>,
    #[serde(default)]
    pub is_published: bool,
}

fn default_true() -> bool {
    true
}

pub async fn admin_list_events_handler(
    State(state): State<Arc<AppState>>,
    actor: Actor,
) -> Result<impl IntoResponse, ApiError> {
    require_staff(&actor)?;
    let events = state.storage.list_events().await?;
    Ok(Json(events))
}

pub async fn create_event_handler(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Json(payload): Json<EventPayload>,
) -> Result<impl IntoResponse, ApiError> {
    require_staff(&actor)?;
    validate_payload(&payload)?;

    let event = Event {
        id: new_id(),
        name: payload.name,
        description: payload.description,
        event_date: payload.event_date,
        start_time: payload.start_time,
        end_time: payload.end_time,
        location: payload.location,
        is_online: payload.is_online,
        is_free: payload.is_free,
        price_cents: payload.price_cents,
        max_attendees: payload.max_attendees,
        is_published: payload.is_published,
        created_at: Utc::now(),
    };
    state.storage.insert_event(&event).await?;
    Ok(Json(event))
}

pub async fn update_event_handler(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<String>,
    Json(payload): Json<EventPayload>,
) -> Result<impl IntoResponse, ApiError> {
    require_staff(&actor)?;
    validate_payload(&payload)?;

    let event = Event {
        id,
        name: payload.name,
        description: payload.description,
        event_date: payload.event_date,
        start_time: payload.start_time,
        end_time: payload.end_time,
        location: payload.location,
        is_online: payload.is_online,
        is_free: payload.is_free,
        price_cents: payload.price_cents,
        max_attendees: payload.max_attendees,
        is_published: payload.is_published,
        created_at: Utc::now(),
    };
    state.storage.update_event(&event).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}

pub async fn delete_event_handler(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    require_staff(&actor)?;
    state.storage.delete_event(&id).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}

// --- blog ---

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BlogPostPayload {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[validate(length(min = 1, message = "Content is required"))]
    pub content: String,
    #[validate(length(min = 1, message = "Author is required"))]
    pub author_name: String,
    #[serde(default)]
    pub is_published: bool,
}

/// Lowercase, alphanumeric words joined by hyphens.
fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut last_hyphen = true;
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_hyphen = false;
        } else if !last_hyphen {
            slug.push('-');
            last_hyphen = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

pub async fn admin_list_blog_handler(
    State(state): State<Arc<AppState>>,
    actor: Actor,
) -> Result<impl IntoResponse, ApiError> {
    require_staff(&actor)?;
    let posts = state.storage.list_blog_posts().await?;
    Ok(Json(posts))
}

pub async fn create_blog_post_handler(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Json(payload): Json<BlogPostPayload>,
) -> Result<impl IntoResponse, ApiError> {
    require_staff(&actor)?;
    validate_payload(&payload)?;

    let now = Utc::now();
    let slug = payload
        .slug
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| slugify(&payload.title));
    let post = BlogPost {
        id: new_id(),
        title: payload.title,
        slug,
        excerpt: payload.excerpt,
        content: payload.content,
        author_name: payload.author_name,
        is_published: payload.is_published,
        published_at: payload.is_published.then_some(now),
        created_at: now,
        updated_at: now,
    };
    state.storage.insert_blog_post(&post).await?;
    Ok(Json(post))
}

pub async fn update_blog_post_handler(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<String>,
    Json(payload): Json<BlogPostPayload>,
) -> Result<impl IntoResponse, ApiError> {
    require_staff(&actor)?;
    validate_payload(&payload)?;

    let existing = state.storage.get_blog_post(&id).await?;
    let now = Utc::now();
    let slug = payload
        .slug
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| slugify(&payload.title));
    // The first publish stamps the timestamp; later edits keep it so the
    // public listing order does not shift. Unpublishing clears it.
    let published_at = if payload.is_published {
        existing.published_at.or(Some(now))
    } else {
        None
    };
    let post = BlogPost {
        id,
        title: payload.title,
        slug,
        excerpt: payload.excerpt,
        content: payload.content,
        author_name: payload.author_name,
        is_published: payload.is_published,
        published_at,
        created_at: existing.created_at,
        updated_at: now,
    };
    state.storage.update_blog_post(&post).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}

pub async fn delete_blog_post_handler(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    require_staff(&actor)?;
    state.storage.delete_blog_post(&id).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}

// --- gallery ---

pub async fn delete_gallery_item_handler(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    require_staff(&actor)?;
    state.storage.delete_gallery_item(&id).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}

// --- sponsorships ---

pub async fn list_sponsorships_handler(
    State(state): State<Arc<AppState>>,
    actor: Actor,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&actor)?;
    let sponsorships = state.storage.list_sponsorships().await?;
    Ok(Json(sponsorships))
}

// --- messages ---

pub async fn list_messages_handler(
    State(state): State<Arc<AppState>>,
    actor: Actor,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&actor)?;
    let messages = state.storage.list_contact_submissions().await?;
    Ok(Json(messages))
}

pub async fn mark_message_read_handler(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&actor)?;
    state.storage.mark_message_read(&id).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}

// --- volunteers ---

#[derive(Debug, Deserialize)]
pub struct VolunteerStatusPayload {
    pub status: String,
}

pub async fn list_volunteers_handler(
    State(state): State<Arc<AppState>>,
    actor: Actor,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&actor)?;
    let applications = state.storage.list_volunteer_applications().await?;
    Ok(Json(applications))
}

pub async fn set_volunteer_status_handler(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<String>,
    Json(payload): Json<VolunteerStatusPayload>,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&actor)?;
    let status = match payload.status.as_str() {
        "pending" => VolunteerStatus::Pending,
        "approved" => VolunteerStatus::Approved,
        "rejected" => VolunteerStatus::Rejected,
        _ => {
            return Err(Error::invalid_field("status", "Unknown volunteer status").into());
        }
    };
    state.storage.set_volunteer_status(&id, status).await?;
    info!("Volunteer application {} set to {:?}", id, status);
    Ok(Json(serde_json::json!({ "success": true })))
}
