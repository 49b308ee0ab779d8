//! Child profiles, scoped to the authenticated parent.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;
use validator::Validate;

use crate::handlers::{validate_payload, ApiError};
use crate::models::{new_id, Student};
use crate::session::Actor;
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct StudentPayload {
    #[validate(length(min = 1, message = "Name is required"))]
    pub full_name: String,
    #[validate(length(min = 1, message = "Grade level is required"))]
    pub grade_level: String,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub notes: Option<String>,
}

pub async fn list_students_handler(
    State(state): State<Arc<AppState>>,
    actor: Actor,
) -> Result<impl IntoResponse, ApiError> {
    let students = state
        .storage
        .list_students_for_parent(&actor.account_id)
        .await?;
    Ok(Json(students))
}

pub async fn create_student_handler(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Json(payload): Json<StudentPayload>,
) -> Result<impl IntoResponse, ApiError> {
    validate_payload(&payload)?;

    let student = Student {
        id: new_id(),
        parent_id: actor.account_id,
        full_name: payload.full_name,
        grade_level: payload.grade_level,
        date_of_birth: payload.date_of_birth,
        notes: payload.notes,
        created_at: chrono::Utc::now(),
    };
    state.storage.insert_student(&student).await?;
    Ok(Json(student))
}

/// Updating another parent's student is indistinguishable from updating a
/// nonexistent one.
pub async fn update_student_handler(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<String>,
    Json(payload): Json<StudentPayload>,
) -> Result<impl IntoResponse, ApiError> {
    validate_payload(&payload)?;

    let student = Student {
        id,
        parent_id: actor.account_id,
        full_name: payload.full_name,
        grade_level: payload.grade_level,
        date_of_birth: payload.date_of_birth,
        notes: payload.notes,
        created_at: chrono::Utc::now(),
    };
    state.storage.update_student(&student).await?;

    let student = state.storage.get_student(&student.id).await?;
    Ok(Json(student))
}

pub async fn delete_student_handler(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.storage.delete_student(&id, &actor.account_id).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}
