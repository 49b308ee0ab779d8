//! Data models for the portal.
//!
//! All ids are uuid strings, money is integer cents, and enums are stored
//! as snake_case text columns.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use uuid::Uuid;

/// Account role, gating mutation entry points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Parent,
    Admin,
    Instructor,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Parent => "parent",
            Role::Admin => "admin",
            Role::Instructor => "instructor",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "parent" => Some(Role::Parent),
            "admin" => Some(Role::Admin),
            "instructor" => Some(Role::Instructor),
            _ => None,
        }
    }
}

/// How a registration is paid for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Card,
    CharterSchool,
}

/// Registration payment lifecycle.
///
/// `pending` and `charter_pending` hold a seat that is released on
/// cancellation, rejection, or expiry; `paid` and `charter_approved` are
/// confirmed seats; `refunded` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
    CharterPending,
    CharterApproved,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::CharterPending => "charter_pending",
            PaymentStatus::CharterApproved => "charter_approved",
            PaymentStatus::Refunded => "refunded",
        }
    }
}

/// A scheduled course instance.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct ClassOffering {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    /// Grade bands this class accepts, e.g. `["3rd", "4th", "5th"]`.
    pub grade_levels: Json<Vec<String>>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub start_time: String,
    pub end_time: String,
    pub price_cents: i64,
    pub charter_price_cents: Option<i64>,
    pub one_on_one_price_cents: Option<i64>,
    pub max_spots: i64,
    /// Seats currently held or confirmed. Mutated only by the atomic
    /// reserve/release statements and admin edits.
    pub spots_taken: i64,
    pub is_online: bool,
    pub meeting_link: Option<String>,
    pub location: Option<String>,
    pub allows_one_on_one: bool,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ClassOffering {
    pub fn is_full(&self) -> bool {
        self.spots_taken >= self.max_spots
    }
}

/// A parent, admin, or instructor account.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Account {
    pub id: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// A child profile owned by exactly one parent account.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Student {
    pub id: String,
    pub parent_id: String,
    pub full_name: String,
    pub grade_level: String,
    pub date_of_birth: Option<NaiveDate>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A class registration; the central entity of the payment lifecycle.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Registration {
    pub id: String,
    pub class_id: String,
    pub student_id: String,
    pub parent_id: String,
    pub is_one_on_one: bool,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub checkout_session_id: Option<String>,
    pub payment_intent_id: Option<String>,
    pub charter_school_name: Option<String>,
    pub charter_school_contact: Option<String>,
    /// Amount resolved server-side at creation; never recomputed.
    pub amount_cents: i64,
    pub created_at: DateTime<Utc>,
}

impl Registration {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        class_id: String,
        student_id: String,
        parent_id: String,
        is_one_on_one: bool,
        payment_method: PaymentMethod,
        amount_cents: i64,
        charter_school_name: Option<String>,
        charter_school_contact: Option<String>,
    ) -> Self {
        let payment_status = match payment_method {
            PaymentMethod::Card => PaymentStatus::Pending,
            PaymentMethod::CharterSchool => PaymentStatus::CharterPending,
        };
        Self {
            id: Uuid::new_v4().to_string(),
            class_id,
            student_id,
            parent_id,
            is_one_on_one,
            payment_method,
            payment_status,
            checkout_session_id: None,
            payment_intent_id: None,
            charter_school_name,
            charter_school_contact,
            amount_cents,
            created_at: Utc::now(),
        }
    }
}

/// A registration joined with its class and student names, for listings.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct RegistrationSummary {
    pub id: String,
    pub class_id: String,
    pub student_id: String,
    pub parent_id: String,
    pub is_one_on_one: bool,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub amount_cents: i64,
    pub charter_school_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub class_name: String,
    pub student_name: String,
}

/// A one-off event shown on the public site.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Event {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub event_date: NaiveDate,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub location: Option<String>,
    pub is_online: bool,
    pub is_free: bool,
    pub price_cents: Option<i64>,
    pub max_attendees: Option<i64>,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct BlogPost {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub excerpt: Option<String>,
    pub content: String,
    pub author_name: String,
    pub is_published: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct GalleryItem {
    pub id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub image_url: String,
    pub student_name: Option<String>,
    pub project_name: Option<String>,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct ContactSubmission {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub subject: Option<String>,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// A completed student sponsorship, recorded at payment settlement.
///
/// Unlike registrations there is no pending row; the record exists only
/// once the processor reports the checkout complete, keyed by the session
/// id so replayed notifications cannot double-record.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Sponsorship {
    pub id: String,
    pub sponsor_first_name: String,
    pub sponsor_last_name: String,
    pub sponsor_email: String,
    pub student_name: Option<String>,
    pub organization_name: Option<String>,
    pub amount_cents: i64,
    pub checkout_session_id: String,
    pub payment_intent_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum VolunteerStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct VolunteerApplication {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub availability: Json<Vec<String>>,
    pub experience: Option<String>,
    pub motivation: Option<String>,
    pub status: VolunteerStatus,
    pub created_at: DateTime<Utc>,
}

/// Generate an opaque row id.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}
