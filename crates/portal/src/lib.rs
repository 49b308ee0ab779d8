//! Coding Sprout portal service
//!
//! REST backend for a children's coding-class business: a public catalog
//! and content pages, parent accounts with student profiles, and the class
//! registration/payment lifecycle (hosted card checkout or charter-school
//! funding with admin approval).
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /api/classes` - Published class catalog (kind/grade filters)
//! - `POST /api/auth/register`, `POST /api/auth/login` - Accounts
//! - `POST /api/register-for-class` - Reserve a seat and route payment
//! - `POST /webhooks/payment` - Payment processor settlement callback
//! - `/api/admin/*` - Back office

pub mod config;
pub mod handlers;
pub mod models;
pub mod notify;
pub mod pricing;
pub mod registration;
pub mod session;
pub mod settlement;
pub mod sponsorship;
pub mod storage;

use std::sync::Arc;

use axum::routing::{delete, get, post, put};
use axum::Router;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::Config;
use crate::notify::EmailSender;
use crate::registration::RegistrationService;
use crate::settlement::Settlement;
use crate::sponsorship::SponsorshipService;
use crate::storage::Storage;

/// Application state shared across handlers
pub struct AppState {
    pub storage: Storage,
    pub registrations: RegistrationService,
    pub sponsorships: SponsorshipService,
    pub settlement: Settlement,
    pub email: Arc<dyn EmailSender>,
    pub config: Config,
}

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    let state = Arc::new(state);

    Router::new()
        // Health check
        .route("/health", get(handlers::public::health_handler))
        // Public catalog and content
        .route("/api/classes", get(handlers::public::list_classes_handler))
        .route("/api/classes/{id}", get(handlers::public::get_class_handler))
        .route("/api/events", get(handlers::public::list_events_handler))
        .route("/api/blog", get(handlers::public::list_blog_handler))
        .route("/api/blog/{slug}", get(handlers::public::get_blog_post_handler))
        .route("/api/gallery", get(handlers::public::list_gallery_handler))
        .route("/api/contact", post(handlers::public::contact_handler))
        .route("/api/volunteer", post(handlers::public::volunteer_handler))
        .route(
            "/api/sponsor",
            post(handlers::public::sponsor_checkout_handler),
        )
        .route(
            "/checkout/cancel",
            get(handlers::public::checkout_cancel_handler),
        )
        // Accounts
        .route("/api/auth/register", post(handlers::auth::register_handler))
        .route("/api/auth/login", post(handlers::auth::login_handler))
        // Parent: students and registrations
        .route(
            "/api/students",
            get(handlers::students::list_students_handler)
                .post(handlers::students::create_student_handler),
        )
        .route(
            "/api/students/{id}",
            put(handlers::students::update_student_handler)
                .delete(handlers::students::delete_student_handler),
        )
        .route(
            "/api/registrations",
            get(handlers::registrations::list_registrations_handler),
        )
        .route(
            "/api/register-for-class",
            post(handlers::registrations::register_for_class_handler),
        )
        // Payment processor callback
        .route(
            "/webhooks/payment",
            post(handlers::webhook::payment_webhook_handler),
        )
        // Back office
        .route(
            "/api/admin/registrations",
            get(handlers::admin::list_registrations_handler),
        )
        .route(
            "/api/admin/registrations/{id}/approve",
            post(handlers::admin::approve_registration_handler),
        )
        .route(
            "/api/admin/registrations/{id}/reject",
            post(handlers::admin::reject_registration_handler),
        )
        .route(
            "/api/admin/classes",
            get(handlers::admin::admin_list_classes_handler)
                .post(handlers::admin::create_class_handler),
        )
        .route(
            "/api/admin/classes/{id}",
            put(handlers::admin::update_class_handler)
                .delete(handlers::admin::delete_class_handler),
        )
        .route(
            "/api/admin/events",
            get(handlers::admin::admin_list_events_handler)
                .post(handlers::admin::create_event_handler),
        )
        .route(
            "/api/admin/events/{id}",
            put(handlers::admin::update_event_handler)
                .delete(handlers::admin::delete_event_handler),
        )
        .route(
            "/api/admin/blog",
            get(handlers::admin::admin_list_blog_handler)
                .post(handlers::admin::create_blog_post_handler),
        )
        .route(
            "/api/admin/blog/{id}",
            put(handlers::admin::update_blog_post_handler)
                .delete(handlers::admin::delete_blog_post_handler),
        )
        .route(
            "/api/admin/gallery/{id}",
            delete(handlers::admin::delete_gallery_item_handler),
        )
        .route(
            "/api/admin/sponsorships",
            get(handlers::admin::list_sponsorships_handler),
        )
        .route(
            "/api/admin/messages",
            get(handlers::admin::list_messages_handler),
        )
        .route(
            "/api/admin/messages/{id}/read",
            post(handlers::admin::mark_message_read_handler),
        )
        .route(
            "/api/admin/volunteers",
            get(handlers::admin::list_volunteers_handler),
        )
        .route(
            "/api/admin/volunteers/{id}/status",
            post(handlers::admin::set_volunteer_status_handler),
        )
        // Middleware
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
