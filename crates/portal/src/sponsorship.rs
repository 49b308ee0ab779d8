//! Sponsorship checkout.
//!
//! A sponsor pays a chosen amount toward a student's classes through the
//! same hosted checkout as registrations. Nothing is written at checkout
//! time; the session carries everything in its metadata and the
//! completion webhook records the row.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;
use sprout_common::Result;
use sprout_payments::{CheckoutProvider, CheckoutRequest, CheckoutSession, LineItem};
use tracing::info;
use validator::Validate;

/// Metadata marker separating sponsorship sessions from class
/// registrations on the shared webhook.
pub const SPONSORSHIP_TYPE: &str = "sponsorship";

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SponsorCheckout {
    /// Sponsor-chosen amount in cents.
    #[validate(range(min = 100, message = "Sponsorship amount must be at least $1"))]
    pub amount_cents: i64,
    #[validate(length(min = 1, message = "First name is required"))]
    pub sponsor_first_name: String,
    #[validate(length(min = 1, message = "Last name is required"))]
    pub sponsor_last_name: String,
    #[validate(email(message = "A valid email is required"))]
    pub sponsor_email: String,
    #[serde(default)]
    pub student_name: Option<String>,
    #[serde(default)]
    pub organization_name: Option<String>,
}

pub struct SponsorshipService {
    checkout: Arc<dyn CheckoutProvider>,
    base_url: String,
}

impl SponsorshipService {
    pub fn new(checkout: Arc<dyn CheckoutProvider>, base_url: impl Into<String>) -> Self {
        Self {
            checkout,
            base_url: base_url.into(),
        }
    }

    /// Create a hosted checkout session for a sponsorship.
    pub async fn start_checkout(&self, form: &SponsorCheckout) -> Result<CheckoutSession> {
        let description = match &form.student_name {
            Some(student) => format!("Sponsorship for {student}"),
            None => "Sponsoring a student's coding education".to_string(),
        };

        let mut metadata = HashMap::new();
        metadata.insert("type".to_string(), SPONSORSHIP_TYPE.to_string());
        metadata.insert(
            "sponsor_first_name".to_string(),
            form.sponsor_first_name.clone(),
        );
        metadata.insert(
            "sponsor_last_name".to_string(),
            form.sponsor_last_name.clone(),
        );
        metadata.insert("sponsor_email".to_string(), form.sponsor_email.clone());
        if let Some(student) = &form.student_name {
            metadata.insert("student_name".to_string(), student.clone());
        }
        if let Some(organization) = &form.organization_name {
            metadata.insert("organization_name".to_string(), organization.clone());
        }

        let request = CheckoutRequest {
            line_item: LineItem {
                name: "Student Sponsorship".to_string(),
                description,
                unit_amount_cents: form.amount_cents,
                currency: "usd".to_string(),
            },
            success_url: format!(
                "{}/sponsor/thank-you?session_id={{CHECKOUT_SESSION_ID}}",
                self.base_url
            ),
            cancel_url: format!("{}/sponsor/checkout", self.base_url),
            customer_email: Some(form.sponsor_email.clone()),
            metadata,
        };

        let session = self.checkout.create_session(&request).await?;
        info!(
            "Sponsorship checkout session {} created for {}",
            session.id, form.sponsor_email
        );
        Ok(session)
    }
}
