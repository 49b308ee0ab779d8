//! Registration writer and payment router.
//!
//! Validates the request, reserves a seat, and either hands off to the
//! payment processor's hosted checkout (card) or parks the registration for
//! admin approval (charter school funds).

use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;
use sprout_common::{Error, FieldError, Result};
use sprout_payments::{CheckoutProvider, CheckoutRequest, LineItem};
use tracing::{error, info};
use validator::Validate;

use crate::models::{PaymentMethod, Registration};
use crate::notify::{self, EmailSender};
use crate::pricing;
use crate::session::Actor;
use crate::storage::Storage;

/// Validated registration payload. The amount is deliberately absent; it is
/// resolved server-side from the class record.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterForClass {
    #[validate(length(min = 1, message = "Class is required"))]
    pub class_id: String,
    #[validate(length(min = 1, message = "Student is required"))]
    pub student_id: String,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub is_one_on_one: bool,
    #[serde(default)]
    pub charter_school_name: Option<String>,
    #[serde(default)]
    pub charter_school_contact: Option<String>,
}

impl RegisterForClass {
    /// Schema validation plus the conditional charter fields the derive
    /// cannot express.
    fn validate_all(&self) -> Result<()> {
        let mut fields = crate::handlers::validation_errors(self.validate());
        if self.payment_method == PaymentMethod::CharterSchool {
            if self.charter_school_name.as_deref().unwrap_or("").trim().is_empty() {
                fields.push(FieldError::new(
                    "charterSchoolName",
                    "Charter school name is required",
                ));
            }
            if self
                .charter_school_contact
                .as_deref()
                .unwrap_or("")
                .trim()
                .is_empty()
            {
                fields.push(FieldError::new(
                    "charterSchoolContact",
                    "Charter school contact is required",
                ));
            }
        }
        if fields.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation(fields))
        }
    }
}

/// Outcome of a registration attempt; `checkout_url` is present on the card
/// path only.
#[derive(Debug)]
pub struct RegistrationOutcome {
    pub registration_id: String,
    pub checkout_url: Option<String>,
}

pub struct RegistrationService {
    storage: Storage,
    checkout: Arc<dyn CheckoutProvider>,
    email: Arc<dyn EmailSender>,
    base_url: String,
}

impl RegistrationService {
    pub fn new(
        storage: Storage,
        checkout: Arc<dyn CheckoutProvider>,
        email: Arc<dyn EmailSender>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            storage,
            checkout,
            email,
            base_url: base_url.into(),
        }
    }

    /// Register a student for a class on behalf of the calling parent.
    ///
    /// Rejections happen in order: validation, unknown student/class, class
    /// full, duplicate enrollment; no external payment call is made until
    /// all of them pass and the seat is held.
    pub async fn register(
        &self,
        actor: &Actor,
        payload: &RegisterForClass,
    ) -> Result<RegistrationOutcome> {
        payload.validate_all()?;

        let student = self.storage.get_student(&payload.student_id).await?;
        if student.parent_id != actor.account_id {
            return Err(Error::NotFound("Student"));
        }

        let class = self.storage.get_class(&payload.class_id).await?;
        if class.is_full() {
            return Err(Error::ClassFull);
        }

        let amount_cents =
            pricing::resolve_amount_cents(&class, payload.is_one_on_one, payload.payment_method)?;
        let parent = self.storage.get_account(&actor.account_id).await?;

        let registration = Registration::new(
            class.id.clone(),
            student.id.clone(),
            parent.id.clone(),
            payload.is_one_on_one,
            payload.payment_method,
            amount_cents,
            payload.charter_school_name.clone(),
            payload.charter_school_contact.clone(),
        );

        // Reserves the seat; ClassFull / AlreadyRegistered surface from here
        // with nothing written.
        self.storage.create_registration(&registration).await?;

        match payload.payment_method {
            PaymentMethod::Card => {
                self.start_checkout(&registration, &class, &parent.email)
                    .await
            }
            PaymentMethod::CharterSchool => {
                let email = notify::charter_pending_email(
                    &parent.email,
                    parent.full_name.as_deref().unwrap_or("Parent"),
                    &student.full_name,
                    &class.name,
                    registration.charter_school_name.as_deref().unwrap_or(""),
                );
                notify::send_best_effort(self.email.as_ref(), email).await;

                Ok(RegistrationOutcome {
                    registration_id: registration.id.clone(),
                    checkout_url: None,
                })
            }
        }
    }

    async fn start_checkout(
        &self,
        registration: &Registration,
        class: &crate::models::ClassOffering,
        customer_email: &str,
    ) -> Result<RegistrationOutcome> {
        let format_label = if registration.is_one_on_one {
            "One-on-One Session"
        } else {
            "Group Class"
        };
        let grades = if class.grade_levels.0.is_empty() {
            "All grades".to_string()
        } else {
            class.grade_levels.0.join(", ")
        };

        let mut metadata = HashMap::new();
        metadata.insert("registration_id".to_string(), registration.id.clone());
        metadata.insert("class_id".to_string(), class.id.clone());

        let request = CheckoutRequest {
            line_item: LineItem {
                name: class.name.clone(),
                description: format!("{format_label} - {grades}"),
                unit_amount_cents: registration.amount_cents,
                currency: "usd".to_string(),
            },
            success_url: format!(
                "{}/checkout/success?session_id={{CHECKOUT_SESSION_ID}}&registration_id={}",
                self.base_url, registration.id
            ),
            cancel_url: format!(
                "{}/checkout/cancel?registration_id={}",
                self.base_url, registration.id
            ),
            customer_email: Some(customer_email.to_string()),
            metadata,
        };

        match self.checkout.create_session(&request).await {
            Ok(session) => {
                self.storage
                    .set_checkout_session(&registration.id, &session.id)
                    .await?;
                info!(
                    "Registration {} redirecting to checkout session {}",
                    registration.id, session.id
                );
                Ok(RegistrationOutcome {
                    registration_id: registration.id.clone(),
                    checkout_url: Some(session.url),
                })
            }
            Err(e) => {
                error!(
                    "Checkout session creation failed for registration {}: {}",
                    registration.id, e
                );
                // Give the seat back before surfacing the failure.
                if let Err(cleanup) = self
                    .storage
                    .delete_registration_release_seat(&registration.id, &class.id)
                    .await
                {
                    error!(
                        "Failed to roll back registration {}: {}",
                        registration.id, cleanup
                    );
                }
                Err(e)
            }
        }
    }
}
