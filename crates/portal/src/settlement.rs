//! Settlement handler: webhook notifications and admin charter decisions.
//!
//! Both entry points are idempotent. The status transition is a single
//! conditional update, so a repeated webhook or double-clicked approval
//! changes nothing and sends no second round of email.

use std::sync::Arc;

use chrono::Utc;
use sprout_common::{Error, Result};
use sprout_payments::webhook::{SessionObject, WebhookEvent, CHECKOUT_COMPLETED};
use tracing::{debug, info, warn};

use crate::models::{new_id, Registration, Sponsorship};
use crate::notify::{self, EmailSender};
use crate::sponsorship::SPONSORSHIP_TYPE;
use crate::storage::Storage;

pub struct Settlement {
    storage: Storage,
    email: Arc<dyn EmailSender>,
}

impl Settlement {
    pub fn new(storage: Storage, email: Arc<dyn EmailSender>) -> Self {
        Self { storage, email }
    }

    /// Consume a verified webhook event. Unknown event types, missing
    /// registrations, and already-settled rows are all no-ops; the caller
    /// acknowledges receipt regardless.
    pub async fn handle_webhook_event(&self, event: &WebhookEvent) -> Result<()> {
        if event.event_type != CHECKOUT_COMPLETED {
            debug!("Ignoring webhook event type: {}", event.event_type);
            return Ok(());
        }
        let object = &event.data.object;
        if object.metadata.get("type").map(String::as_str) == Some(SPONSORSHIP_TYPE) {
            return self.record_sponsorship(object).await;
        }
        let Some(registration_id) = object.metadata.get("registration_id") else {
            debug!("Completed session {} carries no registration id", object.id);
            return Ok(());
        };
        self.confirm_card_payment(registration_id, object.payment_intent.as_deref())
            .await
    }

    /// Record a settled sponsorship session and thank the sponsor. The
    /// row is keyed by the session id, so a redelivered notification
    /// neither double-records nor re-sends the email.
    pub async fn record_sponsorship(&self, object: &SessionObject) -> Result<()> {
        let field = |key: &str| {
            object
                .metadata
                .get(key)
                .cloned()
                .filter(|value| !value.is_empty())
        };
        let sponsorship = Sponsorship {
            id: new_id(),
            sponsor_first_name: field("sponsor_first_name").unwrap_or_default(),
            sponsor_last_name: field("sponsor_last_name").unwrap_or_default(),
            sponsor_email: field("sponsor_email").unwrap_or_default(),
            student_name: field("student_name"),
            organization_name: field("organization_name"),
            amount_cents: object.amount_total.unwrap_or(0),
            checkout_session_id: object.id.clone(),
            payment_intent_id: object.payment_intent.clone(),
            created_at: Utc::now(),
        };

        let recorded = self.storage.insert_sponsorship(&sponsorship).await?;
        if !recorded {
            info!("Sponsorship session {} already recorded, skipping", object.id);
            return Ok(());
        }

        if !sponsorship.sponsor_email.is_empty() {
            let name = if sponsorship.sponsor_first_name.is_empty() {
                "Friend"
            } else {
                &sponsorship.sponsor_first_name
            };
            notify::send_best_effort(
                self.email.as_ref(),
                notify::sponsorship_thanks_email(
                    &sponsorship.sponsor_email,
                    name,
                    sponsorship.amount_cents,
                    sponsorship.student_name.as_deref(),
                ),
            )
            .await;
        }
        Ok(())
    }

    /// Finalize a card registration after payment completed.
    pub async fn confirm_card_payment(
        &self,
        registration_id: &str,
        payment_intent_id: Option<&str>,
    ) -> Result<()> {
        let Some(registration) = self.storage.find_registration(registration_id).await? else {
            warn!(
                "Payment completed for unknown registration: {}",
                registration_id
            );
            return Ok(());
        };

        let settled = self
            .storage
            .mark_paid(registration_id, payment_intent_id)
            .await?;
        if !settled {
            info!(
                "Registration {} already settled ({}), skipping",
                registration_id,
                registration.payment_status.as_str()
            );
            return Ok(());
        }

        info!("Registration {} marked paid", registration_id);
        self.send_confirmation_emails(&registration, payment_intent_id)
            .await;
        Ok(())
    }

    /// Admin approval of a charter-funded registration.
    pub async fn approve_charter(&self, registration_id: &str) -> Result<()> {
        let registration = self.storage.get_registration(registration_id).await?;

        let approved = self.storage.approve_charter(registration_id).await?;
        if !approved {
            return Err(Error::InvalidTransition {
                from: registration.payment_status.as_str().to_string(),
            });
        }

        info!("Registration {} charter approved", registration_id);
        self.send_confirmation_emails(&registration, None).await;
        Ok(())
    }

    /// Admin rejection of a charter-funded registration. Releases the held
    /// seat; no email is sent.
    pub async fn reject_charter(&self, registration_id: &str) -> Result<()> {
        self.storage.reject_charter(registration_id).await?;
        Ok(())
    }

    /// Checkout-cancel callback. Returns whether a pending row was deleted.
    pub async fn cancel_checkout(&self, registration_id: &str) -> Result<bool> {
        self.storage.cancel_pending(registration_id).await
    }

    async fn send_confirmation_emails(
        &self,
        registration: &Registration,
        payment_intent_id: Option<&str>,
    ) {
        let context = async {
            let class = self.storage.get_class(&registration.class_id).await?;
            let student = self.storage.get_student(&registration.student_id).await?;
            let parent = self.storage.get_account(&registration.parent_id).await?;
            Ok::<_, Error>((class, student, parent))
        };
        let (class, student, parent) = match context.await {
            Ok(context) => context,
            Err(e) => {
                warn!(
                    "Skipping confirmation emails for registration {}: {}",
                    registration.id, e
                );
                return;
            }
        };
        let parent_name = parent.full_name.as_deref().unwrap_or("Parent");

        notify::send_best_effort(
            self.email.as_ref(),
            notify::payment_received_email(
                &parent.email,
                parent_name,
                &class.name,
                registration.amount_cents,
                payment_intent_id,
            ),
        )
        .await;
        notify::send_best_effort(
            self.email.as_ref(),
            notify::registration_confirmed_email(
                &parent.email,
                parent_name,
                &student.full_name,
                &class,
                registration,
            ),
        )
        .await;
    }
}
