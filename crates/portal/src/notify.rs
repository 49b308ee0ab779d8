//! Outgoing email.
//!
//! Delivery failures are logged, never surfaced to the user; callers treat
//! every send as fire-and-forget.

use async_trait::async_trait;
use serde_json::json;
use sprout_common::{format_usd, Error, Result};
use tracing::{info, warn};

use crate::models::{ClassOffering, Registration};

#[derive(Debug, Clone)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Sends pre-rendered emails.
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, email: &Email) -> Result<()>;
}

/// HTTP email provider client (Resend-style JSON API).
pub struct HttpEmailSender {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
    from: String,
}

impl HttpEmailSender {
    pub fn new(
        api_url: impl Into<String>,
        api_key: impl Into<String>,
        from: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: api_url.into(),
            api_key: api_key.into(),
            from: from.into(),
        }
    }
}

#[async_trait]
impl EmailSender for HttpEmailSender {
    async fn send(&self, email: &Email) -> Result<()> {
        let response = self
            .http
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&json!({
                "from": self.from,
                "to": email.to,
                "subject": email.subject,
                "html": email.body,
            }))
            .send()
            .await
            .map_err(|e| Error::Email(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Error::Email(format!(
                "provider returned {}",
                response.status()
            )));
        }
        info!("Sent email to {}: {}", email.to, email.subject);
        Ok(())
    }
}

/// Logs outgoing mail instead of delivering it. Used when no provider is
/// configured.
pub struct LogEmailSender;

#[async_trait]
impl EmailSender for LogEmailSender {
    async fn send(&self, email: &Email) -> Result<()> {
        info!("Email (not delivered) to {}: {}", email.to, email.subject);
        Ok(())
    }
}

/// Send an email, logging any delivery failure.
pub async fn send_best_effort(sender: &dyn EmailSender, email: Email) {
    if let Err(e) = sender.send(&email).await {
        warn!("Failed to send '{}' to {}: {}", email.subject, email.to, e);
    }
}

// --- templates ---
// Bodies are intentionally small: recipient, subject, and the fields the
// parent needs. Branding lives with the marketing site, not here.

pub fn welcome_email(to: &str, name: &str) -> Email {
    Email {
        to: to.to_string(),
        subject: "Welcome to Coding Sprout".to_string(),
        body: format!(
            "<h2>Welcome to Coding Sprout, {name}!</h2>\
             <p>Thank you for creating an account. You can now add your child's \
             profile, browse classes, and register for upcoming sessions.</p>\
             <p>We accept both card payments and charter school funds.</p>"
        ),
    }
}

pub fn payment_received_email(
    to: &str,
    parent_name: &str,
    class_name: &str,
    amount_cents: i64,
    transaction_id: Option<&str>,
) -> Email {
    let reference = transaction_id
        .map(|id| format!("<p>Transaction reference: {id}</p>"))
        .unwrap_or_default();
    Email {
        to: to.to_string(),
        subject: format!("Payment Received - {class_name}"),
        body: format!(
            "<h2>Hello {parent_name},</h2>\
             <p>We received your payment of <strong>{}</strong> for \
             <strong>{class_name}</strong>.</p>{reference}",
            format_usd(amount_cents)
        ),
    }
}

pub fn registration_confirmed_email(
    to: &str,
    parent_name: &str,
    student_name: &str,
    class: &ClassOffering,
    registration: &Registration,
) -> Email {
    let where_line = if class.is_online {
        match &class.meeting_link {
            Some(link) => format!("Online - <a href=\"{link}\">{link}</a>"),
            None => "Online - meeting link will be sent before class".to_string(),
        }
    } else {
        class.location.clone().unwrap_or_else(|| "In person".to_string())
    };
    let format_line = if registration.is_one_on_one {
        "One-on-One Session"
    } else {
        "Group Class"
    };
    Email {
        to: to.to_string(),
        subject: format!("Class Registration Confirmed - {}", class.name),
        body: format!(
            "<h2>Hello {parent_name},</h2>\
             <p>{student_name} is enrolled in <strong>{}</strong> ({format_line}).</p>\
             <p>Starts: {} from {} to {}</p>\
             <p>Where: {where_line}</p>\
             <p>Amount paid: {}</p>",
            class.name,
            class.start_date,
            class.start_time,
            class.end_time,
            format_usd(registration.amount_cents)
        ),
    }
}

pub fn sponsorship_thanks_email(
    to: &str,
    name: &str,
    amount_cents: i64,
    student_name: Option<&str>,
) -> Email {
    let target = student_name
        .map(|s| format!(" toward {s}'s classes"))
        .unwrap_or_else(|| " toward a student's coding education".to_string());
    Email {
        to: to.to_string(),
        subject: "Thank You for Your Sponsorship".to_string(),
        body: format!(
            "<h2>Thank you, {name}!</h2>\
             <p>We received your sponsorship of <strong>{}</strong>{target}.</p>\
             <p>Your generosity helps us bring coding to more kids.</p>",
            format_usd(amount_cents)
        ),
    }
}

pub fn charter_pending_email(
    to: &str,
    parent_name: &str,
    student_name: &str,
    class_name: &str,
    charter_school_name: &str,
) -> Email {
    Email {
        to: to.to_string(),
        subject: format!("Registration Pending - {class_name}"),
        body: format!(
            "<h2>Hello {parent_name},</h2>\
             <p>We received {student_name}'s registration for \
             <strong>{class_name}</strong>, to be funded by \
             <strong>{charter_school_name}</strong>.</p>\
             <p>We will confirm the enrollment once the charter school \
             approves the funds. No action is needed from you right now.</p>"
        ),
    }
}
