//! Sponsorship rows, written once per settled checkout session.

use sprout_common::{Error, Result};
use tracing::info;

use super::Storage;
use crate::models::Sponsorship;

impl Storage {
    /// Record a settled sponsorship. Returns false when the checkout
    /// session was already recorded, so a replayed notification writes
    /// nothing.
    pub async fn insert_sponsorship(&self, sponsorship: &Sponsorship) -> Result<bool> {
        let result = sqlx::query(
            "INSERT INTO sponsorships (id, sponsor_first_name, sponsor_last_name, \
             sponsor_email, student_name, organization_name, amount_cents, \
             checkout_session_id, payment_intent_id, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&sponsorship.id)
        .bind(&sponsorship.sponsor_first_name)
        .bind(&sponsorship.sponsor_last_name)
        .bind(&sponsorship.sponsor_email)
        .bind(&sponsorship.student_name)
        .bind(&sponsorship.organization_name)
        .bind(sponsorship.amount_cents)
        .bind(&sponsorship.checkout_session_id)
        .bind(&sponsorship.payment_intent_id)
        .bind(sponsorship.created_at)
        .execute(self.pool())
        .await;

        match result {
            Ok(_) => {
                info!(
                    "Recorded sponsorship {} from session {}",
                    sponsorship.id, sponsorship.checkout_session_id
                );
                Ok(true)
            }
            Err(e)
                if e.as_database_error()
                    .is_some_and(|db| db.is_unique_violation()) =>
            {
                Ok(false)
            }
            Err(e) => Err(Error::Database(e)),
        }
    }

    pub async fn list_sponsorships(&self) -> Result<Vec<Sponsorship>> {
        Ok(sqlx::query_as::<_, Sponsorship>(
            "SELECT * FROM sponsorships ORDER BY created_at DESC",
        )
        .fetch_all(self.pool())
        .await?)
    }
}
