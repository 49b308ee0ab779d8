//! Registration rows and seat accounting.
//!
//! A seat is reserved by the atomic conditional increment in
//! [`Storage::create_registration`] and released by cancellation, charter
//! rejection, or the stale-pending sweep. The increment and the row insert
//! share one transaction, so a rejected insert never leaks a held seat.

use chrono::{DateTime, Utc};
use sprout_common::{Error, Result};
use tracing::{info, warn};

use super::Storage;
use crate::models::{PaymentStatus, Registration, RegistrationSummary};

const SUMMARY_SELECT: &str = "SELECT r.id, r.class_id, r.student_id, r.parent_id, \
     r.is_one_on_one, r.payment_method, r.payment_status, r.amount_cents, \
     r.charter_school_name, r.created_at, c.name AS class_name, s.full_name AS student_name \
     FROM registrations r \
     JOIN classes c ON c.id = r.class_id \
     JOIN students s ON s.id = r.student_id";

impl Storage {
    /// Reserve a seat and insert the registration row in one transaction.
    ///
    /// Errors with [`Error::ClassFull`] when the conditional increment
    /// matches no row, and [`Error::AlreadyRegistered`] when the
    /// (class, student) pair already exists; in both cases nothing is
    /// written.
    pub async fn create_registration(&self, registration: &Registration) -> Result<()> {
        let mut tx = self.pool().begin().await?;

        let held = sqlx::query(
            "UPDATE classes SET spots_taken = spots_taken + 1 \
             WHERE id = ? AND spots_taken < max_spots",
        )
        .bind(&registration.class_id)
        .execute(&mut *tx)
        .await?;

        if held.rows_affected() == 0 {
            return Err(Error::ClassFull);
        }

        let duplicate: Option<(String,)> =
            sqlx::query_as("SELECT id FROM registrations WHERE class_id = ? AND student_id = ?")
                .bind(&registration.class_id)
                .bind(&registration.student_id)
                .fetch_optional(&mut *tx)
                .await?;
        if duplicate.is_some() {
            return Err(Error::AlreadyRegistered);
        }

        sqlx::query(
            "INSERT INTO registrations (id, class_id, student_id, parent_id, is_one_on_one, \
             payment_method, payment_status, checkout_session_id, payment_intent_id, \
             charter_school_name, charter_school_contact, amount_cents, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&registration.id)
        .bind(&registration.class_id)
        .bind(&registration.student_id)
        .bind(&registration.parent_id)
        .bind(registration.is_one_on_one)
        .bind(registration.payment_method)
        .bind(registration.payment_status)
        .bind(&registration.checkout_session_id)
        .bind(&registration.payment_intent_id)
        .bind(&registration.charter_school_name)
        .bind(&registration.charter_school_contact)
        .bind(registration.amount_cents)
        .bind(registration.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if e.as_database_error()
                .is_some_and(|db| db.is_unique_violation())
            {
                Error::AlreadyRegistered
            } else {
                Error::Database(e)
            }
        })?;

        tx.commit().await?;
        info!(
            "Created {} registration {} for class {}",
            registration.payment_status.as_str(),
            registration.id,
            registration.class_id
        );
        Ok(())
    }

    pub async fn get_registration(&self, id: &str) -> Result<Registration> {
        self.find_registration(id)
            .await?
            .ok_or(Error::NotFound("Registration"))
    }

    pub async fn find_registration(&self, id: &str) -> Result<Option<Registration>> {
        Ok(
            sqlx::query_as::<_, Registration>("SELECT * FROM registrations WHERE id = ?")
                .bind(id)
                .fetch_optional(self.pool())
                .await?,
        )
    }

    pub async fn set_checkout_session(&self, id: &str, session_id: &str) -> Result<()> {
        sqlx::query("UPDATE registrations SET checkout_session_id = ? WHERE id = ?")
            .bind(session_id)
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(())
    }

    /// Transition `pending` to `paid`. Returns false when the row was not in
    /// `pending`, which makes repeated webhook deliveries a no-op.
    pub async fn mark_paid(&self, id: &str, payment_intent_id: Option<&str>) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE registrations SET payment_status = 'paid', payment_intent_id = ? \
             WHERE id = ? AND payment_status = 'pending'",
        )
        .bind(payment_intent_id)
        .bind(id)
        .execute(self.pool())
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Transition `charter_pending` to `charter_approved`. The seat was
    /// already reserved at creation, so no counter change here.
    pub async fn approve_charter(&self, id: &str) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE registrations SET payment_status = 'charter_approved' \
             WHERE id = ? AND payment_status = 'charter_pending'",
        )
        .bind(id)
        .execute(self.pool())
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Transition `charter_pending` to `refunded` and release the held seat.
    /// The release mirrors the reservation-time increment in
    /// [`Storage::create_registration`].
    pub async fn reject_charter(&self, id: &str) -> Result<Registration> {
        let mut tx = self.pool().begin().await?;

        let registration: Registration =
            sqlx::query_as("SELECT * FROM registrations WHERE id = ?")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or(Error::NotFound("Registration"))?;

        if registration.payment_status != PaymentStatus::CharterPending {
            return Err(Error::InvalidTransition {
                from: registration.payment_status.as_str().to_string(),
            });
        }

        sqlx::query("UPDATE registrations SET payment_status = 'refunded' WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        release_seat(&mut tx, &registration.class_id).await?;

        tx.commit().await?;
        info!("Rejected charter registration: {}", id);
        Ok(registration)
    }

    /// Delete a registration that is still `pending` and release its seat.
    /// Returns false (and deletes nothing) once the row has moved on, so a
    /// cancel racing a completed payment cannot drop a confirmed seat.
    pub async fn cancel_pending(&self, id: &str) -> Result<bool> {
        let mut tx = self.pool().begin().await?;

        let row: Option<(String,)> = sqlx::query_as(
            "SELECT class_id FROM registrations WHERE id = ? AND payment_status = 'pending'",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some((class_id,)) = row else {
            return Ok(false);
        };

        sqlx::query("DELETE FROM registrations WHERE id = ? AND payment_status = 'pending'")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        release_seat(&mut tx, &class_id).await?;

        tx.commit().await?;
        info!("Cancelled pending registration: {}", id);
        Ok(true)
    }

    /// Compensation for a failed checkout-session creation: drop the row
    /// that was just inserted and give the seat back.
    pub async fn delete_registration_release_seat(&self, id: &str, class_id: &str) -> Result<()> {
        let mut tx = self.pool().begin().await?;
        let deleted = sqlx::query("DELETE FROM registrations WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if deleted.rows_affected() > 0 {
            release_seat(&mut tx, class_id).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    /// Sweep card-path `pending` rows older than `cutoff` and release their
    /// seats. Charter holds are only released by admin rejection.
    pub async fn expire_stale_pending(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let stale: Vec<(String,)> = sqlx::query_as(
            "SELECT id FROM registrations \
             WHERE payment_status = 'pending' AND payment_method = 'card' AND created_at < ?",
        )
        .bind(cutoff)
        .fetch_all(self.pool())
        .await?;

        let mut expired = 0;
        for (id,) in stale {
            // Re-check the status inside the transaction; a webhook may have
            // settled the row since the select.
            if self.cancel_pending(&id).await? {
                warn!("Expired stale pending registration: {}", id);
                expired += 1;
            }
        }
        Ok(expired)
    }

    pub async fn list_registrations_for_parent(
        &self,
        parent_id: &str,
    ) -> Result<Vec<RegistrationSummary>> {
        let sql = format!("{SUMMARY_SELECT} WHERE r.parent_id = ? ORDER BY r.created_at DESC");
        Ok(sqlx::query_as::<_, RegistrationSummary>(&sql)
            .bind(parent_id)
            .fetch_all(self.pool())
            .await?)
    }

    pub async fn list_registrations(&self) -> Result<Vec<RegistrationSummary>> {
        let sql = format!("{SUMMARY_SELECT} ORDER BY r.created_at DESC");
        Ok(sqlx::query_as::<_, RegistrationSummary>(&sql)
            .fetch_all(self.pool())
            .await?)
    }
}

/// Decrement a class's seat counter, never below zero.
async fn release_seat(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    class_id: &str,
) -> Result<()> {
    sqlx::query("UPDATE classes SET spots_taken = spots_taken - 1 WHERE id = ? AND spots_taken > 0")
        .bind(class_id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}
