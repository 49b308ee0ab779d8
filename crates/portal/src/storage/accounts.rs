//! Account rows.

use sprout_common::{Error, Result};
use tracing::info;

use super::Storage;
use crate::models::Account;

impl Storage {
    /// Insert an account. A duplicate email is a validation rejection, not a
    /// server error.
    pub async fn insert_account(&self, account: &Account) -> Result<()> {
        sqlx::query(
            "INSERT INTO accounts (id, email, password_hash, full_name, phone, role, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&account.id)
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(&account.full_name)
        .bind(&account.phone)
        .bind(account.role)
        .bind(account.created_at)
        .execute(self.pool())
        .await
        .map_err(|e| {
            if e.as_database_error()
                .is_some_and(|db| db.is_unique_violation())
            {
                Error::invalid_field("email", "An account with this email already exists")
            } else {
                Error::Database(e)
            }
        })?;
        info!("Created account: {}", account.id);
        Ok(())
    }

    pub async fn get_account(&self, id: &str) -> Result<Account> {
        sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or(Error::NotFound("Account"))
    }

    pub async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>> {
        Ok(sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE email = ?")
            .bind(email)
            .fetch_optional(self.pool())
            .await?)
    }
}
