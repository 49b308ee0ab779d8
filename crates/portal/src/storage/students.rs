//! Student rows. Every mutation is scoped to the owning parent.

use sprout_common::{Error, Result};
use tracing::info;

use super::Storage;
use crate::models::Student;

impl Storage {
    pub async fn insert_student(&self, student: &Student) -> Result<()> {
        sqlx::query(
            "INSERT INTO students (id, parent_id, full_name, grade_level, date_of_birth, notes, \
             created_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&student.id)
        .bind(&student.parent_id)
        .bind(&student.full_name)
        .bind(&student.grade_level)
        .bind(student.date_of_birth)
        .bind(&student.notes)
        .bind(student.created_at)
        .execute(self.pool())
        .await?;
        info!("Created student {} for parent {}", student.id, student.parent_id);
        Ok(())
    }

    pub async fn get_student(&self, id: &str) -> Result<Student> {
        sqlx::query_as::<_, Student>("SELECT * FROM students WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or(Error::NotFound("Student"))
    }

    pub async fn list_students_for_parent(&self, parent_id: &str) -> Result<Vec<Student>> {
        Ok(sqlx::query_as::<_, Student>(
            "SELECT * FROM students WHERE parent_id = ? ORDER BY created_at ASC",
        )
        .bind(parent_id)
        .fetch_all(self.pool())
        .await?)
    }

    pub async fn update_student(&self, student: &Student) -> Result<()> {
        let result = sqlx::query(
            "UPDATE students SET full_name = ?, grade_level = ?, date_of_birth = ?, notes = ? \
             WHERE id = ? AND parent_id = ?",
        )
        .bind(&student.full_name)
        .bind(&student.grade_level)
        .bind(student.date_of_birth)
        .bind(&student.notes)
        .bind(&student.id)
        .bind(&student.parent_id)
        .execute(self.pool())
        .await?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound("Student"));
        }
        Ok(())
    }

    pub async fn delete_student(&self, id: &str, parent_id: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM students WHERE id = ? AND parent_id = ?")
            .bind(id)
            .bind(parent_id)
            .execute(self.pool())
            .await?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound("Student"));
        }
        info!("Deleted student: {}", id);
        Ok(())
    }
}
