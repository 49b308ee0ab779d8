//! Class catalog reads and admin class CRUD.

use chrono::Utc;
use sprout_common::{Error, Result};
use tracing::info;

use super::Storage;
use crate::models::ClassOffering;

/// Catalog filter for the public class listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogKind {
    Online,
    InPerson,
    Individual,
}

impl CatalogKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "online" => Some(CatalogKind::Online),
            "in_person" => Some(CatalogKind::InPerson),
            "individual" => Some(CatalogKind::Individual),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CatalogFilter {
    pub kind: Option<CatalogKind>,
    pub grade: Option<String>,
}

impl Storage {
    /// Published classes with a future-or-current start date, soonest first.
    pub async fn list_published_classes(
        &self,
        filter: &CatalogFilter,
    ) -> Result<Vec<ClassOffering>> {
        let mut sql = String::from(
            "SELECT * FROM classes \
             WHERE is_published = 1 AND start_date >= date('now')",
        );
        match filter.kind {
            Some(CatalogKind::Online) => sql.push_str(" AND is_online = 1"),
            Some(CatalogKind::InPerson) => sql.push_str(" AND is_online = 0"),
            Some(CatalogKind::Individual) => sql.push_str(" AND allows_one_on_one = 1"),
            None => {}
        }
        if filter.grade.is_some() {
            // grade_levels is a JSON array of quoted strings.
            sql.push_str(" AND grade_levels LIKE ?");
        }
        sql.push_str(" ORDER BY start_date ASC");

        let mut query = sqlx::query_as::<_, ClassOffering>(&sql);
        if let Some(grade) = &filter.grade {
            query = query.bind(format!("%\"{grade}\"%"));
        }
        Ok(query.fetch_all(self.pool()).await?)
    }

    /// Every class regardless of publish state, for the back office.
    pub async fn list_classes(&self) -> Result<Vec<ClassOffering>> {
        Ok(
            sqlx::query_as::<_, ClassOffering>("SELECT * FROM classes ORDER BY start_date ASC")
                .fetch_all(self.pool())
                .await?,
        )
    }

    /// One class regardless of publish state.
    pub async fn get_class(&self, id: &str) -> Result<ClassOffering> {
        sqlx::query_as::<_, ClassOffering>("SELECT * FROM classes WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or(Error::NotFound("Class"))
    }

    pub async fn insert_class(&self, class: &ClassOffering) -> Result<()> {
        sqlx::query(
            "INSERT INTO classes (id, name, description, grade_levels, start_date, end_date, \
             start_time, end_time, price_cents, charter_price_cents, one_on_one_price_cents, \
             max_spots, spots_taken, is_online, meeting_link, location, allows_one_on_one, \
             is_published, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&class.id)
        .bind(&class.name)
        .bind(&class.description)
        .bind(&class.grade_levels)
        .bind(class.start_date)
        .bind(class.end_date)
        .bind(&class.start_time)
        .bind(&class.end_time)
        .bind(class.price_cents)
        .bind(class.charter_price_cents)
        .bind(class.one_on_one_price_cents)
        .bind(class.max_spots)
        .bind(class.spots_taken)
        .bind(class.is_online)
        .bind(&class.meeting_link)
        .bind(&class.location)
        .bind(class.allows_one_on_one)
        .bind(class.is_published)
        .bind(class.created_at)
        .bind(class.updated_at)
        .execute(self.pool())
        .await?;
        info!("Created class: {}", class.id);
        Ok(())
    }

    /// Overwrite the editable fields of a class. `spots_taken` is left
    /// alone, and the capacity can never be lowered below the seats
    /// already held; the condition rides on the same statement so a
    /// concurrent reservation cannot slip in between a check and the
    /// write.
    pub async fn update_class(&self, class: &ClassOffering) -> Result<()> {
        let result = sqlx::query(
            "UPDATE classes SET name = ?, description = ?, grade_levels = ?, start_date = ?, \
             end_date = ?, start_time = ?, end_time = ?, price_cents = ?, \
             charter_price_cents = ?, one_on_one_price_cents = ?, max_spots = ?, \
             is_online = ?, meeting_link = ?, location = ?, allows_one_on_one = ?, \
             is_published = ?, updated_at = ? WHERE id = ? AND spots_taken <= ?",
        )
        .bind(&class.name)
        .bind(&class.description)
        .bind(&class.grade_levels)
        .bind(class.start_date)
        .bind(class.end_date)
        .bind(&class.start_time)
        .bind(&class.end_time)
        .bind(class.price_cents)
        .bind(class.charter_price_cents)
        .bind(class.one_on_one_price_cents)
        .bind(class.max_spots)
        .bind(class.is_online)
        .bind(&class.meeting_link)
        .bind(&class.location)
        .bind(class.allows_one_on_one)
        .bind(class.is_published)
        .bind(Utc::now())
        .bind(&class.id)
        .bind(class.max_spots)
        .execute(self.pool())
        .await?;

        if result.rows_affected() == 0 {
            // Either the class is gone or the new capacity is below the
            // current enrollment.
            let current = self.get_class(&class.id).await?;
            return Err(Error::invalid_field(
                "maxSpots",
                format!(
                    "Cannot reduce capacity below current enrollment ({})",
                    current.spots_taken
                ),
            ));
        }
        info!("Updated class: {}", class.id);
        Ok(())
    }

    pub async fn delete_class(&self, id: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM classes WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound("Class"));
        }
        info!("Deleted class: {}", id);
        Ok(())
    }
}
