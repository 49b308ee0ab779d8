//! Events, blog posts, gallery, contact submissions, volunteer applications.
//! Simple records with a publish/read flag; no lifecycle beyond
//! create/list/toggle/delete.

use sprout_common::{Error, Result};
use tracing::info;

use super::Storage;
use crate::models::{
    BlogPost, ContactSubmission, Event, GalleryItem, VolunteerApplication, VolunteerStatus,
};

impl Storage {
    // --- events ---

    pub async fn insert_event(&self, event: &Event) -> Result<()> {
        sqlx::query(
            "INSERT INTO events (id, name, description, event_date, start_time, end_time, \
             location, is_online, is_free, price_cents, max_attendees, is_published, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&event.id)
        .bind(&event.name)
        .bind(&event.description)
        .bind(event.event_date)
        .bind(&event.start_time)
        .bind(&event.end_time)
        .bind(&event.location)
        .bind(event.is_online)
        .bind(event.is_free)
        .bind(event.price_cents)
        .bind(event.max_attendees)
        .bind(event.is_published)
        .bind(event.created_at)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    pub async fn update_event(&self, event: &Event) -> Result<()> {
        let result = sqlx::query(
            "UPDATE events SET name = ?, description = ?, event_date = ?, start_time = ?, \
             end_time = ?, location = ?, is_online = ?, is_free = ?, price_cents = ?, \
             max_attendees = ?, is_published = ? WHERE id = ?",
        )
        .bind(&event.name)
        .bind(&event.description)
        .bind(event.event_date)
        .bind(&event.start_time)
        .bind(&event.end_time)
        .bind(&event.location)
        .bind(event.is_online)
        .bind(event.is_free)
        .bind(event.price_cents)
        .bind(event.max_attendees)
        .bind(event.is_published)
        .bind(&event.id)
        .execute(self.pool())
        .await?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound("Event"));
        }
        Ok(())
    }

    pub async fn delete_event(&self, id: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM events WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound("Event"));
        }
        Ok(())
    }

    pub async fn list_published_events(&self) -> Result<Vec<Event>> {
        Ok(sqlx::query_as::<_, Event>(
            "SELECT * FROM events WHERE is_published = 1 AND event_date >= date('now') \
             ORDER BY event_date ASC",
        )
        .fetch_all(self.pool())
        .await?)
    }

    pub async fn list_events(&self) -> Result<Vec<Event>> {
        Ok(
            sqlx::query_as::<_, Event>("SELECT * FROM events ORDER BY event_date ASC")
                .fetch_all(self.pool())
                .await?,
        )
    }

    // --- blog ---

    pub async fn insert_blog_post(&self, post: &BlogPost) -> Result<()> {
        sqlx::query(
            "INSERT INTO blog_posts (id, title, slug, excerpt, content, author_name, \
             is_published, published_at, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&post.id)
        .bind(&post.title)
        .bind(&post.slug)
        .bind(&post.excerpt)
        .bind(&post.content)
        .bind(&post.author_name)
        .bind(post.is_published)
        .bind(post.published_at)
        .bind(post.created_at)
        .bind(post.updated_at)
        .execute(self.pool())
        .await
        .map_err(|e| {
            if e.as_database_error()
                .is_some_and(|db| db.is_unique_violation())
            {
                Error::invalid_field("slug", "A post with this slug already exists")
            } else {
                Error::Database(e)
            }
        })?;
        info!("Created blog post: {}", post.slug);
        Ok(())
    }

    pub async fn get_blog_post(&self, id: &str) -> Result<BlogPost> {
        sqlx::query_as::<_, BlogPost>("SELECT * FROM blog_posts WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or(Error::NotFound("Blog post"))
    }

    pub async fn update_blog_post(&self, post: &BlogPost) -> Result<()> {
        let result = sqlx::query(
            "UPDATE blog_posts SET title = ?, slug = ?, excerpt = ?, content = ?, \
             is_published = ?, published_at = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&post.title)
        .bind(&post.slug)
        .bind(&post.excerpt)
        .bind(&post.content)
        .bind(post.is_published)
        .bind(post.published_at)
        .bind(post.updated_at)
        .bind(&post.id)
        .execute(self.pool())
        .await?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound("Blog post"));
        }
        Ok(())
    }

    pub async fn delete_blog_post(&self, id: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM blog_posts WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound("Blog post"));
        }
        Ok(())
    }

    pub async fn get_published_post_by_slug(&self, slug: &str) -> Result<BlogPost> {
        sqlx::query_as::<_, BlogPost>(
            "SELECT * FROM blog_posts WHERE slug = ? AND is_published = 1",
        )
        .bind(slug)
        .fetch_optional(self.pool())
        .await?
        .ok_or(Error::NotFound("Blog post"))
    }

    pub async fn list_published_posts(&self) -> Result<Vec<BlogPost>> {
        Ok(sqlx::query_as::<_, BlogPost>(
            "SELECT * FROM blog_posts WHERE is_published = 1 ORDER BY published_at DESC",
        )
        .fetch_all(self.pool())
        .await?)
    }

    pub async fn list_blog_posts(&self) -> Result<Vec<BlogPost>> {
        Ok(
            sqlx::query_as::<_, BlogPost>("SELECT * FROM blog_posts ORDER BY created_at DESC")
                .fetch_all(self.pool())
                .await?,
        )
    }

    // --- gallery ---

    pub async fn list_published_gallery(&self) -> Result<Vec<GalleryItem>> {
        Ok(sqlx::query_as::<_, GalleryItem>(
            "SELECT * FROM gallery_items WHERE is_published = 1 ORDER BY created_at DESC",
        )
        .fetch_all(self.pool())
        .await?)
    }

    pub async fn delete_gallery_item(&self, id: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM gallery_items WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound("Gallery item"));
        }
        Ok(())
    }

    // --- contact ---

    pub async fn insert_contact_submission(&self, submission: &ContactSubmission) -> Result<()> {
        sqlx::query(
            "INSERT INTO contact_submissions (id, first_name, last_name, email, phone, subject, \
             message, is_read, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&submission.id)
        .bind(&submission.first_name)
        .bind(&submission.last_name)
        .bind(&submission.email)
        .bind(&submission.phone)
        .bind(&submission.subject)
        .bind(&submission.message)
        .bind(submission.is_read)
        .bind(submission.created_at)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    pub async fn list_contact_submissions(&self) -> Result<Vec<ContactSubmission>> {
        Ok(sqlx::query_as::<_, ContactSubmission>(
            "SELECT * FROM contact_submissions ORDER BY created_at DESC",
        )
        .fetch_all(self.pool())
        .await?)
    }

    pub async fn mark_message_read(&self, id: &str) -> Result<()> {
        let result = sqlx::query("UPDATE contact_submissions SET is_read = 1 WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound("Message"));
        }
        Ok(())
    }

    // --- volunteers ---

    pub async fn insert_volunteer_application(
        &self,
        application: &VolunteerApplication,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO volunteer_applications (id, first_name, last_name, email, phone, \
             availability, experience, motivation, status, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&application.id)
        .bind(&application.first_name)
        .bind(&application.last_name)
        .bind(&application.email)
        .bind(&application.phone)
        .bind(&application.availability)
        .bind(&application.experience)
        .bind(&application.motivation)
        .bind(application.status)
        .bind(application.created_at)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    pub async fn list_volunteer_applications(&self) -> Result<Vec<VolunteerApplication>> {
        Ok(sqlx::query_as::<_, VolunteerApplication>(
            "SELECT * FROM volunteer_applications ORDER BY created_at DESC",
        )
        .fetch_all(self.pool())
        .await?)
    }

    pub async fn set_volunteer_status(&self, id: &str, status: VolunteerStatus) -> Result<()> {
        let result = sqlx::query("UPDATE volunteer_applications SET status = ? WHERE id = ?")
            .bind(status)
            .bind(id)
            .execute(self.pool())
            .await?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound("Volunteer application"));
        }
        Ok(())
    }
}
