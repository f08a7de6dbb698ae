use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use crate::entities::{posts, prelude::Posts};

/// Fields accepted when creating or updating a post.
#[derive(Debug, Clone)]
pub struct PostInput {
    pub slug: String,
    pub title: String,
    pub summary: Option<String>,
    pub body: String,
    pub published: bool,
}

pub struct PostRepository {
    conn: DatabaseConnection,
}

impl PostRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list_published(&self) -> Result<Vec<posts::Model>> {
        Posts::find()
            .filter(posts::Column::Published.eq(true))
            .order_by_desc(posts::Column::CreatedAt)
            .all(&self.conn)
            .await
            .context("Failed to list published posts")
    }

    pub async fn list_all(&self) -> Result<Vec<posts::Model>> {
        Posts::find()
            .order_by_desc(posts::Column::CreatedAt)
            .all(&self.conn)
            .await
            .context("Failed to list posts")
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<posts::Model>> {
        Posts::find()
            .filter(posts::Column::Slug.eq(slug))
            .one(&self.conn)
            .await
            .context("Failed to query post by slug")
    }

    pub async fn create(&self, input: &PostInput) -> Result<posts::Model> {
        let now = chrono::Utc::now().to_rfc3339();

        let active = posts::ActiveModel {
            slug: Set(input.slug.clone()),
            title: Set(input.title.clone()),
            summary: Set(input.summary.clone()),
            body: Set(input.body.clone()),
            published: Set(input.published),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        active.insert(&self.conn).await.context("Failed to create post")
    }

    pub async fn update(&self, id: i32, input: &PostInput) -> Result<Option<posts::Model>> {
        let Some(existing) = Posts::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query post")?
        else {
            return Ok(None);
        };

        let mut active: posts::ActiveModel = existing.into();
        active.slug = Set(input.slug.clone());
        active.title = Set(input.title.clone());
        active.summary = Set(input.summary.clone());
        active.body = Set(input.body.clone());
        active.published = Set(input.published);
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        let updated = active
            .update(&self.conn)
            .await
            .context("Failed to update post")?;

        Ok(Some(updated))
    }

    pub async fn delete(&self, id: i32) -> Result<bool> {
        let result = Posts::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete post")?;

        Ok(result.rows_affected > 0)
    }
}
