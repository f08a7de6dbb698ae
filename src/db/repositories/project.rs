use anyhow::{Context, Result};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder, Set};

use crate::entities::{prelude::Projects, projects};

#[derive(Debug, Clone)]
pub struct ProjectInput {
    pub slug: String,
    pub name: String,
    pub description: String,
    pub repo_url: Option<String>,
    pub live_url: Option<String>,
    pub featured: bool,
    pub sort_order: i32,
}

pub struct ProjectRepository {
    conn: DatabaseConnection,
}

impl ProjectRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list(&self) -> Result<Vec<projects::Model>> {
        Projects::find()
            .order_by_asc(projects::Column::SortOrder)
            .all(&self.conn)
            .await
            .context("Failed to list projects")
    }

    pub async fn create(&self, input: &ProjectInput) -> Result<projects::Model> {
        let now = chrono::Utc::now().to_rfc3339();

        let active = projects::ActiveModel {
            slug: Set(input.slug.clone()),
            name: Set(input.name.clone()),
            description: Set(input.description.clone()),
            repo_url: Set(input.repo_url.clone()),
            live_url: Set(input.live_url.clone()),
            featured: Set(input.featured),
            sort_order: Set(input.sort_order),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        active
            .insert(&self.conn)
            .await
            .context("Failed to create project")
    }

    pub async fn update(&self, id: i32, input: &ProjectInput) -> Result<Option<projects::Model>> {
        let Some(existing) = Projects::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query project")?
        else {
            return Ok(None);
        };

        let mut active: projects::ActiveModel = existing.into();
        active.slug = Set(input.slug.clone());
        active.name = Set(input.name.clone());
        active.description = Set(input.description.clone());
        active.repo_url = Set(input.repo_url.clone());
        active.live_url = Set(input.live_url.clone());
        active.featured = Set(input.featured);
        active.sort_order = Set(input.sort_order);
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        let updated = active
            .update(&self.conn)
            .await
            .context("Failed to update project")?;

        Ok(Some(updated))
    }

    pub async fn delete(&self, id: i32) -> Result<bool> {
        let result = Projects::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete project")?;

        Ok(result.rows_affected > 0)
    }
}
