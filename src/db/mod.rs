use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::config::{AdminConfig, SecurityConfig};
use crate::entities::{admin, posts, projects};

pub mod migrator;
pub mod repositories;

pub use repositories::post::PostInput;
pub use repositories::project::ProjectInput;

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    /// Delete every session record. Used on password change so no session
    /// established under the old credential stays valid.
    pub async fn clear_sessions(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .execute(Statement::from_string(
                backend,
                "DELETE FROM tower_sessions".to_string(),
            ))
            .await?;
        Ok(())
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn admin_repo(&self) -> repositories::admin::AdminRepository {
        repositories::admin::AdminRepository::new(self.conn.clone())
    }

    fn post_repo(&self) -> repositories::post::PostRepository {
        repositories::post::PostRepository::new(self.conn.clone())
    }

    fn project_repo(&self) -> repositories::project::ProjectRepository {
        repositories::project::ProjectRepository::new(self.conn.clone())
    }

    // -- Credential store --------------------------------------------------

    pub async fn get_admin(&self) -> Result<Option<admin::Model>> {
        self.admin_repo().get().await
    }

    pub async fn ensure_admin(
        &self,
        identity: &AdminConfig,
        security: &SecurityConfig,
    ) -> Result<admin::Model> {
        self.admin_repo().ensure(identity, security).await
    }

    pub async fn set_admin_password_hash(&self, new_hash: &str) -> Result<()> {
        self.admin_repo().set_password_hash(new_hash).await
    }

    pub async fn set_admin_temp_password_hash(&self, temp_hash: &str) -> Result<()> {
        self.admin_repo().set_temp_password_hash(temp_hash).await
    }

    pub async fn clear_admin_temp_password_hash(&self) -> Result<()> {
        self.admin_repo().clear_temp_password_hash().await
    }

    // -- Content -----------------------------------------------------------

    pub async fn list_published_posts(&self) -> Result<Vec<posts::Model>> {
        self.post_repo().list_published().await
    }

    pub async fn list_all_posts(&self) -> Result<Vec<posts::Model>> {
        self.post_repo().list_all().await
    }

    pub async fn get_post_by_slug(&self, slug: &str) -> Result<Option<posts::Model>> {
        self.post_repo().get_by_slug(slug).await
    }

    pub async fn create_post(&self, input: &PostInput) -> Result<posts::Model> {
        self.post_repo().create(input).await
    }

    pub async fn update_post(&self, id: i32, input: &PostInput) -> Result<Option<posts::Model>> {
        self.post_repo().update(id, input).await
    }

    pub async fn delete_post(&self, id: i32) -> Result<bool> {
        self.post_repo().delete(id).await
    }

    pub async fn list_projects(&self) -> Result<Vec<projects::Model>> {
        self.project_repo().list().await
    }

    pub async fn create_project(&self, input: &ProjectInput) -> Result<projects::Model> {
        self.project_repo().create(input).await
    }

    pub async fn update_project(
        &self,
        id: i32,
        input: &ProjectInput,
    ) -> Result<Option<projects::Model>> {
        self.project_repo().update(id, input).await
    }

    pub async fn delete_project(&self, id: i32) -> Result<bool> {
        self.project_repo().delete(id).await
    }
}
