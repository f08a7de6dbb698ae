use anyhow::{Context, Result};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};

use crate::config::{AdminConfig, SecurityConfig};
use crate::entities::{admin, prelude::Admin};
use crate::services::password;

/// Seeded bootstrap credential; `must_change_password` forces rotation on
/// first login.
pub const BOOTSTRAP_PASSWORD: &str = "changeme";

/// Credential Store for the singleton administrator row.
pub struct AdminRepository {
    conn: DatabaseConnection,
}

impl AdminRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get(&self) -> Result<Option<admin::Model>> {
        Admin::find()
            .one(&self.conn)
            .await
            .context("Failed to query admin row")
    }

    /// Bootstrap the admin row from configuration. Creates it with a hashed
    /// default credential on first start; on later starts the identity
    /// columns follow the config.
    pub async fn ensure(
        &self,
        identity: &AdminConfig,
        security: &SecurityConfig,
    ) -> Result<admin::Model> {
        if let Some(existing) = self.get().await? {
            if existing.username == identity.username && existing.email == identity.email {
                return Ok(existing);
            }

            let mut active: admin::ActiveModel = existing.into();
            active.username = Set(identity.username.clone());
            active.email = Set(identity.email.clone());
            active.updated_at = Set(chrono::Utc::now().to_rfc3339());
            return active
                .update(&self.conn)
                .await
                .context("Failed to update admin identity");
        }

        let password_hash = password::hash(BOOTSTRAP_PASSWORD, security).await?;
        let now = chrono::Utc::now().to_rfc3339();

        let active = admin::ActiveModel {
            username: Set(identity.username.clone()),
            email: Set(identity.email.clone()),
            password_hash: Set(password_hash),
            temp_password_hash: Set(None),
            must_change_password: Set(true),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        active
            .insert(&self.conn)
            .await
            .context("Failed to seed admin row")
    }

    /// Replace the primary hash in a single update. Any outstanding
    /// temporary credential is invalidated by the same statement, so no
    /// partial state is observable.
    pub async fn set_password_hash(&self, new_hash: &str) -> Result<()> {
        let row = self
            .get()
            .await?
            .ok_or_else(|| anyhow::anyhow!("Admin row missing"))?;

        let mut active: admin::ActiveModel = row.into();
        active.password_hash = Set(new_hash.to_string());
        active.temp_password_hash = Set(None);
        active.must_change_password = Set(false);
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        active
            .update(&self.conn)
            .await
            .context("Failed to update password hash")?;

        Ok(())
    }

    /// Store the hash of a newly issued temporary credential, overwriting
    /// any prior one.
    pub async fn set_temp_password_hash(&self, temp_hash: &str) -> Result<()> {
        let row = self
            .get()
            .await?
            .ok_or_else(|| anyhow::anyhow!("Admin row missing"))?;

        let mut active: admin::ActiveModel = row.into();
        active.temp_password_hash = Set(Some(temp_hash.to_string()));
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        active
            .update(&self.conn)
            .await
            .context("Failed to store temporary credential")?;

        Ok(())
    }

    /// Erase a consumed temporary credential.
    pub async fn clear_temp_password_hash(&self) -> Result<()> {
        let row = self
            .get()
            .await?
            .ok_or_else(|| anyhow::anyhow!("Admin row missing"))?;

        if row.temp_password_hash.is_none() {
            return Ok(());
        }

        let mut active: admin::ActiveModel = row.into();
        active.temp_password_hash = Set(None);
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        active
            .update(&self.conn)
            .await
            .context("Failed to clear temporary credential")?;

        Ok(())
    }
}
