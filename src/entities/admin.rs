use sea_orm::entity::prelude::*;

/// The singleton administrator row. Exactly one record exists; it is
/// bootstrapped at startup from `[admin]` configuration.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "admin")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub username: String,

    pub email: String,

    /// Argon2id hash of the primary credential.
    pub password_hash: String,

    /// Argon2id hash of the single outstanding temporary credential,
    /// if one has been issued and not yet consumed.
    pub temp_password_hash: Option<String>,

    /// Forces password rotation after the seeded bootstrap credential.
    pub must_change_password: bool,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
