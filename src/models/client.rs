//! Client entity model.
//!
//! A Client is the internal tenant record mirrored from the external
//! invoice-aggregation feed's `client_id`/`client_name` pairs.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "clients")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Natural key from the source system.
    pub external_client_id: i32,

    pub name: String,

    /// Derived from `name`, capped at 50 characters.
    pub code: String,

    pub is_active: bool,
    pub last_synced_at: Option<DateTimeWithTimeZone>,

    pub created_at: DateTimeWithTimeZone,
    pub created_by: String,
    pub modified_at: DateTimeWithTimeZone,
    pub modified_by: String,
    pub is_deleted: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::account::Entity")]
    Account,
}

impl Related<super::account::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Account.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Derive a client code from a client name: uppercase, non-alphanumeric
/// stripped, truncated to 50 characters.
pub fn derive_code(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_uppercase())
        .collect();
    cleaned.chars().take(50).collect()
}
