//! Client repository — upserts distinct `(external_client_id, name)` pairs
//! observed during account sync (spec §4.4 step 2).

use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

use crate::error::OrchestratorError;
use crate::models::client::{self, derive_code};
use crate::models::SYSTEM_ACTOR;

pub struct ClientRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> ClientRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Loads existing clients keyed by `external_client_id`.
    pub async fn load_existing(&self) -> Result<HashMap<i32, client::Model>, OrchestratorError> {
        let rows = client::Entity::find().all(self.db).await?;
        Ok(rows.into_iter().map(|r| (r.external_client_id, r)).collect())
    }

    /// Upserts one `(external_client_id, name)` pair, returning the
    /// internal id. Existing rows have their name/code refreshed; new ones
    /// are inserted active.
    pub async fn upsert(
        &self,
        existing: &mut HashMap<i32, client::Model>,
        external_client_id: i32,
        name: &str,
    ) -> Result<i64, OrchestratorError> {
        let now = Utc::now().fixed_offset();

        if let Some(current) = existing.get(&external_client_id) {
            if current.name != name {
                let mut active: client::ActiveModel = current.clone().into();
                active.name = Set(name.to_string());
                active.code = Set(derive_code(name));
                active.modified_at = Set(now);
                active.modified_by = Set(SYSTEM_ACTOR.to_string());
                let updated = active.update(self.db).await.map_err(|e| {
                    tracing::error!(error = %e, external_client_id, "client update failed");
                    e
                })?;
                let id = updated.id;
                existing.insert(external_client_id, updated);
                return Ok(id);
            }
            return Ok(current.id);
        }

        let active = client::ActiveModel {
            id: sea_orm::ActiveValue::NotSet,
            external_client_id: Set(external_client_id),
            name: Set(name.to_string()),
            code: Set(derive_code(name)),
            is_active: Set(true),
            last_synced_at: Set(Some(now)),
            created_at: Set(now),
            created_by: Set(SYSTEM_ACTOR.to_string()),
            modified_at: Set(now),
            modified_by: Set(SYSTEM_ACTOR.to_string()),
            is_deleted: Set(false),
        };
        let inserted = active.insert(self.db).await.map_err(|e| {
            tracing::error!(error = %e, external_client_id, "client insert failed");
            e
        })?;
        let id = inserted.id;
        existing.insert(external_client_id, inserted);
        Ok(id)
    }

    #[allow(dead_code)]
    async fn find_active(&self) -> Result<Vec<client::Model>, OrchestratorError> {
        Ok(client::Entity::find()
            .filter(client::Column::IsActive.eq(true))
            .all(self.db)
            .await?)
    }
}
