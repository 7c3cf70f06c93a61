//! Account repository — bulk load into an in-memory natural-key map and
//! soft-delete-vanished support (spec §4.4 steps 3 and 5).

use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

use crate::error::OrchestratorError;
use crate::models::account;
use crate::models::SYSTEM_ACTOR;

/// Natural key used to match incoming feed rows against existing accounts.
pub type NaturalKey = (i64, String);

pub struct AccountRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> AccountRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Loads all non-deleted accounts keyed by `(vm_account_id, vm_account_number)`.
    pub async fn load_active_by_natural_key(
        &self,
    ) -> Result<HashMap<NaturalKey, account::Model>, OrchestratorError> {
        let rows = account::Entity::find()
            .filter(account::Column::IsDeleted.eq(false))
            .all(self.db)
            .await?;
        Ok(rows
            .into_iter()
            .map(|r| ((r.vm_account_id, r.vm_account_number.clone()), r))
            .collect())
    }

    /// Soft-deletes every active account whose natural key was not seen in
    /// the current sync pass.
    pub async fn soft_delete_vanished(
        &self,
        seen: &std::collections::HashSet<NaturalKey>,
        existing: &HashMap<NaturalKey, account::Model>,
    ) -> Result<u64, OrchestratorError> {
        let now = Utc::now().fixed_offset();
        let mut deleted = 0u64;

        for (key, model) in existing.iter() {
            if seen.contains(key) {
                continue;
            }
            let mut active: account::ActiveModel = model.clone().into();
            active.is_deleted = Set(true);
            active.modified_at = Set(now);
            active.modified_by = Set(SYSTEM_ACTOR.to_string());
            active.update(self.db).await.map_err(|e| {
                tracing::error!(error = %e, account_id = model.id, "account soft-delete failed");
                e
            })?;
            deleted += 1;
        }

        Ok(deleted)
    }
}
