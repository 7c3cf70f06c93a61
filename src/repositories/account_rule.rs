//! AccountRule repository — active-rule lookup and override-respecting
//! upsert (spec §4.4 step 6, and the "never touch is_manually_overridden
//! rows" invariant).

use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

use crate::error::OrchestratorError;
use crate::models::account_rule::{self, DOWNLOAD_INVOICE_JOB_TYPE_ID};
use crate::models::SYSTEM_ACTOR;

pub struct AccountRuleRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> AccountRuleRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Loads all DownloadInvoice rules keyed by `account_id`.
    pub async fn load_by_account(
        &self,
    ) -> Result<HashMap<i64, account_rule::Model>, OrchestratorError> {
        let rows = account_rule::Entity::find()
            .filter(account_rule::Column::JobTypeId.eq(DOWNLOAD_INVOICE_JOB_TYPE_ID))
            .filter(account_rule::Column::IsDeleted.eq(false))
            .all(self.db)
            .await?;
        Ok(rows.into_iter().map(|r| (r.account_id, r)).collect())
    }

    /// Recomputes the scheduling fields for one account's rule from a
    /// freshly derived `(period_type, next_run_at, range_start, range_end)`
    /// tuple. A no-op when the existing rule is `is_manually_overridden`.
    #[allow(clippy::too_many_arguments)]
    pub async fn upsert_schedule(
        &self,
        existing: Option<&account_rule::Model>,
        account_id: i64,
        period_type: &str,
        period_days: Option<i32>,
        next_run_at: chrono::NaiveDate,
        range_start: chrono::NaiveDate,
        range_end: chrono::NaiveDate,
    ) -> Result<account_rule::Model, OrchestratorError> {
        let now = Utc::now().fixed_offset();

        if let Some(rule) = existing {
            if rule.is_manually_overridden {
                return Ok(rule.clone());
            }
            let mut active: account_rule::ActiveModel = rule.clone().into();
            active.period_type = Set(period_type.to_string());
            active.period_days = Set(period_days);
            active.next_run_at = Set(next_run_at);
            active.next_range_start_at = Set(range_start);
            active.next_range_end_at = Set(range_end);
            active.modified_at = Set(now);
            active.modified_by = Set(SYSTEM_ACTOR.to_string());
            let updated = active.update(self.db).await.map_err(|e| {
                tracing::error!(error = %e, account_id, "account rule update failed");
                e
            })?;
            return Ok(updated);
        }

        let active = account_rule::ActiveModel {
            id: sea_orm::ActiveValue::NotSet,
            account_id: Set(account_id),
            job_type_id: Set(DOWNLOAD_INVOICE_JOB_TYPE_ID),
            period_type: Set(period_type.to_string()),
            period_days: Set(period_days),
            next_run_at: Set(next_run_at),
            next_range_start_at: Set(range_start),
            next_range_end_at: Set(range_end),
            window_days_before: Set(None),
            window_days_after: Set(None),
            is_enabled: Set(true),
            is_manually_overridden: Set(false),
            created_at: Set(now),
            created_by: Set(SYSTEM_ACTOR.to_string()),
            modified_at: Set(now),
            modified_by: Set(SYSTEM_ACTOR.to_string()),
            is_deleted: Set(false),
        };
        let inserted = active.insert(self.db).await.map_err(|e| {
            tracing::error!(error = %e, account_id, "account rule insert failed");
            e
        })?;
        Ok(inserted)
    }
}
