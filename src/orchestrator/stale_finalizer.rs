//! StalePendingFinalizer (C5): cancels jobs whose window closed before they
//! ever left `Pending`/`CredentialCheckInProgress`.

use chrono::{Duration, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

use crate::error::OrchestratorError;
use crate::models::job::{self, JobStatus};
use crate::models::SYSTEM_ACTOR;
use crate::orchestrator::stages::advance_rule_and_account;
use crate::orchestrator::types::{ProgressCallback, StalePendingResult};

const LOOKBACK_DAYS: i64 = 90;

pub struct StaleFinalizer<'a> {
    db: &'a DatabaseConnection,
    batch_size: usize,
}

impl<'a> StaleFinalizer<'a> {
    pub fn new(db: &'a DatabaseConnection, batch_size: usize) -> Self {
        Self { db, batch_size }
    }

    pub async fn run(
        &self,
        progress_cb: &mut ProgressCallback<'_>,
    ) -> Result<StalePendingResult, OrchestratorError> {
        let today = Utc::now().date_naive();
        let lookback = today - Duration::days(LOOKBACK_DAYS);

        let candidates = job::Entity::find()
            .filter(job::Column::IsDeleted.eq(false))
            .filter(
                sea_orm::Condition::any()
                    .add(job::Column::Status.eq(JobStatus::Pending.as_str()))
                    .add(job::Column::Status.eq(JobStatus::CredentialCheckInProgress.as_str())),
            )
            .filter(job::Column::NextRangeEndAt.lt(today))
            .filter(job::Column::NextRangeEndAt.gte(lookback))
            .all(self.db)
            .await?;

        let total = candidates.len();
        let mut result = StalePendingResult::default();
        let now = Utc::now().fixed_offset();

        for (index, job_model) in candidates.into_iter().enumerate() {
            let mut active: job::ActiveModel = job_model.clone().into();
            active.status = Set(JobStatus::Cancelled.as_str().to_string());
            active.error_message = Set(Some(format!(
                "missed window ended {}",
                job_model.next_range_end_at
            )));
            active.modified_at = Set(now);
            active.modified_by = Set(SYSTEM_ACTOR.to_string());
            active.update(self.db).await?;

            advance_rule_and_account(self.db, &job_model, now).await?;

            result.cancelled += 1;

            if (index + 1) % self.batch_size == 0 || index + 1 == total {
                progress_cb((index + 1) as i64, total as i64);
            }
        }

        Ok(result)
    }
}
