//! StartupRecovery (C6): runs once at process start, before C4 is allowed
//! to dequeue, to reconcile state left behind by an unclean restart.

use chrono::{DateTime, Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use crate::error::OrchestratorError;
use crate::models::job_execution;
use crate::models::orchestration_run::{self, RunStatus};
use crate::models::SYSTEM_ACTOR;

#[derive(Debug, Clone, Default)]
pub struct RecoveryResult {
    pub job_executions_failed: u64,
    pub runs_interrupted: u64,
    pub most_recently_interrupted_run_id: Option<i64>,
}

/// Runs the two recovery passes against persisted state. `app_start` is the
/// timestamp the process began running, captured before this call.
pub async fn recover(
    db: &DatabaseConnection,
    app_start: DateTime<Utc>,
    grace_period_minutes: i64,
) -> Result<RecoveryResult, OrchestratorError> {
    let mut result = RecoveryResult::default();
    let now = Utc::now().fixed_offset();
    let grace_cutoff = (app_start - Duration::minutes(grace_period_minutes)).fixed_offset();

    let stuck_executions = job_execution::Entity::find()
        .filter(job_execution::Column::IsDeleted.eq(false))
        .filter(job_execution::Column::EndAt.is_null())
        .filter(job_execution::Column::StartAt.lt(grace_cutoff))
        .all(db)
        .await?;

    for execution in stuck_executions {
        let mut active: job_execution::ActiveModel = execution.into();
        active.is_success = Set(false);
        active.is_error = Set(true);
        active.end_at = Set(Some(now));
        active.error_message = Set(Some("app restarted while running".to_string()));
        active.modified_at = Set(now);
        active.modified_by = Set(SYSTEM_ACTOR.to_string());
        active.update(db).await?;
        result.job_executions_failed += 1;
    }

    let app_start_fixed = app_start.fixed_offset();
    let live_run_after_start = orchestration_run::Entity::find()
        .filter(orchestration_run::Column::Status.eq(RunStatus::Running.as_str()))
        .filter(orchestration_run::Column::StartedAt.gte(app_start_fixed))
        .one(db)
        .await?;

    if live_run_after_start.is_some() {
        return Ok(result);
    }

    let stuck_runs = orchestration_run::Entity::find()
        .filter(orchestration_run::Column::Status.eq(RunStatus::Running.as_str()))
        .filter(orchestration_run::Column::StartedAt.lt(app_start_fixed))
        .filter(orchestration_run::Column::CompletedAt.is_null())
        .order_by_desc(orchestration_run::Column::StartedAt)
        .all(db)
        .await?;

    for run in stuck_runs {
        let run_id = run.id;
        let mut active: orchestration_run::ActiveModel = run.into();
        active.status = Set(RunStatus::Interrupted.as_str().to_string());
        active.completed_at = Set(Some(now));
        active.error_message = Set(Some("interrupted by app restart".to_string()));
        active.modified_at = Set(now);
        active.modified_by = Set(SYSTEM_ACTOR.to_string());
        active.update(db).await?;
        result.runs_interrupted += 1;
        result.most_recently_interrupted_run_id.get_or_insert(run_id);
    }

    Ok(result)
}
