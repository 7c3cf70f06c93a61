//! Configuration entity model — the single persisted operational-config row.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "configuration")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub batch_size: i32,
    pub max_parallel_requests: i32,
    pub daily_status_check_delay_days: i32,
    pub scrape_retry_days: i32,
    pub credential_check_lead_days: i32,
    pub max_retries: i32,
    pub test_mode_enabled: bool,
    pub test_mode_max_scraping_jobs: i32,
    pub test_mode_max_rebill_jobs: i32,
    pub enable_detailed_logging: bool,
    pub is_orchestration_enabled: bool,

    pub created_at: DateTimeWithTimeZone,
    pub created_by: String,
    pub modified_at: DateTimeWithTimeZone,
    pub modified_by: String,
    pub is_deleted: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Documented fallback defaults (spec.md §6), used when the row or a
    /// column is absent.
    pub fn defaults() -> OrchestratorDefaults {
        OrchestratorDefaults::default()
    }
}

/// Process-level defaults mirrored from spec.md §6 `Configuration`, used
/// when no row exists yet or a read fails.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrchestratorDefaults {
    pub batch_size: i32,
    pub max_parallel_requests: i32,
    pub daily_status_check_delay_days: i32,
    pub scrape_retry_days: i32,
    pub credential_check_lead_days: i32,
    pub max_retries: i32,
    pub test_mode_enabled: bool,
    pub test_mode_max_scraping_jobs: i32,
    pub test_mode_max_rebill_jobs: i32,
    pub enable_detailed_logging: bool,
    pub is_orchestration_enabled: bool,
}

impl Default for OrchestratorDefaults {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            max_parallel_requests: 8,
            daily_status_check_delay_days: 1,
            scrape_retry_days: 5,
            credential_check_lead_days: 7,
            max_retries: 5,
            test_mode_enabled: false,
            test_mode_max_scraping_jobs: 50,
            test_mode_max_rebill_jobs: 50,
            enable_detailed_logging: false,
            is_orchestration_enabled: true,
        }
    }
}
