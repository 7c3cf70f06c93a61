//! Configuration loader (C8) — reads the single persisted operational
//! config row, falling back to the documented defaults when the row is
//! absent or a read fails.

use sea_orm::{DatabaseConnection, EntityTrait};

use crate::models::configuration::{self, OrchestratorDefaults};

pub struct ConfigurationLoader;

impl ConfigurationLoader {
    /// Reads the single `configuration` row. Returns the documented
    /// defaults (spec §6) when no row exists or the read fails; a
    /// misconfigured knobs table must never block orchestration.
    pub async fn load(db: &DatabaseConnection) -> OrchestratorDefaults {
        match configuration::Entity::find().one(db).await {
            Ok(Some(row)) => OrchestratorDefaults {
                batch_size: row.batch_size,
                max_parallel_requests: row.max_parallel_requests,
                daily_status_check_delay_days: row.daily_status_check_delay_days,
                scrape_retry_days: row.scrape_retry_days,
                credential_check_lead_days: row.credential_check_lead_days,
                max_retries: row.max_retries,
                test_mode_enabled: row.test_mode_enabled,
                test_mode_max_scraping_jobs: row.test_mode_max_scraping_jobs,
                test_mode_max_rebill_jobs: row.test_mode_max_rebill_jobs,
                enable_detailed_logging: row.enable_detailed_logging,
                is_orchestration_enabled: row.is_orchestration_enabled,
            },
            Ok(None) => {
                tracing::warn!("no configuration row found, using documented defaults");
                OrchestratorDefaults::default()
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to read configuration row, using documented defaults");
                OrchestratorDefaults::default()
            }
        }
    }
}
