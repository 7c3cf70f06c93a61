//! S5 (spec §8): an account that disappears from the external feed is
//! soft-deleted by the next sync, while jobs already in flight for it are
//! left untouched.

#[path = "test_utils/mod.rs"]
mod test_utils;

use std::sync::Arc;

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use sea_orm::{ColumnTrait, ConnectionTrait, DatabaseBackend, EntityTrait, QueryFilter, Statement};
use tokio_util::sync::CancellationToken;

use adr_orchestrator::config::AppConfig;
use adr_orchestrator::models::account;
use adr_orchestrator::models::job::{self, JobStatus};
use adr_orchestrator::notification::NullEmailService;
use adr_orchestrator::orchestrator::OrchestratorCore;
use adr_orchestrator::{adr::client::AdrClient, billing::PeriodType};

use test_utils::{insert_external_feed_row, insert_job, setup_external_feed_db, setup_test_db};

#[tokio::test]
async fn vanished_account_is_soft_deleted_without_touching_its_in_flight_job() -> Result<()> {
    let db = setup_test_db().await?;
    let external_db = setup_external_feed_db().await?;
    let external_handle = external_db.clone();

    let last_invoice: NaiveDate = Utc::now().date_naive() - chrono::Duration::days(20);
    insert_external_feed_row(
        &external_db,
        9201,
        77,
        Some(701),
        Some("Epsilon Partners"),
        Some("EPS"),
        "A-9201",
        None,
        Some(last_invoice),
        3,
    )
    .await?;

    let config = AppConfig {
        adr_base_url: "http://127.0.0.1:1".to_string(),
        ..AppConfig::default()
    };
    let adr = AdrClient::new(&config);
    let core = OrchestratorCore::new(db.clone(), external_db, adr, Arc::new(NullEmailService));
    let cancel = CancellationToken::new();
    let mut noop_progress = |_: i64, _: i64| {};
    let mut noop_substep = |_: &str| {};

    core.sync_accounts(&mut noop_progress, &mut noop_substep, &cancel)
        .await?;

    let synced = account::Entity::find()
        .filter(account::Column::VmAccountId.eq(9201i64))
        .one(&db)
        .await?
        .expect("account created by first sync");
    assert!(!synced.is_deleted);

    // An in-flight job exists for this account when it vanishes from the feed.
    let in_flight_job = insert_job(
        &db,
        synced.id,
        None,
        77,
        PeriodType::Monthly.as_str(),
        last_invoice,
        last_invoice + chrono::Duration::days(30),
        Utc::now().date_naive(),
        last_invoice,
        last_invoice + chrono::Duration::days(30),
        JobStatus::ScrapeInProgress.as_str(),
    )
    .await?;

    // The vendor feed no longer lists the account.
    external_handle
        .execute(Statement::from_string(
            DatabaseBackend::Sqlite,
            "DELETE FROM invoice_aggregation_feed WHERE vm_account_id = 9201".to_string(),
        ))
        .await?;

    core.sync_accounts(&mut noop_progress, &mut noop_substep, &cancel)
        .await?;

    let after_vanish = account::Entity::find_by_id(synced.id).one(&db).await?.unwrap();
    assert!(after_vanish.is_deleted);

    let untouched_job = job::Entity::find_by_id(in_flight_job.id).one(&db).await?.unwrap();
    assert_eq!(untouched_job.status, JobStatus::ScrapeInProgress.as_str());
    assert!(!untouched_job.is_deleted);

    Ok(())
}
