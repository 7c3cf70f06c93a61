//! Manual status-check mode (spec §4.3) must reconcile jobs parked in
//! `StatusCheckInProgress` by an interrupted prior sweep, not just the ones
//! still sitting in `ScrapeRequested`.

#[path = "test_utils/mod.rs"]
mod test_utils;

use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use sea_orm::EntityTrait;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

use adr_orchestrator::config::AppConfig;
use adr_orchestrator::models::job::{self, JobStatus};
use adr_orchestrator::notification::NullEmailService;
use adr_orchestrator::orchestrator::OrchestratorCore;
use adr_orchestrator::{adr::client::AdrClient, billing::PeriodType};

use test_utils::{insert_account, insert_account_rule, insert_client, insert_job, setup_test_db};

#[tokio::test]
async fn manual_sweep_reconciles_a_job_stuck_in_status_check_in_progress() -> Result<()> {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex("^/GetRequestStatusByJobId/.*$"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"statusId":11,"isFinal":true}"#))
        .mount(&mock_server)
        .await;

    let db = setup_test_db().await?;
    let external_db = test_utils::setup_external_feed_db().await?;
    let config = AppConfig {
        adr_base_url: mock_server.uri(),
        ..AppConfig::default()
    };
    let adr = AdrClient::new(&config);
    let core = OrchestratorCore::new(db.clone(), external_db, adr, Arc::new(NullEmailService));
    let cancel = CancellationToken::new();

    let client = insert_client(&db, 603, "Zeta Co").await?;
    let today = Utc::now().date_naive();
    let window_end = today + chrono::Duration::days(5);
    let account_model = insert_account(
        &db,
        client.id,
        9103,
        "A-9103",
        57,
        PeriodType::Monthly.as_str(),
        Some(today),
        Some(today),
        Some(window_end),
    )
    .await?;
    let rule = insert_account_rule(
        &db,
        account_model.id,
        PeriodType::Monthly.as_str(),
        30,
        today,
        today,
        window_end,
        false,
    )
    .await?;
    // Left behind by an interrupted prior sweep: neither `ScrapeRequested`
    // nor `CredentialCheckInProgress`, so the old shared base condition
    // would silently skip it.
    let stuck_job = insert_job(
        &db,
        account_model.id,
        Some(rule.id),
        57,
        PeriodType::Monthly.as_str(),
        today,
        window_end,
        today,
        today,
        window_end,
        JobStatus::StatusCheckInProgress.as_str(),
    )
    .await?;

    let mut noop = |_: i64, _: i64| {};
    core.check_all_scraped_statuses(&mut noop, &cancel).await?;

    let finalized = job::Entity::find_by_id(stuck_job.id).one(&db).await?.unwrap();
    assert_eq!(finalized.status, JobStatus::Completed.as_str());

    Ok(())
}
