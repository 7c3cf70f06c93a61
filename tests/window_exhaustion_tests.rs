//! S3 (spec §8): a job stuck in `StatusCheckInProgress` whose billing window
//! has closed is converted to `NoInvoiceFound` by the window-exhaustion
//! sweep inside status-check, rather than being retried forever.

#[path = "test_utils/mod.rs"]
mod test_utils;

use std::sync::Arc;

use anyhow::Result;
use chrono::{Duration as ChronoDuration, Utc};
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
async fn expired_window_job_becomes_no_invoice_found() -> Result<()> {
    let mock_server = MockServer::start().await;
    // The vendor's status endpoint is unreachable; every status-check call
    // transport-errors, so the job never leaves `StatusCheckInProgress`
    // through the ordinary apply path.
    Mock::given(method("GET"))
        .and(path_regex("^/GetRequestStatusByJobId/.*$"))
        .respond_with(ResponseTemplate::new(500))
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

    let client = insert_client(&db, 601, "Delta Co").await?;
    let closed_window_end = Utc::now().date_naive() - ChronoDuration::days(1);
    let closed_window_start = closed_window_end - ChronoDuration::days(10);
    let account_model = insert_account(
        &db,
        client.id,
        9101,
        "A-9101",
        55,
        PeriodType::Monthly.as_str(),
        Some(closed_window_start),
        Some(closed_window_start),
        Some(closed_window_end),
    )
    .await?;
    let rule = insert_account_rule(
        &db,
        account_model.id,
        PeriodType::Monthly.as_str(),
        30,
        closed_window_start,
        closed_window_start,
        closed_window_end,
        false,
    )
    .await?;
    let stuck_job = insert_job(
        &db,
        account_model.id,
        Some(rule.id),
        55,
        PeriodType::Monthly.as_str(),
        closed_window_start,
        closed_window_end,
        closed_window_start,
        closed_window_start,
        closed_window_end,
        JobStatus::ScrapeRequested.as_str(),
    )
    .await?;

    let mut noop = |_: i64, _: i64| {};
    core.check_all_scraped_statuses(&mut noop, &cancel).await?;

    let finalized = job::Entity::find_by_id(stuck_job.id).one(&db).await?.unwrap();
    assert_eq!(finalized.status, JobStatus::NoInvoiceFound.as_str());
    assert!(finalized.scraping_completed_at.is_some());

    Ok(())
}

/// A non-final, in-flight status response (rather than a transport error)
/// must not revert a past-window job back to `ScrapeRequested` — it should
/// be caught as exhausted before the revert ever happens.
#[tokio::test]
async fn in_flight_response_past_window_becomes_no_invoice_found() -> Result<()> {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex("^/GetRequestStatusByJobId/.*$"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"statusId":1,"isFinal":false}"#))
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

    let client = insert_client(&db, 602, "Epsilon Co").await?;
    let closed_window_end = Utc::now().date_naive() - ChronoDuration::days(1);
    let closed_window_start = closed_window_end - ChronoDuration::days(10);
    let account_model = insert_account(
        &db,
        client.id,
        9102,
        "A-9102",
        56,
        PeriodType::Monthly.as_str(),
        Some(closed_window_start),
        Some(closed_window_start),
        Some(closed_window_end),
    )
    .await?;
    let rule = insert_account_rule(
        &db,
        account_model.id,
        PeriodType::Monthly.as_str(),
        30,
        closed_window_start,
        closed_window_start,
        closed_window_end,
        false,
    )
    .await?;
    let stuck_job = insert_job(
        &db,
        account_model.id,
        Some(rule.id),
        56,
        PeriodType::Monthly.as_str(),
        closed_window_start,
        closed_window_end,
        closed_window_start,
        closed_window_start,
        closed_window_end,
        JobStatus::ScrapeRequested.as_str(),
    )
    .await?;

    let mut noop = |_: i64, _: i64| {};
    core.check_all_scraped_statuses(&mut noop, &cancel).await?;

    let finalized = job::Entity::find_by_id(stuck_job.id).one(&db).await?.unwrap();
    assert_eq!(finalized.status, JobStatus::NoInvoiceFound.as_str());
    assert!(finalized.scraping_completed_at.is_some());

    Ok(())
}
