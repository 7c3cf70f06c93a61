//! End-to-end job lifecycle scenarios driven entirely through
//! `OrchestratorCore`'s public API, mocking the ADR HTTP surface with
//! wiremock.

#[path = "test_utils/mod.rs"]
mod test_utils;

use std::sync::Arc;

use anyhow::Result;
use chrono::{Duration as ChronoDuration, NaiveDate, Utc};
use sea_orm::{DatabaseConnection, EntityTrait};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use adr_orchestrator::config::AppConfig;
use adr_orchestrator::models::job::JobStatus;
use adr_orchestrator::models::{account, account_rule, job};
use adr_orchestrator::notification::NullEmailService;
use adr_orchestrator::orchestrator::OrchestratorCore;
use adr_orchestrator::{adr::client::AdrClient, billing::PeriodType};

use test_utils::{insert_account, insert_account_rule, insert_client, setup_test_db};

/// Builds a core against a fresh in-memory db, returning a clone of the
/// connection for fixture setup/assertions (the core itself keeps its own
/// handle private).
async fn build_core(adr_base_url: &str) -> Result<(OrchestratorCore, DatabaseConnection)> {
    let db = setup_test_db().await?;
    let external_db = test_utils::setup_external_feed_db().await?;
    let config = AppConfig {
        adr_base_url: adr_base_url.to_string(),
        ..AppConfig::default()
    };
    let adr = AdrClient::new(&config);
    let assertions_db = db.clone();
    let core = OrchestratorCore::new(db, external_db, adr, Arc::new(NullEmailService));
    Ok((core, assertions_db))
}

/// S1: a fresh monthly account runs the full Pending -> CredentialVerified
/// -> Completed lifecycle and its rule advances by one period.
#[tokio::test]
async fn fresh_monthly_account_completes_and_advances_rule() -> Result<()> {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/IngestAdrRequest"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"statusId":11,"isFinal":true}"#))
        .mount(&mock_server)
        .await;

    let (core, db) = build_core(&mock_server.uri()).await?;
    let cancel = CancellationToken::new();

    let client = insert_client(&db, 501, "Acme Corp").await?;
    let today = Utc::now().date_naive();
    let account_model = insert_account(
        &db,
        client.id,
        9001,
        "A-9001",
        42,
        PeriodType::Monthly.as_str(),
        Some(today),
        Some(today - ChronoDuration::days(5)),
        Some(today + ChronoDuration::days(5)),
    )
    .await?;
    let rule = insert_account_rule(
        &db,
        account_model.id,
        PeriodType::Monthly.as_str(),
        30,
        today,
        today - ChronoDuration::days(5),
        today + ChronoDuration::days(5),
        false,
    )
    .await?;

    let mut noop = |_: i64, _: i64| {};
    core.create_jobs(&mut noop, &cancel).await?;
    core.verify_credentials(&mut noop, &cancel).await?;
    core.process_scraping(&mut noop, &cancel).await?;

    let jobs = job::Entity::find().all(&db).await?;
    assert_eq!(jobs.len(), 1);
    let completed_job = &jobs[0];
    assert_eq!(completed_job.status, JobStatus::Completed.as_str());
    assert!(completed_job.scraping_completed_at.is_some());

    let advanced_rule = account_rule::Entity::find_by_id(rule.id).one(&db).await?.unwrap();
    assert!(advanced_rule.next_run_at > rule.next_run_at);

    let advanced_account = account::Entity::find_by_id(account_model.id)
        .one(&db)
        .await?
        .unwrap();
    assert_eq!(advanced_account.next_run_at, Some(advanced_rule.next_run_at));
    assert_eq!(
        advanced_account.last_successful_download_date,
        Some(rule.next_run_at)
    );

    Ok(())
}

/// S2: a manually-overridden rule is left untouched by rule advancement even
/// after its job completes.
#[tokio::test]
async fn manually_overridden_rule_does_not_advance_after_completion() -> Result<()> {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/IngestAdrRequest"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"statusId":11,"isFinal":true}"#))
        .mount(&mock_server)
        .await;

    let (core, db) = build_core(&mock_server.uri()).await?;
    let cancel = CancellationToken::new();

    let client = insert_client(&db, 502, "Beta LLC").await?;
    let today = Utc::now().date_naive();
    let account_model = insert_account(
        &db,
        client.id,
        9002,
        "A-9002",
        43,
        PeriodType::Monthly.as_str(),
        Some(today),
        Some(today - ChronoDuration::days(5)),
        Some(today + ChronoDuration::days(5)),
    )
    .await?;
    let rule = insert_account_rule(
        &db,
        account_model.id,
        PeriodType::Monthly.as_str(),
        30,
        today,
        today - ChronoDuration::days(5),
        today + ChronoDuration::days(5),
        true,
    )
    .await?;

    let mut noop = |_: i64, _: i64| {};
    core.create_jobs(&mut noop, &cancel).await?;
    core.verify_credentials(&mut noop, &cancel).await?;
    core.process_scraping(&mut noop, &cancel).await?;

    let jobs = job::Entity::find().all(&db).await?;
    assert_eq!(jobs[0].status, JobStatus::Completed.as_str());

    let unchanged_rule = account_rule::Entity::find_by_id(rule.id).one(&db).await?.unwrap();
    assert_eq!(unchanged_rule.next_run_at, rule.next_run_at);
    assert_eq!(unchanged_rule.next_range_start_at, rule.next_range_start_at);
    assert_eq!(unchanged_rule.next_range_end_at, rule.next_range_end_at);

    Ok(())
}

/// S4: two consecutive completions never push `last_successful_download_date`
/// past the expected cadence step, even when this round's job runs "late".
#[tokio::test]
async fn late_completion_does_not_creep_last_successful_download_date() -> Result<()> {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/IngestAdrRequest"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"statusId":11,"isFinal":true}"#))
        .mount(&mock_server)
        .await;

    let (core, db) = build_core(&mock_server.uri()).await?;
    let cancel = CancellationToken::new();

    let client = insert_client(&db, 503, "Gamma Inc").await?;
    let first_run: NaiveDate = Utc::now().date_naive() - ChronoDuration::days(60);
    let account_model = insert_account(
        &db,
        client.id,
        9003,
        "A-9003",
        44,
        PeriodType::Monthly.as_str(),
        Some(first_run),
        Some(first_run - ChronoDuration::days(5)),
        Some(first_run + ChronoDuration::days(5)),
    )
    .await?;
    insert_account_rule(
        &db,
        account_model.id,
        PeriodType::Monthly.as_str(),
        30,
        first_run,
        first_run - ChronoDuration::days(5),
        first_run + ChronoDuration::days(5),
        false,
    )
    .await?;

    let mut noop = |_: i64, _: i64| {};
    // First cycle completes on schedule.
    core.create_jobs(&mut noop, &cancel).await?;
    core.verify_credentials(&mut noop, &cancel).await?;
    core.process_scraping(&mut noop, &cancel).await?;

    let after_first = account::Entity::find_by_id(account_model.id).one(&db).await?.unwrap();
    let expected_second_run = after_first.next_run_at.unwrap();
    assert_eq!(after_first.last_successful_download_date, Some(first_run));

    // Second cycle's job is scheduled for `expected_second_run`; the stored
    // anchor is the job's own `next_run_at`, not actual completion time, so
    // a "late" vendor delivery cannot push it past that date.
    core.create_jobs(&mut noop, &cancel).await?;
    core.verify_credentials(&mut noop, &cancel).await?;
    core.process_scraping(&mut noop, &cancel).await?;

    let after_second = account::Entity::find_by_id(account_model.id).one(&db).await?.unwrap();
    assert_eq!(
        after_second.last_successful_download_date,
        Some(expected_second_run)
    );

    Ok(())
}
