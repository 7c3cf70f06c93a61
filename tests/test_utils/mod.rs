//! Test utilities for database-backed integration tests.
//!
//! Sets up an in-memory SQLite database with all migrations applied, plus
//! fixture builders for each entity and a raw-SQL helper for the external
//! invoice-aggregation feed table (which lives outside this crate's own
//! migrations, since it represents a system we only read from).

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ActiveModelTrait, ConnectionTrait, Database, DatabaseConnection, Set, Statement};

use adr_orchestrator::models::{account, account_rule, blacklist_entry, client, configuration, job, SYSTEM_ACTOR};

/// Sets up an in-memory SQLite database with all migrations applied.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = Database::connect("sqlite::memory:").await?;
    Migrator::up(&db, None).await?;

    // SQLite does not enforce our Postgres foreign key semantics; disable FK
    // checks so fixtures can be inserted without satisfying every relation.
    db.execute(Statement::from_string(
        db.get_database_backend(),
        "PRAGMA foreign_keys = OFF".to_string(),
    ))
    .await?;

    Ok(db)
}

/// Creates the external `invoice_aggregation_feed` table read by
/// [`adr_orchestrator::sync::AccountSync`]. Not part of this crate's own
/// schema, so it has no migration; tests own its shape directly.
pub async fn setup_external_feed_db() -> Result<DatabaseConnection> {
    let db = Database::connect("sqlite::memory:").await?;
    db.execute(Statement::from_string(
        db.get_database_backend(),
        "CREATE TABLE invoice_aggregation_feed (
            vm_account_id INTEGER NOT NULL,
            credential_id INTEGER NOT NULL,
            client_id INTEGER,
            client_name TEXT,
            vendor_code TEXT,
            vm_account_number TEXT NOT NULL,
            interface_account_id TEXT,
            last_invoice_date TEXT,
            invoice_count INTEGER NOT NULL DEFAULT 0
        )"
        .to_string(),
    ))
    .await?;
    Ok(db)
}

#[allow(clippy::too_many_arguments)]
pub async fn insert_external_feed_row(
    db: &DatabaseConnection,
    vm_account_id: i64,
    credential_id: i32,
    client_id: Option<i32>,
    client_name: Option<&str>,
    vendor_code: Option<&str>,
    vm_account_number: &str,
    interface_account_id: Option<&str>,
    last_invoice_date: Option<NaiveDate>,
    invoice_count: i32,
) -> Result<()> {
    let stmt = Statement::from_string(
        db.get_database_backend(),
        format!(
            "INSERT INTO invoice_aggregation_feed (vm_account_id, credential_id, client_id, client_name, vendor_code, vm_account_number, interface_account_id, last_invoice_date, invoice_count) VALUES ({}, {}, {}, {}, {}, '{}', {}, {}, {})",
            vm_account_id,
            credential_id,
            client_id.map(|v| v.to_string()).unwrap_or_else(|| "NULL".to_string()),
            client_name.map(|v| format!("'{v}'")).unwrap_or_else(|| "NULL".to_string()),
            vendor_code.map(|v| format!("'{v}'")).unwrap_or_else(|| "NULL".to_string()),
            vm_account_number,
            interface_account_id.map(|v| format!("'{v}'")).unwrap_or_else(|| "NULL".to_string()),
            last_invoice_date.map(|v| format!("'{v}'")).unwrap_or_else(|| "NULL".to_string()),
            invoice_count,
        ),
    );
    db.execute(stmt).await?;
    Ok(())
}

pub struct ClientFixture {
    pub id: i64,
    pub external_client_id: i32,
}

pub async fn insert_client(db: &DatabaseConnection, external_client_id: i32, name: &str) -> Result<ClientFixture> {
    let now = Utc::now().fixed_offset();
    let active = client::ActiveModel {
        id: sea_orm::ActiveValue::NotSet,
        external_client_id: Set(external_client_id),
        name: Set(name.to_string()),
        code: Set(client::derive_code(name)),
        is_active: Set(true),
        last_synced_at: Set(Some(now)),
        created_at: Set(now),
        created_by: Set(SYSTEM_ACTOR.to_string()),
        modified_at: Set(now),
        modified_by: Set(SYSTEM_ACTOR.to_string()),
        is_deleted: Set(false),
    };
    let inserted = active.insert(db).await?;
    Ok(ClientFixture {
        id: inserted.id,
        external_client_id: inserted.external_client_id,
    })
}

#[allow(clippy::too_many_arguments)]
pub async fn insert_account(
    db: &DatabaseConnection,
    client_id: i64,
    vm_account_id: i64,
    vm_account_number: &str,
    credential_id: i32,
    period_type: &str,
    next_run_at: Option<NaiveDate>,
    next_range_start_at: Option<NaiveDate>,
    next_range_end_at: Option<NaiveDate>,
) -> Result<account::Model> {
    let now = Utc::now().fixed_offset();
    let active = account::ActiveModel {
        id: sea_orm::ActiveValue::NotSet,
        vm_account_id: Set(vm_account_id),
        vm_account_number: Set(vm_account_number.to_string()),
        interface_account_id: Set(None),
        client_id: Set(client_id),
        client_name: Set(None),
        credential_id: Set(credential_id),
        vendor_code: Set(None),
        primary_vendor_code: Set(None),
        master_vendor_code: Set(None),
        median_days: Set(Some(30.0)),
        invoice_count: Set(0),
        last_invoice_at: Set(None),
        expected_next_at: Set(next_run_at),
        expected_range_start_at: Set(next_range_start_at),
        expected_range_end_at: Set(next_range_end_at),
        days_until_next_run: Set(None),
        next_run_status: Set(None),
        historical_billing_status: Set(None),
        last_successful_download_date: Set(None),
        next_run_at: Set(next_run_at),
        next_range_start_at: Set(next_range_start_at),
        next_range_end_at: Set(next_range_end_at),
        period_type: Set(Some(period_type.to_string())),
        created_at: Set(now),
        created_by: Set(SYSTEM_ACTOR.to_string()),
        modified_at: Set(now),
        modified_by: Set(SYSTEM_ACTOR.to_string()),
        is_deleted: Set(false),
    };
    Ok(active.insert(db).await?)
}

#[allow(clippy::too_many_arguments)]
pub async fn insert_account_rule(
    db: &DatabaseConnection,
    account_id: i64,
    period_type: &str,
    period_days: i32,
    next_run_at: NaiveDate,
    next_range_start_at: NaiveDate,
    next_range_end_at: NaiveDate,
    is_manually_overridden: bool,
) -> Result<account_rule::Model> {
    let now = Utc::now().fixed_offset();
    let active = account_rule::ActiveModel {
        id: sea_orm::ActiveValue::NotSet,
        account_id: Set(account_id),
        job_type_id: Set(account_rule::DOWNLOAD_INVOICE_JOB_TYPE_ID),
        period_type: Set(period_type.to_string()),
        period_days: Set(Some(period_days)),
        next_run_at: Set(next_run_at),
        next_range_start_at: Set(next_range_start_at),
        next_range_end_at: Set(next_range_end_at),
        window_days_before: Set(None),
        window_days_after: Set(None),
        is_enabled: Set(true),
        is_manually_overridden: Set(is_manually_overridden),
        created_at: Set(now),
        created_by: Set(SYSTEM_ACTOR.to_string()),
        modified_at: Set(now),
        modified_by: Set(SYSTEM_ACTOR.to_string()),
        is_deleted: Set(false),
    };
    Ok(active.insert(db).await?)
}

#[allow(clippy::too_many_arguments)]
pub async fn insert_job(
    db: &DatabaseConnection,
    account_id: i64,
    account_rule_id: Option<i64>,
    credential_id: i32,
    period_type: &str,
    billing_period_start_at: NaiveDate,
    billing_period_end_at: NaiveDate,
    next_run_at: NaiveDate,
    next_range_start_at: NaiveDate,
    next_range_end_at: NaiveDate,
    status: &str,
) -> Result<job::Model> {
    let now = Utc::now().fixed_offset();
    let active = job::ActiveModel {
        id: sea_orm::ActiveValue::NotSet,
        account_id: Set(account_id),
        account_rule_id: Set(account_rule_id),
        credential_id: Set(credential_id),
        period_type: Set(period_type.to_string()),
        billing_period_start_at: Set(billing_period_start_at),
        billing_period_end_at: Set(billing_period_end_at),
        next_run_at: Set(next_run_at),
        next_range_start_at: Set(next_range_start_at),
        next_range_end_at: Set(next_range_end_at),
        status: Set(status.to_string()),
        adr_status_id: Set(None),
        adr_status_description: Set(None),
        adr_index_id: Set(None),
        is_missing: Set(false),
        retry_count: Set(0),
        credential_verified_at: Set(None),
        scraping_completed_at: Set(None),
        error_message: Set(None),
        last_status_check_response: Set(None),
        last_status_check_at: Set(None),
        created_at: Set(now),
        created_by: Set(SYSTEM_ACTOR.to_string()),
        modified_at: Set(now),
        modified_by: Set(SYSTEM_ACTOR.to_string()),
        is_deleted: Set(false),
    };
    Ok(active.insert(db).await?)
}

pub async fn insert_blacklist_entry(
    db: &DatabaseConnection,
    exclusion_type: &str,
    vm_account_id: Option<i64>,
) -> Result<blacklist_entry::Model> {
    let now = Utc::now().fixed_offset();
    let active = blacklist_entry::ActiveModel {
        id: sea_orm::ActiveValue::NotSet,
        primary_vendor_code: Set(None),
        master_vendor_code: Set(None),
        vm_account_id: Set(vm_account_id),
        vm_account_number: Set(None),
        credential_id: Set(None),
        exclusion_type: Set(exclusion_type.to_string()),
        effective_start: Set(None),
        effective_end: Set(None),
        is_active: Set(true),
        created_at: Set(now),
        created_by: Set(SYSTEM_ACTOR.to_string()),
        modified_at: Set(now),
        modified_by: Set(SYSTEM_ACTOR.to_string()),
        is_deleted: Set(false),
    };
    Ok(active.insert(db).await?)
}

pub async fn insert_configuration(
    db: &DatabaseConnection,
    overrides: impl FnOnce(&mut configuration::OrchestratorDefaults),
) -> Result<configuration::Model> {
    let mut defaults = configuration::OrchestratorDefaults::default();
    overrides(&mut defaults);

    let now = Utc::now().fixed_offset();
    let active = configuration::ActiveModel {
        id: sea_orm::ActiveValue::NotSet,
        batch_size: Set(defaults.batch_size),
        max_parallel_requests: Set(defaults.max_parallel_requests),
        daily_status_check_delay_days: Set(defaults.daily_status_check_delay_days),
        scrape_retry_days: Set(defaults.scrape_retry_days),
        credential_check_lead_days: Set(defaults.credential_check_lead_days),
        max_retries: Set(defaults.max_retries),
        test_mode_enabled: Set(defaults.test_mode_enabled),
        test_mode_max_scraping_jobs: Set(defaults.test_mode_max_scraping_jobs),
        test_mode_max_rebill_jobs: Set(defaults.test_mode_max_rebill_jobs),
        enable_detailed_logging: Set(defaults.enable_detailed_logging),
        is_orchestration_enabled: Set(defaults.is_orchestration_enabled),
        created_at: Set(now),
        created_by: Set(SYSTEM_ACTOR.to_string()),
        modified_at: Set(now),
        modified_by: Set(SYSTEM_ACTOR.to_string()),
        is_deleted: Set(false),
    };
    Ok(active.insert(db).await?)
}
