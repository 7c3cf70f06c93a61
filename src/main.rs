//! # ADR Orchestrator CLI
//!
//! Command-line entry point: runs database migrations or invokes a single
//! orchestrator operation against the configured database.

use std::sync::Arc;

use adr_orchestrator::config::ConfigLoader;
use adr_orchestrator::notification::NullEmailService;
use adr_orchestrator::orchestrator::OrchestratorCore;
use adr_orchestrator::{adr::client::AdrClient, db, telemetry};
use clap::{Parser, Subcommand};
use migration::{Migrator, MigratorTrait};
use sea_orm::DatabaseConnection;
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "adr-orchestrator")]
#[command(about = "Invoice-retrieval orchestrator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate {
        #[command(subcommand)]
        action: MigrateAction,
    },
    /// Pull the external invoice-aggregation feed into accounts/clients/rules
    SyncAccounts,
    /// Create Pending jobs for due account rules
    CreateJobs,
    /// Verify credentials for jobs nearing their scheduled run
    VerifyCredentials,
    /// Attempt invoice downloads for credential-verified jobs
    ProcessScraping,
    /// Poll status for jobs on their normal schedule
    CheckPendingStatuses,
    /// Poll status for every scraped/checking job, ignoring timing
    CheckAllScrapedStatuses,
    /// Cancel jobs whose window closed before they ever ran
    FinalizeStalePendingJobs,
    /// Fire an ad hoc credential check for every enabled account
    VerifyAllAccountCredentials,
    /// Fire a single out-of-band rebill request
    FireRebill {
        #[arg(long)]
        account_id: i64,
    },
    /// Run the startup-recovery sweep over interrupted runs
    Recover,
}

#[derive(Subcommand)]
enum MigrateAction {
    /// Apply all pending migrations
    Up,
    /// Rollback the last migration
    Down,
    /// Show migration status
    Status,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();

    let config_loader = ConfigLoader::new();
    let config = config_loader.load()?;

    telemetry::init_tracing(&config)?;

    let db = db::init_pool(&config).await?;

    let command = match cli.command {
        Commands::Migrate { action } => {
            return handle_migrate_command(&db, action).await;
        }
        other => other,
    };

    if config.profile == "local" || config.profile == "test" {
        log::info!(
            "running migrations automatically for profile: {}",
            config.profile
        );
        Migrator::up(&db, None).await?;
    }

    let external_db = db::init_external_pool(&config).await?;
    let adr = AdrClient::new(&config);
    let core = OrchestratorCore::new(db, external_db, adr, Arc::new(NullEmailService));

    let recovery = core
        .recover_from_restart(chrono::Utc::now(), config.grace_period_minutes)
        .await?;
    if recovery.runs_interrupted > 0 {
        log::warn!(
            "startup recovery marked {} run(s) interrupted; most recent run id {:?}",
            recovery.runs_interrupted,
            recovery.most_recently_interrupted_run_id
        );
    }

    let cancel = CancellationToken::new();
    let mut report_progress = |current: i64, total: i64| {
        log::info!("progress: {current}/{total}");
    };

    match command {
        Commands::Migrate { .. } => unreachable!("handled above"),
        Commands::SyncAccounts => {
            let mut report_substep = |substep: &str| {
                log::info!("sync_accounts: {substep}");
            };
            let result = core
                .sync_accounts(&mut report_progress, &mut report_substep, &cancel)
                .await?;
            println!("{result:?}");
        }
        Commands::CreateJobs => {
            let result = core.create_jobs(&mut report_progress, &cancel).await?;
            println!("{result:?}");
        }
        Commands::VerifyCredentials => {
            let result = core.verify_credentials(&mut report_progress, &cancel).await?;
            println!("{result:?}");
        }
        Commands::ProcessScraping => {
            let result = core.process_scraping(&mut report_progress, &cancel).await?;
            println!("{result:?}");
        }
        Commands::CheckPendingStatuses => {
            let result = core
                .check_pending_statuses(&mut report_progress, &cancel)
                .await?;
            println!("{result:?}");
        }
        Commands::CheckAllScrapedStatuses => {
            let result = core
                .check_all_scraped_statuses(&mut report_progress, &cancel)
                .await?;
            println!("{result:?}");
        }
        Commands::FinalizeStalePendingJobs => {
            let result = core
                .finalize_stale_pending_jobs(&mut report_progress, &cancel)
                .await?;
            println!("{result:?}");
        }
        Commands::VerifyAllAccountCredentials => {
            let result = core
                .verify_all_account_credentials(&mut report_progress, &cancel)
                .await?;
            println!("{result:?}");
        }
        Commands::FireRebill { account_id } => {
            let result = core.fire_rebill_for_account(account_id, &cancel).await?;
            println!("{result:?}");
        }
        Commands::Recover => {
            println!("{recovery:?}");
        }
    }

    Ok(())
}

async fn handle_migrate_command(
    db: &DatabaseConnection,
    action: MigrateAction,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    match action {
        MigrateAction::Up => {
            println!("Applying migrations...");
            Migrator::up(db, None).await?;
            println!("All migrations applied successfully");
        }
        MigrateAction::Down => {
            println!("Rolling back last migration...");
            Migrator::down(db, Some(1)).await?;
            println!("Migration rolled back successfully");
        }
        MigrateAction::Status => {
            println!("Checking migration status...");
            let applied = Migrator::get_applied_migrations(db).await?;
            let pending = Migrator::get_pending_migrations(db).await?;

            if applied.is_empty() {
                println!("No migrations have been applied");
            } else {
                println!("Applied migrations: {} migration(s)", applied.len());
            }

            if pending.is_empty() {
                println!("No pending migrations");
            } else {
                println!("Pending migrations: {} migration(s)", pending.len());
            }
        }
    }
    Ok(())
}
