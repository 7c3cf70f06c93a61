//! Database migrations for the invoice-retrieval orchestrator.
//!
//! This crate contains all database migrations using SeaORM Migration.

pub use sea_orm_migration::prelude::*;

mod m2026_01_01_000100_create_clients;
mod m2026_01_01_000200_create_accounts;
mod m2026_01_01_000300_create_account_rules;
mod m2026_01_01_000400_create_jobs;
mod m2026_01_01_000500_create_job_executions;
mod m2026_01_01_000600_create_orchestration_runs;
mod m2026_01_01_000700_create_blacklist_entries;
mod m2026_01_01_000800_create_configuration;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m2026_01_01_000100_create_clients::Migration),
            Box::new(m2026_01_01_000200_create_accounts::Migration),
            Box::new(m2026_01_01_000300_create_account_rules::Migration),
            Box::new(m2026_01_01_000400_create_jobs::Migration),
            Box::new(m2026_01_01_000500_create_job_executions::Migration),
            Box::new(m2026_01_01_000600_create_orchestration_runs::Migration),
            Box::new(m2026_01_01_000700_create_blacklist_entries::Migration),
            Box::new(m2026_01_01_000800_create_configuration::Migration),
        ]
    }
}
