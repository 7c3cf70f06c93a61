//! Migration to create the orchestration_runs table — one invocation of the
//! four-stage pipeline.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(OrchestrationRuns::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(OrchestrationRuns::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(OrchestrationRuns::RequestId).text().not_null())
                    .col(
                        ColumnDef::new(OrchestrationRuns::RequestedBy)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OrchestrationRuns::RequestedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OrchestrationRuns::StartedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(OrchestrationRuns::CompletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(OrchestrationRuns::Status)
                            .text()
                            .not_null()
                            .default("Queued"),
                    )
                    .col(ColumnDef::new(OrchestrationRuns::ErrorMessage).text().null())
                    .col(
                        ColumnDef::new(OrchestrationRuns::JobsCreated)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(OrchestrationRuns::CredentialsVerified)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(OrchestrationRuns::ScrapesRequested)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(OrchestrationRuns::StatusChecksPerformed)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(OrchestrationRuns::Errors)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(OrchestrationRuns::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(OrchestrationRuns::CreatedBy).text().not_null())
                    .col(
                        ColumnDef::new(OrchestrationRuns::ModifiedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(OrchestrationRuns::ModifiedBy).text().not_null())
                    .col(
                        ColumnDef::new(OrchestrationRuns::IsDeleted)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_orchestration_runs_status_started_at")
                    .table(OrchestrationRuns::Table)
                    .col(OrchestrationRuns::Status)
                    .col(OrchestrationRuns::StartedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(OrchestrationRuns::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum OrchestrationRuns {
    Table,
    Id,
    RequestId,
    RequestedBy,
    RequestedAt,
    StartedAt,
    CompletedAt,
    Status,
    ErrorMessage,
    JobsCreated,
    CredentialsVerified,
    ScrapesRequested,
    StatusChecksPerformed,
    Errors,
    CreatedAt,
    CreatedBy,
    ModifiedAt,
    ModifiedBy,
    IsDeleted,
}
