//! Migration to create the job_executions table — one remote-call attempt
//! against the ADR service.

use sea_orm_migration::prelude::*;

use crate::m2026_01_01_000400_create_jobs::Jobs;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(JobExecutions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(JobExecutions::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(JobExecutions::JobId).big_integer().not_null())
                    .col(
                        ColumnDef::new(JobExecutions::RequestTypeId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(JobExecutions::StartAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(JobExecutions::EndAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(JobExecutions::HttpStatus).integer().null())
                    .col(ColumnDef::new(JobExecutions::AdrStatusId).integer().null())
                    .col(
                        ColumnDef::new(JobExecutions::AdrStatusDescription)
                            .text()
                            .null(),
                    )
                    .col(ColumnDef::new(JobExecutions::AdrIndexId).integer().null())
                    .col(
                        ColumnDef::new(JobExecutions::IsSuccess)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(JobExecutions::IsError)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(JobExecutions::IsFinal)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(JobExecutions::ErrorMessage).text().null())
                    .col(ColumnDef::new(JobExecutions::ApiResponse).text().null())
                    .col(ColumnDef::new(JobExecutions::RequestPayload).text().null())
                    .col(
                        ColumnDef::new(JobExecutions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(JobExecutions::CreatedBy).text().not_null())
                    .col(
                        ColumnDef::new(JobExecutions::ModifiedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(JobExecutions::ModifiedBy).text().not_null())
                    .col(
                        ColumnDef::new(JobExecutions::IsDeleted)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_job_executions_job_id")
                            .from(JobExecutions::Table, JobExecutions::JobId)
                            .to(Jobs::Table, Jobs::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_job_executions_job_id_start_at")
                    .table(JobExecutions::Table)
                    .col(JobExecutions::JobId)
                    .col(JobExecutions::StartAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(JobExecutions::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum JobExecutions {
    Table,
    Id,
    JobId,
    RequestTypeId,
    StartAt,
    EndAt,
    HttpStatus,
    AdrStatusId,
    AdrStatusDescription,
    AdrIndexId,
    IsSuccess,
    IsError,
    IsFinal,
    ErrorMessage,
    ApiResponse,
    RequestPayload,
    CreatedAt,
    CreatedBy,
    ModifiedAt,
    ModifiedBy,
    IsDeleted,
}
