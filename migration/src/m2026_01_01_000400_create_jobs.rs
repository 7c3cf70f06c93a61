//! Migration to create the jobs table — one billing-window work item per
//! account, driven through the ADR pipeline's state machine.

use sea_orm_migration::prelude::*;

use crate::m2026_01_01_000200_create_accounts::Accounts;
use crate::m2026_01_01_000300_create_account_rules::AccountRules;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Jobs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Jobs::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Jobs::AccountId).big_integer().not_null())
                    .col(ColumnDef::new(Jobs::AccountRuleId).big_integer().null())
                    .col(ColumnDef::new(Jobs::CredentialId).integer().not_null())
                    .col(ColumnDef::new(Jobs::PeriodType).text().not_null())
                    .col(
                        ColumnDef::new(Jobs::BillingPeriodStartAt)
                            .date()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Jobs::BillingPeriodEndAt).date().not_null())
                    .col(ColumnDef::new(Jobs::NextRunAt).date().not_null())
                    .col(ColumnDef::new(Jobs::NextRangeStartAt).date().not_null())
                    .col(ColumnDef::new(Jobs::NextRangeEndAt).date().not_null())
                    .col(
                        ColumnDef::new(Jobs::Status)
                            .text()
                            .not_null()
                            .default("Pending"),
                    )
                    .col(ColumnDef::new(Jobs::AdrStatusId).integer().null())
                    .col(ColumnDef::new(Jobs::AdrStatusDescription).text().null())
                    .col(ColumnDef::new(Jobs::AdrIndexId).integer().null())
                    .col(
                        ColumnDef::new(Jobs::IsMissing)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Jobs::RetryCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Jobs::CredentialVerifiedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Jobs::ScrapingCompletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(Jobs::ErrorMessage).text().null())
                    .col(
                        ColumnDef::new(Jobs::LastStatusCheckResponse)
                            .text()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Jobs::LastStatusCheckAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Jobs::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Jobs::CreatedBy).text().not_null())
                    .col(
                        ColumnDef::new(Jobs::ModifiedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Jobs::ModifiedBy).text().not_null())
                    .col(
                        ColumnDef::new(Jobs::IsDeleted)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_jobs_account_id")
                            .from(Jobs::Table, Jobs::AccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_jobs_account_rule_id")
                            .from(Jobs::Table, Jobs::AccountRuleId)
                            .to(AccountRules::Table, AccountRules::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_jobs_billing_period_unique")
                    .table(Jobs::Table)
                    .col(Jobs::AccountId)
                    .col(Jobs::BillingPeriodStartAt)
                    .col(Jobs::BillingPeriodEndAt)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_jobs_status_next_range_end")
                    .table(Jobs::Table)
                    .col(Jobs::Status)
                    .col(Jobs::NextRangeEndAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Jobs::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Jobs {
    Table,
    Id,
    AccountId,
    AccountRuleId,
    CredentialId,
    PeriodType,
    BillingPeriodStartAt,
    BillingPeriodEndAt,
    NextRunAt,
    NextRangeStartAt,
    NextRangeEndAt,
    Status,
    AdrStatusId,
    AdrStatusDescription,
    AdrIndexId,
    IsMissing,
    RetryCount,
    CredentialVerifiedAt,
    ScrapingCompletedAt,
    ErrorMessage,
    LastStatusCheckResponse,
    LastStatusCheckAt,
    CreatedAt,
    CreatedBy,
    ModifiedAt,
    ModifiedBy,
    IsDeleted,
}
