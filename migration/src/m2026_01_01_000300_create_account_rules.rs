//! Migration to create the account_rules table — the per-account scheduling
//! configuration; the single source of truth for "when to run next".

use sea_orm_migration::prelude::*;

use crate::m2026_01_01_000200_create_accounts::Accounts;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AccountRules::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AccountRules::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AccountRules::AccountId).big_integer().not_null())
                    .col(
                        ColumnDef::new(AccountRules::JobTypeId)
                            .integer()
                            .not_null()
                            .default(2),
                    )
                    .col(ColumnDef::new(AccountRules::PeriodType).text().not_null())
                    .col(ColumnDef::new(AccountRules::PeriodDays).integer().null())
                    .col(ColumnDef::new(AccountRules::NextRunAt).date().not_null())
                    .col(
                        ColumnDef::new(AccountRules::NextRangeStartAt)
                            .date()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AccountRules::NextRangeEndAt)
                            .date()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AccountRules::WindowDaysBefore)
                            .integer()
                            .null(),
                    )
                    .col(ColumnDef::new(AccountRules::WindowDaysAfter).integer().null())
                    .col(
                        ColumnDef::new(AccountRules::IsEnabled)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(AccountRules::IsManuallyOverridden)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(AccountRules::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(AccountRules::CreatedBy).text().not_null())
                    .col(
                        ColumnDef::new(AccountRules::ModifiedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(AccountRules::ModifiedBy).text().not_null())
                    .col(
                        ColumnDef::new(AccountRules::IsDeleted)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_account_rules_account_id")
                            .from(AccountRules::Table, AccountRules::AccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_account_rules_account_job_type")
                    .table(AccountRules::Table)
                    .col(AccountRules::AccountId)
                    .col(AccountRules::JobTypeId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_account_rules_enabled_next_run")
                    .table(AccountRules::Table)
                    .col(AccountRules::IsEnabled)
                    .col(AccountRules::NextRunAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AccountRules::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum AccountRules {
    Table,
    Id,
    AccountId,
    JobTypeId,
    PeriodType,
    PeriodDays,
    NextRunAt,
    NextRangeStartAt,
    NextRangeEndAt,
    WindowDaysBefore,
    WindowDaysAfter,
    IsEnabled,
    IsManuallyOverridden,
    CreatedAt,
    CreatedBy,
    ModifiedAt,
    ModifiedBy,
    IsDeleted,
}
