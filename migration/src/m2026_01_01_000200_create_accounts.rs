//! Migration to create the accounts table — the scraping target.

use sea_orm_migration::prelude::*;

use crate::m2026_01_01_000100_create_clients::Clients;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Accounts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Accounts::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Accounts::VmAccountId).big_integer().not_null())
                    .col(ColumnDef::new(Accounts::VmAccountNumber).text().not_null())
                    .col(ColumnDef::new(Accounts::InterfaceAccountId).text().null())
                    .col(ColumnDef::new(Accounts::ClientId).big_integer().not_null())
                    .col(ColumnDef::new(Accounts::ClientName).text().null())
                    .col(ColumnDef::new(Accounts::CredentialId).integer().not_null())
                    .col(ColumnDef::new(Accounts::VendorCode).text().null())
                    .col(ColumnDef::new(Accounts::PrimaryVendorCode).text().null())
                    .col(ColumnDef::new(Accounts::MasterVendorCode).text().null())
                    .col(ColumnDef::new(Accounts::MedianDays).double().null())
                    .col(
                        ColumnDef::new(Accounts::InvoiceCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Accounts::LastInvoiceAt)
                            .date()
                            .null(),
                    )
                    .col(ColumnDef::new(Accounts::ExpectedNextAt).date().null())
                    .col(ColumnDef::new(Accounts::ExpectedRangeStartAt).date().null())
                    .col(ColumnDef::new(Accounts::ExpectedRangeEndAt).date().null())
                    .col(ColumnDef::new(Accounts::DaysUntilNextRun).integer().null())
                    .col(ColumnDef::new(Accounts::NextRunStatus).text().null())
                    .col(ColumnDef::new(Accounts::HistoricalBillingStatus).text().null())
                    .col(
                        ColumnDef::new(Accounts::LastSuccessfulDownloadDate)
                            .date()
                            .null(),
                    )
                    .col(ColumnDef::new(Accounts::NextRunAt).date().null())
                    .col(ColumnDef::new(Accounts::NextRangeStartAt).date().null())
                    .col(ColumnDef::new(Accounts::NextRangeEndAt).date().null())
                    .col(ColumnDef::new(Accounts::PeriodType).text().null())
                    .col(
                        ColumnDef::new(Accounts::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Accounts::CreatedBy).text().not_null())
                    .col(
                        ColumnDef::new(Accounts::ModifiedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Accounts::ModifiedBy).text().not_null())
                    .col(
                        ColumnDef::new(Accounts::IsDeleted)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_accounts_client_id")
                            .from(Accounts::Table, Accounts::ClientId)
                            .to(Clients::Table, Clients::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_accounts_natural_key")
                    .table(Accounts::Table)
                    .col(Accounts::VmAccountId)
                    .col(Accounts::VmAccountNumber)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_accounts_is_deleted")
                    .table(Accounts::Table)
                    .col(Accounts::IsDeleted)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Accounts::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Accounts {
    Table,
    Id,
    VmAccountId,
    VmAccountNumber,
    InterfaceAccountId,
    ClientId,
    ClientName,
    CredentialId,
    VendorCode,
    PrimaryVendorCode,
    MasterVendorCode,
    MedianDays,
    InvoiceCount,
    LastInvoiceAt,
    ExpectedNextAt,
    ExpectedRangeStartAt,
    ExpectedRangeEndAt,
    DaysUntilNextRun,
    NextRunStatus,
    HistoricalBillingStatus,
    LastSuccessfulDownloadDate,
    NextRunAt,
    NextRangeStartAt,
    NextRangeEndAt,
    PeriodType,
    CreatedAt,
    CreatedBy,
    ModifiedAt,
    ModifiedBy,
    IsDeleted,
}
