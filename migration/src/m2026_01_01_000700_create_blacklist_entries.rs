//! Migration to create the blacklist_entries table — account-exclusion
//! entries consulted by the blacklist filter.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(BlacklistEntries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BlacklistEntries::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(BlacklistEntries::PrimaryVendorCode)
                            .text()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(BlacklistEntries::MasterVendorCode)
                            .text()
                            .null(),
                    )
                    .col(ColumnDef::new(BlacklistEntries::VmAccountId).big_integer().null())
                    .col(ColumnDef::new(BlacklistEntries::VmAccountNumber).text().null())
                    .col(ColumnDef::new(BlacklistEntries::CredentialId).integer().null())
                    .col(
                        ColumnDef::new(BlacklistEntries::ExclusionType)
                            .text()
                            .not_null()
                            .default("All"),
                    )
                    .col(
                        ColumnDef::new(BlacklistEntries::EffectiveStart)
                            .date()
                            .null(),
                    )
                    .col(ColumnDef::new(BlacklistEntries::EffectiveEnd).date().null())
                    .col(
                        ColumnDef::new(BlacklistEntries::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(BlacklistEntries::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(BlacklistEntries::CreatedBy).text().not_null())
                    .col(
                        ColumnDef::new(BlacklistEntries::ModifiedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(BlacklistEntries::ModifiedBy).text().not_null())
                    .col(
                        ColumnDef::new(BlacklistEntries::IsDeleted)
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
                    .name("idx_blacklist_entries_active_window")
                    .table(BlacklistEntries::Table)
                    .col(BlacklistEntries::IsActive)
                    .col(BlacklistEntries::ExclusionType)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(BlacklistEntries::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum BlacklistEntries {
    Table,
    Id,
    PrimaryVendorCode,
    MasterVendorCode,
    VmAccountId,
    VmAccountNumber,
    CredentialId,
    ExclusionType,
    EffectiveStart,
    EffectiveEnd,
    IsActive,
    CreatedAt,
    CreatedBy,
    ModifiedAt,
    ModifiedBy,
    IsDeleted,
}
