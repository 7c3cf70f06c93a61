//! AccountRule entity model — the per-account scheduling configuration;
//! the single source of truth for "when to run next".

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::{Date, DateTimeWithTimeZone};

/// `job_type_id` denoting DownloadInvoice, the only job type this core
/// schedules.
pub const DOWNLOAD_INVOICE_JOB_TYPE_ID: i32 = 2;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "account_rules")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub account_id: i64,
    pub job_type_id: i32,

    pub period_type: String,
    pub period_days: Option<i32>,
    pub next_run_at: Date,
    pub next_range_start_at: Date,
    pub next_range_end_at: Date,
    pub window_days_before: Option<i32>,
    pub window_days_after: Option<i32>,

    pub is_enabled: bool,
    pub is_manually_overridden: bool,

    pub created_at: DateTimeWithTimeZone,
    pub created_by: String,
    pub modified_at: DateTimeWithTimeZone,
    pub modified_by: String,
    pub is_deleted: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::account::Entity",
        from = "Column::AccountId",
        to = "super::account::Column::Id"
    )]
    Account,
}

impl Related<super::account::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Account.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
