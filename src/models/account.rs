//! Account entity model — the scraping target.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::{Date, DateTimeWithTimeZone};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    // Natural key: (vm_account_id, vm_account_number).
    pub vm_account_id: i64,
    pub vm_account_number: String,

    // Identity
    pub interface_account_id: Option<String>,
    pub client_id: i64,
    pub client_name: Option<String>,
    pub credential_id: i32,
    pub vendor_code: Option<String>,
    pub primary_vendor_code: Option<String>,
    pub master_vendor_code: Option<String>,

    // Historical / derived — never manually overridden.
    pub median_days: Option<f64>,
    pub invoice_count: i32,
    pub last_invoice_at: Option<Date>,
    pub expected_next_at: Option<Date>,
    pub expected_range_start_at: Option<Date>,
    pub expected_range_end_at: Option<Date>,
    pub days_until_next_run: Option<i32>,
    pub next_run_status: Option<String>,
    pub historical_billing_status: Option<String>,
    pub last_successful_download_date: Option<Date>,

    // Denormalized scheduling mirror, kept in sync with the active Rule.
    pub next_run_at: Option<Date>,
    pub next_range_start_at: Option<Date>,
    pub next_range_end_at: Option<Date>,
    pub period_type: Option<String>,

    pub created_at: DateTimeWithTimeZone,
    pub created_by: String,
    pub modified_at: DateTimeWithTimeZone,
    pub modified_by: String,
    pub is_deleted: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::client::Entity",
        from = "Column::ClientId",
        to = "super::client::Column::Id"
    )]
    Client,
    #[sea_orm(has_many = "super::account_rule::Entity")]
    AccountRule,
    #[sea_orm(has_many = "super::job::Entity")]
    Job,
}

impl Related<super::client::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Client.def()
    }
}

impl Related<super::account_rule::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AccountRule.def()
    }
}

impl Related<super::job::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Job.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Classification buckets shared by `next_run_status` and
/// `historical_billing_status`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BillingStatus {
    Missing,
    Overdue,
    DueNow,
    DueSoon,
    Upcoming,
    Future,
    RunNow,
}

impl BillingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            BillingStatus::Missing => "Missing",
            BillingStatus::Overdue => "Overdue",
            BillingStatus::DueNow => "Due Now",
            BillingStatus::DueSoon => "Due Soon",
            BillingStatus::Upcoming => "Upcoming",
            BillingStatus::Future => "Future",
            BillingStatus::RunNow => "Run Now",
        }
    }
}
