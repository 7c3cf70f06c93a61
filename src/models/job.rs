//! Job entity model — one billing-window work item for one account.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::{Date, DateTimeWithTimeZone};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "jobs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub account_id: i64,
    pub account_rule_id: Option<i64>,
    pub credential_id: i32,
    pub period_type: String,

    pub billing_period_start_at: Date,
    pub billing_period_end_at: Date,

    pub next_run_at: Date,
    pub next_range_start_at: Date,
    pub next_range_end_at: Date,

    pub status: String,
    pub adr_status_id: Option<i32>,
    pub adr_status_description: Option<String>,
    pub adr_index_id: Option<i32>,

    pub is_missing: bool,
    pub retry_count: i32,

    pub credential_verified_at: Option<DateTimeWithTimeZone>,
    pub scraping_completed_at: Option<DateTimeWithTimeZone>,
    pub error_message: Option<String>,
    pub last_status_check_response: Option<String>,
    pub last_status_check_at: Option<DateTimeWithTimeZone>,

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
    #[sea_orm(
        belongs_to = "super::account_rule::Entity",
        from = "Column::AccountRuleId",
        to = "super::account_rule::Column::Id"
    )]
    AccountRule,
    #[sea_orm(has_many = "super::job_execution::Entity")]
    JobExecution,
}

impl Related<super::account::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Account.def()
    }
}

impl Related<super::account_rule::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AccountRule.def()
    }
}

impl Related<super::job_execution::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::JobExecution.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// The Job state machine. Stored as text in `jobs.status`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    CredentialCheckInProgress,
    CredentialVerified,
    CredentialFailed,
    ScrapeInProgress,
    ScrapeRequested,
    ScrapeFailed,
    StatusCheckInProgress,
    NeedsReview,
    NoInvoiceFound,
    Completed,
    Cancelled,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Pending => "Pending",
            JobStatus::CredentialCheckInProgress => "CredentialCheckInProgress",
            JobStatus::CredentialVerified => "CredentialVerified",
            JobStatus::CredentialFailed => "CredentialFailed",
            JobStatus::ScrapeInProgress => "ScrapeInProgress",
            JobStatus::ScrapeRequested => "ScrapeRequested",
            JobStatus::ScrapeFailed => "ScrapeFailed",
            JobStatus::StatusCheckInProgress => "StatusCheckInProgress",
            JobStatus::NeedsReview => "NeedsReview",
            JobStatus::NoInvoiceFound => "NoInvoiceFound",
            JobStatus::Completed => "Completed",
            JobStatus::Cancelled => "Cancelled",
        }
    }

    /// Terminal statuses satisfy the at-most-one-non-terminal-job invariant.
    /// `CredentialFailed`/`ScrapeFailed` are failure states but not terminal:
    /// they remain in the active population for retry/status-check until a
    /// later stage moves them to one of these three.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Cancelled | JobStatus::NoInvoiceFound
        )
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
