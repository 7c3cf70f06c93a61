//! JobExecution entity model — one remote-call attempt against the ADR
//! service.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "job_executions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub job_id: i64,
    pub request_type_id: i32,

    pub start_at: DateTimeWithTimeZone,
    pub end_at: Option<DateTimeWithTimeZone>,

    pub http_status: Option<i32>,
    pub adr_status_id: Option<i32>,
    pub adr_status_description: Option<String>,
    pub adr_index_id: Option<i32>,

    pub is_success: bool,
    pub is_error: bool,
    pub is_final: bool,

    pub error_message: Option<String>,
    pub api_response: Option<String>,
    pub request_payload: Option<String>,

    pub created_at: DateTimeWithTimeZone,
    pub created_by: String,
    pub modified_at: DateTimeWithTimeZone,
    pub modified_by: String,
    pub is_deleted: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::job::Entity",
        from = "Column::JobId",
        to = "super::job::Column::Id"
    )]
    Job,
}

impl Related<super::job::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Job.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// ADR request type ids (`ADRRequestTypeId` on the outbound wire contract).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdrRequestType {
    AttemptLogin = 1,
    DownloadInvoice = 2,
    Rebill = 3,
}
