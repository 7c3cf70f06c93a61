//! BlacklistEntry entity model — account-exclusion entries consulted by the
//! blacklist filter.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::{Date, DateTimeWithTimeZone};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "blacklist_entries")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub primary_vendor_code: Option<String>,
    pub master_vendor_code: Option<String>,
    pub vm_account_id: Option<i64>,
    pub vm_account_number: Option<String>,
    pub credential_id: Option<i32>,

    pub exclusion_type: String,
    pub effective_start: Option<Date>,
    pub effective_end: Option<Date>,
    pub is_active: bool,

    pub created_at: DateTimeWithTimeZone,
    pub created_by: String,
    pub modified_at: DateTimeWithTimeZone,
    pub modified_by: String,
    pub is_deleted: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExclusionType {
    All,
    Download,
    Rebill,
}

impl ExclusionType {
    pub fn as_str(self) -> &'static str {
        match self {
            ExclusionType::All => "All",
            ExclusionType::Download => "Download",
            ExclusionType::Rebill => "Rebill",
        }
    }

    pub fn matches_requested(self, requested: ExclusionType) -> bool {
        self == ExclusionType::All || self == requested
    }
}
