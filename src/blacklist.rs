//! Blacklist filter (C2).
//!
//! Loads all active exclusion entries once per orchestration run and
//! exposes an in-memory predicate. Failure during load is non-fatal: the
//! caller logs and proceeds with an empty (fail-open) list, the same
//! defensive-default posture the teacher applies when
//! `ConnectionSyncMetadata::from_connection_metadata` encounters malformed
//! stored JSON.

use chrono::NaiveDate;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

use crate::models::blacklist_entry::{self, ExclusionType};

#[derive(Debug, Clone)]
pub struct AccountMatchFields<'a> {
    pub primary_vendor_code: Option<&'a str>,
    pub master_vendor_code: Option<&'a str>,
    pub vm_account_id: i64,
    pub vm_account_number: &'a str,
    pub credential_id: i32,
}

pub struct BlacklistFilter {
    entries: Vec<blacklist_entry::Model>,
}

impl BlacklistFilter {
    /// Loads all entries active today for `requested_type`. On any database
    /// error, logs and returns an empty (fail-open) filter.
    pub async fn load(
        db: &DatabaseConnection,
        today: NaiveDate,
        requested_type: ExclusionType,
    ) -> Self {
        let result = blacklist_entry::Entity::find()
            .filter(blacklist_entry::Column::IsActive.eq(true))
            .filter(blacklist_entry::Column::IsDeleted.eq(false))
            .all(db)
            .await;

        let entries = match result {
            Ok(rows) => rows
                .into_iter()
                .filter(|row| within_effective_window(row, today))
                .filter(|row| {
                    exclusion_type_from_str(&row.exclusion_type)
                        .is_some_and(|t| t.matches_requested(requested_type))
                })
                .collect(),
            Err(err) => {
                tracing::warn!(error = %err, "blacklist load failed, proceeding fail-open");
                Vec::new()
            }
        };

        Self { entries }
    }

    pub fn from_entries(entries: Vec<blacklist_entry::Model>) -> Self {
        Self { entries }
    }

    pub fn is_blacklisted(&self, account: &AccountMatchFields<'_>) -> bool {
        self.entries.iter().any(|entry| matches_entry(entry, account))
    }
}

fn within_effective_window(entry: &blacklist_entry::Model, today: NaiveDate) -> bool {
    let after_start = entry.effective_start.map(|s| today >= s).unwrap_or(true);
    let before_end = entry.effective_end.map(|e| today <= e).unwrap_or(true);
    after_start && before_end
}

fn exclusion_type_from_str(s: &str) -> Option<ExclusionType> {
    match s {
        "All" => Some(ExclusionType::All),
        "Download" => Some(ExclusionType::Download),
        "Rebill" => Some(ExclusionType::Rebill),
        _ => None,
    }
}

fn matches_entry(entry: &blacklist_entry::Model, account: &AccountMatchFields<'_>) -> bool {
    if let Some(code) = &entry.primary_vendor_code {
        if account.primary_vendor_code == Some(code.as_str()) {
            return true;
        }
    }
    if let Some(code) = &entry.master_vendor_code {
        if account.master_vendor_code == Some(code.as_str()) {
            return true;
        }
    }
    if let Some(id) = entry.vm_account_id {
        if id == account.vm_account_id {
            return true;
        }
    }
    if let Some(number) = &entry.vm_account_number {
        if number == account.vm_account_number {
            return true;
        }
    }
    if let Some(cred) = entry.credential_id {
        if cred == account.credential_id {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn blank_entry() -> blacklist_entry::Model {
        blacklist_entry::Model {
            id: 1,
            primary_vendor_code: None,
            master_vendor_code: None,
            vm_account_id: None,
            vm_account_number: None,
            credential_id: None,
            exclusion_type: "All".to_string(),
            effective_start: None,
            effective_end: None,
            is_active: true,
            created_at: chrono::Utc::now().fixed_offset(),
            created_by: "System Created".to_string(),
            modified_at: chrono::Utc::now().fixed_offset(),
            modified_by: "System Created".to_string(),
            is_deleted: false,
        }
    }

    #[test]
    fn matches_on_vm_account_id() {
        let mut entry = blank_entry();
        entry.vm_account_id = Some(1001);
        let filter = BlacklistFilter::from_entries(vec![entry]);
        let account = AccountMatchFields {
            primary_vendor_code: None,
            master_vendor_code: None,
            vm_account_id: 1001,
            vm_account_number: "A1",
            credential_id: 5,
        };
        assert!(filter.is_blacklisted(&account));
    }

    #[test]
    fn does_not_match_when_no_field_matches() {
        let mut entry = blank_entry();
        entry.vm_account_id = Some(999);
        let filter = BlacklistFilter::from_entries(vec![entry]);
        let account = AccountMatchFields {
            primary_vendor_code: None,
            master_vendor_code: None,
            vm_account_id: 1001,
            vm_account_number: "A1",
            credential_id: 5,
        };
        assert!(!filter.is_blacklisted(&account));
    }

    #[test]
    fn respects_effective_window() {
        let mut entry = blank_entry();
        entry.vm_account_id = Some(1001);
        entry.effective_start = Some(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        assert!(within_effective_window(&entry, NaiveDate::from_ymd_opt(2024, 6, 2).unwrap()));
        assert!(!within_effective_window(&entry, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()));
    }

    #[test]
    fn download_type_does_not_match_rebill_only_entries() {
        let mut entry = blank_entry();
        entry.exclusion_type = "Rebill".to_string();
        entry.vm_account_id = Some(1001);
        assert!(!exclusion_type_from_str("Rebill")
            .unwrap()
            .matches_requested(ExclusionType::Download));
    }
}
