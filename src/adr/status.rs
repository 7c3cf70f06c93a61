//! ADR status id classification (spec §4.3 status-mapping table).

/// `AttemptLogin` ADR request type id.
pub const REQUEST_TYPE_ATTEMPT_LOGIN: i32 = 1;
/// `DownloadInvoice` ADR request type id.
pub const REQUEST_TYPE_DOWNLOAD_INVOICE: i32 = 2;

pub const STATUS_DOCUMENT_RETRIEVAL_COMPLETE: i32 = 11;
pub const STATUS_NEEDS_HUMAN_REVIEW: i32 = 9;
pub const STATUS_LOGIN_SUCCEEDED: i32 = 12;

const FAILURE_STATUS_IDS: [i32; 6] = [3, 4, 5, 7, 8, 14];
const IN_FLIGHT_STATUS_IDS: [i32; 6] = [1, 2, 6, 10, 13, 15];

/// Derives `IsFinal` from the status id when the ADR response omits it,
/// per spec §4.3's table.
pub fn derive_is_final(status_id: i32) -> bool {
    status_id == STATUS_DOCUMENT_RETRIEVAL_COMPLETE
        || status_id == STATUS_NEEDS_HUMAN_REVIEW
        || status_id == STATUS_LOGIN_SUCCEEDED
        || FAILURE_STATUS_IDS.contains(&status_id)
}

pub fn is_failure_status(status_id: i32) -> bool {
    FAILURE_STATUS_IDS.contains(&status_id)
}

pub fn is_in_flight_status(status_id: i32) -> bool {
    IN_FLIGHT_STATUS_IDS.contains(&status_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complete_and_review_and_login_are_final() {
        assert!(derive_is_final(STATUS_DOCUMENT_RETRIEVAL_COMPLETE));
        assert!(derive_is_final(STATUS_NEEDS_HUMAN_REVIEW));
        assert!(derive_is_final(STATUS_LOGIN_SUCCEEDED));
    }

    #[test]
    fn failure_ids_are_final_but_in_flight_ids_are_not() {
        for id in FAILURE_STATUS_IDS {
            assert!(derive_is_final(id), "expected {id} to be final");
        }
        for id in IN_FLIGHT_STATUS_IDS {
            assert!(!derive_is_final(id), "expected {id} to be non-final");
        }
    }
}
