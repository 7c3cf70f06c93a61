//! Wire types for the ADR HTTP contract (spec §4.3) — field names are
//! exact and wire-compatible, not idiomatic Rust casing.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::AdrError;

/// Outbound `POST /IngestAdrRequest` body.
#[derive(Debug, Clone, Serialize)]
pub struct IngestAdrRequest {
    #[serde(rename = "ADRRequestTypeId")]
    pub adr_request_type_id: i32,
    #[serde(rename = "CredentialId")]
    pub credential_id: i32,
    #[serde(rename = "StartDate")]
    pub start_date: String,
    #[serde(rename = "EndDate")]
    pub end_date: String,
    #[serde(rename = "SourceApplicationName")]
    pub source_application_name: String,
    #[serde(rename = "RecipientEmail")]
    pub recipient_email: String,
    #[serde(rename = "JobId")]
    pub job_id: i64,
    #[serde(rename = "AccountId")]
    pub account_id: i64,
    #[serde(rename = "InterfaceAccountId")]
    pub interface_account_id: Option<String>,
    #[serde(rename = "IsLastAttempt")]
    pub is_last_attempt: bool,
}

impl IngestAdrRequest {
    pub fn format_date(date: Option<NaiveDate>) -> String {
        date.map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default()
    }
}

/// Normalized result of parsing either the ingest or the status-check
/// response body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestAdrResponse {
    pub status_id: Option<i32>,
    pub status_description: Option<String>,
    pub index_id: Option<i32>,
    pub is_error: Option<bool>,
    pub is_final: Option<bool>,
}

pub type StatusCheckResponse = IngestAdrResponse;

#[derive(Debug, Deserialize)]
struct RawAdrObject {
    #[serde(alias = "statusId", alias = "StatusId")]
    status_id: Option<i32>,
    #[serde(alias = "statusDescription", alias = "StatusDescription", alias = "Status")]
    status_description: Option<String>,
    #[serde(alias = "indexId", alias = "IndexId")]
    index_id: Option<i32>,
    #[serde(alias = "isError", alias = "IsError")]
    is_error: Option<bool>,
    #[serde(alias = "isFinal", alias = "IsFinal")]
    is_final: Option<bool>,
}

impl From<RawAdrObject> for IngestAdrResponse {
    fn from(raw: RawAdrObject) -> Self {
        Self {
            status_id: raw.status_id,
            status_description: raw.status_description,
            index_id: raw.index_id,
            is_error: raw.is_error,
            is_final: raw.is_final,
        }
    }
}

/// Parses a response body per spec §4.3's acceptance order: empty body
/// (success, no status); JSON object; JSON array (first element); bare
/// integer (index id only). Anything else is `AdrError::Malformed`.
pub fn parse_adr_body(body: &str) -> Result<IngestAdrResponse, AdrError> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return Ok(IngestAdrResponse::default());
    }

    if let Ok(value) = serde_json::from_str::<JsonValue>(trimmed) {
        match value {
            JsonValue::Object(_) => {
                let raw: RawAdrObject = serde_json::from_value(value).map_err(|_| {
                    AdrError::Malformed {
                        truncated_body: AdrError::truncate(trimmed, 500),
                    }
                })?;
                return Ok(raw.into());
            }
            JsonValue::Array(items) => {
                let first = items.into_iter().next().ok_or_else(|| AdrError::Malformed {
                    truncated_body: AdrError::truncate(trimmed, 500),
                })?;
                let raw: RawAdrObject = serde_json::from_value(first).map_err(|_| {
                    AdrError::Malformed {
                        truncated_body: AdrError::truncate(trimmed, 500),
                    }
                })?;
                return Ok(raw.into());
            }
            JsonValue::Number(n) => {
                if let Some(index_id) = n.as_i64() {
                    return Ok(IngestAdrResponse {
                        index_id: Some(index_id as i32),
                        ..Default::default()
                    });
                }
            }
            _ => {}
        }
    }

    Err(AdrError::Malformed {
        truncated_body: AdrError::truncate(trimmed, 500),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_body_is_treated_as_success_with_no_status() {
        let parsed = parse_adr_body("").unwrap();
        assert_eq!(parsed, IngestAdrResponse::default());
    }

    #[test]
    fn object_body_maps_all_fields() {
        let body = r#"{"statusId": 11, "statusDescription": "done", "indexId": 42, "isError": false, "isFinal": true}"#;
        let parsed = parse_adr_body(body).unwrap();
        assert_eq!(parsed.status_id, Some(11));
        assert_eq!(parsed.index_id, Some(42));
        assert_eq!(parsed.is_final, Some(true));
    }

    #[test]
    fn array_body_uses_first_element() {
        let body = r#"[{"statusId": 9}, {"statusId": 3}]"#;
        let parsed = parse_adr_body(body).unwrap();
        assert_eq!(parsed.status_id, Some(9));
    }

    #[test]
    fn bare_integer_is_treated_as_index_id() {
        let parsed = parse_adr_body("77").unwrap();
        assert_eq!(parsed.index_id, Some(77));
        assert_eq!(parsed.status_id, None);
    }

    #[test]
    fn status_field_substitutes_for_status_description() {
        let body = r#"{"statusId": 11, "Status": "Complete"}"#;
        let parsed = parse_adr_body(body).unwrap();
        assert_eq!(parsed.status_description, Some("Complete".to_string()));
    }

    #[test]
    fn malformed_body_is_an_error() {
        let result = parse_adr_body("not json at all {{{");
        assert!(result.is_err());
    }
}
