//! ADR HTTP client: `POST /IngestAdrRequest`, `GET /GetRequestStatusByJobId/{id}`.

use std::time::Duration;

use reqwest::StatusCode;

use crate::adr::types::{parse_adr_body, IngestAdrRequest, IngestAdrResponse};
use crate::config::AppConfig;
use crate::error::AdrError;

#[derive(Clone)]
pub struct AdrClient {
    http: reqwest::Client,
    base_url: String,
    recipient_email: String,
    source_application_name: String,
}

impl AdrClient {
    pub fn new(config: &AppConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.adr_request_timeout_seconds))
            .build()
            .expect("reqwest client builds with static config");

        Self {
            http,
            base_url: config.adr_base_url.trim_end_matches('/').to_string(),
            recipient_email: config.adr_recipient_email.clone(),
            source_application_name: config.adr_source_application_name.clone(),
        }
    }

    pub fn recipient_email(&self) -> &str {
        &self.recipient_email
    }

    pub fn source_application_name(&self) -> &str {
        &self.source_application_name
    }

    /// `POST /IngestAdrRequest`. On non-2xx with a JSON body that still
    /// parses and contains `indexId`, the index is returned alongside the
    /// error (spec §7 "Partial-success remote") so callers can record it
    /// even though the call is treated as a failure.
    pub async fn ingest(
        &self,
        request: &IngestAdrRequest,
    ) -> Result<IngestAdrResponse, (AdrError, Option<i32>)> {
        let url = format!("{}/IngestAdrRequest", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|err| (classify_transport_error(&err), None))?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        let parsed = parse_adr_body(&body);

        if status.is_success() {
            parsed.map_err(|err| (err, None))
        } else {
            let index_id = parsed.as_ref().ok().and_then(|r| r.index_id);
            Err((
                AdrError::Transient {
                    status: status.as_u16(),
                    body: AdrError::truncate(&body, 500),
                },
                index_id,
            ))
        }
    }

    /// `GET /GetRequestStatusByJobId/{job_id}`.
    pub async fn status_check(&self, job_id: i64) -> Result<IngestAdrResponse, AdrError> {
        let url = format!("{}/GetRequestStatusByJobId/{}", self.base_url, job_id);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|err| classify_transport_error(&err))?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            return Err(AdrError::Transient {
                status: status.as_u16(),
                body: AdrError::truncate(&body, 1000),
            });
        }

        parse_adr_body(&body)
    }
}

fn classify_transport_error(err: &reqwest::Error) -> AdrError {
    if err.is_timeout() {
        AdrError::Timeout { seconds: 0 }
    } else if let Some(status) = err.status() {
        if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            AdrError::Transient {
                status: status.as_u16(),
                body: err.to_string(),
            }
        } else {
            AdrError::Semantic {
                status_id: status.as_u16() as i32,
                description: err.to_string(),
            }
        }
    } else {
        AdrError::Network(err.to_string())
    }
}
