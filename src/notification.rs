//! Notification hook (spec §6): the core calls an `EmailService` on
//! orchestration failure and startup interruption but never constructs
//! transport details itself, grounded on the trait-at-the-seam pattern of
//! the teacher's `connectors::Connector`.

use async_trait::async_trait;

#[async_trait]
pub trait EmailService: Send + Sync {
    async fn send(&self, subject: &str, body: &str, attachment: Option<Vec<u8>>);
}

/// Default no-op implementation, used when no transport is configured.
/// Logs at `warn` so a missing transport is visible in operational logs
/// without the core needing to know why delivery didn't happen.
pub struct NullEmailService;

#[async_trait]
impl EmailService for NullEmailService {
    async fn send(&self, subject: &str, _body: &str, _attachment: Option<Vec<u8>>) {
        tracing::warn!(subject, "no EmailService configured; notification dropped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn null_service_does_not_panic() {
        let service = NullEmailService;
        service.send("subject", "body", None).await;
    }
}
