//! ADR HTTP client — the contract this orchestrator drives the remote
//! "Automated Document Retrieval" service through. Grounded on the
//! teacher's `connectors::trait_` module: the same error taxonomy shape
//! (`ConnectorError`/`SyncError`) applied to a single opaque downstream
//! service instead of a family of OAuth connectors, and the same
//! `reqwest`-based call pattern used across the teacher's connector
//! implementations.

pub mod client;
pub mod status;
pub mod types;

pub use client::AdrClient;
pub use types::{IngestAdrRequest, IngestAdrResponse, StatusCheckResponse};
