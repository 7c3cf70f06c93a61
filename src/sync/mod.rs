//! Account synchronization (C3): mirrors the external invoice-aggregation
//! feed into internal `Client`/`Account`/`AccountRule` state.

pub mod engine;
pub mod types;

pub use engine::AccountSync;
pub use types::{ExternalAccountRow, SyncResult, SyncSubstep};
