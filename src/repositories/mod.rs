//! # Repository Layer
//!
//! Thin wrappers around SeaORM operations for entities that benefit from a
//! named data-access surface (bulk client/account lookups). Per-stage
//! pipeline work in `orchestrator::*` intentionally bypasses this layer and
//! operates on flat `Vec<Model>`/dirty-set maps loaded once per stage
//! (spec §9 design notes): re-fetching one row at a time through a
//! repository inside a hot loop is the quadratic-time bug the spec calls
//! out to avoid.

pub mod account;
pub mod account_rule;
pub mod client;

pub use account::AccountRepository;
pub use account_rule::AccountRuleRepository;
pub use client::ClientRepository;
