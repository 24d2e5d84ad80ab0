//! # chainlog-contracts
//!
//! Shared types, errors, and configuration for the chainlog audit ledger.
//!
//! Every crate in the workspace imports from here. No hashing or chain logic
//! lives in this crate, only data definitions, error types, and the TOML
//! configuration schema.

pub mod config;
pub mod error;
pub mod finding;
pub mod kinds;
pub mod signature;

pub use config::{LedgerConfig, MAX_DIFFICULTY};
pub use error::{LedgerError, LedgerResult};
pub use finding::{Finding, Violation};
pub use kinds::{Classification, RecordStatus, Severity, TargetType};
pub use signature::{RecordSignature, SigningKey};
