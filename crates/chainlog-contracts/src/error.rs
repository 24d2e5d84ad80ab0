//! Error types for the chainlog ledger.
//!
//! All fallible ledger operations return `LedgerResult<T>`. Integrity problems
//! found while scanning existing history are reported as data by the chain,
//! not through this type; `Integrity` is only raised when an append cannot
//! produce a valid record.

use thiserror::Error;

/// The unified error type for the chainlog crates.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// A record's stored hash does not match its recomputed canonical hash.
    ///
    /// Never retried: a structurally invalid record cannot become valid.
    #[error("record '{record_id}' failed validation: {reason}")]
    Validation { record_id: String, reason: String },

    /// A freshly mined record still failed verification during append.
    #[error("integrity violation on record '{record_id}': {reason}")]
    Integrity { record_id: String, reason: String },

    /// The requested export format is not one of `json` or `yaml`.
    #[error("unsupported export format: {format}")]
    UnsupportedFormat { format: String },

    /// An operation required an existing record and none has this id.
    #[error("record '{record_id}' not found")]
    RecordNotFound { record_id: String },

    /// A string did not name a known variant of a ledger enum.
    #[error("unknown {kind} '{value}'")]
    UnknownVariant { kind: &'static str, value: String },

    /// Encoding or decoding a record or an export failed.
    #[error("serialization error: {reason}")]
    Serialization { reason: String },

    /// A storage backend rejected or failed an operation.
    #[error("backend '{backend}' failed: {reason}")]
    Backend { backend: String, reason: String },

    /// Reading or writing a ledger file failed.
    #[error("failed to access '{path}': {reason}")]
    Io { path: String, reason: String },

    /// A configuration value is missing or invalid.
    #[error("configuration error: {reason}")]
    Config { reason: String },

    /// An internal lock was poisoned by a panicking thread.
    #[error("{resource} lock poisoned")]
    LockPoisoned { resource: &'static str },
}

/// Convenience alias used throughout the chainlog crates.
pub type LedgerResult<T> = Result<T, LedgerError>;
