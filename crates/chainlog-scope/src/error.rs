use thiserror::Error;

use chainlog_contracts::error::LedgerError;
use chainlog_core::Record;

#[derive(Debug, Error)]
pub enum ScopeError {
    #[error("audit scope already committed as record {record_id}")]
    AlreadyCommitted { record_id: String },

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// The chain accepted the record but the store did not. The chain entry
    /// cannot be withdrawn, so the appended record is handed back.
    #[error("record {} appended to the chain but not stored: {source}", .record.id())]
    StoreAfterAppend {
        record: Box<Record>,
        #[source]
        source: LedgerError,
    },
}

pub type ScopeResult<T> = Result<T, ScopeError>;

impl From<ScopeError> for LedgerError {
    fn from(err: ScopeError) -> Self {
        match err {
            ScopeError::Ledger(e) => e,
            ScopeError::StoreAfterAppend { source, .. } => source,
            ScopeError::AlreadyCommitted { record_id } => LedgerError::Validation {
                record_id,
                reason: "audit scope already committed".to_string(),
            },
        }
    }
}
