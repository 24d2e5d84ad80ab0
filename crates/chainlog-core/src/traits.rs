//! Storage seam for the ledger.
//!
//! `RecordBackend` is the whole contract the core needs from a storage
//! engine. The in-memory backend lives in `chainlog-store`; relational,
//! graph, and cache engines implement the same trait out of tree and own
//! their retry and circuit-breaking policy.

use chainlog_contracts::error::LedgerResult;

use crate::{filter::Filter, record::Record};

/// A key-value store of sealed records keyed by record id.
pub trait RecordBackend: Send + Sync {
    /// Short name used in logs and `LedgerError::Backend`.
    fn name(&self) -> &str;

    /// Store `record` under its id. Storing the same id twice keeps the
    /// latest value.
    fn put(&self, record: &Record) -> LedgerResult<()>;

    /// Fetch a record by id. An unknown id is `Ok(None)`, not an error.
    fn get(&self, record_id: &str) -> LedgerResult<Option<Record>>;

    /// Every stored record for which `filter.matches` holds.
    ///
    /// Results are unordered and `limit`/`offset` are ignored; ordering and
    /// pagination belong to the caller.
    fn scan(&self, filter: &Filter) -> LedgerResult<Vec<Record>>;

    /// Every stored record whose `target` equals `target`, unordered.
    fn by_target(&self, target: &str) -> LedgerResult<Vec<Record>> {
        Ok(self
            .scan(&Filter::default())?
            .into_iter()
            .filter(|record| record.target() == target)
            .collect())
    }
}
