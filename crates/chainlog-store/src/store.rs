//! The indexed query façade in front of the storage backends.
//!
//! `AuditStore` always writes to its in-memory backend first and then
//! forwards to any mirror backends in registration order. A mirror failure
//! is returned to the caller but does not undo the memory write: mirrors own
//! their own retry policy, and the memory index remains the source for
//! queries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use chainlog_contracts::error::{LedgerError, LedgerResult};
use chainlog_core::{Filter, Record, RecordBackend};

use crate::memory::MemoryBackend;

/// Aggregate counts over every stored record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStatistics {
    pub total_records: usize,
    /// Name of the primary backend.
    pub storage_backend: String,
    pub earliest_record: Option<DateTime<Utc>>,
    pub latest_record: Option<DateTime<Utc>>,
    pub total_findings: usize,
    pub total_violations: usize,
    pub signed_records: usize,
}

pub struct AuditStore {
    pub(crate) memory: MemoryBackend,
    mirrors: Vec<Box<dyn RecordBackend>>,
}

impl AuditStore {
    /// A store backed by memory only.
    pub fn new() -> Self {
        Self {
            memory: MemoryBackend::new(),
            mirrors: Vec::new(),
        }
    }

    /// Forward every `put` to `backend` as well, and consult it on `get`
    /// misses.
    pub fn with_mirror(mut self, backend: Box<dyn RecordBackend>) -> Self {
        info!(backend = %backend.name(), "audit store mirror registered");
        self.mirrors.push(backend);
        self
    }

    pub fn len(&self) -> LedgerResult<usize> {
        self.memory.len()
    }

    pub fn is_empty(&self) -> LedgerResult<bool> {
        self.memory.is_empty()
    }

    /// Validate and index `record`.
    ///
    /// Fails with `Validation` when the record's hash does not match its
    /// content; nothing is stored in that case.
    pub fn put(&self, record: &Record) -> LedgerResult<()> {
        if !record.verify() {
            return Err(LedgerError::Validation {
                record_id: record.id().to_string(),
                reason: "cannot store a record whose hash does not match its content".to_string(),
            });
        }

        self.memory.put(record)?;

        for mirror in &self.mirrors {
            if let Err(e) = mirror.put(record) {
                warn!(
                    record_id = %record.id(),
                    backend = %mirror.name(),
                    error = %e,
                    "mirror backend rejected record"
                );
                return Err(e);
            }
        }

        debug!(
            record_id = %record.id(),
            action = %record.action(),
            target = %record.target(),
            "stored audit record"
        );
        Ok(())
    }

    /// Look a record up by id: memory first, then each mirror in order.
    pub fn get(&self, record_id: &str) -> LedgerResult<Option<Record>> {
        if let Some(record) = self.memory.get(record_id)? {
            return Ok(Some(record));
        }
        for mirror in &self.mirrors {
            if let Some(record) = mirror.get(record_id)? {
                return Ok(Some(record));
            }
        }
        Ok(None)
    }

    /// Matching records, newest first, paged as `[offset, offset + limit)`
    /// over the full sorted match set.
    ///
    /// Unlike `Chain::find`, the offset is applied before the limit, so deep
    /// pages stay reachable.
    pub fn query(&self, filter: &Filter) -> LedgerResult<Vec<Record>> {
        let mut matches = self.memory.scan(filter)?;
        matches.sort_by(|a, b| {
            b.timestamp()
                .cmp(&a.timestamp())
                .then_with(|| a.id().cmp(b.id()))
        });

        let total = matches.len();
        let page: Vec<Record> = matches
            .into_iter()
            .skip(filter.offset)
            .take(filter.limit)
            .collect();

        debug!(
            matched = total,
            returned = page.len(),
            limit = filter.limit,
            offset = filter.offset,
            "store query complete"
        );
        Ok(page)
    }

    /// Every record for `target`, oldest first.
    ///
    /// An unknown target yields an empty history.
    pub fn provenance(&self, target: &str) -> LedgerResult<Vec<Record>> {
        let mut history = self.memory.by_target(target)?;
        history.sort_by(|a, b| {
            a.timestamp()
                .cmp(&b.timestamp())
                .then_with(|| a.id().cmp(b.id()))
        });

        debug!(target = %target, records = history.len(), "provenance resolved");
        Ok(history)
    }

    /// Re-verify every stored record.
    ///
    /// Logs each record that fails, not just the first, and returns `false`
    /// if any did.
    pub fn verify_integrity(&self) -> LedgerResult<bool> {
        let records = self.memory.all()?;
        let mut invalid = 0usize;

        for record in &records {
            if !record.verify() {
                error!(record_id = %record.id(), "record failed integrity check");
                invalid += 1;
            }
        }

        if invalid > 0 {
            error!(invalid, total = records.len(), "invalid records found in store");
            return Ok(false);
        }

        info!(total = records.len(), "all stored records verified");
        Ok(true)
    }

    pub fn statistics(&self) -> LedgerResult<StoreStatistics> {
        let records = self.memory.all()?;

        Ok(StoreStatistics {
            total_records: records.len(),
            storage_backend: self.memory.name().to_string(),
            earliest_record: records.iter().map(Record::timestamp).min(),
            latest_record: records.iter().map(Record::timestamp).max(),
            total_findings: records.iter().map(|r| r.findings().len()).sum(),
            total_violations: records.iter().map(|r| r.violations().len()).sum(),
            signed_records: records.iter().filter(|r| !r.signatures().is_empty()).count(),
        })
    }
}

impl Default for AuditStore {
    fn default() -> Self {
        Self::new()
    }
}
