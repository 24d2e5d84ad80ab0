//! In-memory implementation of `RecordBackend`.
//!
//! `MemoryBackend` keeps records in a `HashMap` keyed by id plus a secondary
//! index from target to ids, both behind one `RwLock`. `put` takes the write
//! lock, so concurrent puts serialize; reads share the lock and see every put
//! that completed before they started.

use std::collections::{BTreeSet, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chainlog_contracts::error::{LedgerError, LedgerResult};
use chainlog_core::{Filter, Record, RecordBackend};

// ── Internal mutable state ────────────────────────────────────────────────────

#[derive(Default)]
pub(crate) struct MemoryState {
    /// Every stored record, keyed by record id.
    pub(crate) records: HashMap<String, Record>,

    /// Record ids per target, for provenance lookups.
    pub(crate) by_target: HashMap<String, BTreeSet<String>>,
}

// ── Public backend ────────────────────────────────────────────────────────────

/// The always-available primary backend of an `AuditStore`.
#[derive(Default)]
pub struct MemoryBackend {
    pub(crate) state: RwLock<MemoryState>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> LedgerResult<usize> {
        Ok(self.read()?.records.len())
    }

    pub fn is_empty(&self) -> LedgerResult<bool> {
        Ok(self.read()?.records.is_empty())
    }

    /// Every stored record, unordered.
    pub fn all(&self) -> LedgerResult<Vec<Record>> {
        Ok(self.read()?.records.values().cloned().collect())
    }

    fn read(&self) -> LedgerResult<RwLockReadGuard<'_, MemoryState>> {
        self.state
            .read()
            .map_err(|_| LedgerError::LockPoisoned { resource: "memory store" })
    }

    fn write(&self) -> LedgerResult<RwLockWriteGuard<'_, MemoryState>> {
        self.state
            .write()
            .map_err(|_| LedgerError::LockPoisoned { resource: "memory store" })
    }
}

impl RecordBackend for MemoryBackend {
    fn name(&self) -> &str {
        "memory"
    }

    fn put(&self, record: &Record) -> LedgerResult<()> {
        let mut state = self.write()?;
        let id = record.id().to_string();

        // Last write wins; drop the old target entry if the target changed.
        if let Some(previous) = state.records.insert(id.clone(), record.clone()) {
            if previous.target() != record.target() {
                if let Some(ids) = state.by_target.get_mut(previous.target()) {
                    ids.remove(&id);
                }
            }
        }

        state
            .by_target
            .entry(record.target().to_string())
            .or_default()
            .insert(id);

        Ok(())
    }

    fn get(&self, record_id: &str) -> LedgerResult<Option<Record>> {
        Ok(self.read()?.records.get(record_id).cloned())
    }

    fn scan(&self, filter: &Filter) -> LedgerResult<Vec<Record>> {
        Ok(self
            .read()?
            .records
            .values()
            .filter(|record| filter.matches(record))
            .cloned()
            .collect())
    }

    fn by_target(&self, target: &str) -> LedgerResult<Vec<Record>> {
        let state = self.read()?;
        let Some(ids) = state.by_target.get(target) else {
            return Ok(Vec::new());
        };
        Ok(ids
            .iter()
            .filter_map(|id| state.records.get(id))
            .cloned()
            .collect())
    }
}
