//! The append-only audit chain.
//!
//! `Chain` keeps its records in a `Vec` behind an `RwLock`. `append` and
//! `sign` hold the write lock for their whole read-tip → link → mine →
//! verify → push sequence, so concurrent appends cannot race on the tip and
//! readers never observe a half-linked record. Reads share the lock.
//!
//! Mining runs on the caller's thread. Async callers should move `append`
//! onto a blocking worker; there is no cancellation.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use chainlog_contracts::{
    config::{check_difficulty, LedgerConfig},
    error::{LedgerError, LedgerResult},
    kinds::TargetType,
    signature::{RecordSignature, SigningKey},
};
use chainlog_core::{DigestSigner, Filter, Record, Signer, UNLINKED_HASH};

use crate::{
    export::ExportFormat,
    integrity::{self, short, IntegrityReport},
    stats::ChainStatistics,
};

/// An ordered, hash-linked, proof-of-work sequence of audit records.
///
/// Index 0 is always the genesis record.
pub struct Chain {
    difficulty: usize,
    signer: Box<dyn Signer>,
    pub(crate) records: RwLock<Vec<Record>>,
}

impl Chain {
    /// Create a chain with default configuration at `difficulty`.
    pub fn new(difficulty: usize) -> LedgerResult<Self> {
        let config = LedgerConfig {
            difficulty,
            ..LedgerConfig::default()
        };
        Self::with_config(&config)
    }

    /// Create a chain from `config`, signing with `DigestSigner`.
    pub fn with_config(config: &LedgerConfig) -> LedgerResult<Self> {
        Self::with_signer(config, Box::new(DigestSigner))
    }

    /// Create a chain from `config` with a custom signature scheme.
    ///
    /// Mines a genesis record before returning.
    pub fn with_signer(config: &LedgerConfig, signer: Box<dyn Signer>) -> LedgerResult<Self> {
        config.validate()?;

        let genesis = Record::builder(
            config.genesis.actor.clone(),
            "genesis",
            config.genesis.target.clone(),
            TargetType::VersionControl,
            config.genesis.source.clone(),
        )
        .reason(config.genesis.reason.clone())
        .build();

        let mut pending = genesis.into_pending();
        pending.mine(config.difficulty);
        let genesis = pending.seal();

        info!(
            genesis_hash = %short(genesis.hash()),
            difficulty = config.difficulty,
            signer = %signer.algorithm(),
            "audit chain initialized"
        );

        Ok(Self {
            difficulty: config.difficulty,
            signer,
            records: RwLock::new(vec![genesis]),
        })
    }

    /// Rebuild a chain from previously exported records without re-mining.
    ///
    /// Nothing about the records is trusted: call `verify_chain` or
    /// `integrity_report` to audit them. Fails when `records` is empty or
    /// does not start with an unlinked record.
    pub fn from_records(
        records: Vec<Record>,
        difficulty: usize,
        signer: Box<dyn Signer>,
    ) -> LedgerResult<Self> {
        check_difficulty(difficulty)?;

        let first = records.first().ok_or_else(|| LedgerError::Validation {
            record_id: String::new(),
            reason: "chain export contains no records".to_string(),
        })?;
        if first.previous_hash() != UNLINKED_HASH {
            return Err(LedgerError::Validation {
                record_id: first.id().to_string(),
                reason: format!(
                    "first record must be genesis with previous_hash \"{}\"",
                    UNLINKED_HASH
                ),
            });
        }

        debug!(records = records.len(), difficulty, "chain rebuilt from records");

        Ok(Self {
            difficulty,
            signer,
            records: RwLock::new(records),
        })
    }

    /// Parse an export produced by `export_chain` into a chain.
    pub fn import(text: &str, format: ExportFormat, difficulty: usize) -> LedgerResult<Self> {
        let records = format.decode(text)?;
        Self::from_records(records, difficulty, Box::new(DigestSigner))
    }

    pub fn difficulty(&self) -> usize {
        self.difficulty
    }

    /// Number of records, genesis included.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Always false: a chain holds at least its genesis record.
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// The current tip.
    pub fn latest(&self) -> Record {
        let records = self.read();
        // Construction guarantees genesis, and records are never removed.
        records[records.len() - 1].clone()
    }

    pub fn genesis(&self) -> Record {
        self.read()[0].clone()
    }

    /// Snapshot of every record, genesis first.
    pub fn records(&self) -> Vec<Record> {
        self.read().clone()
    }

    pub fn get(&self, record_id: &str) -> Option<Record> {
        self.read().iter().find(|r| r.id() == record_id).cloned()
    }

    // ── Writes ────────────────────────────────────────────────────────────────

    /// Link `record` to the tip, mine it, verify it, and append it.
    ///
    /// Returns the sealed record as stored. Fails with `Validation` if the
    /// incoming record's hash does not match its content, so an edited record
    /// cannot be re-mined into a valid link. Fails with `Integrity` if the
    /// mined record does not verify, which indicates a hashing bug rather
    /// than bad input. Nothing is appended on either failure.
    pub fn append(&self, record: Record) -> LedgerResult<Record> {
        if !record.verify() {
            warn!(record_id = %record.id(), "rejected non-verifying record");
            return Err(LedgerError::Validation {
                record_id: record.id().to_string(),
                reason: "record hash does not match its content".to_string(),
            });
        }

        let mut records = self.write()?;

        let tip_hash = records
            .last()
            .map(|tip| tip.hash().to_string())
            .unwrap_or_else(|| UNLINKED_HASH.to_string());

        let mut pending = record.into_pending();
        pending.link(tip_hash);
        let attempts = pending.mine(self.difficulty);

        if !pending.verify() {
            error!(record_id = %pending.id(), "mined record failed verification");
            return Err(LedgerError::Integrity {
                record_id: pending.id().to_string(),
                reason: "record verification failed before adding to chain".to_string(),
            });
        }

        let record = pending.seal();
        records.push(record.clone());

        info!(
            record_id = %record.id(),
            hash = %short(record.hash()),
            action = %record.action(),
            target = %record.target(),
            actor = %record.actor(),
            nonce = record.nonce(),
            attempts,
            "added audit record"
        );

        Ok(record)
    }

    /// Sign the stored record `record_id` with this chain's signer.
    ///
    /// Only the record's signature list changes; its hash and the chain's
    /// linkage are untouched. Copies of the record held elsewhere, such as
    /// in an `AuditStore`, do not receive the signature; re-put the record
    /// from `get` to keep them in step.
    pub fn sign(
        &self,
        record_id: &str,
        key: &SigningKey,
        signer_id: &str,
    ) -> LedgerResult<RecordSignature> {
        let mut records = self.write()?;
        let record = records
            .iter_mut()
            .find(|r| r.id() == record_id)
            .ok_or_else(|| LedgerError::RecordNotFound {
                record_id: record_id.to_string(),
            })?;

        Ok(record.sign(self.signer.as_ref(), key, signer_id))
    }

    // ── Verification ──────────────────────────────────────────────────────────

    /// Check hash, linkage, and proof-of-work for every record after genesis.
    ///
    /// Returns `false` at the first failure, after logging which record
    /// broke which invariant. Use `integrity_report` for every failure.
    pub fn verify_chain(&self) -> bool {
        let records = self.read();

        for (i, pair) in records.windows(2).enumerate() {
            if let Some(issue) = integrity::first_violation(i + 1, &pair[0], &pair[1], self.difficulty)
            {
                error!(
                    index = issue.index,
                    record_id = %issue.record_id,
                    invariant = ?issue.invariant,
                    detail = %issue.detail,
                    "audit chain verification failed"
                );
                return false;
            }
        }

        info!(records = records.len(), "audit chain verified");
        true
    }

    /// Scan the whole chain and report every invariant violation.
    pub fn integrity_report(&self) -> IntegrityReport {
        let report = integrity::scan(&self.read(), self.difficulty);
        for issue in &report.issues {
            warn!(
                index = issue.index,
                record_id = %issue.record_id,
                invariant = ?issue.invariant,
                detail = %issue.detail,
                "integrity issue"
            );
        }
        report
    }

    /// Signature validity per record id, genesis included.
    ///
    /// A record without signatures is reported valid.
    pub fn verify_signatures(&self) -> BTreeMap<String, bool> {
        self.read()
            .iter()
            .map(|record| {
                let valid = record.verify_signatures(self.signer.as_ref());
                (record.id().to_string(), valid)
            })
            .collect()
    }

    // ── Queries ───────────────────────────────────────────────────────────────

    /// Non-genesis records with `start <= timestamp <= end`, in chain order.
    pub fn slice(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<Record> {
        self.read()
            .iter()
            .skip(1)
            .filter(|r| start <= r.timestamp() && r.timestamp() <= end)
            .cloned()
            .collect()
    }

    /// Matching records, newest first.
    ///
    /// Scans from the tip backwards (genesis excluded), collecting at most
    /// `filter.limit` matches, then drops the first `filter.offset` of those.
    /// The offset therefore pages within the limited window: an offset at or
    /// beyond `limit` always yields an empty result, however many matches
    /// exist further back. `AuditStore::query` pages differently.
    pub fn find(&self, filter: &Filter) -> Vec<Record> {
        let records = self.read();
        let mut matches = Vec::new();
        let mut checked = 0usize;

        for record in records.iter().skip(1).rev() {
            if matches.len() >= filter.limit {
                break;
            }
            checked += 1;

            // Insertion order is not guaranteed to be time order.
            if !filter.in_time_range(record.timestamp()) {
                continue;
            }
            if filter.matches(record) {
                matches.push(record.clone());
            }
        }

        let page: Vec<Record> = matches.into_iter().skip(filter.offset).collect();

        debug!(
            found = page.len(),
            checked,
            limit = filter.limit,
            offset = filter.offset,
            "chain search complete"
        );

        page
    }

    pub fn statistics(&self) -> ChainStatistics {
        let records = self.read();
        ChainStatistics::summarize(records.get(1..).unwrap_or_default())
    }

    // ── Export ────────────────────────────────────────────────────────────────

    /// Serialize the whole chain, genesis included, as `json` or `yaml`.
    pub fn export_chain(&self, format: &str) -> LedgerResult<String> {
        let format: ExportFormat = format.parse()?;
        self.export(format)
    }

    pub fn export(&self, format: ExportFormat) -> LedgerResult<String> {
        let records = self.read();
        let text = format.encode(&records)?;
        debug!(format = %format, records = records.len(), bytes = text.len(), "chain exported");
        Ok(text)
    }

    // ── Locking ───────────────────────────────────────────────────────────────

    // `append` pushes only after every check passes, so a lock poisoned by a
    // panicking writer still guards a consistent vector.
    fn read(&self) -> RwLockReadGuard<'_, Vec<Record>> {
        self.records.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> LedgerResult<RwLockWriteGuard<'_, Vec<Record>>> {
        self.records
            .write()
            .map_err(|_| LedgerError::LockPoisoned { resource: "chain" })
    }
}

impl std::fmt::Debug for Chain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chain")
            .field("difficulty", &self.difficulty)
            .field("signer", &self.signer.algorithm())
            .field("len", &self.len())
            .finish()
    }
}
