//! `AuditScope`: accumulate one operation's audit data, then commit it.
//!
//! A scope is opened against a `Chain` and an `AuditStore`, collects
//! context, metadata, findings, and violations while the operation runs, and
//! on commit appends a single record to the chain and indexes it in the
//! store. The record's timestamp is the moment the scope was opened and its
//! metadata carries `duration_ms`.
//!
//! Dropping an uncommitted scope with `auto_commit` set commits it, so an
//! early return or a panic still leaves a record behind.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use chainlog_chain::Chain;
use chainlog_contracts::{
    finding::{Finding, Violation},
    kinds::{Classification, Severity, TargetType},
};
use chainlog_core::Record;
use chainlog_store::AuditStore;

use crate::error::{ScopeError, ScopeResult};

/// Who did what to which target; fixed for the lifetime of a scope.
#[derive(Debug, Clone)]
pub struct ScopeSpec {
    pub actor: String,
    pub action: String,
    pub target: String,
    pub target_type: TargetType,
    pub source: String,
    pub reason: Option<String>,
    pub classification: Classification,
    /// Commit on drop if the caller has not committed. Defaults to true.
    pub auto_commit: bool,
}

impl ScopeSpec {
    pub fn new(
        actor: impl Into<String>,
        action: impl Into<String>,
        target: impl Into<String>,
        target_type: TargetType,
        source: impl Into<String>,
    ) -> Self {
        Self {
            actor: actor.into(),
            action: action.into(),
            target: target.into(),
            target_type,
            source: source.into(),
            reason: None,
            classification: Classification::default(),
            auto_commit: true,
        }
    }

    pub fn reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn classification(mut self, classification: Classification) -> Self {
        self.classification = classification;
        self
    }

    pub fn auto_commit(mut self, auto_commit: bool) -> Self {
        self.auto_commit = auto_commit;
        self
    }
}

/// What `AuditScope::run` returns: the closure's own result and the outcome
/// of committing its record.
#[derive(Debug)]
pub struct ScopeOutcome<T, E> {
    pub result: Result<T, E>,
    pub record: ScopeResult<Record>,
}

pub struct AuditScope<'a> {
    chain: &'a Chain,
    store: &'a AuditStore,
    spec: ScopeSpec,
    started_at: DateTime<Utc>,
    timer: Instant,
    context: BTreeMap<String, Value>,
    metadata: BTreeMap<String, Value>,
    findings: Vec<Finding>,
    violations: Vec<Violation>,
    severity: Severity,
    /// Set once a commit has been attempted, successful or not.
    attempted: bool,
    committed: Option<Record>,
}

impl<'a> AuditScope<'a> {
    pub fn begin(chain: &'a Chain, store: &'a AuditStore, spec: ScopeSpec) -> Self {
        debug!(
            actor = %spec.actor,
            action = %spec.action,
            target = %spec.target,
            "audit scope opened"
        );

        Self {
            chain,
            store,
            spec,
            started_at: Utc::now(),
            timer: Instant::now(),
            context: BTreeMap::new(),
            metadata: BTreeMap::new(),
            findings: Vec::new(),
            violations: Vec::new(),
            severity: Severity::Info,
            attempted: false,
            committed: None,
        }
    }

    /// Open a scope and run `f` inside it, then commit.
    ///
    /// An `Err` from `f` is recorded with `fail` before the commit. The
    /// record is committed whatever `f` returns.
    pub fn run<T, E, F>(
        chain: &'a Chain,
        store: &'a AuditStore,
        spec: ScopeSpec,
        f: F,
    ) -> ScopeOutcome<T, E>
    where
        F: FnOnce(&mut AuditScope<'a>) -> Result<T, E>,
        E: std::error::Error,
    {
        let mut scope = Self::begin(chain, store, spec);
        let result = f(&mut scope);
        if let Err(e) = &result {
            scope.fail(e);
        }
        let record = scope.commit();
        ScopeOutcome { result, record }
    }

    pub fn add_context(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.context.insert(key.into(), value.into());
        self
    }

    pub fn add_metadata(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn add_finding(&mut self, finding: Finding) -> &mut Self {
        self.escalate(finding.severity);
        self.findings.push(finding);
        self
    }

    pub fn add_findings(&mut self, findings: impl IntoIterator<Item = Finding>) -> &mut Self {
        for finding in findings {
            self.add_finding(finding);
        }
        self
    }

    pub fn add_violation(&mut self, violation: Violation) -> &mut Self {
        self.escalate(violation.severity);
        self.violations.push(violation);
        self
    }

    pub fn add_violations(&mut self, violations: impl IntoIterator<Item = Violation>) -> &mut Self {
        for violation in violations {
            self.add_violation(violation);
        }
        self
    }

    /// Mark the operation failed: severity rises to at least `Error` and the
    /// error's type and message go into metadata.
    pub fn fail<E: std::error::Error + ?Sized>(&mut self, error: &E) -> &mut Self {
        self.record_failure(short_type_name::<E>(), error.to_string())
    }

    /// Current severity: the most severe of `Info` and everything added.
    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// The record this scope put on the chain, if a commit got that far.
    pub fn record(&self) -> Option<&Record> {
        self.committed.as_ref()
    }

    /// Build the record, append it to the chain, then store it.
    ///
    /// A scope commits at most once. If the chain append fails nothing was
    /// written anywhere. If the store then fails, the record is already on
    /// the chain and is returned inside `ScopeError::StoreAfterAppend`.
    pub fn commit(&mut self) -> ScopeResult<Record> {
        if let Some(record) = &self.committed {
            return Err(ScopeError::AlreadyCommitted {
                record_id: record.id().to_string(),
            });
        }
        self.attempted = true;

        let duration_ms = u64::try_from(self.timer.elapsed().as_millis()).unwrap_or(u64::MAX);

        let mut builder = Record::builder(
            self.spec.actor.clone(),
            self.spec.action.clone(),
            self.spec.target.clone(),
            self.spec.target_type,
            self.spec.source.clone(),
        )
        .timestamp(self.started_at)
        .context_map(self.context.clone())
        .metadata_map(self.metadata.clone())
        .metadata("duration_ms", duration_ms)
        .findings(self.findings.iter().cloned())
        .violations(self.violations.iter().cloned())
        .severity(self.severity)
        .classification(self.spec.classification);
        if let Some(reason) = &self.spec.reason {
            builder = builder.reason(reason.clone());
        }

        let record = self.chain.append(builder.build())?;

        if let Err(e) = self.store.put(&record) {
            error!(
                record_id = %record.id(),
                error = %e,
                "audit record appended to chain but not stored"
            );
            self.committed = Some(record.clone());
            return Err(ScopeError::StoreAfterAppend {
                record: Box::new(record),
                source: e,
            });
        }

        info!(
            record_id = %record.id(),
            action = %record.action(),
            severity = %record.severity(),
            duration_ms,
            "audit scope committed"
        );

        self.committed = Some(record.clone());
        Ok(record)
    }

    fn escalate(&mut self, severity: Severity) {
        self.severity = self.severity.max(severity);
    }

    fn record_failure(&mut self, error_type: &str, message: String) -> &mut Self {
        self.escalate(Severity::Error);
        self.metadata
            .insert("error_type".to_string(), Value::from(error_type));
        self.metadata
            .insert("error_message".to_string(), Value::from(message));
        self
    }
}

impl Drop for AuditScope<'_> {
    fn drop(&mut self) {
        if !self.spec.auto_commit || self.attempted {
            return;
        }

        if std::thread::panicking() {
            warn!(action = %self.spec.action, "audit scope unwinding from a panic");
            self.record_failure("panic", "operation panicked inside audit scope".to_string());
        }

        if let Err(e) = self.commit() {
            error!(action = %self.spec.action, error = %e, "audit scope auto-commit failed");
        }
    }
}

impl fmt::Debug for AuditScope<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuditScope")
            .field("spec", &self.spec)
            .field("started_at", &self.started_at)
            .field("severity", &self.severity)
            .field("findings", &self.findings.len())
            .field("violations", &self.violations.len())
            .field("committed", &self.committed.as_ref().map(Record::id))
            .finish()
    }
}

/// `chainlog_contracts::error::LedgerError` → `LedgerError`.
fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}
