//! # chainlog-scope
//!
//! Scoped audit recording on top of `chainlog-chain` and `chainlog-store`.
//!
//! Open an `AuditScope` around an operation, attach what it observed, and
//! the scope turns it into exactly one chained, stored record: explicitly via
//! `commit`, through `AuditScope::run`, or on drop.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use chainlog_scope::{AuditScope, ScopeSpec};
//!
//! let spec = ScopeSpec::new("ci", "lint", "src/app.py", TargetType::File, "ruff");
//! let outcome = AuditScope::run(&chain, &store, spec, |scope| {
//!     scope.add_violation(Violation::new("E501", Severity::Warning, "line too long"));
//!     Ok::<_, std::io::Error>(())
//! });
//! assert!(outcome.record.is_ok());
//! ```

pub mod error;
pub mod scope;

pub use error::{ScopeError, ScopeResult};
pub use scope::{AuditScope, ScopeOutcome, ScopeSpec};

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::panic::{self, AssertUnwindSafe};

    use chrono::Utc;
    use serde_json::json;
    use thiserror::Error;

    use chainlog_chain::Chain;
    use chainlog_contracts::{
        error::{LedgerError, LedgerResult},
        finding::{Finding, Violation},
        kinds::{Severity, TargetType},
    };
    use chainlog_core::{Filter, Record, RecordBackend};
    use chainlog_store::AuditStore;

    use super::*;

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn spec(action: &str) -> ScopeSpec {
        ScopeSpec::new("ci_bot", action, "src/app.py", TargetType::File, "pipeline")
    }

    fn fixtures() -> (Chain, AuditStore) {
        (Chain::new(1).unwrap(), AuditStore::new())
    }

    #[derive(Debug, Error)]
    #[error("upstream timed out after {0}s")]
    struct Timeout(u32);

    struct RejectingBackend;

    impl RecordBackend for RejectingBackend {
        fn name(&self) -> &str {
            "rejecting"
        }

        fn put(&self, _record: &Record) -> LedgerResult<()> {
            Err(LedgerError::Backend {
                backend: "rejecting".to_string(),
                reason: "disk full".to_string(),
            })
        }

        fn get(&self, _record_id: &str) -> LedgerResult<Option<Record>> {
            Ok(None)
        }

        fn scan(&self, _filter: &Filter) -> LedgerResult<Vec<Record>> {
            Ok(Vec::new())
        }
    }

    // ── Explicit commit ───────────────────────────────────────────────────────

    #[test]
    fn test_commit_appends_to_chain_and_store() {
        let (chain, store) = fixtures();
        let before = Utc::now();

        let mut scope = AuditScope::begin(&chain, &store, spec("lint").reason("nightly"));
        scope
            .add_context("branch", "main")
            .add_metadata("files", 12);
        let record = scope.commit().unwrap();

        assert_eq!(chain.len(), 2);
        assert_eq!(chain.latest().id(), record.id());
        assert_eq!(store.get(record.id()).unwrap(), Some(record.clone()));
        assert_eq!(scope.record().map(Record::id), Some(record.id()));

        assert_eq!(record.reason(), Some("nightly"));
        assert_eq!(record.context().get("branch"), Some(&json!("main")));
        assert_eq!(record.metadata().get("files"), Some(&json!(12)));
        assert!(
            record.metadata().get("duration_ms").is_some_and(|v| v.is_u64()),
            "duration_ms must be an integer"
        );
        assert!(before <= record.timestamp() && record.timestamp() <= Utc::now());
        assert_eq!(record.severity(), Severity::Info);
        assert!(chain.verify_chain());
    }

    #[test]
    fn test_commit_twice_is_rejected() {
        let (chain, store) = fixtures();
        let mut scope = AuditScope::begin(&chain, &store, spec("lint"));
        let record = scope.commit().unwrap();

        match scope.commit() {
            Err(ScopeError::AlreadyCommitted { record_id }) => assert_eq!(record_id, record.id()),
            other => panic!("expected AlreadyCommitted, got {:?}", other),
        }
        drop(scope);
        assert_eq!(chain.len(), 2, "neither the second commit nor drop may append");
    }

    // ── Severity ──────────────────────────────────────────────────────────────

    #[test]
    fn test_findings_and_violations_escalate_severity() {
        let (chain, store) = fixtures();
        let mut scope = AuditScope::begin(&chain, &store, spec("scan"));
        assert_eq!(scope.severity(), Severity::Info);

        scope.add_finding(Finding::new("complexity", Severity::Warning, "too deep"));
        assert_eq!(scope.severity(), Severity::Warning);

        scope.add_violations([
            Violation::new("S101", Severity::Critical, "assert used"),
            Violation::new("E501", Severity::Debug, "line too long"),
        ]);
        assert_eq!(scope.severity(), Severity::Critical);

        scope.add_findings([Finding::new("style", Severity::Info, "naming")]);
        assert_eq!(scope.severity(), Severity::Critical, "severity never decreases");

        let record = scope.commit().unwrap();
        assert_eq!(record.severity(), Severity::Critical);
        assert_eq!(record.findings().len(), 2);
        assert_eq!(record.violations().len(), 2);
    }

    #[test]
    fn test_fail_records_error_details() {
        let (chain, store) = fixtures();
        let mut scope = AuditScope::begin(&chain, &store, spec("deploy"));
        scope.fail(&LedgerError::Config {
            reason: "missing key".to_string(),
        });
        let record = scope.commit().unwrap();

        assert_eq!(record.severity(), Severity::Error);
        assert_eq!(record.metadata().get("error_type"), Some(&json!("LedgerError")));
        assert!(record.metadata()["error_message"]
            .as_str()
            .unwrap()
            .contains("missing key"));
    }

    // ── run ───────────────────────────────────────────────────────────────────

    #[test]
    fn test_run_commits_on_success() {
        let (chain, store) = fixtures();
        let outcome = AuditScope::run(&chain, &store, spec("test"), |scope| {
            scope.add_context("suite", "unit");
            Ok::<_, Timeout>(42)
        });

        assert_eq!(outcome.result.unwrap(), 42);
        let record = outcome.record.unwrap();
        assert_eq!(record.severity(), Severity::Info);
        assert!(record.metadata().get("error_type").is_none());
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn test_run_records_failure_and_still_commits() {
        let (chain, store) = fixtures();
        let outcome = AuditScope::run(&chain, &store, spec("fetch"), |_scope| {
            Err::<(), _>(Timeout(30))
        });

        assert!(matches!(outcome.result, Err(Timeout(30))));
        let record = outcome.record.unwrap();
        assert_eq!(record.severity(), Severity::Error);
        assert_eq!(record.metadata().get("error_type"), Some(&json!("Timeout")));
        assert_eq!(
            record.metadata().get("error_message"),
            Some(&json!("upstream timed out after 30s"))
        );
        assert_eq!(chain.len(), 2, "run must not commit twice");
    }

    // ── Drop ──────────────────────────────────────────────────────────────────

    #[test]
    fn test_drop_auto_commits() {
        let (chain, store) = fixtures();
        {
            let mut scope = AuditScope::begin(&chain, &store, spec("format"));
            scope.add_context("tool", "black");
        }

        assert_eq!(chain.len(), 2);
        let record = chain.latest();
        assert_eq!(record.action(), "format");
        assert_eq!(record.context().get("tool"), Some(&json!("black")));
        assert!(store.get(record.id()).unwrap().is_some());
    }

    #[test]
    fn test_drop_without_auto_commit_writes_nothing() {
        let (chain, store) = fixtures();
        {
            let _scope = AuditScope::begin(&chain, &store, spec("format").auto_commit(false));
        }
        assert_eq!(chain.len(), 1);
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn test_panic_inside_scope_is_recorded() {
        let (chain, store) = fixtures();

        let unwound = panic::catch_unwind(AssertUnwindSafe(|| {
            let _scope = AuditScope::begin(&chain, &store, spec("migrate"));
            panic!("migration exploded");
        }));
        assert!(unwound.is_err());

        let record = chain.latest();
        assert_eq!(record.action(), "migrate");
        assert_eq!(record.severity(), Severity::Error);
        assert_eq!(record.metadata().get("error_type"), Some(&json!("panic")));
        assert!(chain.verify_chain());
    }

    // ── Store failure ─────────────────────────────────────────────────────────

    #[test]
    fn test_store_failure_after_append_returns_record() {
        let chain = Chain::new(1).unwrap();
        let store = AuditStore::new().with_mirror(Box::new(RejectingBackend));

        let mut scope = AuditScope::begin(&chain, &store, spec("release"));
        let err = scope.commit().unwrap_err();

        match err {
            ScopeError::StoreAfterAppend { record, source } => {
                assert_eq!(chain.latest().id(), record.id());
                assert!(matches!(source, LedgerError::Backend { .. }));
            }
            other => panic!("expected StoreAfterAppend, got {:?}", other),
        }
        assert!(scope.record().is_some());
        drop(scope);
        assert_eq!(chain.len(), 2, "a scope that reached the chain is not retried on drop");
    }

    #[test]
    fn test_scope_error_converts_to_ledger_error() {
        let err = ScopeError::AlreadyCommitted {
            record_id: "rec-9".to_string(),
        };
        match LedgerError::from(err) {
            LedgerError::Validation { record_id, .. } => assert_eq!(record_id, "rec-9"),
            other => panic!("expected Validation, got {:?}", other),
        }

        let wrapped = ScopeError::from(LedgerError::RecordNotFound {
            record_id: "rec-1".to_string(),
        });
        assert!(matches!(
            LedgerError::from(wrapped),
            LedgerError::RecordNotFound { .. }
        ));
    }

    #[test]
    fn test_many_scopes_keep_chain_valid() {
        let (chain, store) = fixtures();
        for i in 0..5 {
            let mut scope = AuditScope::begin(&chain, &store, spec(&format!("step_{i}")));
            scope.add_metadata("index", i);
        }

        assert_eq!(chain.len(), 6);
        assert_eq!(store.len().unwrap(), 5);
        assert!(chain.verify_chain());
        assert!(store.verify_integrity().unwrap());
    }
}
