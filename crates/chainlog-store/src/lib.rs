//! # chainlog-store
//!
//! Indexed lookup and query over sealed audit records.
//!
//! `AuditStore` validates each record before indexing it by id and by
//! target, answers filtered queries newest-first, and reconstructs a
//! target's provenance oldest-first. Storage engines plug in through
//! `chainlog_core::RecordBackend`; only `MemoryBackend` ships here.
//!
//! The store and the chain share no transaction. A record can be appended to
//! a `Chain` and then fail to store; callers that need both to succeed or
//! neither must serialize the pair themselves.

pub mod memory;
pub mod store;

pub use memory::MemoryBackend;
pub use store::{AuditStore, StoreStatistics};

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, TimeZone, Utc};

    use chainlog_contracts::{
        error::{LedgerError, LedgerResult},
        finding::{Finding, Violation},
        kinds::{Severity, TargetType},
        signature::SigningKey,
    };
    use chainlog_core::{DigestSigner, Filter, Record, RecordBackend};

    use super::{AuditStore, MemoryBackend};

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 10, 8, 0, 0).unwrap()
    }

    fn make_record(actor: &str, target: &str, offset_secs: i64) -> Record {
        Record::builder(actor, "test_action", target, TargetType::File, "test")
            .timestamp(base_time() + Duration::seconds(offset_secs))
            .build()
    }

    fn forged(record: &Record) -> Record {
        let mut raw = serde_json::to_value(record).unwrap();
        raw["actor"] = serde_json::json!("mallory");
        serde_json::from_value(raw).unwrap()
    }

    /// A mirror that rejects every write.
    struct FailingBackend;

    impl RecordBackend for FailingBackend {
        fn name(&self) -> &str {
            "failing"
        }

        fn put(&self, _record: &Record) -> LedgerResult<()> {
            Err(LedgerError::Backend {
                backend: "failing".to_string(),
                reason: "connection refused".to_string(),
            })
        }

        fn get(&self, _record_id: &str) -> LedgerResult<Option<Record>> {
            Ok(None)
        }

        fn scan(&self, _filter: &Filter) -> LedgerResult<Vec<Record>> {
            Ok(Vec::new())
        }
    }

    // ── put / get ─────────────────────────────────────────────────────────────

    #[test]
    fn test_put_and_get() {
        let store = AuditStore::new();
        let record = make_record("test_user", "test_target", 0);
        store.put(&record).unwrap();

        let retrieved = store.get(record.id()).unwrap().unwrap();
        assert_eq!(retrieved, record);
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn test_get_unknown_is_absent() {
        let store = AuditStore::new();
        assert!(store.get("no-such-id").unwrap().is_none());
    }

    #[test]
    fn test_put_rejects_invalid_record() {
        let store = AuditStore::new();
        let record = forged(&make_record("test_user", "t", 0));

        match store.put(&record) {
            Err(LedgerError::Validation { record_id, .. }) => assert_eq!(record_id, record.id()),
            other => panic!("expected Validation, got {:?}", other),
        }
        assert!(store.is_empty().unwrap(), "an invalid record must not be stored");
    }

    #[test]
    fn test_put_same_id_last_write_wins() {
        let store = AuditStore::new();
        let mut record = make_record("u", "a.py", 0);
        store.put(&record).unwrap();

        record.sign(&DigestSigner, &SigningKey::new("k"), "auditor");
        store.put(&record).unwrap();

        assert_eq!(store.len().unwrap(), 1);
        assert_eq!(store.get(record.id()).unwrap().unwrap().signatures().len(), 1);
        assert_eq!(store.provenance("a.py").unwrap().len(), 1);
    }

    // ── query ─────────────────────────────────────────────────────────────────

    #[test]
    fn test_query_returns_newest_first() {
        let store = AuditStore::new();
        for i in 0..5 {
            store.put(&make_record(&format!("user_{i}"), "t", i)).unwrap();
        }

        let records = store.query(&Filter::new().limit(10)).unwrap();
        let actors: Vec<&str> = records.iter().map(Record::actor).collect();
        assert_eq!(actors, vec!["user_4", "user_3", "user_2", "user_1", "user_0"]);
    }

    #[test]
    fn test_query_applies_offset_before_limit() {
        let store = AuditStore::new();
        for i in 0..5 {
            store.put(&make_record("same", "t", i)).unwrap();
        }

        assert!(store.query(&Filter::new().limit(2).offset(10)).unwrap().is_empty());

        // Deep pages are reachable, unlike Chain::find.
        let page = store.query(&Filter::new().limit(2).offset(2)).unwrap();
        let times: Vec<DateTime<Utc>> = page.iter().map(Record::timestamp).collect();
        assert_eq!(
            times,
            vec![base_time() + Duration::seconds(2), base_time() + Duration::seconds(1)]
        );

        let tail = store.query(&Filter::new().limit(2).offset(4)).unwrap();
        assert_eq!(tail.len(), 1);
    }

    #[test]
    fn test_query_filters_and_is_idempotent() {
        let store = AuditStore::new();
        for i in 0..6 {
            let actor = if i % 2 == 0 { "even" } else { "odd" };
            store.put(&make_record(actor, "t", i)).unwrap();
        }

        let filter = Filter::new().actor("odd").limit(2);
        let first = store.query(&filter).unwrap();
        assert_eq!(first.len(), 2);
        assert!(first.iter().all(|r| r.actor() == "odd"));
        assert_eq!(first, store.query(&filter).unwrap());
    }

    // ── provenance ────────────────────────────────────────────────────────────

    #[test]
    fn test_provenance_is_oldest_first_regardless_of_insertion() {
        let store = AuditStore::new();
        for i in (0..3).rev() {
            store.put(&make_record(&format!("user_{i}"), "f.py", i)).unwrap();
        }
        store.put(&make_record("other", "g.py", 1)).unwrap();

        let history = store.provenance("f.py").unwrap();
        let actors: Vec<&str> = history.iter().map(Record::actor).collect();
        assert_eq!(actors, vec!["user_0", "user_1", "user_2"]);
        assert!(history.iter().all(|r| r.target() == "f.py"));
    }

    #[test]
    fn test_provenance_of_unknown_target_is_empty() {
        let store = AuditStore::new();
        store.put(&make_record("u", "f.py", 0)).unwrap();
        assert!(store.provenance("missing.py").unwrap().is_empty());
    }

    // ── integrity ─────────────────────────────────────────────────────────────

    #[test]
    fn test_verify_integrity_of_valid_store() {
        let store = AuditStore::new();
        for i in 0..3 {
            store.put(&make_record(&format!("user_{i}"), "t", i)).unwrap();
        }
        assert!(store.verify_integrity().unwrap());
    }

    #[test]
    fn test_verify_integrity_detects_tampering() {
        let store = AuditStore::new();
        let good = make_record("u", "t", 0);
        store.put(&good).unwrap();

        // Bypass `put` to simulate an edit made directly in the backend.
        let bad = forged(&make_record("v", "t", 1));
        let bad_too = forged(&make_record("w", "t", 2));
        {
            let mut state = store.memory.state.write().unwrap();
            state.records.insert(bad.id().to_string(), bad);
            state.records.insert(bad_too.id().to_string(), bad_too);
        }

        assert!(!store.verify_integrity().unwrap());
    }

    // ── mirrors ───────────────────────────────────────────────────────────────

    #[test]
    fn test_mirror_failure_is_surfaced_after_memory_write() {
        let store = AuditStore::new().with_mirror(Box::new(FailingBackend));
        let record = make_record("u", "t", 0);

        assert!(matches!(
            store.put(&record),
            Err(LedgerError::Backend { backend, .. }) if backend == "failing"
        ));
        assert!(
            store.get(record.id()).unwrap().is_some(),
            "memory index keeps the record when a mirror fails"
        );
    }

    #[test]
    fn test_get_falls_back_to_mirror() {
        let mirror = MemoryBackend::new();
        let archived = make_record("archivist", "old.py", 0);
        mirror.put(&archived).unwrap();

        let store = AuditStore::new().with_mirror(Box::new(mirror));
        assert_eq!(store.get(archived.id()).unwrap(), Some(archived));
    }

    // ── statistics ────────────────────────────────────────────────────────────

    #[test]
    fn test_statistics() {
        let store = AuditStore::new();
        assert_eq!(store.statistics().unwrap().total_records, 0);
        assert!(store.statistics().unwrap().earliest_record.is_none());

        let mut signed = Record::builder("ci", "scan", "app.py", TargetType::File, "ruff")
            .timestamp(base_time())
            .finding(Finding::new("quality_issue", Severity::Warning, "complex"))
            .violation(Violation::new("E501", Severity::Error, "line too long"))
            .violation(Violation::new("F401", Severity::Warning, "unused import"))
            .build();
        signed.sign(&DigestSigner, &SigningKey::new("k"), "ci");
        store.put(&signed).unwrap();
        store.put(&make_record("u", "t", 60)).unwrap();

        let stats = store.statistics().unwrap();
        assert_eq!(stats.total_records, 2);
        assert_eq!(stats.storage_backend, "memory");
        assert_eq!(stats.total_findings, 1);
        assert_eq!(stats.total_violations, 2);
        assert_eq!(stats.signed_records, 1);
        assert_eq!(stats.earliest_record, Some(base_time()));
        assert_eq!(stats.latest_record, Some(base_time() + Duration::seconds(60)));
    }
}
