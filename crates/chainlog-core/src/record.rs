//! The audit record and its two lifecycle phases.
//!
//! ```text
//!   RecordBuilder ──build()──▶ Record (sealed) ──into_pending()──▶ PendingRecord
//!                                   ▲                                   │
//!                                   └─────────────seal()────────────────┘
//! ```
//!
//! A `Record` is read-only apart from appending signatures, which sit outside
//! the hashed payload. Linking and mining happen on a `PendingRecord`, which
//! only the chain's append path holds; it owns the record outright, so no
//! sealed copy can observe the intermediate states.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use chainlog_contracts::{
    finding::{Finding, Violation},
    kinds::{Classification, RecordStatus, Severity, TargetType},
    signature::{RecordSignature, SigningKey},
};

use crate::{
    hash::{canonical_timestamp, digest_value, meets_difficulty},
    signing::Signer,
};

/// `previous_hash` of the genesis record and of records not yet chained.
pub const UNLINKED_HASH: &str = "0";

/// A single hashed, optionally signed audit event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    id: String,
    hash: String,
    timestamp: DateTime<Utc>,

    actor: String,
    action: String,
    target: String,
    target_type: TargetType,
    source: String,
    #[serde(default)]
    reason: Option<String>,

    #[serde(default)]
    context: BTreeMap<String, Value>,
    #[serde(default)]
    metadata: BTreeMap<String, Value>,

    previous_hash: String,
    nonce: u64,

    #[serde(default)]
    signatures: Vec<RecordSignature>,

    #[serde(default)]
    findings: Vec<Finding>,
    #[serde(default)]
    violations: Vec<Violation>,

    severity: Severity,
    classification: Classification,
    status: RecordStatus,
}

impl Record {
    /// Start building a record with its required provenance fields.
    pub fn builder(
        actor: impl Into<String>,
        action: impl Into<String>,
        target: impl Into<String>,
        target_type: TargetType,
        source: impl Into<String>,
    ) -> RecordBuilder {
        RecordBuilder::new(actor, action, target, target_type, source)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn actor(&self) -> &str {
        &self.actor
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn target_type(&self) -> TargetType {
        self.target_type
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    pub fn context(&self) -> &BTreeMap<String, Value> {
        &self.context
    }

    pub fn metadata(&self) -> &BTreeMap<String, Value> {
        &self.metadata
    }

    pub fn previous_hash(&self) -> &str {
        &self.previous_hash
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    pub fn signatures(&self) -> &[RecordSignature] {
        &self.signatures
    }

    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn classification(&self) -> Classification {
        self.classification
    }

    pub fn status(&self) -> RecordStatus {
        self.status
    }

    /// Compute the canonical SHA-256 hash of this record's hashed fields.
    ///
    /// `hash` and `signatures` are excluded: signatures sign the hash, so
    /// including them would be circular. Findings and violations are carried
    /// alongside the payload but are not part of it; their effect on the
    /// record is committed through `severity`.
    pub fn canonical_hash(&self) -> String {
        let content = json!({
            "id": self.id,
            "timestamp": canonical_timestamp(&self.timestamp),
            "actor": self.actor,
            "action": self.action,
            "target": self.target,
            "target_type": self.target_type.as_str(),
            "source": self.source,
            "reason": self.reason,
            "context": self.context,
            "metadata": self.metadata,
            "previous_hash": self.previous_hash,
            "nonce": self.nonce,
            "severity": self.severity.as_str(),
            "classification": self.classification.as_str(),
            "status": self.status.as_str(),
        });
        digest_value(&content)
    }

    /// True iff the stored hash matches the recomputed canonical hash.
    ///
    /// Does not check proof-of-work or chain linkage.
    pub fn verify(&self) -> bool {
        self.hash == self.canonical_hash()
    }

    /// True when the stored hash satisfies `difficulty`.
    pub fn meets_difficulty(&self, difficulty: usize) -> bool {
        meets_difficulty(&self.hash, difficulty)
    }

    /// True for a record that starts a chain.
    pub fn is_genesis(&self) -> bool {
        self.previous_hash == UNLINKED_HASH && self.action == "genesis"
    }

    /// Append a signature over this record's hash.
    ///
    /// The hash is never touched, so proof-of-work and `verify()` are
    /// unaffected. Returns the entry that was appended.
    pub fn sign(
        &mut self,
        signer: &dyn Signer,
        key: &SigningKey,
        signer_id: &str,
    ) -> RecordSignature {
        let entry = RecordSignature {
            signer: signer_id.to_string(),
            signature: signer.sign(&self.hash, signer_id, key),
            algorithm: signer.algorithm().to_string(),
            timestamp: Utc::now(),
        };
        self.signatures.push(entry.clone());

        debug!(
            record_id = %self.id,
            signer = %signer_id,
            algorithm = %entry.algorithm,
            "record signed"
        );

        entry
    }

    /// True when every attached signature verifies under `signer`.
    ///
    /// An unsigned record is vacuously valid.
    pub fn verify_signatures(&self, signer: &dyn Signer) -> bool {
        self.signatures
            .iter()
            .all(|sig| signer.verify(&self.hash, sig))
    }

    /// Reopen the record for linking and mining.
    ///
    /// For `chainlog-chain`'s genesis and append paths only. Other callers
    /// get no integrity guarantee from a record resealed this way.
    #[doc(hidden)]
    pub fn into_pending(self) -> PendingRecord {
        PendingRecord { inner: self }
    }
}

// ── Pending (mutable) phase ───────────────────────────────────────────────────

/// A record being linked and mined. Only the chain's append path uses this.
#[doc(hidden)]
#[derive(Debug)]
pub struct PendingRecord {
    inner: Record,
}

impl PendingRecord {
    pub fn id(&self) -> &str {
        &self.inner.id
    }

    pub fn hash(&self) -> &str {
        &self.inner.hash
    }

    pub fn nonce(&self) -> u64 {
        self.inner.nonce
    }

    /// Point this record at its chain predecessor and rehash.
    pub fn link(&mut self, previous_hash: impl Into<String>) {
        self.inner.previous_hash = previous_hash.into();
        self.rehash();
    }

    /// Search nonces until the hash has `difficulty` leading zeros.
    ///
    /// A hash that already satisfies the target is kept. Runs on the calling
    /// thread with no cancellation; expected cost is `16^difficulty` hashes.
    /// Returns the number of nonces tried.
    pub fn mine(&mut self, difficulty: usize) -> u64 {
        let mut attempts = 0u64;
        while !meets_difficulty(&self.inner.hash, difficulty) {
            self.inner.nonce = self.inner.nonce.wrapping_add(1);
            self.rehash();
            attempts += 1;
        }
        attempts
    }

    pub fn verify(&self) -> bool {
        self.inner.verify()
    }

    /// Freeze the record.
    pub fn seal(self) -> Record {
        self.inner
    }

    fn rehash(&mut self) {
        self.inner.hash = self.inner.canonical_hash();
    }
}

// ── Builder ───────────────────────────────────────────────────────────────────

/// Collects a record's fields; `build()` assigns the id and computes the hash.
#[derive(Debug, Clone)]
pub struct RecordBuilder {
    actor: String,
    action: String,
    target: String,
    target_type: TargetType,
    source: String,
    reason: Option<String>,
    timestamp: Option<DateTime<Utc>>,
    context: BTreeMap<String, Value>,
    metadata: BTreeMap<String, Value>,
    findings: Vec<Finding>,
    violations: Vec<Violation>,
    severity: Severity,
    classification: Classification,
    status: RecordStatus,
}

impl RecordBuilder {
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
            timestamp: None,
            context: BTreeMap::new(),
            metadata: BTreeMap::new(),
            findings: Vec::new(),
            violations: Vec::new(),
            severity: Severity::default(),
            classification: Classification::default(),
            status: RecordStatus::default(),
        }
    }

    pub fn reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Override the creation time (defaults to now at `build()`).
    pub fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn context(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    pub fn metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn context_map(mut self, context: BTreeMap<String, Value>) -> Self {
        self.context.extend(context);
        self
    }

    pub fn metadata_map(mut self, metadata: BTreeMap<String, Value>) -> Self {
        self.metadata.extend(metadata);
        self
    }

    pub fn finding(mut self, finding: Finding) -> Self {
        self.findings.push(finding);
        self
    }

    pub fn findings(mut self, findings: impl IntoIterator<Item = Finding>) -> Self {
        self.findings.extend(findings);
        self
    }

    pub fn violation(mut self, violation: Violation) -> Self {
        self.violations.push(violation);
        self
    }

    pub fn violations(mut self, violations: impl IntoIterator<Item = Violation>) -> Self {
        self.violations.extend(violations);
        self
    }

    /// Base severity. The built record is raised to the most severe attached
    /// finding or violation, never lowered below it.
    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn classification(mut self, classification: Classification) -> Self {
        self.classification = classification;
        self
    }

    pub fn status(mut self, status: RecordStatus) -> Self {
        self.status = status;
        self
    }

    pub fn build(self) -> Record {
        let severity = self
            .findings
            .iter()
            .map(|f| f.severity)
            .chain(self.violations.iter().map(|v| v.severity))
            .fold(self.severity, Severity::max);

        let mut record = Record {
            id: uuid::Uuid::new_v4().to_string(),
            hash: String::new(),
            timestamp: self.timestamp.unwrap_or_else(Utc::now),
            actor: self.actor,
            action: self.action,
            target: self.target,
            target_type: self.target_type,
            source: self.source,
            reason: self.reason,
            context: self.context,
            metadata: self.metadata,
            previous_hash: UNLINKED_HASH.to_string(),
            nonce: 0,
            signatures: Vec::new(),
            findings: self.findings,
            violations: self.violations,
            severity,
            classification: self.classification,
            status: self.status,
        };
        record.hash = record.canonical_hash();
        record
    }
}
