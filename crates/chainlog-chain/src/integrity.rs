//! Chain integrity rules.
//!
//! Every record after genesis must satisfy three invariants against its
//! predecessor:
//!
//!   1. **Hash**: the stored hash equals the recomputed canonical hash.
//!   2. **Link**: `previous_hash` equals the predecessor's hash.
//!   3. **Work**: the hash has at least `difficulty` leading hex zeros.
//!
//! They are checked in that order. `first_violation` stops at the first
//! broken invariant; `violations` reports all of them so an auditor sees the
//! full picture in one pass.

use serde::{Deserialize, Serialize};

use chainlog_core::Record;

/// Which chain invariant a record broke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Invariant {
    HashMismatch,
    BrokenLink,
    InsufficientWork,
}

/// One invariant violation found in stored history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrityIssue {
    /// Position of the offending record in the chain.
    pub index: usize,
    pub record_id: String,
    pub invariant: Invariant,
    pub detail: String,
}

/// Result of a full-chain scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrityReport {
    /// Records checked, genesis excluded.
    pub records_checked: usize,
    pub issues: Vec<IntegrityIssue>,
}

impl IntegrityReport {
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Every invariant `current` (at `index`) breaks against `previous`.
pub fn violations(
    index: usize,
    previous: &Record,
    current: &Record,
    difficulty: usize,
) -> Vec<IntegrityIssue> {
    let issue = |invariant, detail: String| IntegrityIssue {
        index,
        record_id: current.id().to_string(),
        invariant,
        detail,
    };

    let mut issues = Vec::new();

    let recomputed = current.canonical_hash();
    if current.hash() != recomputed {
        issues.push(issue(
            Invariant::HashMismatch,
            format!(
                "stored hash {} does not match recomputed {}",
                short(current.hash()),
                short(&recomputed)
            ),
        ));
    }

    if current.previous_hash() != previous.hash() {
        issues.push(issue(
            Invariant::BrokenLink,
            format!(
                "expected previous_hash {}, got {}",
                short(previous.hash()),
                short(current.previous_hash())
            ),
        ));
    }

    if !current.meets_difficulty(difficulty) {
        issues.push(issue(
            Invariant::InsufficientWork,
            format!(
                "hash {} has fewer than {} leading zeros",
                short(current.hash()),
                difficulty
            ),
        ));
    }

    issues
}

/// The first invariant `current` breaks, if any.
pub fn first_violation(
    index: usize,
    previous: &Record,
    current: &Record,
    difficulty: usize,
) -> Option<IntegrityIssue> {
    violations(index, previous, current, difficulty)
        .into_iter()
        .next()
}

/// Scan `records[1..]` and collect every violation.
pub fn scan(records: &[Record], difficulty: usize) -> IntegrityReport {
    let issues = records
        .windows(2)
        .enumerate()
        .flat_map(|(i, pair)| violations(i + 1, &pair[0], &pair[1], difficulty))
        .collect();

    IntegrityReport {
        records_checked: records.len().saturating_sub(1),
        issues,
    }
}

/// First 16 characters of a hash, for log lines.
pub(crate) fn short(hash: &str) -> &str {
    hash.get(..16).unwrap_or(hash)
}
