//! Summary statistics over a chain's non-genesis records.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use chainlog_contracts::kinds::Severity;
use chainlog_core::Record;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainStatistics {
    /// Records after genesis.
    pub total_records: usize,
    pub earliest_timestamp: Option<DateTime<Utc>>,
    pub latest_timestamp: Option<DateTime<Utc>>,
    pub unique_actors: usize,
    pub unique_actions: usize,
    /// Count per severity; every level is present, zero when unused.
    pub severity_counts: BTreeMap<Severity, usize>,
}

impl ChainStatistics {
    /// Summarize `records`, which must already exclude genesis.
    pub fn summarize(records: &[Record]) -> Self {
        let mut severity_counts: BTreeMap<Severity, usize> =
            Severity::ALL.into_iter().map(|level| (level, 0)).collect();

        for record in records {
            *severity_counts.entry(record.severity()).or_default() += 1;
        }

        Self {
            total_records: records.len(),
            earliest_timestamp: records.iter().map(Record::timestamp).min(),
            latest_timestamp: records.iter().map(Record::timestamp).max(),
            unique_actors: records.iter().map(Record::actor).collect::<HashSet<_>>().len(),
            unique_actions: records.iter().map(Record::action).collect::<HashSet<_>>().len(),
            severity_counts,
        }
    }
}
