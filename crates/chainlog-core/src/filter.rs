//! Record filters shared by the chain and the store.
//!
//! A `Filter` is a value snapshot: every builder method consumes and returns
//! it, and `matches` is a pure function of the filter and one record.
//! Pagination fields are not part of `matches`; each caller applies them with
//! its own semantics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use chainlog_contracts::kinds::{Severity, TargetType};

use crate::record::Record;

/// Page size used when a filter does not set one.
pub const DEFAULT_LIMIT: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    #[serde(default)]
    pub target_type: Option<TargetType>,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub actor: Option<String>,
    #[serde(default)]
    pub severity: Option<Severity>,
    /// Inclusive lower bound on `timestamp`.
    #[serde(default)]
    pub since: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `timestamp`.
    #[serde(default)]
    pub until: Option<DateTime<Utc>>,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    DEFAULT_LIMIT
}

impl Default for Filter {
    fn default() -> Self {
        Self {
            target_type: None,
            action: None,
            actor: None,
            severity: None,
            since: None,
            until: None,
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn target_type(mut self, target_type: TargetType) -> Self {
        self.target_type = Some(target_type);
        self
    }

    pub fn action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    pub fn actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = Some(actor.into());
        self
    }

    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }

    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    pub fn until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    /// True when `timestamp` lies within `[since, until]`.
    pub fn in_time_range(&self, timestamp: DateTime<Utc>) -> bool {
        if self.since.is_some_and(|since| timestamp < since) {
            return false;
        }
        !self.until.is_some_and(|until| timestamp > until)
    }

    /// Conjunction of every constraint that is set. Unset fields match
    /// anything.
    pub fn matches(&self, record: &Record) -> bool {
        if self.target_type.is_some_and(|t| record.target_type() != t) {
            return false;
        }
        if self.action.as_deref().is_some_and(|a| record.action() != a) {
            return false;
        }
        if self.actor.as_deref().is_some_and(|a| record.actor() != a) {
            return false;
        }
        if self.severity.is_some_and(|s| record.severity() != s) {
            return false;
        }
        self.in_time_range(record.timestamp())
    }
}
