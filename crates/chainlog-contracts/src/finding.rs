//! Structured sub-results attached to a record before it is committed.
//!
//! Analyzers emit `Finding`s; linters and scanners emit `Violation`s. Each
//! carries its own severity, and the record that holds them is escalated to
//! the highest one.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::kinds::Severity;

/// An analysis finding produced by an audit analyzer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub finding_id: String,
    /// Analyzer-defined category, e.g. `"quality_issue"`.
    pub finding_type: String,
    pub severity: Severity,
    pub description: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub recommendation: Option<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
}

impl Finding {
    pub fn new(
        finding_type: impl Into<String>,
        severity: Severity,
        description: impl Into<String>,
    ) -> Self {
        Self {
            finding_id: uuid::Uuid::new_v4().to_string(),
            finding_type: finding_type.into(),
            severity,
            description: description.into(),
            location: None,
            recommendation: None,
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_recommendation(mut self, recommendation: impl Into<String>) -> Self {
        self.recommendation = Some(recommendation.into());
        self
    }
}

/// A code quality or security rule violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub violation_id: String,
    /// Identifier of the violated rule, e.g. `"no-unused-vars"`.
    pub rule: String,
    pub severity: Severity,
    pub message: String,
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub line_number: Option<u32>,
    #[serde(default)]
    pub column_number: Option<u32>,
}

impl Violation {
    pub fn new(rule: impl Into<String>, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            violation_id: uuid::Uuid::new_v4().to_string(),
            rule: rule.into(),
            severity,
            message: message.into(),
            file_path: None,
            line_number: None,
            column_number: None,
        }
    }

    /// Pin the violation to a source position.
    pub fn at(mut self, file_path: impl Into<String>, line: u32, column: Option<u32>) -> Self {
        self.file_path = Some(file_path.into());
        self.line_number = Some(line);
        self.column_number = column;
        self
    }
}
