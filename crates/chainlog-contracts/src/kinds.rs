//! Enumerations carried by every audit record.
//!
//! Each enum serializes as a lowercase string. The same string is what the
//! canonical hash commits to, so renaming a wire value invalidates every
//! previously mined record.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

/// What kind of object a record's `target` names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetType {
    File,
    Module,
    Service,
    Log,
    /// A version-control object (commit, branch, repository). Wire value `git`.
    #[serde(rename = "git", alias = "version-control")]
    VersionControl,
    Quality,
}

impl TargetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetType::File => "file",
            TargetType::Module => "module",
            TargetType::Service => "service",
            TargetType::Log => "log",
            TargetType::VersionControl => "git",
            TargetType::Quality => "quality",
        }
    }
}

impl FromStr for TargetType {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "file" => Ok(TargetType::File),
            "module" => Ok(TargetType::Module),
            "service" => Ok(TargetType::Service),
            "log" => Ok(TargetType::Log),
            "git" | "version-control" => Ok(TargetType::VersionControl),
            "quality" => Ok(TargetType::Quality),
            other => Err(LedgerError::UnknownVariant {
                kind: "target type",
                value: other.to_string(),
            }),
        }
    }
}

/// Event severity. Ordered from least to most severe, so `max` escalates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Debug,
    #[default]
    Info,
    Warning,
    Error,
    Critical,
}

impl Severity {
    /// Every level, least severe first.
    pub const ALL: [Severity; 5] = [
        Severity::Debug,
        Severity::Info,
        Severity::Warning,
        Severity::Error,
        Severity::Critical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Debug => "debug",
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Critical => "critical",
        }
    }
}

impl FromStr for Severity {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Severity::ALL
            .into_iter()
            .find(|level| level.as_str() == s)
            .ok_or_else(|| LedgerError::UnknownVariant {
                kind: "severity",
                value: s.to_string(),
            })
    }
}

/// Processing status of a record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    #[default]
    Recorded,
    Analyzed,
    Verified,
    Exported,
}

impl RecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordStatus::Recorded => "recorded",
            RecordStatus::Analyzed => "analyzed",
            RecordStatus::Verified => "verified",
            RecordStatus::Exported => "exported",
        }
    }
}

/// Data classification level of a record's payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Public,
    #[default]
    Internal,
    Confidential,
    Restricted,
}

impl Classification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::Public => "public",
            Classification::Internal => "internal",
            Classification::Confidential => "confidential",
            Classification::Restricted => "restricted",
        }
    }
}

macro_rules! display_as_str {
    ($($ty:ty),*) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.as_str())
                }
            }
        )*
    };
}

display_as_str!(TargetType, Severity, RecordStatus, Classification);
