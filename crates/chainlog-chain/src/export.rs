//! Export and import encodings for a whole chain.
//!
//! Both formats carry the same shape: a sequence of records, genesis first,
//! with enums as their string values and timestamps as RFC 3339. JSON is
//! pretty-printed; YAML uses block style.

use std::fmt;
use std::str::FromStr;

use chainlog_contracts::error::{LedgerError, LedgerResult};
use chainlog_core::Record;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Yaml,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Yaml => "yaml",
        }
    }

    pub fn encode(&self, records: &[Record]) -> LedgerResult<String> {
        match self {
            ExportFormat::Json => {
                serde_json::to_string_pretty(records).map_err(|e| LedgerError::Serialization {
                    reason: format!("failed to encode chain as JSON: {}", e),
                })
            }
            ExportFormat::Yaml => {
                serde_yaml::to_string(records).map_err(|e| LedgerError::Serialization {
                    reason: format!("failed to encode chain as YAML: {}", e),
                })
            }
        }
    }

    pub fn decode(&self, text: &str) -> LedgerResult<Vec<Record>> {
        match self {
            ExportFormat::Json => {
                serde_json::from_str(text).map_err(|e| LedgerError::Serialization {
                    reason: format!("failed to decode JSON chain export: {}", e),
                })
            }
            ExportFormat::Yaml => {
                serde_yaml::from_str(text).map_err(|e| LedgerError::Serialization {
                    reason: format!("failed to decode YAML chain export: {}", e),
                })
            }
        }
    }
}

impl FromStr for ExportFormat {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(ExportFormat::Json),
            "yaml" => Ok(ExportFormat::Yaml),
            other => Err(LedgerError::UnsupportedFormat {
                format: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
