//! Ledger configuration loaded from TOML.
//!
//! Every field has a default, so an empty document is a valid configuration:
//!
//! ```toml
//! difficulty = 2
//!
//! [genesis]
//! actor = "system"
//! target = "audit_chain"
//! source = "system"
//! reason = "Initialize audit chain"
//!
//! [export]
//! default_format = "json"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, LedgerResult};

/// Highest accepted proof-of-work difficulty.
///
/// Expected mining cost is 16^difficulty hashes per record.
pub const MAX_DIFFICULTY: usize = 5;

/// Top-level ledger configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Leading hex zeros required of every chained record's hash.
    #[serde(default = "default_difficulty")]
    pub difficulty: usize,

    #[serde(default)]
    pub genesis: GenesisConfig,

    #[serde(default)]
    pub export: ExportConfig,
}

/// Provenance fields written into the genesis record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenesisConfig {
    pub actor: String,
    pub target: String,
    pub source: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Format used when a caller does not name one (`json` or `yaml`).
    pub default_format: String,
}

fn default_difficulty() -> usize {
    2
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            difficulty: default_difficulty(),
            genesis: GenesisConfig::default(),
            export: ExportConfig::default(),
        }
    }
}

impl Default for GenesisConfig {
    fn default() -> Self {
        Self {
            actor: "system".to_string(),
            target: "audit_chain".to_string(),
            source: "system".to_string(),
            reason: "Initialize audit chain".to_string(),
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            default_format: "json".to_string(),
        }
    }
}

impl LedgerConfig {
    /// Parse `s` as TOML and validate the result.
    ///
    /// Returns `LedgerError::Config` if the TOML is malformed, does not match
    /// the schema, or holds an out-of-range value.
    pub fn from_toml_str(s: &str) -> LedgerResult<Self> {
        let config: LedgerConfig = toml::from_str(s).map_err(|e| LedgerError::Config {
            reason: format!("failed to parse ledger TOML: {}", e),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Read the file at `path` and parse it as ledger configuration.
    pub fn from_file(path: &Path) -> LedgerResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| LedgerError::Config {
            reason: format!("failed to read config file '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn validate(&self) -> LedgerResult<()> {
        check_difficulty(self.difficulty)?;
        if self.genesis.actor.is_empty() || self.genesis.target.is_empty() {
            return Err(LedgerError::Config {
                reason: "genesis actor and target must not be empty".to_string(),
            });
        }
        match self.export.default_format.as_str() {
            "json" | "yaml" => Ok(()),
            other => Err(LedgerError::UnsupportedFormat {
                format: other.to_string(),
            }),
        }
    }
}

/// Reject difficulties above `MAX_DIFFICULTY`.
pub fn check_difficulty(difficulty: usize) -> LedgerResult<()> {
    if difficulty > MAX_DIFFICULTY {
        return Err(LedgerError::Config {
            reason: format!(
                "difficulty {} exceeds maximum of {}",
                difficulty, MAX_DIFFICULTY
            ),
        });
    }
    Ok(())
}
