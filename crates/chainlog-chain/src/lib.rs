//! # chainlog-chain
//!
//! Append-only, proof-of-work, SHA-256 hash-chained audit ledger.
//!
//! ## Overview
//!
//! A `Chain` starts with a mined genesis record. Every appended record is
//! linked to the tip through `previous_hash`, mined until its hash has
//! `difficulty` leading zeros, and verified before it is accepted. Editing
//! any stored record (even a single byte of its context) breaks its own
//! hash, the next record's link, or both, and `verify_chain` detects it.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use chainlog_chain::Chain;
//! use chainlog_core::{Filter, Record};
//! use chainlog_contracts::TargetType;
//!
//! let chain = Chain::new(2)?;
//! chain.append(Record::builder("alice", "edit", "f.py", TargetType::File, "ide").build())?;
//!
//! assert!(chain.verify_chain());
//! let mine = chain.find(&Filter::new().actor("alice"));
//! let json = chain.export_chain("json")?;
//! ```

pub mod chain;
pub mod export;
pub mod integrity;
pub mod stats;

pub use chain::Chain;
pub use export::ExportFormat;
pub use integrity::{IntegrityIssue, IntegrityReport, Invariant};
pub use stats::ChainStatistics;

// ── Tests ─────────────────────────────────────────────────────────────────────
