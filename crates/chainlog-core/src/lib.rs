//! # chainlog-core
//!
//! The record protocol of the chainlog ledger.
//!
//! This crate provides:
//! - Canonical hashing (`hash`) that is independent of map insertion order
//! - The two-phase record lifecycle: sealed `Record` and the `PendingRecord`
//!   used for linking and proof-of-work mining
//! - `Filter`, the predicate shared by chain and store queries
//! - The two seams the rest of the workspace plugs into: `Signer` for
//!   signature schemes and `RecordBackend` for storage engines
//!
//! ## Usage
//!
//! ```rust,ignore
//! use chainlog_core::{Record, signing::DigestSigner};
//! use chainlog_contracts::{SigningKey, TargetType};
//!
//! let mut record = Record::builder("alice", "edit", "src/lib.rs", TargetType::File, "ide")
//!     .reason("fix typo")
//!     .build();
//! assert!(record.verify());
//!
//! record.sign(&DigestSigner, &SigningKey::new("k"), "alice");
//! assert!(record.verify());
//! ```

pub mod filter;
pub mod hash;
pub mod record;
pub mod signing;
pub mod traits;

pub use filter::{Filter, DEFAULT_LIMIT};
#[doc(hidden)]
pub use record::PendingRecord;
pub use record::{Record, RecordBuilder, UNLINKED_HASH};
pub use signing::{DigestSigner, Signer};
pub use traits::RecordBackend;

// ── Tests ─────────────────────────────────────────────────────────────────────
