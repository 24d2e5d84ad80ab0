//! Signature entries and caller-held key material.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One signature over a record's hash.
///
/// Signatures are appended to a sealed record and never removed. They are
/// excluded from the canonical hash, so adding one does not disturb
/// proof-of-work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSignature {
    /// Identity of the signer.
    pub signer: String,
    /// Encoded signature value. Encoding is defined by `algorithm`.
    pub signature: String,
    /// Name of the scheme that produced `signature`.
    pub algorithm: String,
    /// When the signature was made (UTC).
    pub timestamp: DateTime<Utc>,
}

/// Opaque handle to signing key material supplied by the caller.
///
/// The ledger never generates or persists keys. `Debug` output is redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct SigningKey(String);

impl SigningKey {
    pub fn new(material: impl Into<String>) -> Self {
        Self(material.into())
    }

    /// Raw key material, for `Signer` implementations only.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SigningKey(<redacted>)")
    }
}
