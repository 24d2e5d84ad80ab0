//! Pluggable record signing.
//!
//! A `Signer` turns a record hash plus caller-held key material into a
//! signature string and checks signatures it (or a compatible scheme)
//! produced. Chain and record call sites depend only on this trait, so an
//! asymmetric scheme can replace `DigestSigner` without touching them.

use chainlog_contracts::signature::{RecordSignature, SigningKey};

use crate::hash::sha256_hex;

/// A signature scheme over record hashes.
pub trait Signer: Send + Sync {
    /// Name written into `RecordSignature::algorithm`.
    fn algorithm(&self) -> &str;

    /// Sign `record_hash` on behalf of `signer_id` using `key`.
    fn sign(&self, record_hash: &str, signer_id: &str, key: &SigningKey) -> String;

    /// Check `signature` against `record_hash`.
    ///
    /// Real schemes resolve the signer's public key and verify
    /// cryptographically. Structural-only schemes may ignore `record_hash`.
    fn verify(&self, record_hash: &str, signature: &RecordSignature) -> bool;
}

/// Placeholder scheme: `sha256(record_hash || signer_id || key)`.
///
/// NOT cryptographically secure. Anyone holding the key string can forge a
/// signature, and `verify` only checks that the value is a well-formed
/// SHA-256 hex digest produced under this algorithm name, because the key
/// is never available to the verifier.
#[derive(Debug, Clone, Copy, Default)]
pub struct DigestSigner;

impl DigestSigner {
    pub const ALGORITHM: &'static str = "sha256-digest";

    const DIGEST_HEX_LEN: usize = 64;
}

impl Signer for DigestSigner {
    fn algorithm(&self) -> &str {
        Self::ALGORITHM
    }

    fn sign(&self, record_hash: &str, signer_id: &str, key: &SigningKey) -> String {
        let input = format!("{}{}{}", record_hash, signer_id, key.expose());
        sha256_hex(input.as_bytes())
    }

    fn verify(&self, _record_hash: &str, signature: &RecordSignature) -> bool {
        signature.algorithm == Self::ALGORITHM
            && signature.signature.len() == Self::DIGEST_HEX_LEN
            && signature.signature.bytes().all(|b| b.is_ascii_hexdigit())
    }
}
