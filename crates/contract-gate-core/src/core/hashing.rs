// crates/contract-gate-core/src/core/hashing.rs
// ============================================================================
// Module: Contract Gate Content Digests
// Description: Canonical-JSON content digests for snapshot artifacts.
// Purpose: Let CI detect "nothing changed" and re-verify stored snapshots.
// Dependencies: serde, serde_jcs, sha2, thiserror
// ============================================================================

//! ## Overview
//! Snapshot artifacts carry a content digest over their canonical spec list.
//! Values are serialized to RFC 8785 (JCS) canonical JSON before digesting so
//! two corpora with the same semantics digest identically, and a stored
//! digest can be re-verified against the specs it covers at any later point.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use sha2::Digest;
use sha2::Sha256;
use thiserror::Error;

// ============================================================================
// SECTION: Hash Algorithm
// ============================================================================

/// Digest algorithms accepted in snapshot artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HashAlgorithm {
    /// SHA-256.
    Sha256,
}

/// Algorithm used when snapshot options do not override it.
pub const DEFAULT_HASH_ALGORITHM: HashAlgorithm = HashAlgorithm::Sha256;

impl HashAlgorithm {
    /// Returns the stable wire label of the algorithm.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
        }
    }

    /// Digests raw bytes into lowercase hex.
    fn digest_hex(self, bytes: &[u8]) -> String {
        match self {
            Self::Sha256 => format!("{:x}", Sha256::digest(bytes)),
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while computing content digests.
#[derive(Debug, Error)]
pub enum HashError {
    /// Canonical serialization of the digested value failed.
    #[error("canonical serialization failed: {0}")]
    Canonicalization(String),
}

// ============================================================================
// SECTION: Content Digest
// ============================================================================

/// Content digest recorded in a snapshot artifact.
///
/// # Invariants
/// - `value` is the lowercase hex encoding of the digest bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashDigest {
    /// Algorithm the digest was computed with.
    pub algorithm: HashAlgorithm,
    /// Lowercase hex digest bytes.
    pub value: String,
}

impl HashDigest {
    /// Digests raw bytes.
    #[must_use]
    pub fn of_bytes(algorithm: HashAlgorithm, bytes: &[u8]) -> Self {
        Self {
            algorithm,
            value: algorithm.digest_hex(bytes),
        }
    }

    /// Digests the canonical JSON form of a serializable value.
    ///
    /// # Errors
    ///
    /// Returns [`HashError::Canonicalization`] when serialization fails.
    pub fn of_canonical_json<T: Serialize + ?Sized>(
        algorithm: HashAlgorithm,
        value: &T,
    ) -> Result<Self, HashError> {
        Ok(Self::of_bytes(algorithm, &canonical_json_bytes(value)?))
    }

    /// Whether this digest matches a recomputation over a value, using the
    /// algorithm recorded in the digest itself.
    ///
    /// # Errors
    ///
    /// Returns [`HashError::Canonicalization`] when serialization fails.
    pub fn verifies<T: Serialize + ?Sized>(&self, value: &T) -> Result<bool, HashError> {
        Ok(*self == Self::of_canonical_json(self.algorithm, value)?)
    }
}

impl fmt::Display for HashDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.value)
    }
}

// ============================================================================
// SECTION: Canonical Serialization
// ============================================================================

/// Returns the RFC 8785 canonical JSON bytes of a serializable value.
///
/// # Errors
///
/// Returns [`HashError::Canonicalization`] when serialization fails.
pub fn canonical_json_bytes<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, HashError> {
    serde_jcs::to_vec(value).map_err(|err| HashError::Canonicalization(err.to_string()))
}
