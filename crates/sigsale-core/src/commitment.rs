//! # Signal Commitment Scheme
//!
//! The commit-reveal primitive of the protocol. A party commits to a
//! satisfaction signal by publishing `SHA-256(secret || signal || happy)`
//! and later reveals the preimage to unlock settlement.
//!
//! ## Encoding Invariant
//!
//! [`commitment_digest`] is the only sanctioned path for producing a
//! [`SignalCommitment`]. The preimage encoding is fixed and ordered:
//!
//! ```text
//! secret (32 bytes) || signal (u64, big-endian, 8 bytes) || happy (1 byte)
//! ```
//!
//! Whoever prepares a commitment outside the engine and the engine's
//! reveal verification must agree bit-for-bit, so both call this function.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::CoreError;
use crate::identity::impl_hex_serde;
use crate::{bytes_to_hex, hex_to_array};

// ---------------------------------------------------------------------------
// Secret
// ---------------------------------------------------------------------------

/// A 32-byte reveal nonce.
///
/// Chosen by the committing party, disclosed at reveal time, and recorded
/// on the deal for observation only — the engine never interprets it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Secret([u8; 32]);

impl Secret {
    /// Width of a secret in bytes.
    pub const LEN: usize = 32;

    /// Create a secret from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Parse a secret from a hex string (`0x` prefix optional).
    pub fn from_hex(s: &str) -> Result<Self, CoreError> {
        hex_to_array(s).map(Self)
    }

    /// Access the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex rendering without prefix.
    pub fn to_hex(&self) -> String {
        bytes_to_hex(&self.0)
    }
}

impl std::fmt::Display for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl_hex_serde!(Secret);

// ---------------------------------------------------------------------------
// SignalCommitment
// ---------------------------------------------------------------------------

/// A 256-bit commitment digest over a `(secret, signal, happy)` tuple.
///
/// Immutable once committed on a deal; only the exact preimage unlocks
/// the matching reveal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SignalCommitment([u8; 32]);

impl SignalCommitment {
    /// Width of a commitment in bytes.
    pub const LEN: usize = 32;

    /// Create a commitment from raw digest bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Parse a commitment from a hex string (`0x` prefix optional).
    pub fn from_hex(s: &str) -> Result<Self, CoreError> {
        hex_to_array(s).map(Self)
    }

    /// Access the raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex rendering without prefix.
    pub fn to_hex(&self) -> String {
        bytes_to_hex(&self.0)
    }
}

impl std::fmt::Display for SignalCommitment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl_hex_serde!(SignalCommitment);

// ---------------------------------------------------------------------------
// Digest computation
// ---------------------------------------------------------------------------

/// Compute the commitment digest for a `(secret, signal, happy)` tuple.
///
/// SHA-256 over the fixed ordered encoding
/// `secret (32) || signal (u64 BE, 8) || happy (1)`.
pub fn commitment_digest(secret: &Secret, signal: u64, happy: bool) -> SignalCommitment {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hasher.update(signal.to_be_bytes());
    hasher.update([u8::from(happy)]);
    SignalCommitment(hasher.finalize().into())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
