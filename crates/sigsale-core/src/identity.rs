//! # Identity Newtypes
//!
//! Domain-primitive newtypes for the escrow protocol. Each identifier is a
//! distinct type — you cannot pass a [`DealId`] where an [`Address`] is
//! expected.
//!
//! An [`Address`] is an opaque 20-byte identity handle derived externally
//! from an Ed25519 verifying key. The escrow engine only ever compares
//! addresses; it never looks inside them. A [`DealId`] is an opaque 32-byte
//! caller-assigned identifier, globally unique per deal.

use ed25519_dalek::VerifyingKey;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::CoreError;
use crate::{bytes_to_hex, hex_to_array};

/// Helper macro to implement `Serialize`/`Deserialize` for fixed-width
/// byte newtypes as hex strings. Deserialization routes through the
/// type's `from_hex()` constructor so that malformed values are rejected
/// at deserialization time — not silently accepted.
macro_rules! impl_hex_serde {
    ($ty:ident) => {
        impl Serialize for $ty {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.serialize_str(&self.to_hex())
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let raw = String::deserialize(deserializer)?;
                Self::from_hex(&raw).map_err(serde::de::Error::custom)
            }
        }
    };
}

pub(crate) use impl_hex_serde;

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

/// An opaque identity handle for a protocol participant.
///
/// 20 bytes, derived from a public-key cryptosystem outside the engine.
/// Comparable and hashable; the engine treats it as a black box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; 20]);

impl Address {
    /// Width of an address in bytes.
    pub const LEN: usize = 20;

    /// Create an address from raw bytes.
    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Parse an address from a hex string (`0x` prefix optional).
    pub fn from_hex(s: &str) -> Result<Self, CoreError> {
        hex_to_array(s).map(Self)
    }

    /// Derive an address from an Ed25519 verifying key.
    ///
    /// The handle is the first 20 bytes of `SHA-256(verifying_key_bytes)`.
    /// This is the only derivation path; key custody stays outside the
    /// protocol core.
    pub fn from_verifying_key(key: &VerifyingKey) -> Self {
        let digest = Sha256::digest(key.as_bytes());
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&digest[..20]);
        Self(bytes)
    }

    /// Access the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Lowercase hex rendering without prefix.
    pub fn to_hex(&self) -> String {
        bytes_to_hex(&self.0)
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl std::str::FromStr for Address {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl_hex_serde!(Address);

// ---------------------------------------------------------------------------
// DealId
// ---------------------------------------------------------------------------

/// A caller-assigned, globally unique identifier for one escrow deal.
///
/// 32 bytes, opaque. A deal id may be created at most once; the store
/// enforces create-once regardless of the other arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DealId([u8; 32]);

impl DealId {
    /// Width of a deal id in bytes.
    pub const LEN: usize = 32;

    /// Create a deal id from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Parse a deal id from a hex string (`0x` prefix optional).
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

impl std::fmt::Display for DealId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "deal:{}", self.to_hex())
    }
}

impl std::str::FromStr for DealId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl_hex_serde!(DealId);

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
