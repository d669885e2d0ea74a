//! # sigsale-core — Protocol Primitives
//!
//! Foundational types for the sigsale conditional-payment protocol:
//!
//! - **Identity** ([`identity`]): Opaque, comparable identity handles
//!   ([`Address`]) and caller-assigned deal identifiers ([`DealId`]).
//!   Addresses are derived externally from an Ed25519 verifying key;
//!   the engine never inspects their internal structure.
//!
//! - **Commitment** ([`commitment`]): The SHA-256 signal commitment
//!   scheme. [`commitment_digest`] is the single sanctioned path for
//!   producing a [`SignalCommitment`] — the committing party and the
//!   engine's reveal verification must agree bit-for-bit, so both go
//!   through the same function over the same fixed encoding.
//!
//! - **Error** ([`error`]): Parse and validation errors for the
//!   hex-based constructors.

pub mod commitment;
pub mod error;
pub mod identity;

pub use commitment::{commitment_digest, Secret, SignalCommitment};
pub use error::CoreError;
pub use identity::{Address, DealId};

/// Decode a hex string (with or without a `0x` prefix) into exactly `N` bytes.
///
/// Shared by the parsing constructors in [`identity`] and [`commitment`].
pub(crate) fn hex_to_array<const N: usize>(s: &str) -> Result<[u8; N], CoreError> {
    let s = s.strip_prefix("0x").unwrap_or(s);
    // Hex digits are ASCII; anything else must be rejected before the
    // two-byte slicing below, which would panic on a multibyte boundary.
    if !s.is_ascii() {
        return Err(CoreError::InvalidHex(s.to_string()));
    }
    if s.len() != N * 2 {
        return Err(CoreError::InvalidLength {
            expected: N,
            actual: s.len() / 2,
        });
    }
    let mut out = [0u8; N];
    for (i, byte) in out.iter_mut().enumerate() {
        *byte = u8::from_str_radix(&s[i * 2..i * 2 + 2], 16)
            .map_err(|_| CoreError::InvalidHex(s.to_string()))?;
    }
    Ok(out)
}

/// Encode bytes as lowercase hex.
pub(crate) fn bytes_to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_roundtrip() {
        let bytes = [0xde, 0xad, 0xbe, 0xef];
        let hex = bytes_to_hex(&bytes);
        assert_eq!(hex, "deadbeef");
        let decoded: [u8; 4] = hex_to_array(&hex).unwrap();
        assert_eq!(decoded, bytes);
    }

    #[test]
    fn hex_accepts_0x_prefix() {
        let decoded: [u8; 2] = hex_to_array("0xff00").unwrap();
        assert_eq!(decoded, [0xff, 0x00]);
    }

    #[test]
    fn hex_rejects_wrong_length() {
        let result: Result<[u8; 4], _> = hex_to_array("abcd");
        assert!(matches!(result, Err(CoreError::InvalidLength { .. })));
    }

    #[test]
    fn hex_rejects_non_hex_characters() {
        let result: Result<[u8; 2], _> = hex_to_array("zzzz");
        assert!(matches!(result, Err(CoreError::InvalidHex(_))));
    }

    #[test]
    fn hex_rejects_multibyte_characters() {
        // 'é' is two bytes of UTF-8, so this string passes the byte-length
        // guard for N = 2 but must decode to an error, not a panic.
        let result: Result<[u8; 2], _> = hex_to_array("a\u{e9}0");
        assert!(matches!(result, Err(CoreError::InvalidHex(_))));

        // Address-width variant: 40 bytes, one multibyte character.
        let wide = format!("a\u{e9}{}", "a".repeat(37));
        let result: Result<[u8; 20], _> = hex_to_array(&wide);
        assert!(matches!(result, Err(CoreError::InvalidHex(_))));
    }
}
