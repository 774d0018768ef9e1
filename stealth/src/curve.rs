//! Scalar and point algebra over ed25519
//!
//! Thin wrappers around curve25519-dalek so that the rest of the crate
//! speaks in terms of ledger addresses and 32-byte little-endian scalars.
//!
//! Every scalar handed to a point multiplication is reduced mod l first.
//! Scalar multiplication in curve25519-dalek is constant-time; variable-time
//! paths are not used anywhere in this crate.

use curve25519_dalek::{
    constants::ED25519_BASEPOINT_TABLE,
    edwards::{CompressedEdwardsY, EdwardsPoint},
    scalar::Scalar,
};
use sha2::{Digest, Sha512};
use solana_sdk::pubkey::Pubkey;
use zeroize::Zeroize;

use crate::error::{Result, StealthError};

/// Size of a compressed point and of a serialized scalar
pub const KEY_LENGTH: usize = 32;

// ============================================================================
// Zeroizing Scalar Wrapper
// ============================================================================

/// A scalar that zeroizes its contents on drop
///
/// Holds the canonical (reduced) little-endian encoding.
#[derive(Clone)]
pub struct SecretScalar {
    bytes: [u8; 32],
}

impl SecretScalar {
    /// Create from raw little-endian bytes, reducing mod l
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self::from_scalar(&Scalar::from_bytes_mod_order(bytes))
    }

    pub fn from_scalar(scalar: &Scalar) -> Self {
        Self { bytes: scalar.to_bytes() }
    }

    pub fn to_scalar(&self) -> Scalar {
        Scalar::from_bytes_mod_order(self.bytes)
    }

    /// Get the raw bytes (use carefully)
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.bytes
    }

    /// Public point `self·G`
    pub fn public_point(&self) -> EdwardsPoint {
        base_mul(&self.to_scalar())
    }

    /// Public point as a ledger address
    pub fn pubkey(&self) -> Pubkey {
        point_to_pubkey(&self.public_point())
    }
}

impl Drop for SecretScalar {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for SecretScalar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretScalar(..)")
    }
}

// ============================================================================
// Scalars
// ============================================================================

/// Read a little-endian scalar of any length up to 32 bytes, reducing mod l
///
/// Shorter inputs are zero-extended, matching big-integer parsing of a
/// trimmed little-endian encoding.
pub fn scalar_from_le_bytes(bytes: &[u8]) -> Result<Scalar> {
    if bytes.len() > KEY_LENGTH {
        return Err(StealthError::InvalidLength {
            expected: KEY_LENGTH,
            actual: bytes.len(),
        });
    }
    let mut buf = [0u8; 32];
    buf[..bytes.len()].copy_from_slice(bytes);
    let scalar = Scalar::from_bytes_mod_order(buf);
    buf.zeroize();
    Ok(scalar)
}

/// Standard ed25519 secret-key expansion
///
/// `SHA-512(seed)`, keep the low half, clamp it, reduce mod l. This is the
/// transform a seed goes through before it becomes an EdDSA signing scalar.
pub fn expand_seed(seed: &[u8]) -> Scalar {
    let hash = Sha512::digest(seed);
    let mut head = [0u8; 32];
    head.copy_from_slice(&hash[..32]);
    head[0] &= 248;
    head[31] &= 127;
    head[31] |= 64;
    let scalar = Scalar::from_bytes_mod_order(head);
    head.zeroize();
    scalar
}

/// SHA-512 over the concatenated parts, read as a 512-bit little-endian
/// integer and reduced mod l
pub fn hash_to_scalar(parts: &[&[u8]]) -> Scalar {
    let mut hasher = Sha512::new();
    for part in parts {
        hasher.update(part);
    }
    let mut wide = [0u8; 64];
    wide.copy_from_slice(&hasher.finalize());
    let scalar = Scalar::from_bytes_mod_order_wide(&wide);
    wide.zeroize();
    scalar
}

// ============================================================================
// Points
// ============================================================================

/// `scalar·G`
pub fn base_mul(scalar: &Scalar) -> EdwardsPoint {
    scalar * &ED25519_BASEPOINT_TABLE
}

/// Decompress a 32-byte compressed Edwards Y encoding
pub fn decode_point(bytes: &[u8]) -> Result<EdwardsPoint> {
    if bytes.len() != KEY_LENGTH {
        return Err(StealthError::InvalidLength {
            expected: KEY_LENGTH,
            actual: bytes.len(),
        });
    }
    CompressedEdwardsY::from_slice(bytes)
        .decompress()
        .ok_or(StealthError::InvalidPoint)
}

pub fn encode_point(point: &EdwardsPoint) -> [u8; 32] {
    point.compress().to_bytes()
}

/// Interpret a ledger address as a curve point
///
/// Program-derived addresses are off-curve by construction and fail here.
pub fn pubkey_to_point(pubkey: &Pubkey) -> Result<EdwardsPoint> {
    decode_point(pubkey.as_ref())
}

pub fn point_to_pubkey(point: &EdwardsPoint) -> Pubkey {
    Pubkey::new_from_array(encode_point(point))
}

/// Decode a base58 address string into a curve point
pub fn parse_point(encoded: &str) -> Result<EdwardsPoint> {
    let bytes = bs58::decode(encoded).into_vec()?;
    decode_point(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use curve25519_dalek::constants::ED25519_BASEPOINT_POINT;

    #[test]
    fn test_base_mul_matches_point_mul() {
        let scalar = Scalar::from(12345u64);
        assert_eq!(base_mul(&scalar), &scalar * &ED25519_BASEPOINT_POINT);
    }

    #[test]
    fn test_decode_rejects_wrong_length() {
        let err = decode_point(&[1u8; 31]).unwrap_err();
        assert!(matches!(
            err,
            StealthError::InvalidLength { expected: 32, actual: 31 }
        ));
    }

    #[test]
    fn test_decode_rejects_off_curve_bytes() {
        // y = 2 has no matching x on ed25519
        let mut bytes = [0u8; 32];
        bytes[0] = 2;
        assert!(matches!(decode_point(&bytes), Err(StealthError::InvalidPoint)));
    }

    #[test]
    fn test_pubkey_point_roundtrip() {
        let point = base_mul(&Scalar::from(7u64));
        let pubkey = point_to_pubkey(&point);
        assert_eq!(pubkey_to_point(&pubkey).unwrap(), point);
        assert_eq!(parse_point(&pubkey.to_string()).unwrap(), point);
    }

    #[test]
    fn test_expand_seed_is_clamped_and_deterministic() {
        let seed = [9u8; 32];
        assert_eq!(expand_seed(&seed), expand_seed(&seed));
        assert_ne!(expand_seed(&seed), expand_seed(&[10u8; 32]));
    }

    #[test]
    fn test_scalar_from_short_le_bytes() {
        assert_eq!(scalar_from_le_bytes(&[7]).unwrap(), Scalar::from(7u64));
        assert!(scalar_from_le_bytes(&[0u8; 33]).is_err());
    }

    #[test]
    fn test_secret_scalar_reduces() {
        let order = curve25519_dalek::constants::BASEPOINT_ORDER.to_bytes();
        let reduced = SecretScalar::from_bytes(order);
        assert_eq!(reduced.to_scalar(), Scalar::zero());
        assert_eq!(reduced.as_bytes(), &[0u8; 32]);
    }
}
