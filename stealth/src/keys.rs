//! Stealth key material
//!
//! Meta-keys are derived deterministically from a 64-byte secret, which in
//! practice is a signature by the user's primary ledger key over
//! [`KEYGEN_MESSAGE`]. Re-signing the message regenerates the same keys, so
//! nothing has to be stored.

use std::fmt;
use std::str::FromStr;

use curve25519_dalek::{edwards::EdwardsPoint, scalar::Scalar};
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha512};
use solana_sdk::{pubkey::Pubkey, signer::Signer};
use zeroize::Zeroize;

use crate::curve::{self, SecretScalar, KEY_LENGTH};
use crate::error::{Result, StealthError};

/// Message signed by the primary key to obtain the meta-key secret
pub const KEYGEN_MESSAGE: &[u8] = b"Sign this message to generate your stealth keys";

/// Length of the meta-key derivation secret
pub const SECRET_LENGTH: usize = 64;

const META_ADDRESS_PREFIX: &str = "stealth:";

// ============================================================================
// Meta Keys
// ============================================================================

/// A user's long-term (scan, spend) key pair
///
/// Clone is NOT derived; secrets are zeroized on drop.
pub struct MetaKeys {
    /// Scan secret (s)
    scan_secret: SecretScalar,
    /// Spend secret (b)
    spend_secret: SecretScalar,
    /// S = s·G
    pub scan_pubkey: Pubkey,
    /// B = b·G
    pub spend_pubkey: Pubkey,
}

impl MetaKeys {
    /// Derive meta-keys from a 64-byte secret
    ///
    /// The low half seeds the scan key and the high half the spend key, each
    /// through the ed25519 seed expansion.
    pub fn derive(secret: &[u8]) -> Result<Self> {
        if secret.len() != SECRET_LENGTH {
            return Err(StealthError::InvalidLength {
                expected: SECRET_LENGTH,
                actual: secret.len(),
            });
        }

        let scan_scalar = curve::expand_seed(&secret[..32]);
        let spend_scalar = curve::expand_seed(&secret[32..]);

        Ok(Self::from_scalars(&scan_scalar, &spend_scalar))
    }

    /// Derive meta-keys from a signature over [`KEYGEN_MESSAGE`]
    ///
    /// The signature is hashed with SHA-512 before derivation.
    pub fn from_signature(signature: &[u8]) -> Result<Self> {
        if signature.len() != SECRET_LENGTH {
            return Err(StealthError::InvalidLength {
                expected: SECRET_LENGTH,
                actual: signature.len(),
            });
        }
        let mut digest = [0u8; 64];
        digest.copy_from_slice(&Sha512::digest(signature));
        let keys = Self::derive(&digest);
        digest.zeroize();
        keys
    }

    /// Sign [`KEYGEN_MESSAGE`] with the user's primary key and derive from it
    ///
    /// Ed25519 signing is deterministic, so the same signer always yields the
    /// same meta-keys.
    pub fn from_signer<S: Signer + ?Sized>(signer: &S) -> Result<Self> {
        let signature = signer.try_sign_message(KEYGEN_MESSAGE)?;
        Self::from_signature(signature.as_ref())
    }

    /// Rebuild from raw little-endian secret scalars
    #[cfg(test)]
    pub(crate) fn from_secrets(scan_secret: &[u8; 32], spend_secret: &[u8; 32]) -> Self {
        Self::from_scalars(
            &Scalar::from_bytes_mod_order(*scan_secret),
            &Scalar::from_bytes_mod_order(*spend_secret),
        )
    }

    fn from_scalars(scan: &Scalar, spend: &Scalar) -> Self {
        let scan_secret = SecretScalar::from_scalar(scan);
        let spend_secret = SecretScalar::from_scalar(spend);
        let scan_pubkey = scan_secret.pubkey();
        let spend_pubkey = spend_secret.pubkey();

        Self {
            scan_secret,
            spend_secret,
            scan_pubkey,
            spend_pubkey,
        }
    }

    /// The shareable (scan, spend) public pair
    pub fn meta_address(&self) -> MetaAddress {
        MetaAddress {
            scan: self.scan_pubkey,
            spend: self.spend_pubkey,
        }
    }

    /// Scan secret, enough to detect payments but not to spend them
    pub fn scan_secret(&self) -> Scalar {
        self.scan_secret.to_scalar()
    }

    pub(crate) fn spend_secret(&self) -> Scalar {
        self.spend_secret.to_scalar()
    }

    /// Export secrets as little-endian bytes
    #[cfg(test)]
    pub(crate) fn export_secrets(&self) -> ([u8; 32], [u8; 32]) {
        (*self.scan_secret.as_bytes(), *self.spend_secret.as_bytes())
    }
}

impl fmt::Debug for MetaKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetaKeys")
            .field("scan_pubkey", &self.scan_pubkey)
            .field("spend_pubkey", &self.spend_pubkey)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Meta Address
// ============================================================================

/// Public half of [`MetaKeys`], published so that senders can pay the owner
///
/// Text form is `stealth:<base58(scan || spend)>`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MetaAddress {
    pub scan: Pubkey,
    pub spend: Pubkey,
}

impl MetaAddress {
    /// Build from two base58 keys, checking both are curve points
    pub fn from_keys(scan: &str, spend: &str) -> Result<Self> {
        let scan = curve::point_to_pubkey(&curve::parse_point(scan)?);
        let spend = curve::point_to_pubkey(&curve::parse_point(spend)?);
        Ok(Self { scan, spend })
    }

    pub fn scan_point(&self) -> Result<EdwardsPoint> {
        curve::pubkey_to_point(&self.scan)
    }

    pub fn spend_point(&self) -> Result<EdwardsPoint> {
        curve::pubkey_to_point(&self.spend)
    }
}

impl fmt::Display for MetaAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut combined = [0u8; 64];
        combined[..32].copy_from_slice(self.scan.as_ref());
        combined[32..].copy_from_slice(self.spend.as_ref());
        write!(f, "{}{}", META_ADDRESS_PREFIX, bs58::encode(combined).into_string())
    }
}

impl FromStr for MetaAddress {
    type Err = StealthError;

    fn from_str(input: &str) -> Result<Self> {
        let encoded = input.strip_prefix(META_ADDRESS_PREFIX).unwrap_or(input);
        let bytes = bs58::decode(encoded).into_vec()?;

        if bytes.len() != 2 * KEY_LENGTH {
            return Err(StealthError::InvalidMetaAddress(format!(
                "expected 64 bytes, got {}",
                bytes.len()
            )));
        }

        let scan = curve::decode_point(&bytes[..32])?;
        let spend = curve::decode_point(&bytes[32..])?;

        Ok(Self {
            scan: curve::point_to_pubkey(&scan),
            spend: curve::point_to_pubkey(&spend),
        })
    }
}

// ============================================================================
// Ephemeral Keys
// ============================================================================

/// One-time key pair generated by the sender for a single transfer
///
/// Only the public half is published. Never reuse one across transfers.
pub struct EphemeralKeypair {
    secret: SecretScalar,
    pub pubkey: Pubkey,
}

impl EphemeralKeypair {
    /// Fresh key from OS entropy, expanded like an ed25519 seed
    pub fn generate() -> Self {
        let mut seed = [0u8; 32];
        OsRng.fill_bytes(&mut seed);
        let scalar = curve::expand_seed(&seed);
        seed.zeroize();
        Self::from_scalar(&scalar)
    }

    /// Use a caller-chosen scalar (deterministic tests, replays)
    pub fn from_scalar(scalar: &Scalar) -> Self {
        let secret = SecretScalar::from_scalar(scalar);
        let pubkey = secret.pubkey();
        Self { secret, pubkey }
    }

    pub fn secret(&self) -> Scalar {
        self.secret.to_scalar()
    }
}

impl fmt::Debug for EphemeralKeypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EphemeralKeypair")
            .field("pubkey", &self.pubkey)
            .finish_non_exhaustive()
    }
}
