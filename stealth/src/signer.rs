//! Ed25519 signing with a raw derived scalar
//!
//! A stealth spending key is a bare scalar d = c + b, not a seed, so the
//! usual keypair API (which hashes a seed into a scalar) cannot produce it.
//! Signing is done directly on the commit-challenge-response equations:
//!
//! ```text
//! A = d·G
//! r = H(nonce_seed || M) mod l,   R = r·G
//! e = H(R || A || M) mod l
//! s = e·d + r mod l
//! ```
//!
//! The ledger's unmodified ed25519 verifier checks `s·G == e·A + R`.
//!
//! The nonce seed comes from a two-pass construction: a first commitment
//! seeded with d itself is fed through ChaCha20 to produce the seed for the
//! second, returned commitment. No OS randomness is needed and signatures
//! are reproducible.

use curve25519_dalek::{
    edwards::{CompressedEdwardsY, EdwardsPoint},
    scalar::Scalar,
};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use sha2::{Digest, Sha256};
use solana_sdk::{
    pubkey::Pubkey,
    signature::{Signature, Signer, SignerError},
};
use zeroize::Zeroize;

use crate::curve::{self, SecretScalar};

/// Size of the wire signature `R || s`
pub const SIGNATURE_LENGTH: usize = 64;

/// Signature `{R, s}`, serialized as `R || s`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StealthSignature {
    pub r: CompressedEdwardsY,
    pub s: Scalar,
}

impl StealthSignature {
    pub fn to_bytes(&self) -> [u8; SIGNATURE_LENGTH] {
        let mut bytes = [0u8; SIGNATURE_LENGTH];
        bytes[..32].copy_from_slice(self.r.as_bytes());
        bytes[32..].copy_from_slice(self.s.as_bytes());
        bytes
    }

    /// Check `s·G == e·A + R`
    ///
    /// Used by tests and debug assertions; the ledger performs its own check.
    pub fn verify(&self, public: &EdwardsPoint, message: &[u8]) -> bool {
        let Some(r_point) = self.r.decompress() else {
            return false;
        };
        let e = challenge(&self.r, &public.compress(), message);
        curve::base_mul(&self.s) == &e * public + r_point
    }
}

impl From<StealthSignature> for Signature {
    fn from(sig: StealthSignature) -> Self {
        Signature::from(sig.to_bytes())
    }
}

fn challenge(r: &CompressedEdwardsY, a: &CompressedEdwardsY, message: &[u8]) -> Scalar {
    curve::hash_to_scalar(&[r.as_bytes(), a.as_bytes(), message])
}

/// One commit-challenge-response pass with an explicit nonce seed
pub fn commit(message: &[u8], nonce_seed: &[u8], secret: &Scalar) -> StealthSignature {
    let a = secret.reduce();
    let a_point = curve::base_mul(&a).compress();

    let r = curve::hash_to_scalar(&[nonce_seed, message]);
    let r_point = curve::base_mul(&r).compress();

    let e = challenge(&r_point, &a_point, message);
    let s = e * a + r;

    StealthSignature { r: r_point, s }
}

/// Expand a first-pass signature into a fresh 32-byte nonce seed
pub fn derive_nonce_seed(first_pass: &StealthSignature) -> [u8; 32] {
    let mut key = [0u8; 32];
    key.copy_from_slice(&Sha256::digest(first_pass.to_bytes()));
    let mut rng = ChaCha20Rng::from_seed(key);
    key.zeroize();

    let mut seed = [0u8; 32];
    rng.fill_bytes(&mut seed);
    seed
}

/// Deterministic two-pass signature of `message` under scalar `secret`
pub fn sign(message: &[u8], secret: &Scalar) -> StealthSignature {
    let mut secret_bytes = secret.reduce().to_bytes();
    let first = commit(message, &secret_bytes, secret);
    secret_bytes.zeroize();

    let mut nonce_seed = derive_nonce_seed(&first);
    let signature = commit(message, &nonce_seed, secret);
    nonce_seed.zeroize();

    debug_assert!(
        signature.verify(&curve::base_mul(secret), message),
        "stealth signature failed its own verification equation"
    );
    signature
}

// ============================================================================
// Stealth Signer
// ============================================================================

/// A ledger signer backed by a raw scalar
///
/// Plugs DKSAP-derived spending keys into ordinary transaction signing.
pub struct StealthSigner {
    secret: SecretScalar,
    pubkey: Pubkey,
}

impl StealthSigner {
    pub fn from_scalar(scalar: &Scalar) -> Self {
        Self::from_secret(SecretScalar::from_scalar(scalar))
    }

    pub fn from_secret(secret: SecretScalar) -> Self {
        let pubkey = secret.pubkey();
        Self { secret, pubkey }
    }

    /// Sign raw bytes, returning the structured signature
    pub fn sign_raw(&self, message: &[u8]) -> StealthSignature {
        sign(message, &self.secret.to_scalar())
    }
}

impl Signer for StealthSigner {
    fn pubkey(&self) -> Pubkey {
        self.pubkey
    }

    fn try_pubkey(&self) -> Result<Pubkey, SignerError> {
        Ok(self.pubkey)
    }

    fn try_sign_message(&self, message: &[u8]) -> Result<Signature, SignerError> {
        Ok(self.sign_raw(message).into())
    }

    fn is_interactive(&self) -> bool {
        false
    }
}

impl PartialEq for StealthSigner {
    fn eq(&self, other: &Self) -> bool {
        self.pubkey == other.pubkey
    }
}

impl std::fmt::Debug for StealthSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StealthSigner")
            .field("pubkey", &self.pubkey)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::spend_key_for;
    use crate::keys::{EphemeralKeypair, MetaKeys};
    use proptest::prelude::*;

    #[test]
    fn test_signature_satisfies_equation() {
        let d = Scalar::from(424242u64);
        let sig = sign(b"hello", &d);
        assert!(sig.verify(&curve::base_mul(&d), b"hello"));
        assert!(!sig.verify(&curve::base_mul(&d), b"hellp"));
        assert!(!sig.verify(&curve::base_mul(&Scalar::from(1u64)), b"hello"));
    }

    #[test]
    fn test_ledger_verifier_accepts_signature() {
        let signer = StealthSigner::from_scalar(&Scalar::from(99u64));
        let message = b"transfer 1 lamport";
        let signature = signer.try_sign_message(message).unwrap();

        assert!(signature.verify(signer.pubkey().as_ref(), message));
    }

    #[test]
    fn test_signing_is_deterministic() {
        let d = Scalar::from(5u64);
        assert_eq!(sign(b"m", &d), sign(b"m", &d));
        assert_ne!(sign(b"m", &d), sign(b"n", &d));
    }

    #[test]
    fn test_two_passes_use_different_nonces() {
        let d = Scalar::from(5u64);
        let first = commit(b"m", &d.to_bytes(), &d);
        let second = sign(b"m", &d);
        assert_ne!(first.r, second.r);
        // Both passes are valid signatures in their own right
        assert!(first.verify(&curve::base_mul(&d), b"m"));
    }

    #[test]
    fn test_commit_depends_on_nonce_seed() {
        let d = Scalar::from(5u64);
        let a = commit(b"m", &[1u8; 32], &d);
        let b = commit(b"m", &[2u8; 32], &d);
        assert_ne!(a.r, b.r);
        assert_ne!(a.s, b.s);
    }

    #[test]
    fn test_wire_format_is_r_then_s() {
        let sig = sign(b"wire", &Scalar::from(3u64));
        let bytes = sig.to_bytes();
        assert_eq!(&bytes[..32], sig.r.as_bytes());
        assert_eq!(&bytes[32..], sig.s.as_bytes());
    }

    #[test]
    fn test_signer_for_received_output() {
        let keys = MetaKeys::derive(&[0x77u8; 64]).unwrap();
        let ephemeral = EphemeralKeypair::generate();
        let dest = crate::address::destination_for(&keys.meta_address(), &ephemeral).unwrap();

        let signer = StealthSigner::from_secret(spend_key_for(&keys, &dest.ephemeral_pubkey).unwrap());
        assert_eq!(signer.pubkey(), dest.address);

        let message = b"spend";
        let signature = signer.try_sign_message(message).unwrap();
        assert!(signature.verify(dest.address.as_ref(), message));
    }

    proptest! {
        #[test]
        fn prop_signature_valid_for_any_scalar(
            scalar in prop::array::uniform32(any::<u8>()),
            message in prop::collection::vec(any::<u8>(), 0..256),
        ) {
            let d = Scalar::from_bytes_mod_order(scalar);
            let sig = sign(&message, &d);
            let public = curve::base_mul(&d);

            prop_assert!(sig.verify(&public, &message));
            let ledger_sig: Signature = sig.into();
            prop_assert!(ledger_sig.verify(public.compress().as_bytes(), &message));
        }
    }
}
