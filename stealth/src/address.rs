//! One-time destination computation (DKSAP)
//!
//! ## Protocol Overview
//!
//! ### Sender
//! 1. Pick an ephemeral key pair: (r, R) where R = r·G
//! 2. Shared point: S = r·A (A = recipient scan key)
//! 3. Offset: c = expand(SHA-512(S)[..32])
//! 4. Destination: D = c·G + B (B = recipient spend key)
//! 5. Pay D and publish R alongside the transfer
//!
//! ### Recipient
//! 1. For each published R: S' = a·R, which equals S
//! 2. Recompute D' = c·G + B and compare with the paid address
//! 3. On a match the spending scalar is d = c + b (mod l), with d·G = D

use curve25519_dalek::{edwards::EdwardsPoint, scalar::Scalar};
use sha2::{Digest, Sha512};
use solana_sdk::pubkey::Pubkey;

use crate::curve::{self, SecretScalar};
use crate::error::Result;
use crate::keys::{EphemeralKeypair, MetaAddress, MetaKeys};

/// Offset scalar c derived from the shared Diffie-Hellman point
fn shared_offset(shared: &EdwardsPoint) -> Scalar {
    let hash = Sha512::digest(curve::encode_point(shared));
    curve::expand_seed(&hash[..32])
}

/// Sender side: one-time destination for `(scan_pubkey, spend_pubkey)` under
/// the ephemeral secret
pub fn gen_destination(
    scan_pubkey: &EdwardsPoint,
    spend_pubkey: &EdwardsPoint,
    ephemeral_secret: &Scalar,
) -> EdwardsPoint {
    let shared = ephemeral_secret * scan_pubkey;
    curve::base_mul(&shared_offset(&shared)) + spend_pubkey
}

/// Recipient side: the destination a payment tagged with `ephemeral_pubkey`
/// would have if it was addressed to us
pub fn gen_destination_candidate(
    scan_secret: &Scalar,
    spend_pubkey: &EdwardsPoint,
    ephemeral_pubkey: &EdwardsPoint,
) -> EdwardsPoint {
    let shared = scan_secret * ephemeral_pubkey;
    curve::base_mul(&shared_offset(&shared)) + spend_pubkey
}

/// Recipient side: the scalar that signs for the destination tagged with
/// `ephemeral_pubkey`
pub fn gen_spend_scalar(
    scan_secret: &Scalar,
    spend_secret: &Scalar,
    ephemeral_pubkey: &EdwardsPoint,
) -> Scalar {
    let shared = scan_secret * ephemeral_pubkey;
    shared_offset(&shared) + spend_secret
}

// ============================================================================
// Address-level helpers
// ============================================================================

/// Result of computing a stealth address (sender side)
#[derive(Debug)]
pub struct StealthDestination {
    /// One-time destination D
    pub address: Pubkey,
    /// Ephemeral key R to publish with the transfer
    pub ephemeral_pubkey: Pubkey,
}

/// Compute the destination for a meta-address with the given ephemeral key
pub fn destination_for(
    meta: &MetaAddress,
    ephemeral: &EphemeralKeypair,
) -> Result<StealthDestination> {
    let scan = meta.scan_point()?;
    let spend = meta.spend_point()?;
    let destination = gen_destination(&scan, &spend, &ephemeral.secret());

    Ok(StealthDestination {
        address: curve::point_to_pubkey(&destination),
        ephemeral_pubkey: ephemeral.pubkey,
    })
}

/// Candidate destination for an ephemeral key observed on the ledger
///
/// Needs only the scan secret and spend public key (view-only access).
pub fn candidate_for(
    scan_secret: &Scalar,
    spend_pubkey: &Pubkey,
    ephemeral_pubkey: &Pubkey,
) -> Result<Pubkey> {
    let spend = curve::pubkey_to_point(spend_pubkey)?;
    let ephemeral = curve::pubkey_to_point(ephemeral_pubkey)?;
    let candidate = gen_destination_candidate(scan_secret, &spend, &ephemeral);
    Ok(curve::point_to_pubkey(&candidate))
}

/// Spending scalar for the output tagged with `ephemeral_pubkey`
pub fn spend_key_for(keys: &MetaKeys, ephemeral_pubkey: &Pubkey) -> Result<SecretScalar> {
    let ephemeral = curve::pubkey_to_point(ephemeral_pubkey)?;
    let scalar = gen_spend_scalar(&keys.scan_secret(), &keys.spend_secret(), &ephemeral);
    Ok(SecretScalar::from_scalar(&scalar))
}

#[cfg(test)]
#[allow(non_snake_case)] // Crypto notation uses S, B, R, D, etc.
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn keys() -> MetaKeys {
        MetaKeys::derive(&[0x11u8; 64]).unwrap()
    }

    #[test]
    fn test_sender_and_recipient_agree() {
        let keys = keys();
        let A = curve::pubkey_to_point(&keys.scan_pubkey).unwrap();
        let B = curve::pubkey_to_point(&keys.spend_pubkey).unwrap();
        let r = Scalar::from(7u64);
        let R = curve::base_mul(&r);

        let D = gen_destination(&A, &B, &r);
        let D_prime = gen_destination_candidate(&keys.scan_secret(), &B, &R);
        assert_eq!(D, D_prime);
    }

    #[test]
    fn test_spend_scalar_signs_for_destination() {
        let keys = keys();
        let B = curve::pubkey_to_point(&keys.spend_pubkey).unwrap();
        let R = curve::base_mul(&Scalar::from(7u64));

        let d = gen_spend_scalar(&keys.scan_secret(), &keys.spend_secret(), &R);
        let D = gen_destination_candidate(&keys.scan_secret(), &B, &R);
        assert_eq!(curve::base_mul(&d), D);
    }

    #[test]
    fn test_different_ephemeral_keys_unlink() {
        let meta = keys().meta_address();
        let first = destination_for(&meta, &EphemeralKeypair::from_scalar(&Scalar::from(7u64))).unwrap();
        let second = destination_for(&meta, &EphemeralKeypair::from_scalar(&Scalar::from(8u64))).unwrap();

        assert_ne!(first.address, second.address);
        assert_ne!(first.address, meta.spend);
    }

    #[test]
    fn test_pubkey_helpers_agree() {
        let keys = keys();
        let ephemeral = EphemeralKeypair::generate();
        let dest = destination_for(&keys.meta_address(), &ephemeral).unwrap();

        let candidate =
            candidate_for(&keys.scan_secret(), &keys.spend_pubkey, &dest.ephemeral_pubkey).unwrap();
        assert_eq!(candidate, dest.address);

        let spend = spend_key_for(&keys, &dest.ephemeral_pubkey).unwrap();
        assert_eq!(spend.pubkey(), dest.address);
    }

    #[test]
    fn test_malformed_ephemeral_key_fails() {
        let keys = keys();
        let mut bad = [0u8; 32];
        bad[0] = 2;
        let result = candidate_for(&keys.scan_secret(), &keys.spend_pubkey, &Pubkey::new_from_array(bad));
        assert!(result.is_err());
    }

    proptest! {
        #[test]
        fn prop_round_trip_ownership(
            scan_seed in prop::array::uniform32(any::<u8>()),
            spend_seed in prop::array::uniform32(any::<u8>()),
            ephemeral_seed in prop::array::uniform32(any::<u8>()),
        ) {
            let mut full = [0u8; 64];
            full[..32].copy_from_slice(&scan_seed);
            full[32..].copy_from_slice(&spend_seed);
            let keys = MetaKeys::derive(&full).unwrap();
            let A = curve::pubkey_to_point(&keys.scan_pubkey).unwrap();
            let B = curve::pubkey_to_point(&keys.spend_pubkey).unwrap();
            let r = curve::expand_seed(&ephemeral_seed);

            let D = gen_destination(&A, &B, &r);
            let R = curve::base_mul(&r);
            prop_assert_eq!(gen_destination_candidate(&keys.scan_secret(), &B, &R), D);

            let d = gen_spend_scalar(&keys.scan_secret(), &keys.spend_secret(), &R);
            prop_assert_eq!(curve::base_mul(&d), D);
        }

        #[test]
        fn prop_third_party_ephemeral_rejected(
            mine in prop::array::uniform32(any::<u8>()),
            theirs in prop::array::uniform32(any::<u8>()),
            ephemeral_seed in prop::array::uniform32(any::<u8>()),
        ) {
            prop_assume!(mine != theirs);
            let mut recipient_secret = [0u8; 64];
            recipient_secret[..32].copy_from_slice(&mine);
            recipient_secret[32..].copy_from_slice(&mine);
            let mut other_secret = [0u8; 64];
            other_secret[..32].copy_from_slice(&theirs);
            other_secret[32..].copy_from_slice(&mine);
            let recipient = MetaKeys::derive(&recipient_secret).unwrap();
            let other = MetaKeys::derive(&other_secret).unwrap();

            // Payment to `other` must not look like ours, even sharing a spend key
            let ephemeral = EphemeralKeypair::from_scalar(&curve::expand_seed(&ephemeral_seed));
            let paid = destination_for(&other.meta_address(), &ephemeral).unwrap();
            let candidate = candidate_for(
                &recipient.scan_secret(),
                &recipient.spend_pubkey,
                &paid.ephemeral_pubkey,
            ).unwrap();
            prop_assert_ne!(candidate, paid.address);
        }
    }
}
