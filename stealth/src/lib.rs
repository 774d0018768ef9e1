//! Dual-Key Stealth Address Protocol (DKSAP) for Solana
//!
//! A payer sends value to a one-time address derived from the recipient's
//! published (scan, spend) meta-address. Only the recipient's scan key can
//! link that address back to them, and only their spend key can move funds
//! out of it.
//!
//! - [`keys`]: meta-key derivation and encoding
//! - [`address`]: one-time destinations and spending scalars
//! - [`signer`]: ed25519 signatures from a raw derived scalar
//! - [`transfer`]: marker-tagged transfer instructions
//! - [`scanner`]: finding owned outputs in ledger history
//! - [`wallet`]: send and spend flows against a [`ledger::StealthLedger`]

// op_ref warnings are common with curve25519-dalek ergonomics
#![allow(clippy::op_ref)]

pub mod address;
pub mod curve;
pub mod error;
pub mod keys;
pub mod ledger;
pub mod scanner;
pub mod signer;
pub mod transfer;
pub mod wallet;

pub use address::{
    candidate_for, destination_for, gen_destination, gen_destination_candidate, gen_spend_scalar,
    spend_key_for, StealthDestination,
};
pub use error::{Result, StealthError};
pub use keys::{EphemeralKeypair, MetaAddress, MetaKeys, KEYGEN_MESSAGE};
pub use ledger::{LedgerTransaction, RpcLedger, SignatureQuery, StealthLedger};
pub use scanner::{
    scan_history, scan_page, scan_signature, scan_transaction, HistoryOptions, ScanPage,
    ScanResult, ViewKey,
};
pub use signer::{sign, StealthSignature, StealthSigner};
pub use transfer::{build_native_transfer, build_token_transfer, MARKER};
