//! Error types for stealth address operations

use solana_client::client_error::ClientError;
use solana_sdk::{program_error::ProgramError, pubkey::ParsePubkeyError, signer::SignerError};
use thiserror::Error;

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, StealthError>;

#[derive(Debug, Error)]
pub enum StealthError {
    /// Bytes that do not decompress to an Edwards point
    #[error("Invalid curve point - bytes do not decode to a point on ed25519")]
    InvalidPoint,

    #[error("Invalid length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("Invalid base58 encoding: {0}")]
    InvalidEncoding(#[from] bs58::decode::Error),

    #[error("Invalid address: {0}")]
    InvalidPubkey(#[from] ParsePubkeyError),

    #[error("Invalid transaction signature: {0}")]
    InvalidSignature(String),

    #[error("Invalid meta-address: {0}")]
    InvalidMetaAddress(String),

    #[error("Invalid view key: {0}")]
    InvalidViewKey(String),

    /// Token program rejected the instruction arguments
    #[error("Failed to build instruction: {0}")]
    Instruction(#[from] ProgramError),

    /// Ledger errors are passed through untouched
    #[error(transparent)]
    Rpc(#[from] ClientError),

    #[error(transparent)]
    Signer(#[from] SignerError),
}
