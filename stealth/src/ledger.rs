//! Ledger access
//!
//! The stealth core needs four things from the ledger: list the signatures
//! touching an address, fetch a transaction, fetch a blockhash and submit a
//! signed transaction. [`StealthLedger`] is that seam; [`RpcLedger`] backs it
//! with the nonblocking JSON-RPC client.
//!
//! No retries or backoff happen here. Timeouts belong to the RPC client.

use async_trait::async_trait;
use solana_client::{
    nonblocking::rpc_client::RpcClient,
    rpc_client::GetConfirmedSignaturesForAddress2Config,
    rpc_config::RpcTransactionConfig,
};
use solana_sdk::{
    commitment_config::CommitmentConfig,
    hash::Hash,
    instruction::CompiledInstruction,
    message::VersionedMessage,
    pubkey::Pubkey,
    signature::Signature,
    transaction::Transaction,
};
use solana_transaction_status::{UiLoadedAddresses, UiTransactionEncoding};
use tracing::{debug, warn};

use crate::error::{Result, StealthError};

/// Maximum page size accepted by `getSignaturesForAddress`
pub const MAX_SIGNATURES_PER_PAGE: usize = 1000;

/// One page request for `getSignaturesForAddress`
///
/// Results come back newest first. `before` is the exclusive cursor.
#[derive(Clone, Debug)]
pub struct SignatureQuery {
    pub before: Option<Signature>,
    pub until: Option<Signature>,
    pub limit: usize,
}

impl Default for SignatureQuery {
    fn default() -> Self {
        Self {
            before: None,
            until: None,
            limit: MAX_SIGNATURES_PER_PAGE,
        }
    }
}

/// A transaction reduced to what scanning needs
///
/// `account_keys` is the full key list instructions index into: static keys
/// followed by writable and then read-only addresses loaded from lookup
/// tables.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LedgerTransaction {
    pub account_keys: Vec<Pubkey>,
    pub instructions: Vec<CompiledInstruction>,
}

impl LedgerTransaction {
    pub fn from_message(message: &VersionedMessage) -> Self {
        Self {
            account_keys: message.static_account_keys().to_vec(),
            instructions: message.instructions().to_vec(),
        }
    }

    pub fn with_loaded_addresses(mut self, writable: Vec<Pubkey>, readonly: Vec<Pubkey>) -> Self {
        self.account_keys.extend(writable);
        self.account_keys.extend(readonly);
        self
    }

    /// Resolve an instruction's account index
    pub fn key(&self, index: u8) -> Option<&Pubkey> {
        self.account_keys.get(usize::from(index))
    }
}

impl From<&Transaction> for LedgerTransaction {
    fn from(transaction: &Transaction) -> Self {
        Self::from_message(&VersionedMessage::Legacy(transaction.message.clone()))
    }
}

#[async_trait]
pub trait StealthLedger: Send + Sync {
    /// Signatures of transactions referencing `address`, newest first
    async fn signatures_for_address(
        &self,
        address: &Pubkey,
        query: &SignatureQuery,
    ) -> Result<Vec<Signature>>;

    /// Fetch a confirmed transaction
    ///
    /// `None` when the transaction failed on-ledger or cannot be decoded.
    async fn transaction(&self, signature: &Signature) -> Result<Option<LedgerTransaction>>;

    async fn latest_blockhash(&self) -> Result<Hash>;

    /// Submit and wait for confirmation
    async fn send_transaction(&self, transaction: &Transaction) -> Result<Signature>;
}

// ============================================================================
// JSON-RPC backend
// ============================================================================

pub struct RpcLedger {
    client: RpcClient,
    commitment: CommitmentConfig,
}

impl RpcLedger {
    pub fn new(url: impl Into<String>) -> Self {
        Self::new_with_commitment(url, CommitmentConfig::confirmed())
    }

    pub fn new_with_commitment(url: impl Into<String>, commitment: CommitmentConfig) -> Self {
        Self {
            client: RpcClient::new_with_commitment(url.into(), commitment),
            commitment,
        }
    }

    pub fn client(&self) -> &RpcClient {
        &self.client
    }
}

fn parse_keys(keys: &[String]) -> Result<Vec<Pubkey>> {
    keys.iter()
        .map(|key| key.parse::<Pubkey>().map_err(StealthError::from))
        .collect()
}

#[async_trait]
impl StealthLedger for RpcLedger {
    async fn signatures_for_address(
        &self,
        address: &Pubkey,
        query: &SignatureQuery,
    ) -> Result<Vec<Signature>> {
        let config = GetConfirmedSignaturesForAddress2Config {
            before: query.before,
            until: query.until,
            limit: Some(query.limit),
            commitment: Some(self.commitment),
        };
        let statuses = self
            .client
            .get_signatures_for_address_with_config(address, config)
            .await?;

        statuses
            .into_iter()
            .map(|status| {
                status
                    .signature
                    .parse::<Signature>()
                    .map_err(|e| StealthError::InvalidSignature(e.to_string()))
            })
            .collect()
    }

    async fn transaction(&self, signature: &Signature) -> Result<Option<LedgerTransaction>> {
        let config = RpcTransactionConfig {
            encoding: Some(UiTransactionEncoding::Base64),
            commitment: Some(self.commitment),
            max_supported_transaction_version: Some(0),
        };
        let encoded = self
            .client
            .get_transaction_with_config(signature, config)
            .await?;

        let meta = encoded.transaction.meta;
        if meta.as_ref().is_some_and(|meta| meta.err.is_some()) {
            debug!(%signature, "skipping failed transaction");
            return Ok(None);
        }

        let Some(decoded) = encoded.transaction.transaction.decode() else {
            warn!(%signature, "transaction could not be decoded, skipping");
            return Ok(None);
        };

        let mut transaction = LedgerTransaction::from_message(&decoded.message);
        let loaded = meta.and_then(|meta| Option::<UiLoadedAddresses>::from(meta.loaded_addresses));
        if let Some(loaded) = loaded {
            transaction = transaction
                .with_loaded_addresses(parse_keys(&loaded.writable)?, parse_keys(&loaded.readonly)?);
        }

        Ok(Some(transaction))
    }

    async fn latest_blockhash(&self) -> Result<Hash> {
        Ok(self.client.get_latest_blockhash().await?)
    }

    async fn send_transaction(&self, transaction: &Transaction) -> Result<Signature> {
        Ok(self.client.send_and_confirm_transaction(transaction).await?)
    }
}

// ============================================================================
// In-memory ledger for tests
// ============================================================================


#[cfg(test)]
mod tests {
    use super::mock::MockLedger;
    use super::*;
    use solana_sdk::{instruction::Instruction, message::Message, system_instruction};

    fn sample_transaction() -> LedgerTransaction {
        let from = Pubkey::new_unique();
        let ix: Instruction = system_instruction::transfer(&from, &Pubkey::new_unique(), 5);
        LedgerTransaction::from_message(&VersionedMessage::Legacy(Message::new(&[ix], Some(&from))))
    }

    #[test]
    fn test_loaded_addresses_follow_static_keys() {
        let tx = sample_transaction();
        let statics = tx.account_keys.len();
        let writable = Pubkey::new_unique();
        let readonly = Pubkey::new_unique();
        let tx = tx.with_loaded_addresses(vec![writable], vec![readonly]);

        assert_eq!(tx.key(statics as u8), Some(&writable));
        assert_eq!(tx.key(statics as u8 + 1), Some(&readonly));
        assert_eq!(tx.key(statics as u8 + 2), None);
    }

    #[tokio::test]
    async fn test_mock_pagination_cursor() {
        let ledger = MockLedger::new();
        let sigs: Vec<Signature> = (0..5).map(|_| Signature::new_unique()).collect();
        for sig in &sigs {
            ledger.push(*sig, sample_transaction());
        }
        assert_eq!(ledger.len(), 5);

        let address = Pubkey::new_unique();
        let first = ledger
            .signatures_for_address(&address, &SignatureQuery { limit: 2, ..Default::default() })
            .await
            .unwrap();
        assert_eq!(first, vec![sigs[4], sigs[3]]);

        let second = ledger
            .signatures_for_address(
                &address,
                &SignatureQuery { before: Some(sigs[3]), until: Some(sigs[0]), limit: 10 },
            )
            .await
            .unwrap();
        assert_eq!(second, vec![sigs[2], sigs[1]]);
    }
}
