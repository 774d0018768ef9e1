//! Scanning the ledger for stealth outputs
//!
//! Every stealth instruction references the [`MARKER`] account, so the
//! history of that single address is the full candidate set. Instructions
//! that reference the marker are classified by account count:
//!
//! - 4 accounts: native transfer `[source, dest, ephemeral, marker]`
//! - 6 accounts: token transfer `[source ATA, dest ATA, owner, ephemeral, mint, marker]`
//!
//! Anything else is skipped. A candidate destination is recomputed from the
//! instruction's ephemeral key and compared with the actual destination.
//!
//! [`MARKER`]: crate::transfer::MARKER

use std::str::FromStr;

use curve25519_dalek::{edwards::EdwardsPoint, scalar::Scalar};
use futures::stream::{self, StreamExt, TryStreamExt};
use solana_sdk::{instruction::CompiledInstruction, pubkey::Pubkey, signature::Signature};
use spl_associated_token_account::get_associated_token_address;
use subtle::ConstantTimeEq;
use tracing::{debug, info};

use crate::address::gen_destination_candidate;
use crate::curve::{self, SecretScalar};
use crate::error::{Result, StealthError};
use crate::keys::MetaKeys;
use crate::ledger::{LedgerTransaction, SignatureQuery, StealthLedger, MAX_SIGNATURES_PER_PAGE};
use crate::transfer::{MARKER, NATIVE_TRANSFER_ACCOUNTS, TOKEN_TRANSFER_ACCOUNTS};

/// Transactions fetched at once while scanning a page
pub const SCAN_CONCURRENCY: usize = 16;

/// One recovered stealth output
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ScanResult {
    /// The stealth address D (owner of the token account for token outputs)
    pub account: Pubkey,
    /// Ephemeral key R that produced it
    pub ephem: Pubkey,
    /// Mint, for token transfers
    pub token: Option<Pubkey>,
}

// ============================================================================
// View Key
// ============================================================================

/// Scan secret plus spend public key: enough to detect payments, not to
/// spend them
pub struct ViewKey {
    scan_secret: SecretScalar,
    spend_point: EdwardsPoint,
    spend_pubkey: Pubkey,
}

impl ViewKey {
    /// Fails if `spend_pubkey` is not a curve point
    pub fn new(scan_secret: &Scalar, spend_pubkey: &Pubkey) -> Result<Self> {
        Ok(Self {
            scan_secret: SecretScalar::from_scalar(scan_secret),
            spend_point: curve::pubkey_to_point(spend_pubkey)?,
            spend_pubkey: *spend_pubkey,
        })
    }

    pub fn from_meta_keys(keys: &MetaKeys) -> Self {
        Self {
            scan_secret: SecretScalar::from_scalar(&keys.scan_secret()),
            spend_point: curve::base_mul(&keys.spend_secret()),
            spend_pubkey: keys.spend_pubkey,
        }
    }

    pub fn spend_pubkey(&self) -> &Pubkey {
        &self.spend_pubkey
    }

    /// Shareable text form `<scan secret>:<spend pubkey>`, both base58
    ///
    /// Anyone holding it sees every incoming payment but cannot spend.
    pub fn export(&self) -> String {
        format!(
            "{}:{}",
            bs58::encode(self.scan_secret.as_bytes()).into_string(),
            self.spend_pubkey
        )
    }

    /// Destination we would own for this ephemeral key
    ///
    /// `None` if the ephemeral account is not a curve point, which can only
    /// mean the instruction is not a payment to anyone.
    fn candidate(&self, ephemeral: &Pubkey) -> Option<Pubkey> {
        let point = curve::pubkey_to_point(ephemeral).ok()?;
        let candidate =
            gen_destination_candidate(&self.scan_secret.to_scalar(), &self.spend_point, &point);
        Some(curve::point_to_pubkey(&candidate))
    }

    /// Stealth outputs in `transaction` that belong to this key
    pub fn scan_transaction(&self, transaction: &LedgerTransaction) -> Vec<ScanResult> {
        transaction
            .instructions
            .iter()
            .filter_map(|instruction| self.scan_instruction(transaction, instruction))
            .collect()
    }

    fn scan_instruction(
        &self,
        transaction: &LedgerTransaction,
        instruction: &CompiledInstruction,
    ) -> Option<ScanResult> {
        let accounts: Vec<&Pubkey> = instruction
            .accounts
            .iter()
            .map(|index| transaction.key(*index))
            .collect::<Option<_>>()?;

        if !accounts.iter().any(|key| **key == MARKER) {
            return None;
        }

        match accounts.len() {
            NATIVE_TRANSFER_ACCOUNTS => {
                let (destination, ephem) = (accounts[1], accounts[2]);
                let candidate = self.candidate(ephem)?;
                keys_match(&candidate, destination).then(|| ScanResult {
                    account: candidate,
                    ephem: *ephem,
                    token: None,
                })
            }
            TOKEN_TRANSFER_ACCOUNTS => {
                let (destination_ata, ephem, mint) = (accounts[1], accounts[3], accounts[4]);
                let candidate = self.candidate(ephem)?;
                let candidate_ata = get_associated_token_address(&candidate, mint);
                keys_match(&candidate_ata, destination_ata).then(|| ScanResult {
                    account: candidate,
                    ephem: *ephem,
                    token: Some(*mint),
                })
            }
            other => {
                debug!(accounts = other, "skipping marker instruction with unknown shape");
                None
            }
        }
    }
}

impl FromStr for ViewKey {
    type Err = StealthError;

    fn from_str(input: &str) -> Result<Self> {
        let (scan, spend) = input
            .split_once(':')
            .ok_or_else(|| StealthError::InvalidViewKey("expected <scan>:<spend>".into()))?;
        let scan_secret = curve::scalar_from_le_bytes(&bs58::decode(scan).into_vec()?)?;
        let spend_pubkey = curve::point_to_pubkey(&curve::parse_point(spend)?);
        Self::new(&scan_secret, &spend_pubkey)
    }
}

fn keys_match(candidate: &Pubkey, actual: &Pubkey) -> bool {
    bool::from(candidate.to_bytes().ct_eq(&actual.to_bytes()))
}

/// Scan a single transaction with raw key material
pub fn scan_transaction(
    transaction: &LedgerTransaction,
    scan_secret: &Scalar,
    spend_pubkey: &Pubkey,
) -> Result<Vec<ScanResult>> {
    Ok(ViewKey::new(scan_secret, spend_pubkey)?.scan_transaction(transaction))
}

// ============================================================================
// History
// ============================================================================

/// Where and how far to walk the history of the marker address
#[derive(Clone, Debug)]
pub struct HistoryOptions {
    /// Start strictly before this signature (resume point)
    pub before: Option<Signature>,
    /// Stop at this signature (exclusive)
    pub until: Option<Signature>,
    /// Signatures per page
    pub limit: usize,
    /// Stop after this many pages; `None` walks to the end
    pub max_pages: Option<usize>,
}

impl Default for HistoryOptions {
    fn default() -> Self {
        Self {
            before: None,
            until: None,
            limit: MAX_SIGNATURES_PER_PAGE,
            max_pages: None,
        }
    }
}

/// Results of one page of history
#[derive(Clone, Debug, Default)]
pub struct ScanPage {
    pub results: Vec<ScanResult>,
    /// Signatures listed on this page, newest first
    pub signatures: Vec<Signature>,
}

impl ScanPage {
    /// Cursor for the next (older) page
    pub fn last_signature(&self) -> Option<Signature> {
        self.signatures.last().copied()
    }
}

/// Fetch one transaction and scan it
///
/// Transactions the ledger does not return are treated as empty.
pub async fn scan_signature<L: StealthLedger + ?Sized>(
    ledger: &L,
    view: &ViewKey,
    signature: &Signature,
) -> Result<Vec<ScanResult>> {
    match ledger.transaction(signature).await? {
        Some(transaction) => {
            let results = view.scan_transaction(&transaction);
            for result in &results {
                info!(%signature, account = %result.account, token = ?result.token, "found stealth output");
            }
            Ok(results)
        }
        None => {
            debug!(%signature, "no scannable transaction, skipping");
            Ok(Vec::new())
        }
    }
}

/// Scan one page of the history of `marker`
pub async fn scan_page<L: StealthLedger + ?Sized>(
    ledger: &L,
    marker: &Pubkey,
    view: &ViewKey,
    query: &SignatureQuery,
) -> Result<ScanPage> {
    let signatures = ledger.signatures_for_address(marker, query).await?;
    debug!(count = signatures.len(), before = ?query.before, "fetched signature page");

    let per_transaction: Vec<Vec<ScanResult>> = stream::iter(&signatures)
        .map(|signature| scan_signature(ledger, view, signature))
        .buffered(SCAN_CONCURRENCY)
        .try_collect()
        .await?;
    let results = per_transaction.into_iter().flatten().collect();

    Ok(ScanPage { results, signatures })
}

/// Walk the history of `marker` page by page, newest first, and collect
/// every output owned by `view`
pub async fn scan_history<L: StealthLedger + ?Sized>(
    ledger: &L,
    marker: &Pubkey,
    view: &ViewKey,
    options: &HistoryOptions,
) -> Result<Vec<ScanResult>> {
    let mut query = SignatureQuery {
        before: options.before,
        until: options.until,
        limit: options.limit,
    };
    let mut results = Vec::new();
    let mut pages = 0;

    loop {
        if options.max_pages.is_some_and(|max| pages >= max) {
            debug!(pages, cursor = ?query.before, "page limit reached");
            break;
        }

        let page = scan_page(ledger, marker, view, &query).await?;
        results.extend_from_slice(&page.results);
        pages += 1;

        let full_page = page.signatures.len() == query.limit;
        match page.last_signature() {
            Some(cursor) if full_page => query.before = Some(cursor),
            _ => break,
        }
    }

    Ok(results)
}
