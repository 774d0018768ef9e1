//! Sending to and spending from stealth addresses
//!
//! These are thin flows over the builders: derive a destination, build the
//! instructions, sign, submit. Ledger errors come back unchanged.

use solana_sdk::{
    instruction::Instruction,
    pubkey::Pubkey,
    signature::Signature,
    signer::Signer,
    transaction::Transaction,
};
use tracing::info;

use crate::address::{destination_for, spend_key_for};
use crate::error::Result;
use crate::keys::{EphemeralKeypair, MetaAddress, MetaKeys};
use crate::ledger::StealthLedger;
use crate::scanner::ScanResult;
use crate::signer::StealthSigner;
use crate::transfer::{
    build_native_transfer, build_native_withdraw, build_token_transfer_with_payer,
    build_token_withdraw,
};

/// Sign with `signers` (the first pays fees) and submit
pub async fn submit<L: StealthLedger + ?Sized>(
    ledger: &L,
    instructions: &[Instruction],
    signers: &[&dyn Signer],
) -> Result<Signature> {
    let payer = signers.first().map(|signer| signer.pubkey());
    let blockhash = ledger.latest_blockhash().await?;
    let mut transaction = Transaction::new_with_payer(instructions, payer.as_ref());
    transaction.try_sign(signers, blockhash)?;
    ledger.send_transaction(&transaction).await
}

/// Send lamports to a fresh stealth address of `recipient`
pub async fn stealth_transfer<L: StealthLedger + ?Sized>(
    ledger: &L,
    source: &dyn Signer,
    recipient: &MetaAddress,
    lamports: u64,
) -> Result<Signature> {
    stealth_transfer_with_ephemeral(ledger, source, recipient, &EphemeralKeypair::generate(), lamports)
        .await
}

/// [`stealth_transfer`] with a caller-supplied ephemeral key
pub async fn stealth_transfer_with_ephemeral<L: StealthLedger + ?Sized>(
    ledger: &L,
    source: &dyn Signer,
    recipient: &MetaAddress,
    ephemeral: &EphemeralKeypair,
    lamports: u64,
) -> Result<Signature> {
    let destination = destination_for(recipient, ephemeral)?;
    let instruction = build_native_transfer(&source.pubkey(), &destination, lamports);

    let signature = submit(ledger, &[instruction], &[source]).await?;
    info!(%signature, destination = %destination.address, lamports, "stealth transfer submitted");
    Ok(signature)
}

/// Send tokens of `mint` to a fresh stealth address of `recipient`
///
/// `source` owns the tokens and pays for the destination token account.
pub async fn stealth_token_transfer<L: StealthLedger + ?Sized>(
    ledger: &L,
    source: &dyn Signer,
    mint: &Pubkey,
    recipient: &MetaAddress,
    amount: u64,
) -> Result<Signature> {
    stealth_token_transfer_with_payer(ledger, source, source, mint, recipient, amount).await
}

/// Token transfer where `payer` funds the account creation and fees and
/// `owner` authorizes the transfer
pub async fn stealth_token_transfer_with_payer<L: StealthLedger + ?Sized>(
    ledger: &L,
    payer: &dyn Signer,
    owner: &dyn Signer,
    mint: &Pubkey,
    recipient: &MetaAddress,
    amount: u64,
) -> Result<Signature> {
    let ephemeral = EphemeralKeypair::generate();
    let destination = destination_for(recipient, &ephemeral)?;
    let instructions = build_token_transfer_with_payer(
        &payer.pubkey(),
        &owner.pubkey(),
        mint,
        &destination,
        amount,
    )?;

    let signature = if payer.pubkey() == owner.pubkey() {
        submit(ledger, &instructions, &[payer]).await?
    } else {
        submit(ledger, &instructions, &[payer, owner]).await?
    };
    info!(%signature, destination = %destination.address, %mint, amount, "stealth token transfer submitted");
    Ok(signature)
}

/// Signer for the stealth output tagged with `ephemeral_pubkey`
pub fn output_signer(keys: &MetaKeys, ephemeral_pubkey: &Pubkey) -> Result<StealthSigner> {
    Ok(StealthSigner::from_secret(spend_key_for(keys, ephemeral_pubkey)?))
}

/// Move lamports out of a stealth address; the stealth address pays fees
///
/// Sending straight to a main wallet links it to the payment.
pub async fn send_from_stealth<L: StealthLedger + ?Sized>(
    ledger: &L,
    keys: &MetaKeys,
    ephemeral_pubkey: &Pubkey,
    to: &Pubkey,
    lamports: u64,
) -> Result<Signature> {
    let signer = output_signer(keys, ephemeral_pubkey)?;
    let instruction = build_native_withdraw(&signer.pubkey(), to, lamports);

    let signature = submit(ledger, &[instruction], &[&signer]).await?;
    info!(%signature, from = %signer.pubkey(), %to, lamports, "withdrawal submitted");
    Ok(signature)
}

/// Move tokens out of a stealth address into `to`'s associated token account
pub async fn token_from_stealth<L: StealthLedger + ?Sized>(
    ledger: &L,
    keys: &MetaKeys,
    ephemeral_pubkey: &Pubkey,
    mint: &Pubkey,
    to: &Pubkey,
    amount: u64,
) -> Result<Signature> {
    let signer = output_signer(keys, ephemeral_pubkey)?;
    let instruction = build_token_withdraw(&signer.pubkey(), mint, to, amount)?;

    let signature = submit(ledger, &[instruction], &[&signer]).await?;
    info!(%signature, from = %signer.pubkey(), %to, %mint, amount, "token withdrawal submitted");
    Ok(signature)
}

/// Spend a scanned output, native or token
pub async fn spend_output<L: StealthLedger + ?Sized>(
    ledger: &L,
    keys: &MetaKeys,
    output: &ScanResult,
    to: &Pubkey,
    amount: u64,
) -> Result<Signature> {
    match output.token {
        Some(mint) => token_from_stealth(ledger, keys, &output.ephem, &mint, to, amount).await,
        None => send_from_stealth(ledger, keys, &output.ephem, to, amount).await,
    }
}
