//! Instruction builders for stealth transfers
//!
//! Every stealth-tagged instruction carries two (three for tokens) extra
//! read-only accounts after the program's own: the ephemeral public key and
//! the protocol marker. The marker turns "find stealth payments" into
//! "list transactions touching the marker", which the RPC already serves.
//!
//! Account layouts:
//! - native: `[source (s,w), destination (w), ephemeral, marker]`
//! - token:  `[source ATA (w), destination ATA (w), owner (s), ephemeral, mint, marker]`

use solana_sdk::{
    instruction::{AccountMeta, Instruction},
    pubkey,
    pubkey::Pubkey,
    system_instruction,
};
use spl_associated_token_account::{
    get_associated_token_address, instruction::create_associated_token_account,
};

use crate::address::StealthDestination;
use crate::error::Result;

/// Well-known marker account referenced by every stealth instruction
///
/// Never signs and holds no logic.
pub const MARKER: Pubkey = pubkey!("3iUBKuvbRMPNLeF33QJHYia7ZBNDWqiccy35MXBRQd1f");

/// Account count of a tagged native transfer
pub const NATIVE_TRANSFER_ACCOUNTS: usize = 4;

/// Account count of a tagged token transfer
pub const TOKEN_TRANSFER_ACCOUNTS: usize = 6;

fn append_readonly(instruction: &mut Instruction, extra: &[Pubkey]) {
    instruction
        .accounts
        .extend(extra.iter().map(|key| AccountMeta::new_readonly(*key, false)));
}

/// Native transfer to a stealth destination, tagged with R and the marker
pub fn build_native_transfer(
    source: &Pubkey,
    destination: &StealthDestination,
    lamports: u64,
) -> Instruction {
    let mut instruction = system_instruction::transfer(source, &destination.address, lamports);
    append_readonly(&mut instruction, &[destination.ephemeral_pubkey, MARKER]);
    instruction
}

/// Token transfer to a stealth destination where `source` both pays for the
/// destination token account and owns the tokens
pub fn build_token_transfer(
    source: &Pubkey,
    mint: &Pubkey,
    destination: &StealthDestination,
    amount: u64,
) -> Result<Vec<Instruction>> {
    build_token_transfer_with_payer(source, source, mint, destination, amount)
}

/// Token transfer with a separate rent payer
///
/// Creates the associated token account of D, then transfers from the
/// owner's associated token account. Only the transfer is tagged.
pub fn build_token_transfer_with_payer(
    payer: &Pubkey,
    owner: &Pubkey,
    mint: &Pubkey,
    destination: &StealthDestination,
    amount: u64,
) -> Result<Vec<Instruction>> {
    let destination_ata = get_associated_token_address(&destination.address, mint);
    let create = create_associated_token_account(
        payer,
        &destination.address,
        mint,
        &spl_token::id(),
    );

    let source_ata = get_associated_token_address(owner, mint);
    let mut transfer = spl_token::instruction::transfer(
        &spl_token::id(),
        &source_ata,
        &destination_ata,
        owner,
        &[],
        amount,
    )?;
    append_readonly(&mut transfer, &[destination.ephemeral_pubkey, *mint, MARKER]);

    Ok(vec![create, transfer])
}

// ============================================================================
// Spending from a stealth address
// ============================================================================

/// Plain native transfer out of a stealth address
///
/// Untagged: spending must not advertise itself through the marker.
pub fn build_native_withdraw(stealth: &Pubkey, to: &Pubkey, lamports: u64) -> Instruction {
    system_instruction::transfer(stealth, to, lamports)
}

/// Plain token transfer out of a stealth address into `to`'s associated
/// token account, which must already exist
pub fn build_token_withdraw(
    stealth: &Pubkey,
    mint: &Pubkey,
    to: &Pubkey,
    amount: u64,
) -> Result<Instruction> {
    let source_ata = get_associated_token_address(stealth, mint);
    let destination_ata = get_associated_token_address(to, mint);
    Ok(spl_token::instruction::transfer(
        &spl_token::id(),
        &source_ata,
        &destination_ata,
        stealth,
        &[],
        amount,
    )?)
}
