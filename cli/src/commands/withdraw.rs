//! Withdraw funds from a stealth address

use anyhow::{Context, Result};
use colored::Colorize;
use dksap::{spend_key_for, wallet};
use solana_sdk::native_token::lamports_to_sol;

use crate::config::{parse_amount, parse_pubkey, Network};

pub async fn run(
    network: &Network,
    ephemeral: &str,
    to: &str,
    amount: &str,
    mint: Option<&str>,
) -> Result<()> {
    println!("{}", "Preparing withdrawal...".cyan());

    let ephemeral = parse_pubkey(ephemeral, "ephemeral key")?;
    let to = parse_pubkey(to, "destination")?;
    let mint = mint.map(|m| parse_pubkey(m, "mint")).transpose()?;
    let amount = parse_amount(amount, mint.is_some())?;

    let keys = network.meta_keys()?;
    let stealth_address = spend_key_for(&keys, &ephemeral)
        .context("Ephemeral key is not a valid curve point")?
        .pubkey();
    println!("From: {}", stealth_address);
    println!("To:   {}", to);

    let ledger = network.ledger();
    let signature = match mint {
        Some(mint) => {
            println!("Amount: {} base units of {}", amount, mint);
            wallet::token_from_stealth(&ledger, &keys, &ephemeral, &mint, &to, amount)
                .await
                .context("Token withdrawal failed")?
        }
        None => {
            println!("Amount: {} SOL", lamports_to_sol(amount));
            wallet::send_from_stealth(&ledger, &keys, &ephemeral, &to, amount)
                .await
                .context("Withdrawal failed")?
        }
    };

    println!();
    println!("{}", "Withdrawal complete!".green().bold());
    println!("Signature: {}", signature);
    println!();
    println!(
        "{}",
        "Withdrawing to your main wallet links it to this payment.".dimmed()
    );

    Ok(())
}
