//! Send SOL or tokens to a stealth meta-address

use anyhow::{Context, Result};
use colored::Colorize;
use dksap::{wallet, MetaAddress};
use solana_sdk::native_token::lamports_to_sol;

use crate::config::{parse_amount, parse_pubkey, Network};

pub async fn run(network: &Network, recipient: &str, amount: &str, mint: Option<&str>) -> Result<()> {
    println!("{}", "Preparing stealth payment...".cyan());

    let meta_address: MetaAddress = recipient.parse().context("Invalid meta-address format")?;
    let mint = mint.map(|m| parse_pubkey(m, "mint")).transpose()?;
    let amount = parse_amount(amount, mint.is_some())?;

    let payer = network.wallet()?;
    let ledger = network.ledger();

    let signature = match mint {
        Some(mint) => {
            println!("Token:  {}", mint);
            println!("Amount: {} base units", amount);
            wallet::stealth_token_transfer(&ledger, &payer, &mint, &meta_address, amount)
                .await
                .context("Token transfer failed")?
        }
        None => {
            println!("Amount: {} SOL", lamports_to_sol(amount));
            wallet::stealth_transfer(&ledger, &payer, &meta_address, amount)
                .await
                .context("Transfer failed")?
        }
    };

    println!();
    println!("{}", "Payment sent!".green().bold());
    println!("Signature: {}", signature);
    println!();
    println!(
        "{}",
        "The recipient will find it with 'dksap scan'.".dimmed()
    );

    Ok(())
}
