//! Scan the marker account's history for incoming stealth payments

use anyhow::{Context, Result};
use colored::Colorize;
use dksap::{scan_history, HistoryOptions, ScanResult, ViewKey, MARKER};
use serde_json::json;
use solana_sdk::{native_token::lamports_to_sol, signature::Signature};

use crate::config::Network;

pub struct ScanOptions {
    pub view_key: Option<String>,
    pub before: Option<String>,
    pub until: Option<String>,
    pub limit: usize,
    pub max_pages: Option<usize>,
    pub json: bool,
}

fn parse_signature(input: Option<&str>) -> Result<Option<Signature>> {
    input
        .map(|s| s.parse::<Signature>().with_context(|| format!("Invalid signature: {}", s)))
        .transpose()
}

pub async fn run(network: &Network, options: ScanOptions) -> Result<()> {
    let view = match options.view_key.as_deref() {
        Some(encoded) => encoded.parse::<ViewKey>().context("Invalid view key")?,
        None => ViewKey::from_meta_keys(&network.meta_keys()?),
    };

    let history = HistoryOptions {
        before: parse_signature(options.before.as_deref())?,
        until: parse_signature(options.until.as_deref())?,
        limit: options.limit.clamp(1, dksap::ledger::MAX_SIGNATURES_PER_PAGE),
        max_pages: options.max_pages,
    };

    if !options.json {
        println!("{}", "Scanning for incoming stealth payments...".cyan());
        println!("Marker account: {}", MARKER);
    }

    let ledger = network.ledger();
    let found = scan_history(&ledger, &MARKER, &view, &history)
        .await
        .context("Scan failed")?;

    if options.json {
        let results: Vec<_> = found.iter().map(result_json).collect();
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    println!();
    if found.is_empty() {
        println!("{}", "No incoming payments found.".yellow());
        if history.max_pages.is_some() {
            println!(
                "{}",
                "Try without --max-pages to scan the full history.".dimmed()
            );
        }
        return Ok(());
    }

    println!(
        "{}",
        format!("Found {} payment(s):", found.len()).green().bold()
    );
    println!();

    for (i, payment) in found.iter().enumerate() {
        println!("{}. {}", i + 1, "Payment".yellow());
        println!("   Address:   {}", payment.account);
        println!("   Ephemeral: {}", payment.ephem);
        match payment.token {
            Some(mint) => println!("   Token:     {}", mint),
            None => {
                println!("   Token:     Native SOL");
                match ledger.client().get_balance(&payment.account).await {
                    Ok(balance) => println!("   Balance:   {} SOL", lamports_to_sol(balance)),
                    Err(e) => println!("   Balance:   {}", format!("unavailable ({})", e).dimmed()),
                }
            }
        }
        println!();
    }

    println!(
        "{}",
        "Use 'dksap withdraw --ephemeral <key> --to <address> --amount <n>' to move funds.".dimmed()
    );

    Ok(())
}

fn result_json(result: &ScanResult) -> serde_json::Value {
    json!({
        "account": result.account.to_string(),
        "ephem": result.ephem.to_string(),
        "token": result.token.map(|mint| mint.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::pubkey::Pubkey;

    #[test]
    fn test_result_json_shape() {
        let mint = Pubkey::new_unique();
        let result = ScanResult {
            account: Pubkey::new_unique(),
            ephem: Pubkey::new_unique(),
            token: Some(mint),
        };
        let value = result_json(&result);
        assert_eq!(value["token"], json!(mint.to_string()));

        let native = ScanResult { token: None, ..result };
        assert!(result_json(&native)["token"].is_null());
    }

    #[test]
    fn test_parse_signature_cursor() {
        let sig = Signature::new_unique();
        assert_eq!(parse_signature(Some(&sig.to_string())).unwrap(), Some(sig));
        assert_eq!(parse_signature(None).unwrap(), None);
        assert!(parse_signature(Some("not-a-signature")).is_err());
    }
}
