//! dksap - command line wallet for dual-key stealth addresses on Solana

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod config;
mod logging;

use commands::*;

#[derive(Parser)]
#[command(name = "dksap")]
#[command(version = "0.1.0")]
#[command(about = "Dual-key stealth addresses for Solana - private payments without a program")]
#[command(long_about = r#"
Each payment lands on a fresh one-time address that only the recipient
can link to their meta-address. Stealth keys are derived from a
signature by your Solana wallet, so there is nothing extra to back up.

Quick Start:
  1. dksap address              Show your stealth meta-address
  2. dksap send --to <meta>     Pay someone privately
  3. dksap scan                 Find payments sent to you
  4. dksap withdraw             Move received funds
"#)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Solana RPC URL
    #[arg(long, global = true, default_value = "https://api.devnet.solana.com")]
    rpc_url: String,

    /// Path to keypair file
    #[arg(long, global = true)]
    keypair: Option<String>,

    /// Commitment level for reads and confirmation
    #[arg(long, global = true, default_value = "confirmed")]
    commitment: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Show your stealth meta-address
    Address,

    /// Export view key (scan-only, no spending capability)
    ExportViewKey,

    /// Send SOL or tokens to a stealth meta-address
    Send {
        /// Recipient's meta-address (base58 or stealth:... format)
        #[arg(short, long)]
        to: String,

        /// Amount in SOL, or in base units when --mint is set
        #[arg(short, long)]
        amount: String,

        /// Token mint; omit to send SOL
        #[arg(long)]
        mint: Option<String>,
    },

    /// Scan the ledger for incoming stealth payments
    Scan {
        /// Scan with an exported view key instead of your wallet
        #[arg(long)]
        view_key: Option<String>,

        /// Resume strictly before this transaction signature
        #[arg(long)]
        before: Option<String>,

        /// Stop at this transaction signature
        #[arg(long)]
        until: Option<String>,

        /// Signatures per page
        #[arg(long, default_value_t = dksap::ledger::MAX_SIGNATURES_PER_PAGE)]
        limit: usize,

        /// Stop after this many pages
        #[arg(long)]
        max_pages: Option<usize>,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Withdraw funds from a stealth address
    Withdraw {
        /// Ephemeral key of the payment (from scan results)
        #[arg(short, long)]
        ephemeral: String,

        /// Destination wallet
        #[arg(short, long)]
        to: String,

        /// Amount in SOL, or in base units when --mint is set
        #[arg(short, long)]
        amount: String,

        /// Token mint; omit to withdraw SOL
        #[arg(long)]
        mint: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();

    let cli = Cli::parse();
    let network = config::Network::new(&cli.rpc_url, cli.keypair.as_deref(), &cli.commitment)?;

    match cli.command {
        Commands::Address => {
            address::run(&network)?;
        }
        Commands::ExportViewKey => {
            export_view_key::run(&network)?;
        }
        Commands::Send { to, amount, mint } => {
            send::run(&network, &to, &amount, mint.as_deref()).await?;
        }
        Commands::Scan { view_key, before, until, limit, max_pages, json } => {
            scan::run(
                &network,
                scan::ScanOptions {
                    view_key,
                    before,
                    until,
                    limit,
                    max_pages,
                    json,
                },
            )
            .await?;
        }
        Commands::Withdraw { ephemeral, to, amount, mint } => {
            withdraw::run(&network, &ephemeral, &to, &amount, mint.as_deref()).await?;
        }
    }

    Ok(())
}
