//! Export view key (scan-only capability)

use anyhow::Result;
use colored::Colorize;
use dksap::ViewKey;

use crate::config::Network;

pub fn run(network: &Network) -> Result<()> {
    let keys = network.meta_keys()?;
    let view_key = ViewKey::from_meta_keys(&keys);

    println!();
    println!("{}", "View Key Export".yellow().bold());
    println!();
    println!(
        "{}",
        "The view key finds payments WITHOUT spending capability.".dimmed()
    );
    println!(
        "{}",
        "Use it with 'dksap scan --view-key <key>' on a watch-only machine.".dimmed()
    );
    println!();
    println!("{}:", "View Key (scan secret + spend pubkey)".yellow());
    println!();
    println!("  {}", view_key.export());
    println!();

    println!(
        "{}",
        "WARNING: Anyone with this key can see all your incoming payments!".red()
    );
    println!("{}", "         They CANNOT spend your funds.".green());

    Ok(())
}
