//! Display stealth meta-address

use anyhow::Result;
use colored::Colorize;

use crate::config::Network;

pub fn run(network: &Network) -> Result<()> {
    let keys = network.meta_keys()?;
    let meta_address = keys.meta_address();

    println!();
    println!("{}", "Your Stealth Meta-Address".yellow().bold());
    println!();
    println!("{}", meta_address);
    println!();
    println!("{}:", "Components".dimmed());
    println!("  Scan pubkey:  {}", meta_address.scan);
    println!("  Spend pubkey: {}", meta_address.spend);
    println!();
    println!(
        "{}",
        "Share the meta-address above to receive private payments.".dimmed()
    );

    Ok(())
}
