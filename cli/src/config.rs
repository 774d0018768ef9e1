//! Connection settings, wallet loading and amount parsing

use std::fs;
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use dksap::{MetaKeys, RpcLedger};
use solana_sdk::{
    commitment_config::{CommitmentConfig, CommitmentLevel},
    native_token::{sol_to_lamports, LAMPORTS_PER_SOL},
    pubkey::Pubkey,
    signature::Keypair,
};
use tracing::debug;

/// Global flags shared by every command
pub struct Network {
    pub rpc_url: String,
    pub keypair_path: Option<String>,
    pub commitment: CommitmentConfig,
}

impl Network {
    pub fn new(rpc_url: &str, keypair_path: Option<&str>, commitment: &str) -> Result<Self> {
        Ok(Self {
            rpc_url: rpc_url.to_string(),
            keypair_path: keypair_path.map(str::to_string),
            commitment: parse_commitment(commitment)?,
        })
    }

    pub fn ledger(&self) -> RpcLedger {
        debug!(url = %self.rpc_url, commitment = ?self.commitment.commitment, "connecting");
        RpcLedger::new_with_commitment(self.rpc_url.clone(), self.commitment)
    }

    pub fn wallet(&self) -> Result<Keypair> {
        load_solana_keypair(self.keypair_path.as_deref())
    }

    /// Stealth keys derived from a signature by the wallet
    pub fn meta_keys(&self) -> Result<MetaKeys> {
        let wallet = self.wallet()?;
        MetaKeys::from_signer(&wallet).context("Failed to derive stealth keys from wallet")
    }
}

pub fn parse_commitment(level: &str) -> Result<CommitmentConfig> {
    let commitment = level
        .parse::<CommitmentLevel>()
        .map_err(|_| anyhow!("Unknown commitment '{}'. Use processed, confirmed or finalized", level))?;
    Ok(CommitmentConfig { commitment })
}

/// Default Solana CLI keypair location
pub fn default_keypair_path() -> Result<PathBuf> {
    Ok(dirs::home_dir()
        .context("Could not find home directory")?
        .join(".config")
        .join("solana")
        .join("id.json"))
}

/// Load Solana keypair from file or default location
pub fn load_solana_keypair(path: Option<&str>) -> Result<Keypair> {
    let keypair_path = match path {
        Some(p) => PathBuf::from(p),
        None => default_keypair_path()?,
    };

    if !keypair_path.exists() {
        bail!(
            "Solana keypair not found at {:?}. Generate one with 'solana-keygen new' or specify path with --keypair",
            keypair_path
        );
    }

    let keypair_json = fs::read_to_string(&keypair_path).context("Failed to read keypair file")?;
    let bytes: Vec<u8> = serde_json::from_str(&keypair_json).context("Keypair file is not a JSON byte array")?;
    let keypair = Keypair::from_bytes(&bytes).context("Invalid keypair bytes")?;

    Ok(keypair)
}

pub fn parse_pubkey(input: &str, what: &str) -> Result<Pubkey> {
    input
        .parse()
        .with_context(|| format!("Invalid {}: {}", what, input))
}

/// Amount in lamports for SOL, or raw base units for tokens
pub fn parse_amount(input: &str, token: bool) -> Result<u64> {
    let amount = if token {
        input
            .parse::<u64>()
            .with_context(|| format!("Token amount must be a whole number of base units: {}", input))?
    } else {
        let sol: f64 = input
            .parse()
            .with_context(|| format!("Invalid SOL amount: {}", input))?;
        if !sol.is_finite() || sol < 0.0 {
            bail!("Invalid SOL amount: {}", input);
        }
        // sol_to_lamports saturates at u64::MAX
        if sol * LAMPORTS_PER_SOL as f64 >= u64::MAX as f64 {
            bail!("SOL amount too large: {}", input);
        }
        sol_to_lamports(sol)
    };

    if amount == 0 {
        bail!("Amount must be greater than zero");
    }
    Ok(amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::signer::Signer;
    use std::io::Write;

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("1.5", false).unwrap(), 1_500_000_000);
        assert_eq!(parse_amount("0.000000001", false).unwrap(), 1);
        assert_eq!(parse_amount("42", true).unwrap(), 42);

        assert!(parse_amount("1.5", true).is_err());
        assert!(parse_amount("-1", false).is_err());
        assert!(parse_amount("0", false).is_err());
        assert!(parse_amount("0", true).is_err());
        assert!(parse_amount("NaN", false).is_err());
    }

    #[test]
    fn test_parse_amount_rejects_overflowing_sol() {
        assert!(parse_amount("1e30", false).is_err());
        assert!(parse_amount("18446744074", false).is_err());
        assert_eq!(parse_amount("1000000", false).unwrap(), 1_000_000_000_000_000);
    }

    #[test]
    fn test_parse_commitment() {
        assert_eq!(parse_commitment("finalized").unwrap(), CommitmentConfig::finalized());
        assert_eq!(parse_commitment("confirmed").unwrap(), CommitmentConfig::confirmed());
        assert!(parse_commitment("eventually").is_err());
    }

    #[test]
    fn test_load_keypair_file() {
        let keypair = Keypair::new();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{:?}", keypair.to_bytes().to_vec()).unwrap();

        let loaded = load_solana_keypair(file.path().to_str()).unwrap();
        assert_eq!(loaded.pubkey(), keypair.pubkey());
    }

    #[test]
    fn test_missing_keypair_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");
        assert!(load_solana_keypair(path.to_str()).is_err());
    }

    #[test]
    fn test_meta_keys_follow_wallet() {
        let keypair = Keypair::new();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{:?}", keypair.to_bytes().to_vec()).unwrap();

        let network = Network::new("http://localhost:8899", file.path().to_str(), "confirmed").unwrap();
        let first = network.meta_keys().unwrap().meta_address();
        let second = network.meta_keys().unwrap().meta_address();
        assert_eq!(first, second);
    }
}
