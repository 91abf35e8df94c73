//! Configuration Loader - File Loading and Validation
//!
//! Handles loading `config.toml`, validating all parameters,
//! and providing clear error messages for misconfiguration.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use super::AppConfig;

/// Load and validate configuration from a TOML file.
///
/// # Errors
/// Returns detailed error if:
/// - File doesn't exist or can't be read
/// - TOML parsing fails
/// - Validation rules are violated
pub fn load_config(path: &str) -> Result<AppConfig> {
  let path = Path::new(path);

  let content = std::fs::read_to_string(path)
    .with_context(|| format!("Failed to read config file: {}", path.display()))?;

  let config = parse_config(&content)?;

  info!(
    accounts = config.accounts.len(),
    wallets = config.wallets.len(),
    disabled_chains = config.factory.disabled_chains.len(),
    "Configuration loaded successfully"
  );

  Ok(config)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<AppConfig> {
  let config: AppConfig =
    toml::from_str(content).with_context(|| "Failed to parse config.toml")?;

  validate_config(&config)?;
  Ok(config)
}

/// Validate all configuration parameters.
///
/// Checks for:
/// - Non-empty service name and positive intervals/capacities
/// - Unique account ids and names
/// - Wallets referencing known accounts with representable decimals
/// - An allowance section naming a configured wallet
fn validate_config(config: &AppConfig) -> Result<()> {
  anyhow::ensure!(
    !config.service.name.is_empty(),
    "service.name must not be empty"
  );
  anyhow::ensure!(
    config.service.reload_interval_secs > 0,
    "service.reload_interval_secs must be positive"
  );

  // Channel validation
  anyhow::ensure!(
    config.channels.wallet_set_capacity > 0
      && config.channels.ready_capacity > 0
      && config.channels.phase_capacity > 0,
    "Channel capacities must be positive"
  );

  // Account validation
  let mut ids = HashSet::new();
  let mut names = HashSet::new();
  for account in &config.accounts {
    anyhow::ensure!(
      ids.insert(account.id),
      "Duplicate account id {}",
      account.id
    );
    anyhow::ensure!(
      names.insert(account.name.as_str()),
      "Duplicate account name {}",
      account.name
    );
  }

  // Wallet validation
  for (i, wallet) in config.wallets.iter().enumerate() {
    anyhow::ensure!(
      names.contains(wallet.account.as_str()),
      "Wallet {} ({}) references unknown account {}",
      i,
      wallet.code,
      wallet.account
    );
    anyhow::ensure!(
      !wallet.code.is_empty(),
      "Wallet {} has empty code",
      i
    );
    anyhow::ensure!(
      wallet.decimals <= 28,
      "Wallet {} ({}) decimals must be <= 28, got {}",
      i,
      wallet.code,
      wallet.decimals
    );
  }

  // Allowance validation
  config.allowance_wallet()?;

  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::{AccountType, BlockchainType, TokenType};

  const VALID: &str = r#"
[service]
name = "router"

[factory]
disabled_chains = ["tron"]

[[accounts]]
id = "6f1c7c3e-8d4b-4b7a-9c55-0d2b1f3e7a10"
name = "main"
type = "mnemonic"

[[accounts]]
id = "0b8e2a55-2f0c-4d6e-8f3b-7a1d9c4e5f21"
name = "watch"
type = { evm_address = "0x00000000000000000000000000000000000000aa" }

[[wallets]]
account = "main"
blockchain = "ethereum"
code = "ETH"
decimals = 18

[[wallets]]
account = "main"
blockchain = "ethereum"
code = "USDT"
decimals = 6
type = { eip20 = { address = "0xdac17f958d2ee523a2206206994597c13d831ec7" } }

[[wallets]]
account = "watch"
blockchain = "polygon"
code = "MATIC"
decimals = 18

[allowance]
account = "main"
code = "USDT"
"#;

  #[test]
  fn test_load_nonexistent_file() {
    let result = load_config("nonexistent.toml");
    assert!(result.is_err());
  }

  #[test]
  fn test_parse_valid_config() {
    let config = parse_config(VALID).unwrap();

    assert_eq!(config.service.log_level, "info");
    assert_eq!(config.service.reload_interval_secs, 60);
    assert_eq!(config.channels.ready_capacity, 64);
    assert_eq!(config.factory.disabled_chains, vec![BlockchainType::Tron]);
    assert!(matches!(config.accounts[1].kind, AccountType::EvmAddress(_)));

    let wallets = config.wallet_list().unwrap();
    assert_eq!(wallets.len(), 3);
    assert_eq!(wallets[0].token.kind, TokenType::Native);
    assert_eq!(wallets[0].transaction_source(), wallets[1].transaction_source());
    assert_eq!(wallets[2].token.blockchain.name, "polygon");

    let tracked = config.allowance_wallet().unwrap().unwrap();
    assert_eq!(tracked.token.code, "USDT");
  }

  #[test]
  fn test_unknown_account_rejected() {
    let bad = VALID.replace("account = \"watch\"", "account = \"ghost\"");
    assert!(parse_config(&bad).is_err());
  }

  #[test]
  fn test_duplicate_account_name_rejected() {
    let bad = VALID.replace("name = \"watch\"", "name = \"main\"");
    assert!(parse_config(&bad).is_err());
  }

  #[test]
  fn test_unknown_allowance_token_rejected() {
    let bad = VALID.replace(
      "[allowance]\naccount = \"main\"\ncode = \"USDT\"",
      "[allowance]\naccount = \"main\"\ncode = \"DAI\"",
    );
    assert_ne!(bad, VALID);
    assert!(parse_config(&bad).is_err());
  }

  #[test]
  fn test_zero_capacity_rejected() {
    let bad = VALID.replace("[factory]", "[channels]\nready_capacity = 0\n\n[factory]");
    assert!(parse_config(&bad).is_err());
  }
}
