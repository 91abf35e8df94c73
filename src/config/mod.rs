//! Configuration Module - TOML-based Router Configuration
//!
//! Loads and validates configuration from `config.toml`. Accounts and
//! wallets declared here are the active wallet set the binary publishes;
//! editing them while running triggers a routing table rebuild through
//! the hot-reload watcher.

pub mod hot_reload;
pub mod loader;

use anyhow::{Context, Result};
use serde::Deserialize;
use uuid::Uuid;

use crate::domain::{Account, AccountType, Blockchain, BlockchainType, Token, TokenType, Wallet};

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
  /// Service identity and logging.
  pub service: ServiceConfig,
  /// Notification channel sizing.
  #[serde(default)]
  pub channels: ChannelConfig,
  /// Adapter factory behaviour.
  #[serde(default)]
  pub factory: FactoryConfig,
  /// Metrics and health endpoints.
  #[serde(default)]
  pub metrics: MetricsConfig,
  /// Accounts wallets may reference.
  #[serde(default)]
  pub accounts: Vec<AccountConfig>,
  /// Active wallets, in priority order.
  #[serde(default)]
  pub wallets: Vec<WalletConfig>,
  /// Token whose pending approvals are tracked.
  pub allowance: Option<AllowanceConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
  /// Human-readable service name.
  pub name: String,
  /// Log level (trace, debug, info, warn, error).
  #[serde(default = "default_log_level")]
  pub log_level: String,
  /// How often config.toml is checked for changes (seconds).
  #[serde(default = "default_reload_interval")]
  pub reload_interval_secs: u64,
}

/// Broadcast channel capacities.
#[derive(Debug, Clone, Deserialize)]
pub struct ChannelConfig {
  /// Pending wallet-set notifications before a subscriber lags.
  #[serde(default = "default_capacity")]
  pub wallet_set_capacity: usize,
  /// Pending adapters-ready signals per subscriber.
  #[serde(default = "default_capacity")]
  pub ready_capacity: usize,
  /// Pending approval phase notifications per subscriber.
  #[serde(default = "default_capacity")]
  pub phase_capacity: usize,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FactoryConfig {
  /// Chains whose kits refuse to start (construction errors).
  #[serde(default)]
  pub disabled_chains: Vec<BlockchainType>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
  /// Serve /metrics, /live and /ready.
  #[serde(default = "default_true")]
  pub enabled: bool,
  /// Bind address for the HTTP endpoints.
  #[serde(default = "default_metrics_addr")]
  pub bind_address: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccountConfig {
  /// Stable id; keeps transaction sources equal across reloads.
  pub id: Uuid,
  pub name: String,
  #[serde(rename = "type")]
  pub kind: AccountType,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WalletConfig {
  /// Name of the owning account.
  pub account: String,
  pub blockchain: BlockchainType,
  /// Display name; defaults to the blockchain id.
  pub blockchain_name: Option<String>,
  pub code: String,
  pub decimals: u8,
  #[serde(rename = "type", default = "default_token_type")]
  pub token_type: TokenType,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AllowanceConfig {
  /// Owning account name.
  pub account: String,
  /// Token code of a configured wallet.
  pub code: String,
}

impl AppConfig {
  pub fn account_list(&self) -> Vec<Account> {
    self
      .accounts
      .iter()
      .map(|a| Account {
        id: a.id,
        name: a.name.clone(),
        kind: a.kind.clone(),
      })
      .collect()
  }

  /// Resolve configured wallets against configured accounts, in order.
  pub fn wallet_list(&self) -> Result<Vec<Wallet>> {
    let accounts = self.account_list();

    self
      .wallets
      .iter()
      .map(|w| {
        let account = accounts
          .iter()
          .find(|a| a.name == w.account)
          .with_context(|| format!("Wallet {} references unknown account {}", w.code, w.account))?;

        let name = w
          .blockchain_name
          .clone()
          .unwrap_or_else(|| w.blockchain.to_string());

        Ok(Wallet::new(
          Token {
            blockchain: Blockchain::new(w.blockchain.clone(), name),
            kind: w.token_type.clone(),
            code: w.code.clone(),
            decimals: w.decimals,
          },
          account.clone(),
        ))
      })
      .collect()
  }

  /// The wallet named by the `[allowance]` section, if any.
  pub fn allowance_wallet(&self) -> Result<Option<Wallet>> {
    let Some(allowance) = &self.allowance else {
      return Ok(None);
    };

    let wallet = self
      .wallet_list()?
      .into_iter()
      .find(|w| w.account.name == allowance.account && w.token.code == allowance.code)
      .with_context(|| {
        format!(
          "Allowance token {} of account {} is not a configured wallet",
          allowance.code, allowance.account
        )
      })?;

    Ok(Some(wallet))
  }
}

impl Default for ChannelConfig {
  fn default() -> Self {
    Self {
      wallet_set_capacity: default_capacity(),
      ready_capacity: default_capacity(),
      phase_capacity: default_capacity(),
    }
  }
}

impl Default for MetricsConfig {
  fn default() -> Self {
    Self {
      enabled: default_true(),
      bind_address: default_metrics_addr(),
    }
  }
}

// Default value functions for serde

fn default_log_level() -> String {
  "info".to_string()
}

fn default_reload_interval() -> u64 {
  60
}

fn default_capacity() -> usize {
  64
}

fn default_true() -> bool {
  true
}

fn default_metrics_addr() -> String {
  "0.0.0.0:9090".to_string()
}

fn default_token_type() -> TokenType {
  TokenType::Native
}
