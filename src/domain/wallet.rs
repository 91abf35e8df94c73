//! Wallets, tokens, accounts and the transaction source routing key.
//!
//! A `Wallet` is a token held by an account. Several wallets can share
//! one chain-level transaction stream (every EIP-20 token on Ethereum for
//! the same account, for instance); that stream is a `TransactionSource`.

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::blockchain::{AdapterKind, Blockchain};

/// How a token is represented on its chain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    /// The chain's base coin (ETH, SOL, TRX, BTC...).
    Native,
    /// ERC-20 style token identified by its contract.
    Eip20 { address: Address },
    /// Binance Chain asset identified by its symbol.
    Bep2 { symbol: String },
    /// Solana SPL token identified by its mint.
    Spl { address: String },
    /// Token type reported upstream that the wallet can't handle.
    Unsupported(String),
}

impl TokenType {
    /// Extra routing metadata for the transaction source.
    ///
    /// BEP-2 tokens keep separate transaction histories per symbol; every
    /// other type shares the chain-level stream.
    pub fn meta(&self) -> Option<String> {
        match self {
            Self::Bep2 { symbol } => Some(symbol.clone()),
            _ => None,
        }
    }
}

/// A coin on a specific chain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token {
    pub blockchain: Blockchain,
    #[serde(rename = "type")]
    pub kind: TokenType,
    /// Ticker code, e.g. `USDT`.
    pub code: String,
    pub decimals: u8,
}

/// Key material an account was created from.
///
/// Watch-only variants can only ever serve the chain family their
/// address belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    Mnemonic,
    EvmPrivateKey,
    EvmAddress(Address),
    SolanaAddress(String),
    TronAddress(String),
}

impl AccountType {
    /// Whether an adapter of `kind` can be built for this account.
    pub const fn supports(&self, kind: &AdapterKind) -> bool {
        match self {
            Self::Mnemonic => true,
            Self::EvmPrivateKey | Self::EvmAddress(_) => matches!(kind, AdapterKind::Evm(_)),
            Self::SolanaAddress(_) => matches!(kind, AdapterKind::Solana),
            Self::TronAddress(_) => matches!(kind, AdapterKind::Tron),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: AccountType,
}

impl Account {
    pub fn new(name: impl Into<String>, kind: AccountType) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            kind,
        }
    }
}

/// Routing key: one chain-level transaction stream.
///
/// Equality is by value over all three fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionSource {
    pub blockchain: Blockchain,
    pub account: Account,
    pub meta: Option<String>,
}

impl std::fmt::Display for TransactionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.blockchain.kind, self.account.id)?;
        if let Some(meta) = &self.meta {
            write!(f, "/{meta}")?;
        }
        Ok(())
    }
}

/// A token enabled for an account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Wallet {
    pub token: Token,
    pub account: Account,
}

impl Wallet {
    pub const fn new(token: Token, account: Account) -> Self {
        Self { token, account }
    }

    /// The transaction stream this wallet's history lives in.
    pub fn transaction_source(&self) -> TransactionSource {
        TransactionSource {
            blockchain: self.token.blockchain.clone(),
            account: self.account.clone(),
            meta: self.token.kind.meta(),
        }
    }
}
