//! Blockchain identity types.
//!
//! A `Blockchain` pairs a `BlockchainType` with a display name. Only the
//! type participates in adapter routing; the name is carried for logs.

use serde::{Deserialize, Serialize};

/// Every chain the wallet knows about.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockchainType {
    Ethereum,
    BinanceSmartChain,
    Polygon,
    Avalanche,
    Optimism,
    Gnosis,
    Fantom,
    ArbitrumOne,
    Solana,
    Tron,
    BinanceChain,
    Bitcoin,
    Litecoin,
    Zcash,
    /// Chain reported by the market data provider but not handled natively.
    Unsupported(String),
}

/// Which dedicated transactions-adapter family serves a chain.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AdapterKind {
    /// Shared EVM transactions adapter, parameterized by the concrete chain.
    Evm(BlockchainType),
    Solana,
    Tron,
}

impl BlockchainType {
    /// Whether the chain belongs to the EVM family.
    pub const fn is_evm(&self) -> bool {
        matches!(
            self,
            Self::Ethereum
                | Self::BinanceSmartChain
                | Self::Polygon
                | Self::Avalanche
                | Self::Optimism
                | Self::Gnosis
                | Self::Fantom
                | Self::ArbitrumOne
        )
    }

    /// Dedicated adapter family for this chain.
    ///
    /// `None` means the wallet's own adapter must be used directly if it
    /// is transactions-capable.
    pub fn transactions_kind(&self) -> Option<AdapterKind> {
        match self {
            t if t.is_evm() => Some(AdapterKind::Evm(t.clone())),
            Self::Solana => Some(AdapterKind::Solana),
            Self::Tron => Some(AdapterKind::Tron),
            _ => None,
        }
    }
}

impl std::fmt::Display for BlockchainType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ethereum => write!(f, "ethereum"),
            Self::BinanceSmartChain => write!(f, "binance-smart-chain"),
            Self::Polygon => write!(f, "polygon"),
            Self::Avalanche => write!(f, "avalanche"),
            Self::Optimism => write!(f, "optimism"),
            Self::Gnosis => write!(f, "gnosis"),
            Self::Fantom => write!(f, "fantom"),
            Self::ArbitrumOne => write!(f, "arbitrum-one"),
            Self::Solana => write!(f, "solana"),
            Self::Tron => write!(f, "tron"),
            Self::BinanceChain => write!(f, "binancecoin"),
            Self::Bitcoin => write!(f, "bitcoin"),
            Self::Litecoin => write!(f, "litecoin"),
            Self::Zcash => write!(f, "zcash"),
            Self::Unsupported(uid) => write!(f, "{uid}"),
        }
    }
}

impl std::fmt::Display for AdapterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Evm(chain) => write!(f, "evm:{chain}"),
            Self::Solana => write!(f, "solana"),
            Self::Tron => write!(f, "tron"),
        }
    }
}

/// A blockchain as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Blockchain {
    #[serde(rename = "type")]
    pub kind: BlockchainType,
    pub name: String,
}

impl Blockchain {
    pub fn new(kind: BlockchainType, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }
}
