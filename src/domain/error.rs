//! Adapter construction errors.

use thiserror::Error;

use super::blockchain::{AdapterKind, BlockchainType};
use super::wallet::TransactionSource;

/// Failure to build a transactions adapter for one source.
///
/// Returned only to the caller of the specific construction; the routing
/// table records it and carries on with the other sources.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AdapterError {
    /// The account's key material can't serve this adapter kind.
    #[error("account {account} does not support {kind} adapters")]
    UnsupportedAccount { account: String, kind: AdapterKind },

    /// The factory has no adapter for this chain.
    #[error("blockchain {0} is not supported")]
    UnsupportedBlockchain(BlockchainType),

    /// The underlying kit failed to start.
    #[error("failed to construct adapter for {source_id}: {reason}")]
    Construction { source_id: String, reason: String },
}

impl AdapterError {
    pub fn unsupported_account(source: &TransactionSource, kind: &AdapterKind) -> Self {
        Self::UnsupportedAccount {
            account: source.account.name.clone(),
            kind: kind.clone(),
        }
    }

    pub fn construction(source: &TransactionSource, reason: impl Into<String>) -> Self {
        Self::Construction {
            source_id: source.to_string(),
            reason: reason.into(),
        }
    }
}
