//! Transaction records as reported by chain adapters.

use alloy::primitives::Address;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A transaction in an adapter's history or pending list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransactionRecord {
    /// EIP-20 `approve(spender, value)`. A zero value is a revoke.
    Approve {
        hash: String,
        spender: Address,
        /// Allowance the transaction sets, in token units.
        value: Decimal,
        timestamp: DateTime<Utc>,
    },
    /// Anything else (transfers, swaps, contract calls).
    Other {
        hash: String,
        timestamp: DateTime<Utc>,
    },
}

impl TransactionRecord {
    pub fn hash(&self) -> &str {
        match self {
            Self::Approve { hash, .. } | Self::Other { hash, .. } => hash,
        }
    }

    /// Target allowance for approve records.
    pub const fn approve_value(&self) -> Option<Decimal> {
        match self {
            Self::Approve { value, .. } => Some(*value),
            Self::Other { .. } => None,
        }
    }
}
