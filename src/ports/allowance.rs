//! Allowance Ports - On-chain Allowance and Pending Transactions
//!
//! Both are read synchronously by the reconciler; fetching and retrying
//! belong to the implementations.

use tokio::sync::watch;

use crate::domain::{AllowanceState, Token, TransactionRecord};

/// Current allowance for one token/spender/owner triple.
///
/// An unavailable source reports `NotReady`, never an error.
pub trait AllowanceSource: Send + Sync + 'static {
  fn state(&self) -> AllowanceState;

  /// Notified on every state change.
  fn subscribe(&self) -> watch::Receiver<AllowanceState>;
}

/// Not-yet-confirmed transactions known to a token's adapter.
pub trait PendingTransactionSource: Send + Sync + 'static {
  /// `None` when no adapter exists for `token`.
  fn pending_transactions(&self, token: &Token) -> Option<Vec<TransactionRecord>>;
}
