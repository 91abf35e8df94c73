//! Adapter Ports - Transactions Adapters and Their Factory
//!
//! A transactions adapter lists the history of one `TransactionSource`.
//! The factory builds them per adapter family and tears them down when
//! the routing table lets go of a source.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{AdapterError, AdapterKind, TransactionRecord, TransactionSource};

/// Shared handle to a live transactions adapter.
///
/// Identity is `Arc::ptr_eq`: a reused adapter is the same allocation.
pub type AdapterHandle = Arc<dyn TransactionsAdapter>;

/// Capability to query transaction history for one source.
#[async_trait]
pub trait TransactionsAdapter: Send + Sync + 'static {
  /// The source this adapter was built for.
  fn source(&self) -> &TransactionSource;

  /// Page through history, newest first, starting after `from_hash`.
  async fn transactions(
    &self,
    from_hash: Option<&str>,
    limit: usize,
  ) -> anyhow::Result<Vec<TransactionRecord>>;

  /// Last synced block, if the chain has blocks.
  fn last_block_height(&self) -> Option<u64>;
}

/// Balance/sync adapter a wallet already owns.
///
/// Opaque to the routing table apart from the optional transactions
/// capability, which is used for chains without a dedicated family.
pub trait RawAdapter: Send + Sync + 'static {
  /// This adapter as a transactions adapter, when it is one.
  fn transactions_adapter(&self) -> Option<AdapterHandle> {
    None
  }
}

/// Builds and releases chain-family transactions adapters.
pub trait AdapterFactory: Send + Sync + 'static {
  /// Construct an adapter of `kind` for `source`.
  ///
  /// # Errors
  /// `UnsupportedAccount` when the account can't serve `kind`, or
  /// `Construction` when the underlying kit fails to start.
  fn transactions_adapter(
    &self,
    source: &TransactionSource,
    kind: &AdapterKind,
  ) -> Result<AdapterHandle, AdapterError>;

  /// Release whatever was built for `source`.
  fn unlink(&self, source: &TransactionSource);
}
