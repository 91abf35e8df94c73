//! In-memory transactions adapter and wallet balance adapter.
//!
//! Stand-ins for the native chain kits: history is whatever was pushed,
//! newest last in storage and newest first when listed.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::domain::{AdapterKind, TransactionRecord, TransactionSource};
use crate::ports::{AdapterHandle, RawAdapter, TransactionsAdapter};

/// Transaction history for one source, held in memory.
pub struct InMemoryTransactionsAdapter {
    source: TransactionSource,
    /// `None` for adapters owned by a wallet rather than a kit family.
    kind: Option<AdapterKind>,
    records: RwLock<Vec<TransactionRecord>>,
    /// Zero means "no blocks synced".
    block_height: AtomicU64,
}

impl InMemoryTransactionsAdapter {
    pub fn new(source: TransactionSource, kind: Option<AdapterKind>) -> Self {
        Self {
            source,
            kind,
            records: RwLock::new(Vec::new()),
            block_height: AtomicU64::new(0),
        }
    }

    pub const fn kind(&self) -> Option<&AdapterKind> {
        self.kind.as_ref()
    }

    /// Append a record as the newest one.
    pub fn push(&self, record: TransactionRecord) {
        self.records.write().push(record);
    }

    pub fn set_block_height(&self, height: u64) {
        self.block_height.store(height, Ordering::Relaxed);
    }
}

#[async_trait]
impl TransactionsAdapter for InMemoryTransactionsAdapter {
    fn source(&self) -> &TransactionSource {
        &self.source
    }

    async fn transactions(
        &self,
        from_hash: Option<&str>,
        limit: usize,
    ) -> anyhow::Result<Vec<TransactionRecord>> {
        let records = self.records.read();
        let newest_first = records.iter().rev();

        let page = match from_hash {
            Some(hash) => {
                anyhow::ensure!(
                    records.iter().any(|r| r.hash() == hash),
                    "Unknown transaction {hash} for {}",
                    self.source
                );
                newest_first
                    .skip_while(|r| r.hash() != hash)
                    .skip(1)
                    .take(limit)
                    .cloned()
                    .collect()
            }
            None => newest_first.take(limit).cloned().collect(),
        };

        Ok(page)
    }

    fn last_block_height(&self) -> Option<u64> {
        match self.block_height.load(Ordering::Relaxed) {
            0 => None,
            h => Some(h),
        }
    }
}

/// Balance adapter a wallet owns.
///
/// Chains without a dedicated kit family keep their history here, so
/// the routing table can fall back to it.
#[derive(Default)]
pub struct BalanceAdapter {
    history: Option<Arc<InMemoryTransactionsAdapter>>,
}

impl BalanceAdapter {
    /// Balance only; not transactions-capable.
    pub fn new() -> Self {
        Self::default()
    }

    /// Balance plus its own transaction history for `source`.
    pub fn with_history(source: TransactionSource) -> Self {
        Self {
            history: Some(Arc::new(InMemoryTransactionsAdapter::new(source, None))),
        }
    }
}

impl RawAdapter for BalanceAdapter {
    fn transactions_adapter(&self) -> Option<AdapterHandle> {
        self.history
            .as_ref()
            .map(|h| Arc::clone(h) as AdapterHandle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        Account, AccountType, Blockchain, BlockchainType, Token, TokenType, Wallet,
    };
    use chrono::Utc;

    fn source() -> TransactionSource {
        Wallet::new(
            Token {
                blockchain: Blockchain::new(BlockchainType::Bitcoin, "Bitcoin"),
                kind: TokenType::Native,
                code: "BTC".into(),
                decimals: 8,
            },
            Account::new("main", AccountType::Mnemonic),
        )
        .transaction_source()
    }

    fn other(hash: &str) -> TransactionRecord {
        TransactionRecord::Other {
            hash: hash.into(),
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_pages_newest_first() {
        let adapter = InMemoryTransactionsAdapter::new(source(), None);
        for hash in ["a", "b", "c", "d"] {
            adapter.push(other(hash));
        }

        let first = adapter.transactions(None, 2).await.unwrap();
        let hashes: Vec<_> = first.iter().map(TransactionRecord::hash).collect();
        assert_eq!(hashes, vec!["d", "c"]);

        let next = adapter.transactions(Some("c"), 5).await.unwrap();
        let hashes: Vec<_> = next.iter().map(TransactionRecord::hash).collect();
        assert_eq!(hashes, vec!["b", "a"]);
    }

    #[tokio::test]
    async fn test_unknown_cursor_is_error() {
        let adapter = InMemoryTransactionsAdapter::new(source(), None);
        assert!(adapter.transactions(Some("zz"), 5).await.is_err());
    }

    #[test]
    fn test_block_height() {
        let adapter = InMemoryTransactionsAdapter::new(source(), None);
        assert_eq!(adapter.last_block_height(), None);
        adapter.set_block_height(840_000);
        assert_eq!(adapter.last_block_height(), Some(840_000));
    }

    #[test]
    fn test_balance_adapter_capability() {
        assert!(BalanceAdapter::new().transactions_adapter().is_none());

        let src = source();
        let capable = BalanceAdapter::with_history(src.clone());
        let history = capable.transactions_adapter().unwrap();
        assert_eq!(history.source(), &src);
    }
}
