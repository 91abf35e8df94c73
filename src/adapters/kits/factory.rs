//! In-memory adapter factory.
//!
//! Plays the role of the per-chain kit managers: builds one adapter per
//! source and kind, refuses chains outside the requested family and
//! accounts whose key material can't serve the kind, and fails
//! construction for chains configured as disabled.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use tracing::{debug, info};

use super::transactions::InMemoryTransactionsAdapter;
use crate::domain::{AdapterError, AdapterKind, BlockchainType, TransactionSource};
use crate::ports::{AdapterFactory, AdapterHandle};

pub struct InMemoryAdapterFactory {
    disabled: HashSet<BlockchainType>,
    linked: RwLock<HashMap<TransactionSource, Arc<InMemoryTransactionsAdapter>>>,
    created_total: AtomicU64,
    unlinked_total: AtomicU64,
}

impl InMemoryAdapterFactory {
    pub fn new(disabled_chains: impl IntoIterator<Item = BlockchainType>) -> Self {
        Self {
            disabled: disabled_chains.into_iter().collect(),
            linked: RwLock::new(HashMap::new()),
            created_total: AtomicU64::new(0),
            unlinked_total: AtomicU64::new(0),
        }
    }

    /// Adapter currently linked for `source`.
    pub fn linked(&self, source: &TransactionSource) -> Option<Arc<InMemoryTransactionsAdapter>> {
        self.linked.read().get(source).cloned()
    }

    pub fn linked_count(&self) -> usize {
        self.linked.read().len()
    }

    pub fn created_total(&self) -> u64 {
        self.created_total.load(Ordering::Relaxed)
    }

    pub fn unlinked_total(&self) -> u64 {
        self.unlinked_total.load(Ordering::Relaxed)
    }
}

impl Default for InMemoryAdapterFactory {
    fn default() -> Self {
        Self::new([])
    }
}

impl AdapterFactory for InMemoryAdapterFactory {
    fn transactions_adapter(
        &self,
        source: &TransactionSource,
        kind: &AdapterKind,
    ) -> Result<AdapterHandle, AdapterError> {
        if self.disabled.contains(&source.blockchain.kind) {
            return Err(AdapterError::construction(source, "kit disabled by configuration"));
        }

        // A kit only serves the chains of its own family
        if source.blockchain.kind.transactions_kind().as_ref() != Some(kind) {
            return Err(AdapterError::UnsupportedBlockchain(
                source.blockchain.kind.clone(),
            ));
        }

        if !source.account.kind.supports(kind) {
            return Err(AdapterError::unsupported_account(source, kind));
        }

        let adapter = Arc::new(InMemoryTransactionsAdapter::new(
            source.clone(),
            Some(kind.clone()),
        ));
        self.linked.write().insert(source.clone(), Arc::clone(&adapter));
        self.created_total.fetch_add(1, Ordering::Relaxed);

        info!(source = %source, kind = %kind, "Kit adapter linked");
        Ok(adapter)
    }

    fn unlink(&self, source: &TransactionSource) {
        self.unlinked_total.fetch_add(1, Ordering::Relaxed);

        if self.linked.write().remove(source).is_some() {
            info!(source = %source, "Kit adapter unlinked");
        } else {
            // Wallet-owned adapters were never linked here
            debug!(source = %source, "Unlink for source without kit adapter");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Account, AccountType, Blockchain, Token, TokenType, Wallet};
    use alloy::primitives::Address;

    fn source(chain: BlockchainType, account: AccountType) -> TransactionSource {
        Wallet::new(
            Token {
                blockchain: Blockchain::new(chain.clone(), chain.to_string()),
                kind: TokenType::Native,
                code: "X".into(),
                decimals: 18,
            },
            Account::new("acc", account),
        )
        .transaction_source()
    }

    #[test]
    fn test_link_and_unlink() {
        let factory = InMemoryAdapterFactory::default();
        let src = source(BlockchainType::Solana, AccountType::Mnemonic);

        let adapter = factory
            .transactions_adapter(&src, &AdapterKind::Solana)
            .unwrap();
        assert_eq!(adapter.source(), &src);
        assert_eq!(factory.linked_count(), 1);
        assert_eq!(
            factory.linked(&src).unwrap().kind(),
            Some(&AdapterKind::Solana)
        );

        factory.unlink(&src);
        assert_eq!(factory.linked_count(), 0);
        assert_eq!(factory.created_total(), 1);
        assert_eq!(factory.unlinked_total(), 1);
    }

    #[test]
    fn test_disabled_chain_fails_construction() {
        let factory = InMemoryAdapterFactory::new([BlockchainType::Tron]);
        let src = source(BlockchainType::Tron, AccountType::Mnemonic);

        let err = factory
            .transactions_adapter(&src, &AdapterKind::Tron)
            .err()
            .unwrap();
        assert!(matches!(err, AdapterError::Construction { .. }));
        assert_eq!(factory.linked_count(), 0);
    }

    #[test]
    fn test_kind_for_other_chain_is_unsupported_blockchain() {
        let factory = InMemoryAdapterFactory::default();
        let btc = source(BlockchainType::Bitcoin, AccountType::Mnemonic);
        let poly = source(BlockchainType::Polygon, AccountType::Mnemonic);

        let err = factory
            .transactions_adapter(&btc, &AdapterKind::Solana)
            .err()
            .unwrap();
        assert_eq!(err, AdapterError::UnsupportedBlockchain(BlockchainType::Bitcoin));

        let err = factory
            .transactions_adapter(&poly, &AdapterKind::Evm(BlockchainType::Ethereum))
            .err()
            .unwrap();
        assert_eq!(err, AdapterError::UnsupportedBlockchain(BlockchainType::Polygon));
        assert_eq!(factory.created_total(), 0);
    }

    #[test]
    fn test_watch_account_rejected_for_other_family() {
        let factory = InMemoryAdapterFactory::default();
        let src = source(
            BlockchainType::Tron,
            AccountType::EvmAddress(Address::repeat_byte(0x42)),
        );

        let err = factory
            .transactions_adapter(&src, &AdapterKind::Tron)
            .err()
            .unwrap();
        assert!(matches!(err, AdapterError::UnsupportedAccount { .. }));
    }
}
