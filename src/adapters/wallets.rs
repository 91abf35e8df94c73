//! Wallet Set Source - Config-backed Active Wallets
//!
//! Publishes the active wallet set on a broadcast channel. The binary
//! feeds it from config.toml at startup and on every hot reload.

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::broadcast;
use tracing::debug;

use super::kits::BalanceAdapter;
use crate::domain::Wallet;
use crate::ports::{RawAdapter, WalletSet, WalletSetSource};

pub struct ConfigWalletSource {
    current: RwLock<WalletSet>,
    set_tx: broadcast::Sender<WalletSet>,
}

impl ConfigWalletSource {
    pub fn new(capacity: usize) -> Self {
        let (set_tx, _) = broadcast::channel(capacity.max(1));
        Self {
            current: RwLock::new(WalletSet::new()),
            set_tx,
        }
    }

    /// Replace the active set and notify subscribers.
    pub fn publish(&self, set: WalletSet) {
        debug!(wallets = set.len(), "Publishing wallet set");
        *self.current.write() = set.clone();
        // No subscribers yet is fine; they start from `current()`
        let _ = self.set_tx.send(set);
    }

    /// Publish `wallets` in order, each with a fresh balance adapter.
    ///
    /// Chains without a kit family get a transactions-capable balance
    /// adapter so their history stays reachable.
    pub fn publish_wallets(&self, wallets: impl IntoIterator<Item = Wallet>) {
        self.publish(wallet_set(wallets));
    }
}

impl WalletSetSource for ConfigWalletSource {
    fn current(&self) -> WalletSet {
        self.current.read().clone()
    }

    fn subscribe(&self) -> broadcast::Receiver<WalletSet> {
        self.set_tx.subscribe()
    }
}

/// Pair each wallet with its balance adapter.
pub fn wallet_set(wallets: impl IntoIterator<Item = Wallet>) -> WalletSet {
    wallets
        .into_iter()
        .map(|wallet| {
            let adapter: Arc<dyn RawAdapter> =
                if wallet.token.blockchain.kind.transactions_kind().is_some() {
                    Arc::new(BalanceAdapter::new())
                } else {
                    Arc::new(BalanceAdapter::with_history(wallet.transaction_source()))
                };
            (wallet, adapter)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Account, AccountType, Blockchain, BlockchainType, Token, TokenType};

    fn wallet(chain: BlockchainType) -> Wallet {
        Wallet::new(
            Token {
                blockchain: Blockchain::new(chain.clone(), chain.to_string()),
                kind: TokenType::Native,
                code: chain.to_string(),
                decimals: 8,
            },
            Account::new("main", AccountType::Mnemonic),
        )
    }

    #[test]
    fn test_publish_updates_current_and_notifies() {
        let source = ConfigWalletSource::new(4);
        let mut rx = source.subscribe();

        source.publish_wallets([wallet(BlockchainType::Ethereum), wallet(BlockchainType::Bitcoin)]);

        assert_eq!(source.current().len(), 2);
        assert_eq!(rx.try_recv().unwrap().len(), 2);
    }

    #[test]
    fn test_fallback_chains_get_capable_adapters() {
        let set = wallet_set([wallet(BlockchainType::Ethereum), wallet(BlockchainType::Bitcoin)]);
        let capable: Vec<bool> = set
            .iter()
            .map(|(_, a)| a.transactions_adapter().is_some())
            .collect();
        assert_eq!(capable, vec![false, true]);
    }
}
