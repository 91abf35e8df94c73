//! Wallet Set Port - Active Wallets and Their Adapters
//!
//! The wallet manager publishes the complete set of active wallets,
//! each paired with its raw adapter, whenever that set changes.

use std::sync::Arc;

use tokio::sync::broadcast;

use super::adapters::RawAdapter;
use crate::domain::Wallet;

/// Insertion-ordered mapping of wallet to raw adapter.
///
/// Order is significant: when two wallets share a transaction source
/// the earlier one wins.
#[derive(Clone, Default)]
pub struct WalletSet {
  entries: Vec<(Wallet, Arc<dyn RawAdapter>)>,
}

impl WalletSet {
  pub fn new() -> Self {
    Self::default()
  }

  /// Add a wallet, or replace the adapter of an existing one in place.
  pub fn insert(&mut self, wallet: Wallet, adapter: Arc<dyn RawAdapter>) {
    match self.entries.iter_mut().find(|(w, _)| *w == wallet) {
      Some(entry) => entry.1 = adapter,
      None => self.entries.push((wallet, adapter)),
    }
  }

  /// Remove a wallet, returning its adapter.
  pub fn remove(&mut self, wallet: &Wallet) -> Option<Arc<dyn RawAdapter>> {
    let idx = self.entries.iter().position(|(w, _)| w == wallet)?;
    Some(self.entries.remove(idx).1)
  }

  pub fn iter(&self) -> impl Iterator<Item = (&Wallet, &Arc<dyn RawAdapter>)> {
    self.entries.iter().map(|(w, a)| (w, a))
  }

  pub fn wallets(&self) -> impl Iterator<Item = &Wallet> {
    self.entries.iter().map(|(w, _)| w)
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }
}

impl FromIterator<(Wallet, Arc<dyn RawAdapter>)> for WalletSet {
  fn from_iter<I: IntoIterator<Item = (Wallet, Arc<dyn RawAdapter>)>>(iter: I) -> Self {
    let mut set = Self::new();
    for (wallet, adapter) in iter {
      set.insert(wallet, adapter);
    }
    set
  }
}

impl std::fmt::Debug for WalletSet {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_list()
      .entries(self.entries.iter().map(|(w, _)| w.transaction_source().to_string()))
      .finish()
  }
}

/// Source of wallet-set notifications.
pub trait WalletSetSource: Send + Sync + 'static {
  /// The set as of now.
  fn current(&self) -> WalletSet;

  /// Every subsequent set, one complete snapshot per change.
  fn subscribe(&self) -> broadcast::Receiver<WalletSet>;
}
