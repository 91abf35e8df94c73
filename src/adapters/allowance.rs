//! Allowance Adapters - Watch-backed Allowance, In-memory Pending List
//!
//! `WatchAllowanceSource` holds the last allowance delivered by whatever
//! polls the chain. `InMemoryPendingTransactions` holds per-token pending
//! lists; a token with no entry has no adapter.

use std::collections::HashMap;

use parking_lot::RwLock;
use tokio::sync::watch;
use tracing::debug;

use crate::domain::{AllowanceState, Token, TransactionRecord};
use crate::ports::{AllowanceSource, PendingTransactionSource};

pub struct WatchAllowanceSource {
    state_tx: watch::Sender<AllowanceState>,
}

impl WatchAllowanceSource {
    pub fn new() -> Self {
        let (state_tx, _) = watch::channel(AllowanceState::NotReady);
        Self { state_tx }
    }

    /// Deliver a new allowance; subscribers are woken only on change.
    pub fn set(&self, state: AllowanceState) {
        self.state_tx.send_if_modified(|current| {
            if *current == state {
                return false;
            }
            debug!(?state, "Allowance updated");
            *current = state;
            true
        });
    }
}

impl Default for WatchAllowanceSource {
    fn default() -> Self {
        Self::new()
    }
}

impl AllowanceSource for WatchAllowanceSource {
    fn state(&self) -> AllowanceState {
        *self.state_tx.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<AllowanceState> {
        self.state_tx.subscribe()
    }
}

#[derive(Default)]
pub struct InMemoryPendingTransactions {
    by_token: RwLock<HashMap<Token, Vec<TransactionRecord>>>,
}

impl InMemoryPendingTransactions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter for `token` with an empty pending list.
    pub fn track(&self, token: Token) {
        self.by_token.write().entry(token).or_default();
    }

    /// Drop the adapter for `token`.
    pub fn forget(&self, token: &Token) {
        self.by_token.write().remove(token);
    }

    /// Add a pending record, registering the token if needed.
    pub fn push(&self, token: Token, record: TransactionRecord) {
        self.by_token.write().entry(token).or_default().push(record);
    }

    /// Remove a record once it is confirmed. Returns whether it was pending.
    pub fn confirm(&self, token: &Token, hash: &str) -> bool {
        let mut by_token = self.by_token.write();
        let Some(records) = by_token.get_mut(token) else {
            return false;
        };
        let before = records.len();
        records.retain(|r| r.hash() != hash);
        records.len() != before
    }
}

impl PendingTransactionSource for InMemoryPendingTransactions {
    fn pending_transactions(&self, token: &Token) -> Option<Vec<TransactionRecord>> {
        self.by_token.read().get(token).cloned()
    }
}
