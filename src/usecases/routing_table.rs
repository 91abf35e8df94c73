//! Adapter Routing Table - Wallet Set to Transactions Adapters
//!
//! Keeps exactly one transactions adapter per distinct `TransactionSource`
//! among the active wallets:
//! - Sources present before and after a change keep their adapter
//! - New sources get an adapter from the factory (or the wallet's own)
//! - Sources no longer referenced are unlinked exactly once
//!
//! Each rebuild is assembled in a fresh map and published with a single
//! pointer swap, so `get_adapter` never sees a half-built table.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use tokio::sync::broadcast;
use tracing::{debug, info, instrument, warn};

use crate::domain::{AdapterError, TransactionSource};
use crate::ports::{AdapterFactory, AdapterHandle, RawAdapter, WalletSet, WalletSetSource};

type Table = HashMap<TransactionSource, AdapterHandle>;

/// Outcome of one rebuild.
#[derive(Debug, Clone)]
pub struct RebuildReport {
    /// Adapters carried over from the previous table.
    pub reused: usize,
    /// Adapters constructed by this rebuild.
    pub created: usize,
    /// Adapters unlinked because their source disappeared.
    pub released: usize,
    /// Wallets skipped because an earlier wallet had the same source.
    pub duplicates: usize,
    /// Sources with neither a dedicated family nor a capable raw adapter.
    pub unsupported: usize,
    /// Size of the published table.
    pub registered: usize,
    /// Sources whose construction failed; absent from the table.
    pub failures: Vec<(TransactionSource, AdapterError)>,
    pub completed_at: DateTime<Utc>,
}

impl RebuildReport {
    fn new() -> Self {
        Self {
            reused: 0,
            created: 0,
            released: 0,
            duplicates: 0,
            unsupported: 0,
            registered: 0,
            failures: Vec::new(),
            completed_at: Utc::now(),
        }
    }
}

/// Owns every transactions adapter, keyed by source.
pub struct AdapterRoutingTable<F: AdapterFactory> {
    factory: Arc<F>,
    /// Published table; replaced wholesale on every rebuild.
    table: RwLock<Arc<Table>>,
    /// Serializes rebuilds and disposal.
    writer: Mutex<()>,
    ready_tx: broadcast::Sender<()>,
    report_tx: broadcast::Sender<RebuildReport>,
}

impl<F: AdapterFactory> AdapterRoutingTable<F> {
    /// Create an empty table.
    ///
    /// `ready_capacity` bounds how many unread ready signals (and
    /// reports) a slow subscriber may fall behind by.
    pub fn new(factory: Arc<F>, ready_capacity: usize) -> Self {
        let (ready_tx, _) = broadcast::channel(ready_capacity.max(1));
        let (report_tx, _) = broadcast::channel(ready_capacity.max(1));
        Self {
            factory,
            table: RwLock::new(Arc::new(HashMap::new())),
            writer: Mutex::new(()),
            ready_tx,
            report_tx,
        }
    }

    /// Current adapter for `source`.
    pub fn get_adapter(&self, source: &TransactionSource) -> Option<AdapterHandle> {
        self.table.read().get(source).cloned()
    }

    /// Fires once after each rebuild has been published.
    pub fn subscribe_ready(&self) -> broadcast::Receiver<()> {
        self.ready_tx.subscribe()
    }

    pub fn sources(&self) -> Vec<TransactionSource> {
        self.table.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.table.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.read().is_empty()
    }

    /// Receives the report of every rebuild, in rebuild order.
    pub fn subscribe_reports(&self) -> broadcast::Receiver<RebuildReport> {
        self.report_tx.subscribe()
    }

    /// Rebuild the table from the current wallet set.
    ///
    /// Never fails as a whole: a source whose adapter can't be built is
    /// left out and listed in the report.
    pub fn on_wallet_set_changed(&self, wallets: &WalletSet) -> RebuildReport {
        let _writer = self.writer.lock();

        let mut previous: Table = self.table.read().as_ref().clone();
        let mut rebuilt: Table = HashMap::with_capacity(wallets.len());
        let mut report = RebuildReport::new();

        for (wallet, raw) in wallets.iter() {
            let source = wallet.transaction_source();

            if rebuilt.contains_key(&source) {
                report.duplicates += 1;
                continue;
            }

            if let Some(adapter) = previous.remove(&source) {
                rebuilt.insert(source, adapter);
                report.reused += 1;
                continue;
            }

            match self.build(&source, raw.as_ref()) {
                Ok(Some(adapter)) => {
                    debug!(source = %source, "Transactions adapter created");
                    rebuilt.insert(source, adapter);
                    report.created += 1;
                }
                Ok(None) => {
                    debug!(source = %source, "No transactions adapter for source");
                    report.unsupported += 1;
                }
                Err(e) => {
                    warn!(source = %source, error = %e, "Adapter construction failed");
                    report.failures.push((source, e));
                }
            }
        }

        report.registered = rebuilt.len();
        *self.table.write() = Arc::new(rebuilt);

        // Leftovers are unreachable through get_adapter from here on
        for source in previous.keys() {
            self.factory.unlink(source);
            report.released += 1;
        }
        report.completed_at = Utc::now();

        info!(
            registered = report.registered,
            reused = report.reused,
            created = report.created,
            released = report.released,
            failed = report.failures.len(),
            "Transaction adapters ready"
        );

        // No subscribers is fine
        let _ = self.report_tx.send(report.clone());
        let _ = self.ready_tx.send(());

        report
    }

    /// Release every adapter and empty the table.
    pub fn dispose(&self) {
        let _writer = self.writer.lock();

        let owned = std::mem::take(&mut *self.table.write());
        if owned.is_empty() {
            return;
        }

        for source in owned.keys() {
            self.factory.unlink(source);
        }

        info!(released = owned.len(), "Routing table disposed");
    }

    /// Consume wallet-set notifications until shutdown, then dispose.
    ///
    /// Each notification is processed to completion before the next is
    /// read. A lagged receiver resyncs from the source's current set,
    /// since every notification is a full snapshot anyway.
    #[instrument(skip(self, wallets, shutdown_rx))]
    pub async fn run<W: WalletSetSource + ?Sized>(
        &self,
        wallets: &W,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) -> anyhow::Result<()> {
        let mut set_rx = wallets.subscribe();
        self.on_wallet_set_changed(&wallets.current());

        loop {
            tokio::select! {
                biased;
                _ = shutdown_rx.recv() => {
                    info!("Routing table shutting down");
                    break;
                }
                set = set_rx.recv() => {
                    match set {
                        Ok(set) => {
                            self.on_wallet_set_changed(&set);
                        }
                        Err(broadcast::error::RecvError::Lagged(n)) => {
                            warn!(dropped = n, "Wallet set stream lagged, resyncing");
                            self.on_wallet_set_changed(&wallets.current());
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            info!("Wallet set stream closed");
                            break;
                        }
                    }
                }
            }
        }

        self.dispose();
        Ok(())
    }

    fn build(
        &self,
        source: &TransactionSource,
        raw: &dyn RawAdapter,
    ) -> Result<Option<AdapterHandle>, AdapterError> {
        match source.blockchain.kind.transactions_kind() {
            Some(kind) => self.factory.transactions_adapter(source, &kind).map(Some),
            None => Ok(raw.transactions_adapter()),
        }
    }
}

impl<F: AdapterFactory> Drop for AdapterRoutingTable<F> {
    fn drop(&mut self) {
        self.dispose();
    }
}
