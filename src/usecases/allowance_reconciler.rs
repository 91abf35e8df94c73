//! Allowance Reconciler - Pending Approve/Revoke Tracking
//!
//! Remembers the target of the most recent locally pending approve (or
//! revoke) for the tracked token and compares it against the on-chain
//! allowance. Subscribers are notified only when the derived phase
//! actually changes.

use std::sync::Arc;

use parking_lot::Mutex;
use rust_decimal::Decimal;
use tokio::sync::broadcast;
use tracing::{debug, info, instrument};

use crate::domain::{ApprovalPhase, Token, TransactionRecord, reconcile};
use crate::ports::{AllowanceSource, PendingTransactionSource};

#[derive(Debug, Default)]
struct Tracked {
    token: Option<Token>,
    pending_target: Option<Decimal>,
    phase: ApprovalPhase,
}

/// Drives the approve/revoke UI state for one token at a time.
pub struct AllowanceReconciler<P: PendingTransactionSource, A: AllowanceSource> {
    pending: Arc<P>,
    allowance: Arc<A>,
    tracked: Mutex<Tracked>,
    phase_tx: broadcast::Sender<ApprovalPhase>,
}

impl<P: PendingTransactionSource, A: AllowanceSource> AllowanceReconciler<P, A> {
    pub fn new(pending: Arc<P>, allowance: Arc<A>, phase_capacity: usize) -> Self {
        let (phase_tx, _) = broadcast::channel(phase_capacity.max(1));
        Self {
            pending,
            allowance,
            tracked: Mutex::new(Tracked::default()),
            phase_tx,
        }
    }

    pub fn phase(&self) -> ApprovalPhase {
        self.tracked.lock().phase
    }

    pub fn pending_target(&self) -> Option<Decimal> {
        self.tracked.lock().pending_target
    }

    /// Receives each new phase, never the same phase twice in a row.
    pub fn subscribe(&self) -> broadcast::Receiver<ApprovalPhase> {
        self.phase_tx.subscribe()
    }

    /// Switch the tracked token.
    ///
    /// Forgets the previous pending target and takes the latest approve
    /// from the new token's pending transactions, then reconciles once.
    /// `None` stops tracking.
    pub fn set_token(&self, token: Option<Token>) {
        let latest = token.as_ref().and_then(|t| self.latest_approve(t));

        let mut tracked = self.tracked.lock();
        debug!(token = ?token.as_ref().map(|t| &t.code), "Tracking token");
        tracked.token = token;
        tracked.pending_target = latest;
        self.sync(&mut tracked);
    }

    /// Pick up the latest approve among the token's pending transactions.
    ///
    /// Does nothing to the pending target when no token is tracked, the
    /// token has no adapter, or no approve is pending.
    pub fn sync_pending_from_adapter(&self) {
        let Some(token) = self.tracked.lock().token.clone() else {
            return;
        };

        let latest = self.latest_approve(&token);

        let mut tracked = self.tracked.lock();
        // Token switched while we were reading
        if tracked.token.as_ref() != Some(&token) {
            return;
        }
        if let Some(target) = latest {
            tracked.pending_target = Some(target);
        }
        self.sync(&mut tracked);
    }

    /// Re-run reconciliation after the allowance source changed.
    pub fn on_allowance_changed(&self) {
        let mut tracked = self.tracked.lock();
        self.sync(&mut tracked);
    }

    /// Follow allowance changes until shutdown.
    #[instrument(skip(self, shutdown_rx))]
    pub async fn run(&self, mut shutdown_rx: broadcast::Receiver<()>) -> anyhow::Result<()> {
        let mut allowance_rx = self.allowance.subscribe();
        self.on_allowance_changed();

        loop {
            tokio::select! {
                biased;
                _ = shutdown_rx.recv() => {
                    info!("Allowance reconciler shutting down");
                    return Ok(());
                }
                changed = allowance_rx.changed() => {
                    if changed.is_err() {
                        info!("Allowance source closed");
                        return Ok(());
                    }
                    self.on_allowance_changed();
                }
            }
        }
    }

    /// Target of the last approve record, read outside the state lock.
    fn latest_approve(&self, token: &Token) -> Option<Decimal> {
        self.pending
            .pending_transactions(token)?
            .iter()
            .filter_map(TransactionRecord::approve_value)
            .last()
    }

    fn sync(&self, tracked: &mut Tracked) {
        let phase = reconcile(tracked.pending_target, self.allowance.state());
        if phase == tracked.phase {
            return;
        }

        debug!(from = %tracked.phase, to = %phase, "Approval phase changed");
        tracked.phase = phase;
        let _ = self.phase_tx.send(phase);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AllowanceState, Blockchain, BlockchainType, TokenType};
    use alloy::primitives::Address;
    use chrono::Utc;
    use parking_lot::RwLock;
    use rust_decimal_macros::dec;
    use tokio::sync::watch;

    struct Allowance {
        tx: watch::Sender<AllowanceState>,
    }

    impl Allowance {
        fn new(state: AllowanceState) -> Self {
            Self {
                tx: watch::channel(state).0,
            }
        }

        fn set(&self, state: AllowanceState) {
            self.tx.send_replace(state);
        }
    }

    impl AllowanceSource for Allowance {
        fn state(&self) -> AllowanceState {
            *self.tx.borrow()
        }

        fn subscribe(&self) -> watch::Receiver<AllowanceState> {
            self.tx.subscribe()
        }
    }

    #[derive(Default)]
    struct Pending {
        records: RwLock<Option<Vec<TransactionRecord>>>,
    }

    impl Pending {
        fn set(&self, records: Option<Vec<TransactionRecord>>) {
            *self.records.write() = records;
        }
    }

    impl PendingTransactionSource for Pending {
        fn pending_transactions(&self, _token: &Token) -> Option<Vec<TransactionRecord>> {
            self.records.read().clone()
        }
    }

    fn usdt() -> Token {
        Token {
            blockchain: Blockchain::new(BlockchainType::Ethereum, "Ethereum"),
            kind: TokenType::Eip20 {
                address: Address::repeat_byte(0xdd),
            },
            code: "USDT".into(),
            decimals: 6,
        }
    }

    fn approve(value: Decimal) -> TransactionRecord {
        TransactionRecord::Approve {
            hash: format!("0x{value}"),
            spender: Address::repeat_byte(0x01),
            value,
            timestamp: Utc::now(),
        }
    }

    fn other() -> TransactionRecord {
        TransactionRecord::Other {
            hash: "0xff".into(),
            timestamp: Utc::now(),
        }
    }

    fn setup(
        allowance: AllowanceState,
        pending: Option<Vec<TransactionRecord>>,
    ) -> (
        AllowanceReconciler<Pending, Allowance>,
        Arc<Pending>,
        Arc<Allowance>,
    ) {
        let pending_src = Arc::new(Pending::default());
        pending_src.set(pending);
        let allowance_src = Arc::new(Allowance::new(allowance));
        let reconciler =
            AllowanceReconciler::new(Arc::clone(&pending_src), Arc::clone(&allowance_src), 16);
        (reconciler, pending_src, allowance_src)
    }

    #[test]
    fn test_approving_then_approved() {
        let (r, _, allowance) = setup(
            AllowanceState::Ready(dec!(3)),
            Some(vec![approve(dec!(10))]),
        );
        r.set_token(Some(usdt()));
        assert_eq!(r.phase(), ApprovalPhase::Approving);

        allowance.set(AllowanceState::Ready(dec!(10)));
        r.on_allowance_changed();
        assert_eq!(r.phase(), ApprovalPhase::Approved);
    }

    #[test]
    fn test_revoking_then_revoked() {
        let (r, _, allowance) = setup(
            AllowanceState::Ready(dec!(5)),
            Some(vec![approve(dec!(0))]),
        );
        r.set_token(Some(usdt()));
        assert_eq!(r.phase(), ApprovalPhase::Revoking);

        allowance.set(AllowanceState::Ready(dec!(0)));
        r.on_allowance_changed();
        assert_eq!(r.phase(), ApprovalPhase::Revoked);
    }

    #[test]
    fn test_last_approve_wins() {
        let (r, _, _) = setup(
            AllowanceState::Ready(dec!(0)),
            Some(vec![approve(dec!(10)), other(), approve(dec!(0))]),
        );
        r.set_token(Some(usdt()));
        assert_eq!(r.pending_target(), Some(dec!(0)));
        assert_eq!(r.phase(), ApprovalPhase::Revoked);
    }

    #[test]
    fn test_no_approve_records_keeps_na() {
        let (r, _, _) = setup(AllowanceState::Ready(dec!(1)), Some(vec![other()]));
        r.set_token(Some(usdt()));
        assert_eq!(r.pending_target(), None);
        assert_eq!(r.phase(), ApprovalPhase::NA);
    }

    #[test]
    fn test_not_ready_allowance_is_na() {
        let (r, _, _) = setup(AllowanceState::NotReady, Some(vec![approve(dec!(10))]));
        r.set_token(Some(usdt()));
        assert_eq!(r.pending_target(), Some(dec!(10)));
        assert_eq!(r.phase(), ApprovalPhase::NA);
    }

    #[test]
    fn test_missing_adapter_is_noop() {
        let (r, _, _) = setup(AllowanceState::Ready(dec!(10)), None);
        r.set_token(Some(usdt()));
        r.sync_pending_from_adapter();
        assert_eq!(r.pending_target(), None);
        assert_eq!(r.phase(), ApprovalPhase::NA);
    }

    #[test]
    fn test_sync_without_token_is_noop() {
        let (r, _, _) = setup(AllowanceState::Ready(dec!(10)), Some(vec![approve(dec!(10))]));
        r.sync_pending_from_adapter();
        assert_eq!(r.pending_target(), None);
        assert_eq!(r.phase(), ApprovalPhase::NA);
    }

    #[test]
    fn test_set_same_token_clears_pending_target() {
        let (r, pending, _) = setup(
            AllowanceState::Ready(dec!(10)),
            Some(vec![approve(dec!(10))]),
        );
        r.set_token(Some(usdt()));
        assert_eq!(r.phase(), ApprovalPhase::Approved);

        // Confirmed approve left the pending list
        pending.set(Some(Vec::new()));
        r.set_token(Some(usdt()));
        assert_eq!(r.pending_target(), None);
        assert_eq!(r.phase(), ApprovalPhase::NA);

        pending.set(Some(vec![approve(dec!(10))]));
        r.sync_pending_from_adapter();
        assert_eq!(r.phase(), ApprovalPhase::Approved);
    }

    #[test]
    fn test_clearing_token_resets_to_na() {
        let (r, _, _) = setup(
            AllowanceState::Ready(dec!(3)),
            Some(vec![approve(dec!(10))]),
        );
        r.set_token(Some(usdt()));
        r.set_token(None);
        assert_eq!(r.phase(), ApprovalPhase::NA);
    }

    #[test]
    fn test_phase_changed_is_deduplicated() {
        let (r, _, allowance) = setup(
            AllowanceState::Ready(dec!(3)),
            Some(vec![approve(dec!(10))]),
        );
        let mut rx = r.subscribe();

        r.set_token(Some(usdt()));
        assert_eq!(rx.try_recv().unwrap(), ApprovalPhase::Approving);

        r.on_allowance_changed();
        r.sync_pending_from_adapter();
        allowance.set(AllowanceState::Ready(dec!(4)));
        r.on_allowance_changed();
        assert!(rx.try_recv().is_err());

        allowance.set(AllowanceState::Ready(dec!(10)));
        r.on_allowance_changed();
        assert_eq!(rx.try_recv().unwrap(), ApprovalPhase::Approved);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_reselecting_token_with_same_pending_is_silent() {
        let (r, _, _) = setup(
            AllowanceState::Ready(dec!(3)),
            Some(vec![approve(dec!(10))]),
        );
        r.set_token(Some(usdt()));
        assert_eq!(r.phase(), ApprovalPhase::Approving);

        let mut rx = r.subscribe();
        r.set_token(Some(usdt()));

        assert_eq!(r.phase(), ApprovalPhase::Approving);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_switching_token_emits_only_final_phase() {
        let (r, pending, _) = setup(
            AllowanceState::Ready(dec!(3)),
            Some(vec![approve(dec!(10))]),
        );
        r.set_token(Some(usdt()));
        let mut rx = r.subscribe();

        pending.set(Some(vec![approve(dec!(0))]));
        r.set_token(Some(usdt()));
        assert_eq!(rx.try_recv().unwrap(), ApprovalPhase::Revoking);
        assert!(rx.try_recv().is_err());

        r.set_token(None);
        assert_eq!(rx.try_recv().unwrap(), ApprovalPhase::NA);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_run_follows_allowance_changes() {
        let (r, _, allowance) = setup(
            AllowanceState::Ready(dec!(0)),
            Some(vec![approve(dec!(10))]),
        );
        let r = Arc::new(r);
        r.set_token(Some(usdt()));
        let mut phases = r.subscribe();

        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let runner = Arc::clone(&r);
        let handle = tokio::spawn(async move { runner.run(shutdown_rx).await });

        allowance.set(AllowanceState::Ready(dec!(10)));
        let phase = tokio::time::timeout(std::time::Duration::from_secs(1), phases.recv())
            .await
            .expect("phase change not delivered")
            .unwrap();
        assert_eq!(phase, ApprovalPhase::Approved);

        shutdown_tx.send(()).unwrap();
        handle.await.unwrap().unwrap();
    }
}
