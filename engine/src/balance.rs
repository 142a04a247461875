use async_trait::async_trait;
use log::{debug, warn};
use mcw_core::balance::WalletWithBalance;
use mcw_core::coins::Coin;
use mcw_core::errors::WalletError;
use mcw_core::output::UnspentOutput;
use mcw_core::wallet::WalletBase;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;

/// Delay between polls after a successful fetch and after a failed one.
/// Errors retry sooner.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PollingIntervals {
    pub update: Duration,
    pub error: Duration,
}

impl PollingIntervals {
    /// Balance polling cadence: local nodes every 10s, remote every 10min.
    #[must_use]
    pub fn balance_for(coin: &Coin) -> Self {
        if coin.is_local {
            PollingIntervals {
                update: Duration::from_secs(10),
                error: Duration::from_secs(2),
            }
        } else {
            PollingIntervals {
                update: Duration::from_secs(600),
                error: Duration::from_secs(60),
            }
        }
    }

    /// Sync polling cadence.
    #[must_use]
    pub fn sync_for(coin: &Coin) -> Self {
        if coin.is_local {
            PollingIntervals {
                update: Duration::from_secs(2),
                error: Duration::from_secs(2),
            }
        } else {
            PollingIntervals {
                update: Duration::from_secs(120),
                error: Duration::from_secs(30),
            }
        }
    }
}

/// Data source a balance tracker polls. One implementation per coin
/// family; tests inject scripted sources.
#[async_trait]
pub trait BalanceSource: Send + Sync {
    /// Fresh balances for the given wallets, in the same order.
    async fn fetch_balances(
        &self,
        wallets: &[WalletBase],
    ) -> Result<Vec<WalletWithBalance>, WalletError>;

    /// Spendable output pool for the given addresses. Account-based
    /// sources return an empty pool.
    async fn fetch_outputs(&self, addresses: &[String]) -> Result<Vec<UnspentOutput>, WalletError>;
}

struct TrackerInner {
    source: Arc<dyn BalanceSource>,
    wallets: RwLock<Vec<WalletBase>>,
    intervals: PollingIntervals,
    refresh: Notify,
    wallets_tx: watch::Sender<Vec<WalletWithBalance>>,
    has_pending_tx: watch::Sender<bool>,
    first_full_update_tx: watch::Sender<bool>,
    had_error_tx: watch::Sender<bool>,
    refreshing_tx: watch::Sender<bool>,
    last_update_tx: watch::Sender<Option<SystemTime>>,
}

/// Polls a [`BalanceSource`], reconciles the response against the last
/// published snapshot and republishes only what materially changed.
///
/// The polling loop is a single spawned task that sleeps after each
/// completed fetch, so at most one fetch is ever in flight. A fetch error
/// keeps the last good snapshot and only raises the error flag and
/// shortens the retry delay.
pub struct BalanceTracker {
    inner: Arc<TrackerInner>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl BalanceTracker {
    /// Builds a tracker publishing zero balances for `wallets`. Polling
    /// does not begin until [`BalanceTracker::start`].
    #[must_use]
    pub fn new(
        source: Arc<dyn BalanceSource>,
        wallets: Vec<WalletBase>,
        intervals: PollingIntervals,
    ) -> Self {
        let initial: Vec<WalletWithBalance> =
            wallets.iter().map(WalletWithBalance::from_base).collect();
        BalanceTracker {
            inner: Arc::new(TrackerInner {
                source,
                wallets: RwLock::new(wallets),
                intervals,
                refresh: Notify::new(),
                wallets_tx: watch::channel(initial).0,
                has_pending_tx: watch::channel(false).0,
                first_full_update_tx: watch::channel(false).0,
                had_error_tx: watch::channel(false).0,
                refreshing_tx: watch::channel(false).0,
                last_update_tx: watch::channel(None).0,
            }),
            task: Mutex::new(None),
        }
    }

    /// Spawns the polling loop. Calling it again while running is a no-op.
    pub fn start(&self) {
        let mut guard = self.task.lock();
        if guard.is_some() {
            return;
        }
        let inner = self.inner.clone();
        *guard = Some(tokio::spawn(async move {
            loop {
                inner.refreshing_tx.send_replace(true);
                let ok = poll_once(&inner).await;
                inner.refreshing_tx.send_replace(false);
                let delay = if ok {
                    inner.intervals.update
                } else {
                    inner.intervals.error
                };
                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = inner.refresh.notified() => {}
                }
            }
        }));
    }

    /// Aborts the polling loop; an in-flight fetch is detached and its
    /// result discarded.
    pub fn dispose(&self) {
        if let Some(task) = self.task.lock().take() {
            task.abort();
        }
    }

    /// Short-circuits the current sleep so the next poll starts at once.
    pub fn refresh(&self) {
        self.inner.refresh.notify_one();
    }

    /// Replaces the tracked wallet set and polls again immediately.
    pub fn set_wallets(&self, wallets: Vec<WalletBase>) {
        *self.inner.wallets.write() = wallets;
        self.refresh();
    }

    /// Runs one fetch/reconcile cycle outside the loop. Used by the loop
    /// itself and by one-shot consumers that do not want polling.
    pub async fn poll_once(&self) -> bool {
        poll_once(&self.inner).await
    }

    /// Spendable outputs for the given addresses, via the tracker's source.
    pub async fn outputs(&self, addresses: &[String]) -> Result<Vec<UnspentOutput>, WalletError> {
        self.inner.source.fetch_outputs(addresses).await
    }

    pub fn subscribe_wallets(&self) -> watch::Receiver<Vec<WalletWithBalance>> {
        self.inner.wallets_tx.subscribe()
    }

    /// True while any tracked wallet has confirmed ≠ predicted balance.
    pub fn subscribe_has_pending(&self) -> watch::Receiver<bool> {
        self.inner.has_pending_tx.subscribe()
    }

    /// Latches to true after the first successful full update and never
    /// resets; distinguishes "genuinely zero" from "not yet loaded".
    pub fn subscribe_first_full_update(&self) -> watch::Receiver<bool> {
        self.inner.first_full_update_tx.subscribe()
    }

    pub fn subscribe_had_error(&self) -> watch::Receiver<bool> {
        self.inner.had_error_tx.subscribe()
    }

    pub fn subscribe_refreshing(&self) -> watch::Receiver<bool> {
        self.inner.refreshing_tx.subscribe()
    }

    pub fn subscribe_last_update(&self) -> watch::Receiver<Option<SystemTime>> {
        self.inner.last_update_tx.subscribe()
    }
}

impl Drop for BalanceTracker {
    fn drop(&mut self) {
        self.dispose();
    }
}

async fn poll_once(inner: &TrackerInner) -> bool {
    let wallets = inner.wallets.read().clone();
    match inner.source.fetch_balances(&wallets).await {
        Ok(fresh) => {
            let mut current = inner.wallets_tx.borrow().clone();
            if reconcile(&mut current, fresh) {
                debug!("balance snapshot changed, republishing");
                inner.wallets_tx.send_replace(current.clone());
            }
            let has_pending = current.iter().any(|w| w.balance.has_pending());
            set_flag(&inner.has_pending_tx, has_pending);
            set_flag(&inner.first_full_update_tx, true);
            set_flag(&inner.had_error_tx, false);
            inner.last_update_tx.send_replace(Some(SystemTime::now()));
            true
        }
        Err(e) => {
            warn!("balance fetch failed, keeping last snapshot: {e}");
            set_flag(&inner.had_error_tx, true);
            false
        }
    }
}

pub(crate) fn set_flag(tx: &watch::Sender<bool>, value: bool) {
    tx.send_if_modified(|current| {
        if *current == value {
            false
        } else {
            *current = value;
            true
        }
    });
}

/// Merges a fresh snapshot into the published one.
///
/// A changed wallet count or id sequence is structural and replaces the
/// whole list; otherwise balances are patched field by field so readers
/// holding unrelated wallets see no spurious updates. An address-count
/// change within one wallet replaces that wallet's address list only.
fn reconcile(published: &mut Vec<WalletWithBalance>, fresh: Vec<WalletWithBalance>) -> bool {
    let structural = published.len() != fresh.len()
        || published.iter().zip(&fresh).any(|(a, b)| a.id != b.id);
    if structural {
        *published = fresh;
        return true;
    }
    let mut changed = false;
    for (current, new) in published.iter_mut().zip(fresh) {
        if current.addresses.len() != new.addresses.len() {
            current.addresses = new.addresses;
            current.balance = new.balance;
            changed = true;
            continue;
        }
        if current.balance != new.balance {
            current.balance = new.balance;
            changed = true;
        }
        for (current_addr, new_addr) in current.addresses.iter_mut().zip(new.addresses) {
            if current_addr.address != new_addr.address {
                *current_addr = new_addr;
                changed = true;
            } else if current_addr.balance != new_addr.balance {
                current_addr.balance = new_addr.balance;
                changed = true;
            }
        }
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcw_core::balance::{AddressWithBalance, Balance};
    use mcw_core::wallet::{AddressBase, WalletType};
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn base_wallet(id: &str, addresses: &[&str]) -> WalletBase {
        WalletBase {
            id: id.to_string(),
            label: id.to_uppercase(),
            encrypted: false,
            is_hardware: false,
            wallet_type: WalletType::Deterministic,
            addresses: addresses
                .iter()
                .map(|a| AddressBase {
                    address: (*a).to_string(),
                    is_change: false,
                })
                .collect(),
        }
    }

    fn snapshot(id: &str, balances: &[(&str, u128)]) -> WalletWithBalance {
        let total: u128 = balances.iter().map(|(_, b)| b).sum();
        WalletWithBalance {
            id: id.to_string(),
            label: id.to_uppercase(),
            encrypted: false,
            is_hardware: false,
            wallet_type: WalletType::Deterministic,
            balance: Balance {
                confirmed: total,
                predicted: total,
                available: total,
            },
            addresses: balances
                .iter()
                .map(|(address, amount)| AddressWithBalance {
                    address: (*address).to_string(),
                    is_change: false,
                    balance: Balance {
                        confirmed: *amount,
                        predicted: *amount,
                        available: *amount,
                    },
                })
                .collect(),
        }
    }

    #[test]
    fn test_reconcile_patches_single_address() {
        let mut published = vec![
            snapshot("w1", &[("a1", 10), ("a2", 20)]),
            snapshot("w2", &[("b1", 5)]),
        ];
        let untouched = published[1].clone();

        let mut fresh = published.clone();
        fresh[0].addresses[1].balance.confirmed = 25;
        fresh[0].balance.confirmed = 35;

        assert!(reconcile(&mut published, fresh));
        assert_eq!(published[0].addresses[1].balance.confirmed, 25);
        assert_eq!(published[0].addresses[0].balance.confirmed, 10);
        // The unrelated wallet was patched in place, not replaced.
        assert_eq!(published[1], untouched);
    }

    #[test]
    fn test_reconcile_no_change_reports_false() {
        let mut published = vec![snapshot("w1", &[("a1", 10)])];
        let fresh = published.clone();
        assert!(!reconcile(&mut published, fresh));
    }

    #[test]
    fn test_reconcile_structural_replacement() {
        let mut published = vec![snapshot("w1", &[("a1", 10)])];
        let fresh = vec![
            snapshot("w1", &[("a1", 10)]),
            snapshot("w2", &[("b1", 1)]),
        ];
        assert!(reconcile(&mut published, fresh.clone()));
        assert_eq!(published, fresh);
    }

    #[test]
    fn test_reconcile_address_count_change_replaces_wallet_addresses() {
        let mut published = vec![snapshot("w1", &[("a1", 10)])];
        let fresh = vec![snapshot("w1", &[("a1", 10), ("a2", 3)])];
        assert!(reconcile(&mut published, fresh));
        assert_eq!(published[0].addresses.len(), 2);
    }

    struct ScriptedSource {
        responses: Mutex<VecDeque<Result<Vec<WalletWithBalance>, WalletError>>>,
        calls: AtomicUsize,
    }

    impl ScriptedSource {
        fn new(responses: Vec<Result<Vec<WalletWithBalance>, WalletError>>) -> Arc<Self> {
            Arc::new(ScriptedSource {
                responses: Mutex::new(responses.into()),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl BalanceSource for ScriptedSource {
        async fn fetch_balances(
            &self,
            _wallets: &[WalletBase],
        ) -> Result<Vec<WalletWithBalance>, WalletError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.responses
                .lock()
                .pop_front()
                .unwrap_or_else(|| Err(WalletError::UnexpectedResponse("script exhausted".into())))
        }

        async fn fetch_outputs(
            &self,
            _addresses: &[String],
        ) -> Result<Vec<UnspentOutput>, WalletError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_error_keeps_last_snapshot_and_sets_flag() {
        let source = ScriptedSource::new(vec![
            Ok(vec![snapshot("w1", &[("a1", 50)])]),
            Err(WalletError::UnexpectedResponse("boom".into())),
        ]);
        let tracker = BalanceTracker::new(
            source,
            vec![base_wallet("w1", &["a1"])],
            PollingIntervals::balance_for(&mcw_core::coins::default_coins()[0]),
        );

        assert!(tracker.poll_once().await);
        assert_eq!(
            tracker.subscribe_wallets().borrow()[0].balance.confirmed,
            50
        );
        assert!(!*tracker.subscribe_had_error().borrow());

        assert!(!tracker.poll_once().await);
        // Last good snapshot survives the failed tick.
        assert_eq!(
            tracker.subscribe_wallets().borrow()[0].balance.confirmed,
            50
        );
        assert!(*tracker.subscribe_had_error().borrow());
        assert!(*tracker.subscribe_first_full_update().borrow());
    }

    #[tokio::test]
    async fn test_first_full_update_latch_never_resets() {
        let source = ScriptedSource::new(vec![
            Err(WalletError::UnexpectedResponse("down".into())),
            Ok(vec![snapshot("w1", &[("a1", 0)])]),
            Err(WalletError::UnexpectedResponse("down again".into())),
        ]);
        let tracker = BalanceTracker::new(
            source,
            vec![base_wallet("w1", &["a1"])],
            PollingIntervals {
                update: Duration::from_secs(1),
                error: Duration::from_secs(1),
            },
        );

        tracker.poll_once().await;
        assert!(!*tracker.subscribe_first_full_update().borrow());
        tracker.poll_once().await;
        assert!(*tracker.subscribe_first_full_update().borrow());
        tracker.poll_once().await;
        assert!(*tracker.subscribe_first_full_update().borrow());
    }

    #[tokio::test]
    async fn test_has_pending_follows_snapshots() {
        let mut pending = snapshot("w1", &[("a1", 10)]);
        pending.balance.predicted = 7;
        let source = ScriptedSource::new(vec![
            Ok(vec![pending]),
            Ok(vec![snapshot("w1", &[("a1", 7)])]),
        ]);
        let tracker = BalanceTracker::new(
            source,
            vec![base_wallet("w1", &["a1"])],
            PollingIntervals {
                update: Duration::from_secs(1),
                error: Duration::from_secs(1),
            },
        );

        tracker.poll_once().await;
        assert!(*tracker.subscribe_has_pending().borrow());
        tracker.poll_once().await;
        assert!(!*tracker.subscribe_has_pending().borrow());
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_publishes_and_refresh_short_circuits() {
        let source = ScriptedSource::new(vec![Ok(vec![snapshot("w1", &[("a1", 9)])])]);
        let counter = source.clone();
        let tracker = BalanceTracker::new(
            source,
            vec![base_wallet("w1", &["a1"])],
            PollingIntervals {
                update: Duration::from_secs(600),
                error: Duration::from_secs(600),
            },
        );
        let mut wallets_rx = tracker.subscribe_wallets();

        tracker.start();
        wallets_rx.changed().await.expect("first update");
        assert_eq!(wallets_rx.borrow_and_update()[0].balance.confirmed, 9);
        let after_first = counter.calls.load(Ordering::SeqCst);
        assert_eq!(after_first, 1);

        // A refresh cuts the 600s sleep short.
        tracker.refresh();
        let mut error_rx = tracker.subscribe_had_error();
        error_rx.changed().await.expect("error flag");
        assert!(*error_rx.borrow());
        assert!(counter.calls.load(Ordering::SeqCst) > after_first);

        tracker.dispose();
    }
}
