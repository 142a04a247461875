use crate::balance::{set_flag, BalanceTracker, PollingIntervals};
use async_trait::async_trait;
use log::{debug, warn};
use mcw_core::errors::WalletError;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// One observation of the chain head.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SyncSnapshot {
    pub current_block: u64,
    pub highest_block: u64,
    /// Whether the family's own definition of "synchronized" holds.
    pub synchronized: bool,
}

/// Chain-head source a sync monitor polls. Each coin family supplies its
/// own notion of synchronized (node progress, block age, or node/indexer
/// height agreement).
#[async_trait]
pub trait SyncSource: Send + Sync {
    async fn poll(&self) -> Result<SyncSnapshot, WalletError>;
}

/// What the monitor refreshes when the chain becomes synchronized.
pub trait RefreshTarget: Send + Sync {
    fn refresh(&self);
}

impl RefreshTarget for BalanceTracker {
    fn refresh(&self) {
        BalanceTracker::refresh(self);
    }
}

struct MonitorInner {
    source: Arc<dyn SyncSource>,
    target: Arc<dyn RefreshTarget>,
    intervals: PollingIntervals,
    snapshot_tx: watch::Sender<Option<SyncSnapshot>>,
    synchronized_tx: watch::Sender<bool>,
    had_error_tx: watch::Sender<bool>,
    /// None until the first successful poll; drives the edge trigger.
    last_synchronized: Mutex<Option<bool>>,
}

/// Polls chain-head state and fires exactly one balance refresh on each
/// transition into the synchronized state. Repeated synchronized ticks do
/// not re-trigger; error ticks raise a flag and retry sooner without
/// touching the edge state.
pub struct SyncMonitor {
    inner: Arc<MonitorInner>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl SyncMonitor {
    #[must_use]
    pub fn new(
        source: Arc<dyn SyncSource>,
        target: Arc<dyn RefreshTarget>,
        intervals: PollingIntervals,
    ) -> Self {
        SyncMonitor {
            inner: Arc::new(MonitorInner {
                source,
                target,
                intervals,
                snapshot_tx: watch::channel(None).0,
                synchronized_tx: watch::channel(false).0,
                had_error_tx: watch::channel(false).0,
                last_synchronized: Mutex::new(None),
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
                let ok = poll_once(&inner).await;
                let delay = if ok {
                    inner.intervals.update
                } else {
                    inner.intervals.error
                };
                tokio::time::sleep(delay).await;
            }
        }));
    }

    pub fn dispose(&self) {
        if let Some(task) = self.task.lock().take() {
            task.abort();
        }
    }

    /// Runs one poll cycle outside the loop.
    pub async fn poll_once(&self) -> bool {
        poll_once(&self.inner).await
    }

    pub fn subscribe_snapshot(&self) -> watch::Receiver<Option<SyncSnapshot>> {
        self.inner.snapshot_tx.subscribe()
    }

    pub fn subscribe_synchronized(&self) -> watch::Receiver<bool> {
        self.inner.synchronized_tx.subscribe()
    }

    pub fn subscribe_had_error(&self) -> watch::Receiver<bool> {
        self.inner.had_error_tx.subscribe()
    }
}

impl Drop for SyncMonitor {
    fn drop(&mut self) {
        self.dispose();
    }
}

async fn poll_once(inner: &MonitorInner) -> bool {
    match inner.source.poll().await {
        Ok(snapshot) => {
            let previous = inner
                .last_synchronized
                .lock()
                .replace(snapshot.synchronized);
            inner.snapshot_tx.send_replace(Some(snapshot));
            set_flag(&inner.synchronized_tx, snapshot.synchronized);
            set_flag(&inner.had_error_tx, false);
            if snapshot.synchronized && previous != Some(true) {
                debug!("chain became synchronized, refreshing balances");
                inner.target.refresh();
            }
            true
        }
        Err(e) => {
            warn!("sync poll failed: {e}");
            set_flag(&inner.had_error_tx, true);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct ScriptedSync {
        responses: Mutex<VecDeque<Result<SyncSnapshot, WalletError>>>,
    }

    impl ScriptedSync {
        fn new(responses: Vec<Result<SyncSnapshot, WalletError>>) -> Arc<Self> {
            Arc::new(ScriptedSync {
                responses: Mutex::new(responses.into()),
            })
        }
    }

    #[async_trait]
    impl SyncSource for ScriptedSync {
        async fn poll(&self) -> Result<SyncSnapshot, WalletError> {
            self.responses
                .lock()
                .pop_front()
                .unwrap_or_else(|| Err(WalletError::UnexpectedResponse("script exhausted".into())))
        }
    }

    #[derive(Default)]
    struct CountingTarget {
        refreshes: AtomicUsize,
    }

    impl RefreshTarget for CountingTarget {
        fn refresh(&self) {
            self.refreshes.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn state(current: u64, highest: u64, synchronized: bool) -> Result<SyncSnapshot, WalletError> {
        Ok(SyncSnapshot {
            current_block: current,
            highest_block: highest,
            synchronized,
        })
    }

    fn intervals() -> PollingIntervals {
        PollingIntervals {
            update: std::time::Duration::from_secs(2),
            error: std::time::Duration::from_secs(2),
        }
    }

    #[tokio::test]
    async fn test_edge_trigger_fires_once() {
        let source = ScriptedSync::new(vec![
            state(10, 20, false),
            state(15, 20, false),
            state(20, 20, true),
            state(21, 21, true),
        ]);
        let target = Arc::new(CountingTarget::default());
        let monitor = SyncMonitor::new(source, target.clone(), intervals());

        for _ in 0..4 {
            monitor.poll_once().await;
        }
        // Exactly one refresh, on the unsynchronized -> synchronized edge.
        assert_eq!(target.refreshes.load(Ordering::SeqCst), 1);
        assert!(*monitor.subscribe_synchronized().borrow());
    }

    #[tokio::test]
    async fn test_first_snapshot_synchronized_refreshes_once() {
        let source = ScriptedSync::new(vec![state(20, 20, true), state(21, 21, true)]);
        let target = Arc::new(CountingTarget::default());
        let monitor = SyncMonitor::new(source, target.clone(), intervals());

        monitor.poll_once().await;
        monitor.poll_once().await;
        assert_eq!(target.refreshes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_error_tick_keeps_edge_state() {
        let source = ScriptedSync::new(vec![
            state(20, 20, true),
            Err(WalletError::UnexpectedResponse("down".into())),
            state(21, 21, true),
        ]);
        let target = Arc::new(CountingTarget::default());
        let monitor = SyncMonitor::new(source, target.clone(), intervals());

        assert!(monitor.poll_once().await);
        assert!(!monitor.poll_once().await);
        assert!(*monitor.subscribe_had_error().borrow());
        assert!(monitor.poll_once().await);
        // The failed tick between two synchronized ticks is not an edge.
        assert_eq!(target.refreshes.load(Ordering::SeqCst), 1);
        assert!(!*monitor.subscribe_had_error().borrow());
    }

    #[tokio::test]
    async fn test_losing_sync_rearms_the_trigger() {
        let source = ScriptedSync::new(vec![
            state(20, 20, true),
            state(20, 30, false),
            state(30, 30, true),
        ]);
        let target = Arc::new(CountingTarget::default());
        let monitor = SyncMonitor::new(source, target.clone(), intervals());

        for _ in 0..3 {
            monitor.poll_once().await;
        }
        assert_eq!(target.refreshes.load(Ordering::SeqCst), 2);
    }
}
