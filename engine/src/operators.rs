use crate::balance::{BalanceSource, BalanceTracker, PollingIntervals};
use crate::hardware::HardwareSigner;
use crate::notes::{save_note_with_retries, NoteStore};
use crate::sources::{
    BtcBalanceSource, BtcSyncSource, EthBalanceSource, EthSyncSource, FiberBalanceSource,
    FiberSyncSource,
};
use crate::spending::account::AccountOperator;
use crate::spending::hours::HoursOperator;
use crate::spending::utxo_fee::UtxoFeeOperator;
use crate::spending::SpendingOperator;
use crate::sync::{SyncMonitor, SyncSource};
use log::{info, warn};
use mcw_clients::api::blockbook::BlockbookApi;
use mcw_clients::api::btc::BtcApi;
use mcw_clients::api::eth::EthApi;
use mcw_clients::api::fiber::FiberApi;
use mcw_clients::rpc::blockbook::BlockbookClient;
use mcw_clients::rpc::btc::BtcClient;
use mcw_clients::rpc::eth::EthClient;
use mcw_clients::rpc::fiber::FiberClient;
use mcw_core::coins::{Coin, CoinFamily};
use mcw_core::errors::WalletError;
use mcw_core::transaction::GeneratedTransaction;
use mcw_core::wallet::WalletBase;
use parking_lot::Mutex;
use std::sync::Arc;

/// The operators serving one coin: balance tracker, sync monitor and the
/// family's spending operator. Built fully before any polling starts.
pub struct CoinOperators {
    pub coin: Coin,
    pub balance: Arc<BalanceTracker>,
    pub sync: Arc<SyncMonitor>,
    pub spending: Arc<dyn SpendingOperator>,
}

impl CoinOperators {
    /// Builds the operator set for a coin, constructing the clients its
    /// family needs. Nothing polls until [`CoinOperators::start`].
    pub fn build(
        coin: Coin,
        wallets: Vec<WalletBase>,
        hardware: Option<Arc<dyn HardwareSigner>>,
    ) -> Result<Self, WalletError> {
        let (balance_source, sync_source, spending): (
            Arc<dyn BalanceSource>,
            Arc<dyn SyncSource>,
            Arc<dyn SpendingOperator>,
        ) = match coin.family {
            CoinFamily::UtxoWithHours => {
                let api: Arc<dyn FiberApi + Send + Sync> =
                    Arc::new(FiberClient::new(&coin.node_url)?);
                (
                    Arc::new(FiberBalanceSource::new(api.clone(), coin.decimals)),
                    Arc::new(FiberSyncSource::new(api.clone())),
                    Arc::new(HoursOperator::new(coin.clone(), api, hardware)),
                )
            }
            CoinFamily::UtxoWithFee => {
                let api: Arc<dyn BtcApi + Send + Sync> = Arc::new(BtcClient::new(&coin.node_url)?);
                (
                    Arc::new(BtcBalanceSource::new(
                        api.clone(),
                        coin.decimals,
                        u64::from(coin.confirmations_needed),
                    )),
                    Arc::new(BtcSyncSource::new(api.clone(), coin.out_of_sync_age_secs)),
                    Arc::new(UtxoFeeOperator::new(coin.clone(), api, hardware)),
                )
            }
            CoinFamily::AccountBased => {
                let node: Arc<dyn EthApi + Send + Sync> =
                    Arc::new(EthClient::new(&coin.node_url)?);
                let indexer: Option<Arc<dyn BlockbookApi + Send + Sync>> =
                    match &coin.indexer_url {
                        Some(url) => Some(Arc::new(BlockbookClient::new(url)?)),
                        None => None,
                    };
                (
                    Arc::new(EthBalanceSource::new(node.clone(), indexer.clone())),
                    Arc::new(EthSyncSource::new(node.clone(), indexer)),
                    Arc::new(AccountOperator::new(coin.clone(), node, hardware)),
                )
            }
        };
        Ok(Self::from_parts(coin, balance_source, sync_source, spending, wallets))
    }

    /// Assembles a set from explicit sources; tests inject scripted ones.
    #[must_use]
    pub fn from_parts(
        coin: Coin,
        balance_source: Arc<dyn BalanceSource>,
        sync_source: Arc<dyn SyncSource>,
        spending: Arc<dyn SpendingOperator>,
        wallets: Vec<WalletBase>,
    ) -> Self {
        let balance = Arc::new(BalanceTracker::new(
            balance_source,
            wallets,
            PollingIntervals::balance_for(&coin),
        ));
        let sync = Arc::new(SyncMonitor::new(
            sync_source,
            balance.clone(),
            PollingIntervals::sync_for(&coin),
        ));
        CoinOperators {
            coin,
            balance,
            sync,
            spending,
        }
    }

    pub fn start(&self) {
        self.balance.start();
        self.sync.start();
    }

    pub fn dispose(&self) {
        self.sync.dispose();
        self.balance.dispose();
    }

    /// Broadcasts a signed transaction, refreshes the balances and stores
    /// the transaction's note, if any. A note that cannot be stored does
    /// not fail the broadcast; it is only logged.
    pub async fn broadcast(
        &self,
        transaction: &GeneratedTransaction,
        note_store: Option<&dyn NoteStore>,
    ) -> Result<String, WalletError> {
        let transaction_id = self.spending.broadcast(transaction).await?;
        info!("broadcast {} transaction {transaction_id}", self.coin.symbol);
        self.balance.refresh();
        if let (Some(store), Some(note)) = (note_store, transaction.note.as_deref()) {
            if !note.is_empty()
                && save_note_with_retries(store, &transaction_id, note).await.is_err()
            {
                warn!("note for transaction {transaction_id} was not stored");
            }
        }
        Ok(transaction_id)
    }
}

/// Owns the single live operator set. Swapping the active coin builds the
/// replacement first, disposes the old set, then starts the new one, so
/// two pollers never write snapshots at the same time.
#[derive(Default)]
pub struct OperatorManager {
    active: Mutex<Option<Arc<CoinOperators>>>,
}

impl OperatorManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `operators` the live set and returns its handle. The old
    /// set's polling is stopped before the new set's begins.
    pub fn activate(&self, operators: CoinOperators) -> Arc<CoinOperators> {
        let fresh = Arc::new(operators);
        let mut active = self.active.lock();
        if let Some(previous) = active.take() {
            info!(
                "switching active coin from {} to {}",
                previous.coin.symbol, fresh.coin.symbol
            );
            previous.dispose();
        }
        fresh.start();
        *active = Some(fresh.clone());
        fresh
    }

    #[must_use]
    pub fn active(&self) -> Option<Arc<CoinOperators>> {
        self.active.lock().clone()
    }

    pub fn deactivate(&self) {
        if let Some(previous) = self.active.lock().take() {
            previous.dispose();
        }
    }
}
