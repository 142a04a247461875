use crate::balance::BalanceSource;
use crate::sync::{SyncSnapshot, SyncSource};
use async_trait::async_trait;
use mcw_clients::api::blockbook::BlockbookApi;
use mcw_clients::api::btc::BtcApi;
use mcw_clients::api::eth::EthApi;
use mcw_clients::api::fiber::FiberApi;
use mcw_clients::api::responses::EthSyncState;
use mcw_core::balance::{AddressWithBalance, Balance, WalletWithBalance};
use mcw_core::errors::WalletError;
use mcw_core::formatting::parse_amount;
use mcw_core::output::UnspentOutput;
use mcw_core::wallet::WalletBase;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

fn sum_addresses(addresses: &[AddressWithBalance]) -> Balance {
    let mut total = Balance::default();
    for address in addresses {
        total.confirmed += address.balance.confirmed;
        total.predicted += address.balance.predicted;
        total.available += address.balance.available;
    }
    total
}

fn enrich(base: &WalletBase, addresses: Vec<AddressWithBalance>) -> WalletWithBalance {
    let mut wallet = WalletWithBalance::from_base(base);
    wallet.balance = sum_addresses(&addresses);
    wallet.addresses = addresses;
    wallet
}

/// Converts a display-unit amount reported as a float into smallest
/// units, rounding to the nearest unit.
fn float_to_units(amount: f64, decimals: u32) -> Result<u64, WalletError> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(WalletError::UnexpectedResponse(format!(
            "invalid amount from node: {amount}"
        )));
    }
    Ok((amount * 10f64.powi(decimals as i32)).round() as u64)
}

pub(crate) fn units_from_display(value: &str, decimals: u32) -> Result<u64, WalletError> {
    let units = parse_amount(value, decimals)?;
    u64::try_from(units)
        .map_err(|_| WalletError::UnexpectedResponse(format!("amount too large: {value}")))
}

// --- hour-bearing family -------------------------------------------------

pub struct FiberBalanceSource {
    api: Arc<dyn FiberApi + Send + Sync>,
    decimals: u32,
}

impl FiberBalanceSource {
    #[must_use]
    pub fn new(api: Arc<dyn FiberApi + Send + Sync>, decimals: u32) -> Self {
        FiberBalanceSource { api, decimals }
    }
}

#[async_trait]
impl BalanceSource for FiberBalanceSource {
    async fn fetch_balances(
        &self,
        wallets: &[WalletBase],
    ) -> Result<Vec<WalletWithBalance>, WalletError> {
        let all_addresses: Vec<String> = wallets
            .iter()
            .flat_map(WalletBase::address_strings)
            .collect();
        if all_addresses.is_empty() {
            return Ok(wallets.iter().map(WalletWithBalance::from_base).collect());
        }
        let response = self.api.addresses_balance(&all_addresses).await?;
        Ok(wallets
            .iter()
            .map(|wallet| {
                let addresses = wallet
                    .addresses
                    .iter()
                    .map(|address| {
                        let pair = response.addresses.get(&address.address);
                        let confirmed =
                            pair.map_or(0, |p| u128::from(p.confirmed.coins));
                        let predicted =
                            pair.map_or(0, |p| u128::from(p.predicted.coins));
                        AddressWithBalance {
                            address: address.address.clone(),
                            is_change: address.is_change,
                            balance: Balance {
                                confirmed,
                                predicted,
                                available: predicted,
                            },
                        }
                    })
                    .collect();
                enrich(wallet, addresses)
            })
            .collect())
    }

    async fn fetch_outputs(&self, addresses: &[String]) -> Result<Vec<UnspentOutput>, WalletError> {
        let entries = self.api.outputs(addresses).await?;
        entries
            .into_iter()
            .map(|entry| {
                Ok(UnspentOutput {
                    hash: entry.hash,
                    address: entry.address,
                    amount: units_from_display(&entry.coins, self.decimals)?,
                    hours: Some(entry.calculated_hours),
                    source_tx: None,
                    source_index: None,
                })
            })
            .collect()
    }
}

pub struct FiberSyncSource {
    api: Arc<dyn FiberApi + Send + Sync>,
    last_highest: Mutex<u64>,
}

impl FiberSyncSource {
    #[must_use]
    pub fn new(api: Arc<dyn FiberApi + Send + Sync>) -> Self {
        FiberSyncSource {
            api,
            last_highest: Mutex::new(0),
        }
    }
}

#[async_trait]
impl SyncSource for FiberSyncSource {
    async fn poll(&self) -> Result<SyncSnapshot, WalletError> {
        let progress = self.api.blockchain_progress().await?;
        if progress.current == 0 || progress.highest == 0 {
            return Err(WalletError::UnexpectedResponse(
                "node reported a zero block height".to_string(),
            ));
        }
        let mut last = self.last_highest.lock();
        if progress.highest < *last {
            return Err(WalletError::UnexpectedResponse(format!(
                "node block height regressed from {} to {}",
                *last, progress.highest
            )));
        }
        *last = progress.highest;
        Ok(SyncSnapshot {
            current_block: progress.current,
            highest_block: progress.highest,
            synchronized: progress.current >= progress.highest,
        })
    }
}

// --- fee-based utxo family ----------------------------------------------

pub struct BtcBalanceSource {
    api: Arc<dyn BtcApi + Send + Sync>,
    decimals: u32,
    confirmations_needed: u64,
}

impl BtcBalanceSource {
    #[must_use]
    pub fn new(
        api: Arc<dyn BtcApi + Send + Sync>,
        decimals: u32,
        confirmations_needed: u64,
    ) -> Self {
        BtcBalanceSource {
            api,
            decimals,
            confirmations_needed,
        }
    }
}

#[async_trait]
impl BalanceSource for BtcBalanceSource {
    async fn fetch_balances(
        &self,
        wallets: &[WalletBase],
    ) -> Result<Vec<WalletWithBalance>, WalletError> {
        let all_addresses: Vec<String> = wallets
            .iter()
            .flat_map(WalletBase::address_strings)
            .collect();
        if all_addresses.is_empty() {
            return Ok(wallets.iter().map(WalletWithBalance::from_base).collect());
        }
        // Zero-confirmation entries feed the predicted balance.
        let unspent = self.api.list_unspent(0, &all_addresses).await?;
        let mut results = Vec::with_capacity(wallets.len());
        for wallet in wallets {
            let mut addresses = Vec::with_capacity(wallet.addresses.len());
            for address in &wallet.addresses {
                let mut confirmed: u128 = 0;
                let mut predicted: u128 = 0;
                for entry in unspent.iter().filter(|e| e.address == address.address) {
                    let units = u128::from(float_to_units(entry.amount, self.decimals)?);
                    predicted += units;
                    if entry.confirmations >= self.confirmations_needed {
                        confirmed += units;
                    }
                }
                addresses.push(AddressWithBalance {
                    address: address.address.clone(),
                    is_change: address.is_change,
                    balance: Balance {
                        confirmed,
                        predicted,
                        available: confirmed,
                    },
                });
            }
            results.push(enrich(wallet, addresses));
        }
        Ok(results)
    }

    async fn fetch_outputs(&self, addresses: &[String]) -> Result<Vec<UnspentOutput>, WalletError> {
        let unspent = self
            .api
            .list_unspent(self.confirmations_needed, addresses)
            .await?;
        unspent
            .into_iter()
            .map(|entry| {
                Ok(UnspentOutput {
                    hash: format!("{}/{}", entry.txid, entry.vout),
                    address: entry.address,
                    amount: float_to_units(entry.amount, self.decimals)?,
                    hours: None,
                    source_tx: Some(entry.txid),
                    source_index: Some(entry.vout),
                })
            })
            .collect()
    }
}

pub struct BtcSyncSource {
    api: Arc<dyn BtcApi + Send + Sync>,
    out_of_sync_age_secs: u64,
}

impl BtcSyncSource {
    #[must_use]
    pub fn new(api: Arc<dyn BtcApi + Send + Sync>, out_of_sync_age_secs: u64) -> Self {
        BtcSyncSource {
            api,
            out_of_sync_age_secs,
        }
    }
}

#[async_trait]
impl SyncSource for BtcSyncSource {
    async fn poll(&self) -> Result<SyncSnapshot, WalletError> {
        let hash = self.api.get_best_block_hash().await?;
        let block = self.api.get_block(&hash).await?;
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        // The node does not report a target height; a fresh-enough best
        // block is the synchronization criterion.
        let age = now.saturating_sub(block.time);
        Ok(SyncSnapshot {
            current_block: block.height,
            highest_block: block.height,
            synchronized: age <= self.out_of_sync_age_secs,
        })
    }
}

// --- account-based family -----------------------------------------------

pub struct EthBalanceSource {
    node: Arc<dyn EthApi + Send + Sync>,
    indexer: Option<Arc<dyn BlockbookApi + Send + Sync>>,
}

impl EthBalanceSource {
    #[must_use]
    pub fn new(
        node: Arc<dyn EthApi + Send + Sync>,
        indexer: Option<Arc<dyn BlockbookApi + Send + Sync>>,
    ) -> Self {
        EthBalanceSource { node, indexer }
    }
}

fn parse_indexer_balance(value: &str) -> Result<u128, WalletError> {
    if value.is_empty() {
        return Ok(0);
    }
    value.parse().map_err(|_| {
        WalletError::UnexpectedResponse(format!("invalid indexer balance: {value:?}"))
    })
}

#[async_trait]
impl BalanceSource for EthBalanceSource {
    async fn fetch_balances(
        &self,
        wallets: &[WalletBase],
    ) -> Result<Vec<WalletWithBalance>, WalletError> {
        let mut results = Vec::with_capacity(wallets.len());
        for wallet in wallets {
            let mut addresses = Vec::with_capacity(wallet.addresses.len());
            for address in &wallet.addresses {
                let predicted = self.node.get_balance(&address.address).await?;
                let confirmed = match &self.indexer {
                    Some(indexer) => {
                        let summary = indexer.address(&address.address).await?;
                        parse_indexer_balance(&summary.balance)?
                    }
                    None => predicted,
                };
                addresses.push(AddressWithBalance {
                    address: address.address.clone(),
                    is_change: address.is_change,
                    balance: Balance {
                        confirmed,
                        predicted,
                        available: confirmed,
                    },
                });
            }
            results.push(enrich(wallet, addresses));
        }
        Ok(results)
    }

    async fn fetch_outputs(
        &self,
        _addresses: &[String],
    ) -> Result<Vec<UnspentOutput>, WalletError> {
        // Account chains have no output pool.
        Ok(Vec::new())
    }
}

pub struct EthSyncSource {
    node: Arc<dyn EthApi + Send + Sync>,
    indexer: Option<Arc<dyn BlockbookApi + Send + Sync>>,
}

impl EthSyncSource {
    #[must_use]
    pub fn new(
        node: Arc<dyn EthApi + Send + Sync>,
        indexer: Option<Arc<dyn BlockbookApi + Send + Sync>>,
    ) -> Self {
        EthSyncSource { node, indexer }
    }
}

#[async_trait]
impl SyncSource for EthSyncSource {
    async fn poll(&self) -> Result<SyncSnapshot, WalletError> {
        match self.node.syncing().await? {
            EthSyncState::Syncing { current, highest } => Ok(SyncSnapshot {
                current_block: current,
                highest_block: highest,
                synchronized: false,
            }),
            EthSyncState::Synced => match &self.indexer {
                Some(indexer) => {
                    let status = indexer.status().await?;
                    let indexed = status.blockbook.best_height;
                    let backend = status.backend.blocks;
                    Ok(SyncSnapshot {
                        current_block: indexed,
                        highest_block: backend,
                        synchronized: indexed.abs_diff(backend) <= 1,
                    })
                }
                None => {
                    let height = self.node.block_number().await?;
                    Ok(SyncSnapshot {
                        current_block: height,
                        highest_block: height,
                        synchronized: true,
                    })
                }
            },
        }
    }
}
