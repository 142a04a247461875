use crate::api::responses::EthSyncState;
use async_trait::async_trait;
use std::io::Error;

/// JSON-RPC surface of account-model nodes.
#[async_trait]
pub trait EthApi {
    /// Balance in the smallest unit for the `pending` block.
    async fn get_balance(&self, address: &str) -> Result<u128, Error>;
    /// Pending nonce of the address.
    async fn get_transaction_count(&self, address: &str) -> Result<u64, Error>;
    /// Suggested gas price in the smallest unit.
    async fn gas_price(&self) -> Result<u128, Error>;
    async fn block_number(&self) -> Result<u64, Error>;
    async fn syncing(&self) -> Result<EthSyncState, Error>;
    async fn send_raw_transaction(&self, raw_transaction: &str) -> Result<String, Error>;
}
