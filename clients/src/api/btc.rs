use crate::api::responses::{BtcBlock, BtcTxOut, BtcUnspent, BtcValidateAddress};
use async_trait::async_trait;
use std::io::Error;

/// JSON-RPC surface of bitcoin-like nodes.
#[async_trait]
pub trait BtcApi {
    async fn get_best_block_hash(&self) -> Result<String, Error>;
    async fn get_block(&self, hash: &str) -> Result<BtcBlock, Error>;
    async fn validate_address(&self, address: &str) -> Result<BtcValidateAddress, Error>;
    /// Returns `None` for outputs the node considers spent.
    async fn get_tx_out(&self, txid: &str, vout: u32) -> Result<Option<BtcTxOut>, Error>;
    async fn list_unspent(
        &self,
        min_confirmations: u64,
        addresses: &[String],
    ) -> Result<Vec<BtcUnspent>, Error>;
    /// Fee rate in smallest units per byte for confirmation within
    /// `blocks` blocks, or `None` when the node has no estimate.
    async fn estimate_fee_per_byte(&self, blocks: u64) -> Result<Option<u64>, Error>;
    async fn send_raw_transaction(&self, raw_transaction: &str) -> Result<String, Error>;
}
