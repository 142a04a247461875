use crate::api::btc::BtcApi;
use crate::api::responses::{BtcBlock, BtcTxOut, BtcUnspent, BtcValidateAddress};
use crate::rpc::{call_rpc_method, get_client};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{from_value, json, Value};
use std::io::{Error, ErrorKind};

const SATOSHIS_PER_COIN: f64 = 100_000_000.0;

/// JSON-RPC client for bitcoin-like nodes.
pub struct BtcClient {
    client: Client,
    url: String,
}

impl BtcClient {
    pub fn new(url: &str) -> Result<Self, Error> {
        Ok(BtcClient {
            client: get_client(30)?,
            url: url.to_string(),
        })
    }

    async fn call(&self, method: &str, params: Value) -> Result<Value, Error> {
        call_rpc_method(&self.client, &self.url, method, params).await
    }
}

/// Converts an `estimatesmartfee` rate (coins per kilobyte) to smallest
/// units per byte, rounding up so the estimate never falls below the
/// node's threshold.
fn fee_rate_to_unit_per_byte(coins_per_kb: f64) -> u64 {
    (coins_per_kb * SATOSHIS_PER_COIN / 1000.0).ceil() as u64
}

#[async_trait]
impl BtcApi for BtcClient {
    async fn get_best_block_hash(&self) -> Result<String, Error> {
        let result = self.call("getbestblockhash", json!([])).await?;
        result.as_str().map(str::to_string).ok_or_else(|| {
            Error::new(
                ErrorKind::InvalidData,
                format!("expected block hash, got {result}"),
            )
        })
    }

    async fn get_block(&self, hash: &str) -> Result<BtcBlock, Error> {
        let result = self.call("getblock", json!([hash])).await?;
        from_value(result).map_err(|e| Error::new(ErrorKind::InvalidData, e.to_string()))
    }

    async fn validate_address(&self, address: &str) -> Result<BtcValidateAddress, Error> {
        let result = self.call("validateaddress", json!([address])).await?;
        from_value(result).map_err(|e| Error::new(ErrorKind::InvalidData, e.to_string()))
    }

    async fn get_tx_out(&self, txid: &str, vout: u32) -> Result<Option<BtcTxOut>, Error> {
        let result = self.call("gettxout", json!([txid, vout])).await?;
        if result.is_null() {
            return Ok(None);
        }
        from_value(result)
            .map(Some)
            .map_err(|e| Error::new(ErrorKind::InvalidData, e.to_string()))
    }

    async fn list_unspent(
        &self,
        min_confirmations: u64,
        addresses: &[String],
    ) -> Result<Vec<BtcUnspent>, Error> {
        let result = self
            .call("listunspent", json!([min_confirmations, 9_999_999, addresses]))
            .await?;
        from_value(result).map_err(|e| Error::new(ErrorKind::InvalidData, e.to_string()))
    }

    async fn estimate_fee_per_byte(&self, blocks: u64) -> Result<Option<u64>, Error> {
        let result = self.call("estimatesmartfee", json!([blocks])).await?;
        match result.get("feerate").and_then(Value::as_f64) {
            Some(rate) if rate > 0.0 => Ok(Some(fee_rate_to_unit_per_byte(rate))),
            _ => Ok(None),
        }
    }

    async fn send_raw_transaction(&self, raw_transaction: &str) -> Result<String, Error> {
        let result = self
            .call("sendrawtransaction", json!([raw_transaction]))
            .await?;
        result.as_str().map(str::to_string).ok_or_else(|| {
            Error::new(
                ErrorKind::InvalidData,
                format!("expected transaction id, got {result}"),
            )
        })
    }
}
