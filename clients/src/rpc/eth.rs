use crate::api::eth::EthApi;
use crate::api::responses::EthSyncState;
use crate::rpc::{call_rpc_method, get_client, parse_hex_quantity};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::io::{Error, ErrorKind};

/// JSON-RPC client for account-model nodes.
pub struct EthClient {
    client: Client,
    url: String,
}

impl EthClient {
    pub fn new(url: &str) -> Result<Self, Error> {
        Ok(EthClient {
            client: get_client(30)?,
            url: url.to_string(),
        })
    }

    async fn call(&self, method: &str, params: Value) -> Result<Value, Error> {
        call_rpc_method(&self.client, &self.url, method, params).await
    }
}

fn with_hex_prefix(raw: &str) -> String {
    if raw.starts_with("0x") || raw.starts_with("0X") {
        raw.to_string()
    } else {
        format!("0x{raw}")
    }
}

#[async_trait]
impl EthApi for EthClient {
    async fn get_balance(&self, address: &str) -> Result<u128, Error> {
        let result = self
            .call("eth_getBalance", json!([address, "pending"]))
            .await?;
        parse_hex_quantity(&result)
    }

    async fn get_transaction_count(&self, address: &str) -> Result<u64, Error> {
        let result = self
            .call("eth_getTransactionCount", json!([address, "pending"]))
            .await?;
        let count = parse_hex_quantity(&result)?;
        u64::try_from(count)
            .map_err(|_| Error::new(ErrorKind::InvalidData, format!("nonce out of range: {count}")))
    }

    async fn gas_price(&self) -> Result<u128, Error> {
        let result = self.call("eth_gasPrice", json!([])).await?;
        parse_hex_quantity(&result)
    }

    async fn block_number(&self) -> Result<u64, Error> {
        let result = self.call("eth_blockNumber", json!([])).await?;
        let height = parse_hex_quantity(&result)?;
        u64::try_from(height).map_err(|_| {
            Error::new(
                ErrorKind::InvalidData,
                format!("block number out of range: {height}"),
            )
        })
    }

    async fn syncing(&self) -> Result<EthSyncState, Error> {
        let result = self.call("eth_syncing", json!([])).await?;
        // Synced nodes answer with the literal `false`.
        if result.as_bool() == Some(false) {
            return Ok(EthSyncState::Synced);
        }
        let current = result
            .get("currentBlock")
            .map(parse_hex_quantity)
            .transpose()?
            .unwrap_or(0);
        let highest = result
            .get("highestBlock")
            .map(parse_hex_quantity)
            .transpose()?
            .unwrap_or(0);
        Ok(EthSyncState::Syncing {
            current: current as u64,
            highest: highest as u64,
        })
    }

    async fn send_raw_transaction(&self, raw_transaction: &str) -> Result<String, Error> {
        let raw = with_hex_prefix(raw_transaction);
        let result = self.call("eth_sendRawTransaction", json!([raw])).await?;
        result.as_str().map(str::to_string).ok_or_else(|| {
            Error::new(
                ErrorKind::InvalidData,
                format!("expected transaction hash, got {result}"),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_hex_prefix() {
        assert_eq!(with_hex_prefix("f86c05"), "0xf86c05");
        assert_eq!(with_hex_prefix("0xf86c05"), "0xf86c05");
    }
}
