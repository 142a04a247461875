use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Coin/hour pair as reported by hour-bearing nodes, in smallest units.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiberBalancePair {
    pub coins: u64,
    pub hours: u64,
}

/// Balance of a wallet or address set: confirmed and predicted totals plus
/// the per-address breakdown.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiberBalance {
    pub confirmed: FiberBalancePair,
    pub predicted: FiberBalancePair,
    #[serde(default)]
    pub addresses: HashMap<String, FiberAddressBalance>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiberAddressBalance {
    pub confirmed: FiberBalancePair,
    pub predicted: FiberBalancePair,
}

/// One spendable output as listed by the node. Coins arrive as a decimal
/// display string; the engine converts using the coin's decimals.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiberOutputEntry {
    pub hash: String,
    pub address: String,
    pub coins: String,
    pub calculated_hours: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiberOutputsResponse {
    pub head_outputs: Vec<FiberOutputEntry>,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiberProgress {
    pub current: u64,
    pub highest: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiberTransactionInput {
    pub uxid: String,
    pub address: String,
    pub coins: String,
    pub calculated_hours: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiberTransactionOutput {
    #[serde(default)]
    pub uxid: String,
    pub address: String,
    pub coins: String,
    pub hours: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiberTransaction {
    pub inputs: Vec<FiberTransactionInput>,
    pub outputs: Vec<FiberTransactionOutput>,
    /// Hours burned by the transaction.
    pub fee: u64,
    pub inner_hash: String,
}

/// Node response for a built (not yet broadcast) transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiberCreatedTransaction {
    pub transaction: FiberTransaction,
    pub encoded_transaction: String,
}

/// Parameters for making the node build a transaction.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiberTransactionParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wallet_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub addresses: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unspents: Option<Vec<String>>,
    pub hours_selection: FiberHoursSelection,
    pub to: Vec<FiberDestinationParam>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unsigned: Option<bool>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiberHoursSelection {
    #[serde(rename = "type")]
    pub selection_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub share_factor: Option<String>,
}

impl Default for FiberHoursSelection {
    fn default() -> Self {
        // Automatic hour distribution, sharing half of the hours.
        FiberHoursSelection {
            selection_type: "auto".to_string(),
            mode: Some("share".to_string()),
            share_factor: Some("0.5".to_string()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiberDestinationParam {
    pub address: String,
    pub coins: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hours: Option<String>,
}

/// `validateaddress` response of bitcoin-like nodes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BtcValidateAddress {
    pub isvalid: bool,
    #[serde(rename = "scriptPubKey", default)]
    pub script_pub_key: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BtcBlock {
    pub height: u64,
    /// Unix timestamp of the block.
    pub time: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BtcScriptPubKey {
    #[serde(default)]
    pub hex: String,
    #[serde(rename = "type", default)]
    pub script_type: String,
}

/// `gettxout` response; `None` when the output was already spent.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BtcTxOut {
    #[serde(rename = "scriptPubKey", default)]
    pub script_pub_key: BtcScriptPubKey,
    #[serde(default)]
    pub confirmations: u64,
}

/// One entry of `listunspent`. The value arrives in display units.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BtcUnspent {
    pub txid: String,
    pub vout: u32,
    pub address: String,
    pub amount: f64,
    #[serde(default)]
    pub confirmations: u64,
}

/// `eth_syncing` result: either `false` or a progress object.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EthSyncState {
    Synced,
    Syncing { current: u64, highest: u64 },
}

/// Subset of the blockbook `api` status endpoint used for sync checks.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockbookStatus {
    pub blockbook: BlockbookInfo,
    pub backend: BlockbookBackend,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockbookInfo {
    #[serde(rename = "bestHeight", default)]
    pub best_height: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockbookBackend {
    #[serde(default)]
    pub blocks: u64,
}

/// Address summary from blockbook, balances as integer strings in
/// smallest units.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockbookAddress {
    pub address: String,
    #[serde(default)]
    pub balance: String,
    #[serde(rename = "unconfirmedBalance", default)]
    pub unconfirmed_balance: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fiber_balance_deserialize() {
        let json = r#"{
            "confirmed": {"coins": 2000000, "hours": 100},
            "predicted": {"coins": 1500000, "hours": 93},
            "addresses": {
                "addr-a": {
                    "confirmed": {"coins": 2000000, "hours": 100},
                    "predicted": {"coins": 1500000, "hours": 93}
                }
            }
        }"#;
        let balance: FiberBalance = serde_json::from_str(json).expect("deserialize");
        assert_eq!(balance.confirmed.coins, 2_000_000);
        assert_eq!(balance.predicted.hours, 93);
        assert_eq!(balance.addresses["addr-a"].confirmed.coins, 2_000_000);
    }

    #[test]
    fn test_blockbook_status_deserialize() {
        let json = r#"{
            "blockbook": {"bestHeight": 100, "coin": "Ethereum"},
            "backend": {"blocks": 101, "chain": "mainnet"}
        }"#;
        let status: BlockbookStatus = serde_json::from_str(json).expect("deserialize");
        assert_eq!(status.blockbook.best_height, 100);
        assert_eq!(status.backend.blocks, 101);
    }

    #[test]
    fn test_transaction_params_skip_missing_fields() {
        let params = FiberTransactionParams {
            addresses: Some(vec!["a".to_string()]),
            to: vec![FiberDestinationParam {
                address: "b".to_string(),
                coins: "1.5".to_string(),
                hours: None,
            }],
            ..Default::default()
        };
        let value = serde_json::to_value(&params).expect("serialize");
        assert!(value.get("wallet_id").is_none());
        assert!(value.get("unsigned").is_none());
        assert_eq!(value["hours_selection"]["type"], "auto");
        assert!(value["to"][0].get("hours").is_none());
    }
}
