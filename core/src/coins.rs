use serde::{Deserialize, Serialize};

/// The three transaction/balance models the engine knows how to drive.
/// Shared logic never branches on this tag; it only selects which concrete
/// operator implementations are built when a coin becomes active.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CoinFamily {
    /// Ethereum-like chains: account/nonce model, RLP wire format.
    AccountBased,
    /// Bitcoin-like chains: UTXO model with a byte-proportional fee.
    UtxoWithFee,
    /// Fiber chains: UTXO model where a secondary resource (hours) is
    /// burned as the fee instead of the base coin.
    UtxoWithHours,
}

const fn default_out_of_sync_age_secs() -> u64 {
    // Consider the chain out of sync if the last block is more than
    // 90 minutes old.
    5400
}
const fn default_confirmations() -> u32 {
    1
}

/// Static descriptor of a coin. Immutable after construction; exactly one
/// instance is selected as the active coin at any time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    pub name: String,
    pub symbol: String,
    pub family: CoinFamily,
    /// Number of decimals of the smallest unit (sats, droplets, wei).
    pub decimals: u32,
    /// Display name of the unit fees are expressed in (sat/byte, gwei, hours).
    pub fee_unit: String,
    /// Network-advertised minimum fee per unit, in smallest units.
    /// Enforced as a floor before any local fee formula runs.
    #[serde(default)]
    pub min_fee_per_unit: u64,
    #[serde(default = "default_confirmations")]
    pub confirmations_needed: u32,
    pub node_url: String,
    /// Block-indexer endpoint, where one exists for the family.
    #[serde(default)]
    pub indexer_url: Option<String>,
    /// Local nodes are polled much more aggressively than remote ones.
    pub is_local: bool,
    /// EIP-155 chain id, for account-based coins only.
    #[serde(default)]
    pub chain_id: Option<u64>,
    #[serde(default = "default_out_of_sync_age_secs")]
    pub out_of_sync_age_secs: u64,
}

impl Coin {
    /// 10^decimals, for converting between display units and smallest units.
    #[must_use]
    pub fn unit_factor(&self) -> u128 {
        10u128.pow(self.decimals)
    }
}

/// The built-in coin set. Callers can equally deserialize their own list
/// from JSON; these mirror the defaults shipped with the wallet.
#[must_use]
pub fn default_coins() -> Vec<Coin> {
    vec![
        Coin {
            name: "Skycoin".to_string(),
            symbol: "SKY".to_string(),
            family: CoinFamily::UtxoWithHours,
            decimals: 6,
            fee_unit: "hours".to_string(),
            min_fee_per_unit: 0,
            confirmations_needed: 1,
            node_url: "http://127.0.0.1:6420".to_string(),
            indexer_url: None,
            is_local: true,
            chain_id: None,
            out_of_sync_age_secs: default_out_of_sync_age_secs(),
        },
        Coin {
            name: "Bitcoin".to_string(),
            symbol: "BTC".to_string(),
            family: CoinFamily::UtxoWithFee,
            decimals: 8,
            fee_unit: "sat/byte".to_string(),
            min_fee_per_unit: 1,
            confirmations_needed: 2,
            node_url: "http://127.0.0.1:8332".to_string(),
            indexer_url: None,
            is_local: true,
            chain_id: None,
            out_of_sync_age_secs: default_out_of_sync_age_secs(),
        },
        Coin {
            name: "Ethereum".to_string(),
            symbol: "ETH".to_string(),
            family: CoinFamily::AccountBased,
            decimals: 18,
            fee_unit: "gwei".to_string(),
            min_fee_per_unit: 1,
            confirmations_needed: 12,
            node_url: "http://127.0.0.1:8545".to_string(),
            indexer_url: Some("http://127.0.0.1:9130".to_string()),
            is_local: true,
            chain_id: Some(1),
            out_of_sync_age_secs: default_out_of_sync_age_secs(),
        },
    ]
}
