use serde::{Deserialize, Serialize};

/// A spendable unit observed unspent on a UTXO chain. Filtered out of the
/// pool once consumed by a confirmed or pending spend.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnspentOutput {
    /// Unique id of the output. For fee-based chains this is
    /// `"<txid>/<vout>"`; for hours-based chains it is the uxid hash.
    pub hash: String,
    pub address: String,
    /// Coin amount in smallest units.
    pub amount: u64,
    /// Secondary resource carried by hour-bearing chains.
    #[serde(default)]
    pub hours: Option<u64>,
    /// Transaction that created this output, where the data source
    /// reports it separately from the hash.
    #[serde(default)]
    pub source_tx: Option<String>,
    #[serde(default)]
    pub source_index: Option<u32>,
}

impl UnspentOutput {
    /// Splits a `"<txid>/<vout>"` id into its parts, preferring the
    /// explicit source fields when present.
    pub fn tx_and_index(&self) -> Option<(String, u32)> {
        if let (Some(tx), Some(index)) = (&self.source_tx, self.source_index) {
            return Some((tx.clone(), index));
        }
        let (tx, index) = self.hash.split_once('/')?;
        let index = index.parse().ok()?;
        Some((tx.to_string(), index))
    }
}
