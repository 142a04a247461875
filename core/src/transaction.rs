use serde::{Deserialize, Serialize};

/// Where a built transaction sends coins.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionDestination {
    pub address: String,
    /// Coin amount in smallest units. `u128` so account chains can send
    /// wei amounts past `u64::MAX`; UTXO operators narrow at the wire.
    pub amount: u128,
    /// Hours to attach, for hour-bearing chains with manual distribution.
    #[serde(default)]
    pub hours: Option<u64>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionInput {
    pub hash: String,
    pub address: String,
    pub amount: u128,
    #[serde(default)]
    pub hours: Option<u64>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionOutput {
    pub address: String,
    pub amount: u128,
    #[serde(default)]
    pub hours: Option<u64>,
    /// Locking script for the output, where the family needs one for
    /// encoding (fee-based UTXO chains).
    #[serde(default)]
    pub locking_script: Option<String>,
    /// True for the output returning leftover coins to the sender.
    #[serde(default)]
    pub is_change: bool,
}

/// A fully-formed transaction as produced by a spending operator.
/// Immutable once returned, except for attaching the signed encoding or a
/// user note.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedTransaction {
    pub inputs: Vec<TransactionInput>,
    pub outputs: Vec<TransactionOutput>,
    /// Total amount sent to the destinations, in smallest units.
    pub amount: u128,
    /// Fee in the family's fee unit: smallest coin units for fee-based
    /// chains, wei for account chains, burned hours for hour chains.
    pub fee: u128,
    /// Display string describing where the coins come from.
    pub from: String,
    /// Display string listing the destination addresses.
    pub to: String,
    /// Encoded payload, hex. Replaced by the signed encoding after signing.
    pub encoded: String,
    /// Inner hash used by the two-step signing of hour-bearing chains.
    #[serde(default)]
    pub inner_hash: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

impl GeneratedTransaction {
    #[must_use]
    pub fn destination_summary(destinations: &[TransactionDestination]) -> String {
        destinations
            .iter()
            .map(|d| d.address.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_destination_summary() {
        let destinations = vec![
            TransactionDestination {
                address: "a1".to_string(),
                amount: 1,
                hours: None,
            },
            TransactionDestination {
                address: "a2".to_string(),
                amount: 2,
                hours: None,
            },
        ];
        assert_eq!(
            GeneratedTransaction::destination_summary(&destinations),
            "a1, a2"
        );
    }
}
