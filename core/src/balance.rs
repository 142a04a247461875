use crate::wallet::{WalletBase, WalletType};
use serde::{Deserialize, Serialize};

/// Balance triple in smallest units. `u128` so account-based chains can
/// express wei amounts without overflow.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    /// Coins in confirmed transactions.
    pub confirmed: u128,
    /// Balance the wallet will have once pending transactions confirm.
    pub predicted: u128,
    /// Coins currently spendable.
    pub available: u128,
}

impl Balance {
    /// A pending transaction affects this balance when the confirmed and
    /// predicted amounts disagree.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.confirmed != self.predicted
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressWithBalance {
    pub address: String,
    pub is_change: bool,
    pub balance: Balance,
}

/// A wallet as published by the balance tracker. Instances are owned by the
/// tracker; readers get clones and must never patch balances in place, or
/// the tracker's diffing will miss the change on the next tick.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletWithBalance {
    pub id: String,
    pub label: String,
    pub encrypted: bool,
    pub is_hardware: bool,
    pub wallet_type: WalletType,
    pub balance: Balance,
    pub addresses: Vec<AddressWithBalance>,
}

impl WalletWithBalance {
    /// A zero-balance enrichment of a base wallet, used before the first
    /// node response arrives and when a wallet is unknown to the node.
    #[must_use]
    pub fn from_base(base: &WalletBase) -> Self {
        WalletWithBalance {
            id: base.id.clone(),
            label: base.label.clone(),
            encrypted: base.encrypted,
            is_hardware: base.is_hardware,
            wallet_type: base.wallet_type,
            balance: Balance::default(),
            addresses: base
                .addresses
                .iter()
                .map(|a| AddressWithBalance {
                    address: a.address.clone(),
                    is_change: a.is_change,
                    balance: Balance::default(),
                })
                .collect(),
        }
    }
}
