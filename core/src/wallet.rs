use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WalletType {
    /// Legacy deterministic seed wallets.
    Deterministic,
    /// BIP-44-like hierarchical wallets.
    Bip44,
    /// Watch-only wallets tracking a public key or address list.
    XPub,
}

/// An address as known before any balance enrichment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressBase {
    pub address: String,
    /// Marks addresses the wallet created to receive change.
    #[serde(default)]
    pub is_change: bool,
}

/// Wallet identity plus its ordered address list. Created by import or
/// generation (outside this engine), mutated only by appending addresses.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletBase {
    pub id: String,
    pub label: String,
    pub encrypted: bool,
    pub is_hardware: bool,
    pub wallet_type: WalletType,
    pub addresses: Vec<AddressBase>,
}

impl WalletBase {
    #[must_use]
    pub fn address_strings(&self) -> Vec<String> {
        self.addresses.iter().map(|a| a.address.clone()).collect()
    }

    #[must_use]
    pub fn first_address(&self) -> Option<&str> {
        self.addresses.first().map(|a| a.address.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_wallet() -> WalletBase {
        WalletBase {
            id: "w1".to_string(),
            label: "Main".to_string(),
            encrypted: false,
            is_hardware: false,
            wallet_type: WalletType::Deterministic,
            addresses: vec![
                AddressBase {
                    address: "addr-a".to_string(),
                    is_change: false,
                },
                AddressBase {
                    address: "addr-b".to_string(),
                    is_change: true,
                },
            ],
        }
    }

    #[test]
    fn test_address_strings() {
        let wallet = test_wallet();
        assert_eq!(wallet.address_strings(), vec!["addr-a", "addr-b"]);
        assert_eq!(wallet.first_address(), Some("addr-a"));
    }
}
