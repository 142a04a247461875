pub mod account;
pub mod hours;
pub mod utxo_fee;

use crate::fees::RecommendedFees;
use async_trait::async_trait;
use mcw_core::errors::WalletError;
use mcw_core::output::UnspentOutput;
use mcw_core::transaction::{GeneratedTransaction, TransactionDestination};
use mcw_core::wallet::WalletBase;

/// Where the coins of a transaction come from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransactionSource {
    /// All addresses of a wallet; software signing may use it too.
    Wallet(WalletBase),
    /// An explicit address list.
    Addresses(Vec<String>),
    /// An explicit output pool, skipping the fetch.
    Outputs(Vec<UnspentOutput>),
}

impl TransactionSource {
    #[must_use]
    pub fn addresses(&self) -> Vec<String> {
        match self {
            TransactionSource::Wallet(wallet) => wallet.address_strings(),
            TransactionSource::Addresses(addresses) => addresses.clone(),
            TransactionSource::Outputs(outputs) => {
                let mut addresses: Vec<String> =
                    outputs.iter().map(|o| o.address.clone()).collect();
                addresses.dedup();
                addresses
            }
        }
    }

    #[must_use]
    pub fn wallet(&self) -> Option<&WalletBase> {
        match self {
            TransactionSource::Wallet(wallet) => Some(wallet),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_hardware(&self) -> bool {
        self.wallet().is_some_and(|w| w.is_hardware)
    }
}

/// Fee input for transaction creation, in the family's unit.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FeeSpec {
    /// Smallest units per byte, for fee-based UTXO chains.
    PerUnit(u64),
    /// Gas price in wei plus the gas limit, for account chains.
    Gas { price: u128, limit: u64 },
    /// The node computes the fee (hour-bearing chains).
    None,
}

/// Builds, signs and broadcasts transactions for one coin family.
#[async_trait]
pub trait SpendingOperator: Send + Sync {
    /// Builds a transaction. With `unsigned` false and a software wallet
    /// source the result is already signed; hardware wallets always go
    /// through [`SpendingOperator::sign_transaction`].
    async fn create_transaction(
        &self,
        source: &TransactionSource,
        destinations: &[TransactionDestination],
        change_address: Option<&str>,
        password: Option<&str>,
        unsigned: bool,
        fee: &FeeSpec,
    ) -> Result<GeneratedTransaction, WalletError>;

    /// Attaches a signature to a previously built transaction, returning
    /// the signed copy. The original is left untouched.
    async fn sign_transaction(
        &self,
        wallet: Option<&WalletBase>,
        password: Option<&str>,
        transaction: &GeneratedTransaction,
    ) -> Result<GeneratedTransaction, WalletError>;

    /// Broadcasts a signed transaction, returning its id.
    async fn broadcast(&self, transaction: &GeneratedTransaction) -> Result<String, WalletError>;

    async fn recommended_fees(&self) -> Result<RecommendedFees, WalletError>;
}

pub(crate) fn check_destinations(
    destinations: &[TransactionDestination],
) -> Result<(), WalletError> {
    if destinations.is_empty() {
        return Err(WalletError::InvalidParameters(
            "at least one destination is required".to_string(),
        ));
    }
    for destination in destinations {
        if destination.amount == 0 {
            return Err(WalletError::InvalidParameters(format!(
                "zero amount for destination {}",
                destination.address
            )));
        }
    }
    Ok(())
}

pub(crate) fn total_amount(destinations: &[TransactionDestination]) -> Result<u128, WalletError> {
    destinations
        .iter()
        .try_fold(0u128, |sum, d| sum.checked_add(d.amount))
        .ok_or_else(|| WalletError::InvalidParameters("destination total overflows".to_string()))
}

/// Picks the change address: the explicit one, the wallet's first
/// address, the first source address, or the first selected output's
/// owner, in that order.
pub(crate) fn resolve_change_address(
    explicit: Option<&str>,
    source: &TransactionSource,
    chosen: &[UnspentOutput],
) -> Result<String, WalletError> {
    if let Some(address) = explicit {
        return Ok(address.to_string());
    }
    if let Some(wallet) = source.wallet() {
        if let Some(address) = wallet.first_address() {
            return Ok(address.to_string());
        }
    }
    if let TransactionSource::Addresses(addresses) = source {
        if let Some(address) = addresses.first() {
            return Ok(address.clone());
        }
    }
    chosen
        .first()
        .map(|o| o.address.clone())
        .ok_or_else(|| WalletError::InvalidParameters("no change address available".to_string()))
}

/// Display string describing the transaction's origin.
pub(crate) fn source_summary(source: &TransactionSource) -> String {
    match source {
        TransactionSource::Wallet(wallet) => wallet.label.clone(),
        TransactionSource::Addresses(addresses) => addresses.join(", "),
        TransactionSource::Outputs(_) => "manually selected outputs".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn destination(address: &str, amount: u128) -> TransactionDestination {
        TransactionDestination {
            address: address.to_string(),
            amount,
            hours: None,
        }
    }

    #[test]
    fn test_check_destinations() {
        assert!(check_destinations(&[]).is_err());
        assert!(check_destinations(&[destination("a", 0)]).is_err());
        assert!(check_destinations(&[destination("a", 1)]).is_ok());
    }

    #[test]
    fn test_total_amount_overflow() {
        let destinations = vec![destination("a", u128::MAX), destination("b", 1)];
        assert!(total_amount(&destinations).is_err());
    }

    #[test]
    fn test_resolve_change_address_priority() {
        let chosen = vec![UnspentOutput {
            hash: "h".to_string(),
            address: "pool-addr".to_string(),
            amount: 1,
            hours: None,
            source_tx: None,
            source_index: None,
        }];
        let source = TransactionSource::Addresses(vec!["src-addr".to_string()]);
        assert_eq!(
            resolve_change_address(Some("explicit"), &source, &chosen).unwrap(),
            "explicit"
        );
        assert_eq!(
            resolve_change_address(None, &source, &chosen).unwrap(),
            "src-addr"
        );
        let outputs_source = TransactionSource::Outputs(chosen.clone());
        assert_eq!(
            resolve_change_address(None, &outputs_source, &chosen).unwrap(),
            "pool-addr"
        );
    }
}
