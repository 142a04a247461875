use crate::fees::RecommendedFees;
use crate::hardware::{
    check_hardware_limits, check_signature_count, HardwareSignRequest, HardwareSigner,
};
use crate::sources::units_from_display;
use crate::spending::{
    check_destinations, source_summary, total_amount, FeeSpec, SpendingOperator, TransactionSource,
};
use async_trait::async_trait;
use mcw_clients::api::fiber::FiberApi;
use mcw_clients::api::responses::{
    FiberDestinationParam, FiberHoursSelection, FiberTransactionParams,
};
use mcw_core::coins::Coin;
use mcw_core::errors::WalletError;
use mcw_core::formatting::{display_amount, hex_to_bytes};
use mcw_core::transaction::{
    GeneratedTransaction, TransactionDestination, TransactionInput, TransactionOutput,
};
use mcw_core::wallet::WalletBase;
use mcw_wire::base58::HoursAddress;
use mcw_wire::hours::{self, HoursOutput, SIGNATURE_LENGTH};
use std::sync::Arc;

/// Spending operator for hour-bearing UTXO chains. The node builds and
/// fee-calculates transactions; only hardware-wallet signature splicing
/// happens locally.
pub struct HoursOperator {
    coin: Coin,
    api: Arc<dyn FiberApi + Send + Sync>,
    hardware: Option<Arc<dyn HardwareSigner>>,
}

impl HoursOperator {
    #[must_use]
    pub fn new(
        coin: Coin,
        api: Arc<dyn FiberApi + Send + Sync>,
        hardware: Option<Arc<dyn HardwareSigner>>,
    ) -> Self {
        HoursOperator {
            coin,
            api,
            hardware,
        }
    }

    async fn sign_with_hardware(
        &self,
        transaction: &GeneratedTransaction,
    ) -> Result<GeneratedTransaction, WalletError> {
        check_hardware_limits(transaction.inputs.len(), transaction.outputs.len())?;
        let signer = self.hardware.as_ref().ok_or_else(|| {
            WalletError::InvalidParameters("no hardware signer available".to_string())
        })?;
        let inner_hash_hex = transaction.inner_hash.as_ref().ok_or_else(|| {
            WalletError::Encoding("transaction has no inner hash to sign".to_string())
        })?;

        let request = HardwareSignRequest {
            coin_symbol: self.coin.symbol.clone(),
            inputs: transaction.inputs.clone(),
            outputs: transaction.outputs.clone(),
            inner_hash: Some(inner_hash_hex.clone()),
        };
        let raw_signatures = signer.sign_transaction(&request).await?;
        check_signature_count(&raw_signatures, transaction.inputs.len())?;
        let signatures: Vec<[u8; SIGNATURE_LENGTH]> = raw_signatures
            .iter()
            .map(|signature| {
                signature.0.as_slice().try_into().map_err(|_| {
                    WalletError::Encoding(format!(
                        "device signature must be {SIGNATURE_LENGTH} bytes, got {}",
                        signature.0.len()
                    ))
                })
            })
            .collect::<Result<_, _>>()?;

        let inner_hash = to_hash32(inner_hash_hex)?;
        let inputs: Vec<[u8; 32]> = transaction
            .inputs
            .iter()
            .map(|input| to_hash32(&input.hash))
            .collect::<Result<_, _>>()?;
        let outputs: Vec<HoursOutput> = transaction
            .outputs
            .iter()
            .map(|output| {
                Ok(HoursOutput {
                    address: HoursAddress::from_base58(&output.address)
                        .map_err(|_| WalletError::InvalidAddress(output.address.clone()))?,
                    coins: u64::try_from(output.amount)
                        .map_err(|_| WalletError::Encoding("output value overflows".to_string()))?,
                    hours: output.hours.unwrap_or(0),
                })
            })
            .collect::<Result<_, WalletError>>()?;

        let mut signed = transaction.clone();
        signed.encoded = hex::encode(hours::encode(&inner_hash, &signatures, &inputs, &outputs));
        Ok(signed)
    }
}

fn to_hash32(hex_str: &str) -> Result<[u8; 32], WalletError> {
    hex_to_bytes(hex_str)?
        .as_slice()
        .try_into()
        .map_err(|_| WalletError::Encoding(format!("expected a 32-byte hash: {hex_str}")))
}

fn hours_selection(destinations: &[TransactionDestination]) -> FiberHoursSelection {
    if destinations.iter().all(|d| d.hours.is_some()) {
        FiberHoursSelection {
            selection_type: "manual".to_string(),
            mode: None,
            share_factor: None,
        }
    } else {
        FiberHoursSelection::default()
    }
}

#[async_trait]
impl SpendingOperator for HoursOperator {
    async fn create_transaction(
        &self,
        source: &TransactionSource,
        destinations: &[TransactionDestination],
        change_address: Option<&str>,
        password: Option<&str>,
        unsigned: bool,
        fee: &FeeSpec,
    ) -> Result<GeneratedTransaction, WalletError> {
        check_destinations(destinations)?;
        if !matches!(fee, FeeSpec::None) {
            return Err(WalletError::InvalidParameters(
                "the node computes hour fees; no fee rate applies".to_string(),
            ));
        }
        for destination in destinations {
            HoursAddress::from_base58(&destination.address)
                .map_err(|_| WalletError::InvalidAddress(destination.address.clone()))?;
        }
        let hardware = source.is_hardware();
        if !unsigned && !hardware && source.wallet().is_none() {
            return Err(WalletError::InvalidParameters(
                "a wallet is required to sign".to_string(),
            ));
        }
        // Hardware wallets sign locally, so the node must not.
        let build_unsigned = unsigned || hardware;

        let change = change_address
            .map(ToString::to_string)
            .or_else(|| {
                source
                    .wallet()
                    .and_then(|w| w.first_address().map(String::from))
            })
            .or_else(|| match source {
                TransactionSource::Addresses(addresses) => addresses.first().cloned(),
                _ => None,
            });

        let mut params = FiberTransactionParams {
            hours_selection: hours_selection(destinations),
            to: destinations
                .iter()
                .map(|d| FiberDestinationParam {
                    address: d.address.clone(),
                    coins: display_amount(d.amount, self.coin.decimals),
                    hours: d.hours.map(|h| h.to_string()),
                })
                .collect(),
            change_address: change,
            ..Default::default()
        };
        match source {
            TransactionSource::Wallet(wallet) if !build_unsigned => {
                params.wallet_id = Some(wallet.id.clone());
                params.password = password.map(ToString::to_string);
            }
            TransactionSource::Wallet(wallet) => {
                params.addresses = Some(wallet.address_strings());
                params.unsigned = Some(true);
            }
            TransactionSource::Addresses(addresses) => {
                params.addresses = Some(addresses.clone());
                params.unsigned = Some(true);
            }
            TransactionSource::Outputs(outputs) => {
                params.unspents = Some(outputs.iter().map(|o| o.hash.clone()).collect());
                params.unsigned = Some(true);
            }
        }

        let created = self.api.create_transaction(&params).await?;
        let inputs: Vec<TransactionInput> = created
            .transaction
            .inputs
            .iter()
            .map(|input| {
                Ok(TransactionInput {
                    hash: input.uxid.clone(),
                    address: input.address.clone(),
                    amount: u128::from(units_from_display(&input.coins, self.coin.decimals)?),
                    hours: Some(input.calculated_hours),
                })
            })
            .collect::<Result<_, WalletError>>()?;
        let outputs: Vec<TransactionOutput> = created
            .transaction
            .outputs
            .iter()
            .map(|output| {
                let is_change = !destinations.iter().any(|d| d.address == output.address);
                Ok(TransactionOutput {
                    address: output.address.clone(),
                    amount: u128::from(units_from_display(&output.coins, self.coin.decimals)?),
                    hours: Some(output.hours),
                    locking_script: None,
                    is_change,
                })
            })
            .collect::<Result<_, WalletError>>()?;

        let transaction = GeneratedTransaction {
            inputs,
            outputs,
            amount: total_amount(destinations)?,
            fee: u128::from(created.transaction.fee),
            from: source_summary(source),
            to: GeneratedTransaction::destination_summary(destinations),
            encoded: created.encoded_transaction,
            inner_hash: Some(created.transaction.inner_hash),
            note: None,
        };

        if !unsigned && hardware {
            return self.sign_transaction(source.wallet(), None, &transaction).await;
        }
        Ok(transaction)
    }

    async fn sign_transaction(
        &self,
        wallet: Option<&WalletBase>,
        password: Option<&str>,
        transaction: &GeneratedTransaction,
    ) -> Result<GeneratedTransaction, WalletError> {
        let wallet = wallet.ok_or_else(|| {
            WalletError::InvalidParameters("a wallet is required to sign".to_string())
        })?;
        if wallet.is_hardware {
            return self.sign_with_hardware(transaction).await;
        }
        let encoded = self
            .api
            .sign_transaction(&wallet.id, password, &transaction.encoded)
            .await?;
        let mut signed = transaction.clone();
        signed.encoded = encoded;
        Ok(signed)
    }

    async fn broadcast(&self, transaction: &GeneratedTransaction) -> Result<String, WalletError> {
        Ok(self.api.inject_transaction(&transaction.encoded).await?)
    }

    async fn recommended_fees(&self) -> Result<RecommendedFees, WalletError> {
        // Fees are hours burned by the node; there is no rate to pick.
        Ok(RecommendedFees::uniform(0))
    }
}
