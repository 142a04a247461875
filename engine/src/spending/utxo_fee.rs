use crate::coin_select::select;
use crate::fees::{FeeModel, RecommendedFees};
use crate::hardware::{
    check_hardware_limits, check_signature_count, HardwareSignRequest, HardwareSigner,
};
use crate::spending::{
    check_destinations, resolve_change_address, source_summary, total_amount, FeeSpec,
    SpendingOperator, TransactionSource,
};
use async_trait::async_trait;
use log::debug;
use mcw_clients::api::btc::BtcApi;
use mcw_core::coins::Coin;
use mcw_core::errors::WalletError;
use mcw_core::formatting::hex_to_bytes;
use mcw_core::output::UnspentOutput;
use mcw_core::transaction::{
    GeneratedTransaction, TransactionDestination, TransactionInput, TransactionOutput,
};
use mcw_core::wallet::WalletBase;
use mcw_wire::utxo::{self, UtxoInput, UtxoOutput};
use std::sync::Arc;

/// Block targets queried for the fee tiers, slowest to fastest.
const FEE_TIER_BLOCKS: [u64; 4] = [20, 10, 5, 1];

/// Spending operator for fee-based UTXO chains: local coin selection,
/// byte-proportional fees, raw-transaction encoding.
pub struct UtxoFeeOperator {
    coin: Coin,
    api: Arc<dyn BtcApi + Send + Sync>,
    hardware: Option<Arc<dyn HardwareSigner>>,
}

impl UtxoFeeOperator {
    #[must_use]
    pub fn new(
        coin: Coin,
        api: Arc<dyn BtcApi + Send + Sync>,
        hardware: Option<Arc<dyn HardwareSigner>>,
    ) -> Self {
        UtxoFeeOperator {
            coin,
            api,
            hardware,
        }
    }

    /// Locking script for an address, via the node's address validation.
    async fn script_for_address(&self, address: &str) -> Result<Vec<u8>, WalletError> {
        let validation = self.api.validate_address(address).await?;
        if !validation.isvalid {
            return Err(WalletError::InvalidAddress(address.to_string()));
        }
        let script = validation.script_pub_key.ok_or_else(|| {
            WalletError::UnexpectedResponse(format!("node returned no script for {address}"))
        })?;
        hex_to_bytes(script)
    }

    async fn fetch_pool(
        &self,
        source: &TransactionSource,
    ) -> Result<Vec<UnspentOutput>, WalletError> {
        if let TransactionSource::Outputs(outputs) = source {
            return Ok(outputs.clone());
        }
        let unspent = self
            .api
            .list_unspent(u64::from(self.coin.confirmations_needed), &source.addresses())
            .await?;
        let factor = 10f64.powi(self.coin.decimals as i32);
        unspent
            .into_iter()
            .map(|entry| {
                let amount = entry.amount * factor;
                if !amount.is_finite() || amount < 0.0 {
                    return Err(WalletError::UnexpectedResponse(format!(
                        "invalid unspent amount: {}",
                        entry.amount
                    )));
                }
                Ok(UnspentOutput {
                    hash: format!("{}/{}", entry.txid, entry.vout),
                    address: entry.address.clone(),
                    amount: amount.round() as u64,
                    hours: None,
                    source_tx: Some(entry.txid),
                    source_index: Some(entry.vout),
                })
            })
            .collect()
    }

    /// Wire inputs for the chosen outputs. The script of each input is the
    /// locking script of the output being spent, fetched per input; it is
    /// what signers sign against and what the unsigned encoding carries.
    async fn wire_inputs(&self, inputs: &[TransactionInput]) -> Result<Vec<UtxoInput>, WalletError> {
        let mut wire = Vec::with_capacity(inputs.len());
        for input in inputs {
            let (tx, vout) = split_input_id(&input.hash)?;
            let tx_out = self.api.get_tx_out(&tx, vout).await?.ok_or_else(|| {
                WalletError::UnexpectedResponse(format!("output {} is already spent", input.hash))
            })?;
            wire.push(UtxoInput {
                prev_tx: tx,
                vout,
                script: hex_to_bytes(tx_out.script_pub_key.hex)?,
            });
        }
        Ok(wire)
    }

    async fn sign_with_hardware(
        &self,
        transaction: &GeneratedTransaction,
    ) -> Result<GeneratedTransaction, WalletError> {
        check_hardware_limits(transaction.inputs.len(), transaction.outputs.len())?;
        let signer = self.hardware.as_ref().ok_or_else(|| {
            WalletError::InvalidParameters("no hardware signer available".to_string())
        })?;
        let request = HardwareSignRequest {
            coin_symbol: self.coin.symbol.clone(),
            inputs: transaction.inputs.clone(),
            outputs: transaction.outputs.clone(),
            inner_hash: None,
        };
        let signatures = signer.sign_transaction(&request).await?;
        check_signature_count(&signatures, transaction.inputs.len())?;

        let mut wire_inputs = Vec::with_capacity(transaction.inputs.len());
        for (input, signature) in transaction.inputs.iter().zip(&signatures) {
            let (tx, vout) = split_input_id(&input.hash)?;
            wire_inputs.push(UtxoInput {
                prev_tx: tx,
                vout,
                script: signature.0.clone(),
            });
        }
        let wire_outputs = wire_outputs(&transaction.outputs)?;
        let encoded = utxo::encode(&wire_inputs, &wire_outputs)
            .map_err(|e| WalletError::Encoding(e.to_string()))?;

        let mut signed = transaction.clone();
        signed.encoded = hex::encode(encoded);
        Ok(signed)
    }
}

fn split_input_id(hash: &str) -> Result<(String, u32), WalletError> {
    let (tx, vout) = hash
        .split_once('/')
        .ok_or_else(|| WalletError::Encoding(format!("malformed input id: {hash}")))?;
    let vout = vout
        .parse()
        .map_err(|_| WalletError::Encoding(format!("malformed input id: {hash}")))?;
    Ok((tx.to_string(), vout))
}

fn wire_outputs(outputs: &[TransactionOutput]) -> Result<Vec<UtxoOutput>, WalletError> {
    outputs
        .iter()
        .map(|output| {
            let script = output.locking_script.as_ref().ok_or_else(|| {
                WalletError::Encoding(format!("output {} has no script", output.address))
            })?;
            Ok(UtxoOutput {
                value: u64::try_from(output.amount)
                    .map_err(|_| WalletError::Encoding("output value overflows".to_string()))?,
                script: hex_to_bytes(script)?,
            })
        })
        .collect()
}

#[async_trait]
impl SpendingOperator for UtxoFeeOperator {
    async fn create_transaction(
        &self,
        source: &TransactionSource,
        destinations: &[TransactionDestination],
        change_address: Option<&str>,
        _password: Option<&str>,
        unsigned: bool,
        fee: &FeeSpec,
    ) -> Result<GeneratedTransaction, WalletError> {
        check_destinations(destinations)?;
        let FeeSpec::PerUnit(rate) = fee else {
            return Err(WalletError::InvalidParameters(
                "this coin family needs a per-byte fee rate".to_string(),
            ));
        };
        let rate = (*rate).max(self.coin.min_fee_per_unit);

        // Sequentially validate every destination and collect its script.
        let mut destination_scripts = Vec::with_capacity(destinations.len());
        for destination in destinations {
            destination_scripts.push(self.script_for_address(&destination.address).await?);
        }

        let pool = self.fetch_pool(source).await?;
        let target = u64::try_from(total_amount(destinations)?).map_err(|_| {
            WalletError::InvalidParameters("amount too large for this coin".to_string())
        })?;
        let model = FeeModel::byte_proportional();
        let selection = select(&pool, target, destinations.len(), u128::from(rate), &model)?;
        if !selection.sufficient {
            return Err(WalletError::InsufficientFunds);
        }
        debug!(
            "selected {} inputs, fee {} for target {}",
            selection.chosen.len(),
            selection.fee,
            target
        );

        let change_addr = resolve_change_address(change_address, source, &selection.chosen)?;
        let inputs: Vec<TransactionInput> = selection
            .chosen
            .iter()
            .map(|output| TransactionInput {
                hash: output.hash.clone(),
                address: output.address.clone(),
                amount: u128::from(output.amount),
                hours: None,
            })
            .collect();

        let mut outputs: Vec<TransactionOutput> = destinations
            .iter()
            .zip(destination_scripts)
            .map(|(destination, script)| TransactionOutput {
                address: destination.address.clone(),
                amount: destination.amount,
                hours: None,
                locking_script: Some(hex::encode(script)),
                is_change: false,
            })
            .collect();
        if selection.change > 0 {
            let change_script = self.script_for_address(&change_addr).await?;
            outputs.push(TransactionOutput {
                address: change_addr,
                amount: selection.change,
                hours: None,
                locking_script: Some(hex::encode(change_script)),
                is_change: true,
            });
        }

        let wire_inputs = self.wire_inputs(&inputs).await?;
        let encoded = utxo::encode(&wire_inputs, &wire_outputs(&outputs)?)
            .map_err(|e| WalletError::Encoding(e.to_string()))?;

        let transaction = GeneratedTransaction {
            inputs,
            outputs,
            amount: u128::from(target),
            fee: selection.fee,
            from: source_summary(source),
            to: GeneratedTransaction::destination_summary(destinations),
            encoded: hex::encode(encoded),
            inner_hash: None,
            note: None,
        };
        if unsigned {
            return Ok(transaction);
        }
        self.sign_transaction(source.wallet(), None, &transaction)
            .await
    }

    async fn sign_transaction(
        &self,
        wallet: Option<&WalletBase>,
        _password: Option<&str>,
        transaction: &GeneratedTransaction,
    ) -> Result<GeneratedTransaction, WalletError> {
        if wallet.is_some_and(|w| w.is_hardware) {
            return self.sign_with_hardware(transaction).await;
        }
        Err(WalletError::InvalidParameters(
            "this coin family has no node-side signing; use a hardware wallet".to_string(),
        ))
    }

    async fn broadcast(&self, transaction: &GeneratedTransaction) -> Result<String, WalletError> {
        Ok(self.api.send_raw_transaction(&transaction.encoded).await?)
    }

    async fn recommended_fees(&self) -> Result<RecommendedFees, WalletError> {
        let mut tiers = [0u128; 4];
        for (tier, blocks) in tiers.iter_mut().zip(FEE_TIER_BLOCKS) {
            // A node without an estimate still gets the floor rate.
            let rate = match self.api.estimate_fee_per_byte(blocks).await {
                Ok(Some(rate)) => rate,
                Ok(None) | Err(_) => 1,
            };
            *tier = u128::from(rate.max(self.coin.min_fee_per_unit).max(1));
        }
        Ok(RecommendedFees::from_tiers(
            tiers[0], tiers[1], tiers[2], tiers[3],
        ))
    }
}
