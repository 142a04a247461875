use crate::fees::RecommendedFees;
use crate::hardware::{check_signature_count, HardwareSignRequest, HardwareSigner};
use crate::spending::{
    check_destinations, source_summary, FeeSpec, SpendingOperator, TransactionSource,
};
use async_trait::async_trait;
use mcw_clients::api::eth::EthApi;
use mcw_core::coins::Coin;
use mcw_core::errors::WalletError;
use mcw_core::formatting::{hex_to_bytes, prep_hex_str};
use mcw_core::transaction::{
    GeneratedTransaction, TransactionDestination, TransactionInput, TransactionOutput,
};
use mcw_core::wallet::WalletBase;
use mcw_wire::rlp::{add_signature, encode_unsigned, AccountTransaction};
use std::sync::Arc;

/// Spending operator for account-based chains: one source address, one
/// destination, a fresh nonce per transaction and RLP encoding.
pub struct AccountOperator {
    coin: Coin,
    node: Arc<dyn EthApi + Send + Sync>,
    hardware: Option<Arc<dyn HardwareSigner>>,
}

impl AccountOperator {
    #[must_use]
    pub fn new(
        coin: Coin,
        node: Arc<dyn EthApi + Send + Sync>,
        hardware: Option<Arc<dyn HardwareSigner>>,
    ) -> Self {
        AccountOperator {
            coin,
            node,
            hardware,
        }
    }

    fn chain_id(&self) -> Result<u64, WalletError> {
        self.coin.chain_id.ok_or_else(|| {
            WalletError::InvalidParameters(format!("coin {} has no chain id", self.coin.symbol))
        })
    }

    async fn sign_with_hardware(
        &self,
        transaction: &GeneratedTransaction,
    ) -> Result<GeneratedTransaction, WalletError> {
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
        check_signature_count(&signatures, 1)?;
        // r(32) || s(32) || recovery bit.
        let bytes = &signatures[0].0;
        if bytes.len() != 65 {
            return Err(WalletError::Encoding(format!(
                "device signature must be 65 bytes, got {}",
                bytes.len()
            )));
        }
        let r: [u8; 32] = bytes[0..32].try_into().expect("length checked");
        let s: [u8; 32] = bytes[32..64].try_into().expect("length checked");
        let recovery_bit = bytes[64];

        let raw = hex_to_bytes(&transaction.encoded)?;
        let signed_raw = add_signature(&raw, self.chain_id()?, &r, &s, recovery_bit)
            .map_err(|e| WalletError::Encoding(e.to_string()))?;
        let mut signed = transaction.clone();
        signed.encoded = hex::encode(signed_raw);
        Ok(signed)
    }
}

fn parse_eth_address(address: &str) -> Result<[u8; 20], WalletError> {
    let stripped = prep_hex_str(address);
    if stripped.len() != 40 {
        return Err(WalletError::InvalidAddress(address.to_string()));
    }
    hex_to_bytes(stripped)
        .map_err(|_| WalletError::InvalidAddress(address.to_string()))?
        .as_slice()
        .try_into()
        .map_err(|_| WalletError::InvalidAddress(address.to_string()))
}

#[async_trait]
impl SpendingOperator for AccountOperator {
    async fn create_transaction(
        &self,
        source: &TransactionSource,
        destinations: &[TransactionDestination],
        _change_address: Option<&str>,
        _password: Option<&str>,
        unsigned: bool,
        fee: &FeeSpec,
    ) -> Result<GeneratedTransaction, WalletError> {
        check_destinations(destinations)?;
        let [destination] = destinations else {
            return Err(WalletError::InvalidParameters(
                "account chains send to exactly one destination".to_string(),
            ));
        };
        let source_addresses = source.addresses();
        let [source_address] = source_addresses.as_slice() else {
            return Err(WalletError::InvalidParameters(
                "account chains spend from exactly one address".to_string(),
            ));
        };
        let FeeSpec::Gas { price, limit } = fee else {
            return Err(WalletError::InvalidParameters(
                "this coin family needs a gas price and limit".to_string(),
            ));
        };
        if *price == 0 || *limit == 0 {
            return Err(WalletError::InvalidParameters(
                "gas price and limit must be nonzero".to_string(),
            ));
        }
        let to = parse_eth_address(&destination.address)?;
        parse_eth_address(source_address)?;

        // Fetched immediately before encoding so another in-flight
        // transaction from the same address cannot reuse the nonce.
        let nonce = self.node.get_transaction_count(source_address).await?;
        let wire = AccountTransaction {
            nonce,
            gas_price: *price,
            gas_limit: *limit,
            to,
            value: destination.amount,
            data: Vec::new(),
            chain_id: self.chain_id()?,
        };

        let transaction = GeneratedTransaction {
            inputs: vec![TransactionInput {
                hash: String::new(),
                address: source_address.clone(),
                amount: destination.amount,
                hours: None,
            }],
            outputs: vec![TransactionOutput {
                address: destination.address.clone(),
                amount: destination.amount,
                hours: None,
                locking_script: None,
                is_change: false,
            }],
            amount: destination.amount,
            fee: u128::from(*limit) * price,
            from: source_summary(source),
            to: destination.address.clone(),
            encoded: hex::encode(encode_unsigned(&wire)),
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
        Ok(self.node.send_raw_transaction(&transaction.encoded).await?)
    }

    async fn recommended_fees(&self) -> Result<RecommendedFees, WalletError> {
        // The node advertises a single suggested gas price.
        Ok(RecommendedFees::uniform(self.node.gas_price().await?))
    }
}
