use crate::api::responses::{
    FiberBalance, FiberCreatedTransaction, FiberOutputEntry, FiberProgress, FiberTransactionParams,
};
use async_trait::async_trait;
use std::io::Error;

/// API of hour-bearing nodes (Skycoin and fiber chains).
#[async_trait]
pub trait FiberApi {
    async fn addresses_balance(&self, addresses: &[String]) -> Result<FiberBalance, Error>;
    async fn wallet_balance(&self, wallet_id: &str) -> Result<FiberBalance, Error>;
    async fn outputs(&self, addresses: &[String]) -> Result<Vec<FiberOutputEntry>, Error>;
    async fn blockchain_progress(&self) -> Result<FiberProgress, Error>;
    /// Asks the node to build a transaction without broadcasting it.
    async fn create_transaction(
        &self,
        params: &FiberTransactionParams,
    ) -> Result<FiberCreatedTransaction, Error>;
    /// Signs a previously built transaction with a software wallet held by
    /// the node. Returns the signed raw transaction, hex encoded.
    async fn sign_transaction(
        &self,
        wallet_id: &str,
        password: Option<&str>,
        encoded_transaction: &str,
    ) -> Result<String, Error>;
    /// Broadcasts a raw transaction, returning its id.
    async fn inject_transaction(&self, raw_transaction: &str) -> Result<String, Error>;
}
