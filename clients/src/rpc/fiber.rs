use crate::api::fiber::FiberApi;
use crate::api::responses::{
    FiberBalance, FiberCreatedTransaction, FiberOutputEntry, FiberOutputsResponse, FiberProgress,
    FiberTransactionParams,
};
use crate::rpc::{get, get_client, get_url, post};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::io::{Error, ErrorKind};

/// REST client for Skycoin-style nodes.
pub struct FiberClient {
    client: Client,
    base_url: String,
}

impl FiberClient {
    pub fn new(base_url: &str) -> Result<Self, Error> {
        Ok(FiberClient {
            client: get_client(30)?,
            base_url: base_url.to_string(),
        })
    }
}

/// v2 endpoints wrap their payload in a `data` field.
#[derive(Deserialize)]
struct V2Envelope<T> {
    data: T,
}

#[derive(Deserialize)]
struct SignedTransaction {
    encoded_transaction: String,
}

#[async_trait]
impl FiberApi for FiberClient {
    async fn addresses_balance(&self, addresses: &[String]) -> Result<FiberBalance, Error> {
        let url = get_url(&self.base_url, "api/v1/balance");
        let query = [("addrs".to_string(), addresses.join(","))];
        get(&self.client, &url, &query).await
    }

    async fn wallet_balance(&self, wallet_id: &str) -> Result<FiberBalance, Error> {
        let url = get_url(&self.base_url, "api/v1/wallet/balance");
        let query = [("id".to_string(), wallet_id.to_string())];
        get(&self.client, &url, &query).await
    }

    async fn outputs(&self, addresses: &[String]) -> Result<Vec<FiberOutputEntry>, Error> {
        let url = get_url(&self.base_url, "api/v1/outputs");
        let query = [("addrs".to_string(), addresses.join(","))];
        let response: FiberOutputsResponse = get(&self.client, &url, &query).await?;
        Ok(response.head_outputs)
    }

    async fn blockchain_progress(&self) -> Result<FiberProgress, Error> {
        let url = get_url(&self.base_url, "api/v1/blockchain/progress");
        get(&self.client, &url, &[]).await
    }

    async fn create_transaction(
        &self,
        params: &FiberTransactionParams,
    ) -> Result<FiberCreatedTransaction, Error> {
        let data = serde_json::to_value(params)
            .map_err(|e| Error::new(ErrorKind::InvalidData, e.to_string()))?;
        if params.wallet_id.is_some() {
            let url = get_url(&self.base_url, "api/v1/wallet/transaction");
            post(&self.client, &url, &data).await
        } else {
            let url = get_url(&self.base_url, "api/v2/transaction");
            let envelope: V2Envelope<FiberCreatedTransaction> =
                post(&self.client, &url, &data).await?;
            Ok(envelope.data)
        }
    }

    async fn sign_transaction(
        &self,
        wallet_id: &str,
        password: Option<&str>,
        encoded_transaction: &str,
    ) -> Result<String, Error> {
        let url = get_url(&self.base_url, "api/v2/wallet/transaction/sign");
        let mut data = json!({
            "wallet_id": wallet_id,
            "encoded_transaction": encoded_transaction,
        });
        if let Some(password) = password {
            data["password"] = json!(password);
        }
        let envelope: V2Envelope<SignedTransaction> = post(&self.client, &url, &data).await?;
        Ok(envelope.data.encoded_transaction)
    }

    async fn inject_transaction(&self, raw_transaction: &str) -> Result<String, Error> {
        let url = get_url(&self.base_url, "api/v1/injectTransaction");
        let data = json!({ "rawtx": raw_transaction });
        post(&self.client, &url, &data).await
    }
}
