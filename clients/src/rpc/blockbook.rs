use crate::api::blockbook::BlockbookApi;
use crate::api::responses::{BlockbookAddress, BlockbookStatus};
use crate::rpc::{get, get_client, get_url};
use async_trait::async_trait;
use reqwest::Client;
use std::io::Error;

/// REST client for blockbook indexers.
pub struct BlockbookClient {
    client: Client,
    base_url: String,
}

impl BlockbookClient {
    pub fn new(base_url: &str) -> Result<Self, Error> {
        Ok(BlockbookClient {
            client: get_client(30)?,
            base_url: base_url.to_string(),
        })
    }
}

#[async_trait]
impl BlockbookApi for BlockbookClient {
    async fn status(&self) -> Result<BlockbookStatus, Error> {
        let url = get_url(&self.base_url, "api");
        get(&self.client, &url, &[]).await
    }

    async fn address(&self, address: &str) -> Result<BlockbookAddress, Error> {
        let url = get_url(&self.base_url, &format!("api/v2/address/{address}"));
        get(&self.client, &url, &[]).await
    }
}
