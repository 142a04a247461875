use crate::api::responses::{BlockbookAddress, BlockbookStatus};
use async_trait::async_trait;
use std::io::Error;

/// REST surface of blockbook indexers, shared by the utxo and account
/// coin integrations.
#[async_trait]
pub trait BlockbookApi {
    async fn status(&self) -> Result<BlockbookStatus, Error>;
    async fn address(&self, address: &str) -> Result<BlockbookAddress, Error>;
}
