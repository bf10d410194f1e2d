use crate::settings::IndexerSettings;
use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use ethers::{
    contract::abigen,
    providers::{Http, Middleware, Provider},
    types::{Address, Filter, Log, TransactionReceipt, H256, U256},
};
use std::{future::Future, sync::Arc, time::Duration};

abigen!(
    SharePool,
    r#"[
        event Join(address indexed player, address indexed referrer, uint256 amountPaid)
        event Raid(address indexed attacker, address indexed target, uint256 sharesStolen, uint256 selfPenalty)
        event Claim(address indexed player, uint256 amount)
        function sharesOf(address player) external view returns (uint256)
    ]"#
);

/// Read side of the chain node. Kept behind a trait so cycles can run against
/// a scripted chain in tests.
#[async_trait]
pub trait ChainReader {
    async fn current_height(&self) -> Result<u64>;
    async fn logs(&self, topic0: H256, from_block: u64, to_block: u64) -> Result<Vec<Log>>;
    async fn receipt(&self, transaction_hash: H256) -> Result<Option<TransactionReceipt>>;
    async fn share_balance(&self, address: Address) -> Result<U256>;
    async fn block_timestamp(&self, block_number: u64) -> Result<u64>;
}

pub struct RpcReader {
    provider: Provider<Http>,
    pool: SharePool<Provider<Http>>,
    pool_address: Address,
    request_timeout: Duration,
}

impl RpcReader {
    pub fn new(settings: &IndexerSettings) -> Result<Self> {
        if settings.rpc_url.trim().is_empty() {
            bail!("rpc url is not configured");
        }
        if settings.pool_address == Address::zero() {
            bail!("pool contract address is not configured");
        }
        let provider = Provider::<Http>::try_from(settings.rpc_url.as_str())?;
        let pool = SharePool::new(settings.pool_address, Arc::new(provider.clone()));
        Ok(Self {
            provider,
            pool,
            pool_address: settings.pool_address,
            request_timeout: settings.request_timeout,
        })
    }

    async fn with_timeout<T, E, F>(&self, fut: F) -> Result<T>
    where
        E: Into<anyhow::Error>,
        F: Future<Output = Result<T, E>> + Send,
    {
        tokio::time::timeout(self.request_timeout, fut)
            .await
            .map_err(|_| anyhow!("rpc request timed out"))?
            .map_err(Into::into)
    }
}

#[async_trait]
impl ChainReader for RpcReader {
    async fn current_height(&self) -> Result<u64> {
        let height = self.with_timeout(self.provider.get_block_number()).await?;
        Ok(height.as_u64())
    }

    async fn logs(&self, topic0: H256, from_block: u64, to_block: u64) -> Result<Vec<Log>> {
        let filter = Filter::new()
            .address(self.pool_address)
            .topic0(topic0)
            .from_block(from_block)
            .to_block(to_block);
        self.with_timeout(self.provider.get_logs(&filter)).await
    }

    async fn receipt(&self, transaction_hash: H256) -> Result<Option<TransactionReceipt>> {
        self.with_timeout(self.provider.get_transaction_receipt(transaction_hash))
            .await
    }

    async fn share_balance(&self, address: Address) -> Result<U256> {
        self.with_timeout(self.pool.shares_of(address).call()).await
    }

    async fn block_timestamp(&self, block_number: u64) -> Result<u64> {
        let block = self
            .with_timeout(self.provider.get_block(block_number))
            .await?
            .ok_or_else(|| anyhow!("block {block_number} not found"))?;
        Ok(block.timestamp.as_u64())
    }
}
