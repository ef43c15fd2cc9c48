use anyhow::{Context, Result};
use async_trait::async_trait;
use dex::Erc20;
use ethers::prelude::*;
use ethers::types::{Address, U256};
use std::sync::Arc;

/// 钱包余额与链状态读取 (仅用于余额报告)
#[async_trait]
pub trait WalletReader: Send + Sync {
    /// 钱包地址
    fn address(&self) -> Address;

    /// 原生币余额 (wei)
    async fn native_balance(&self) -> Result<U256>;

    /// ERC20 余额 (链上单位)
    async fn token_balance(&self, token: Address) -> Result<U256>;

    /// 当前区块高度
    async fn block_number(&self) -> Result<u64>;
}

/// 通过 RPC 读取指定地址的余额
pub struct ChainWallet<M: Middleware> {
    provider: Arc<M>,
    address: Address,
}

impl<M: Middleware + 'static> ChainWallet<M> {
    pub fn new(provider: Arc<M>, address: Address) -> Self {
        Self { provider, address }
    }
}

#[async_trait]
impl<M: Middleware + 'static> WalletReader for ChainWallet<M> {
    fn address(&self) -> Address {
        self.address
    }

    async fn native_balance(&self) -> Result<U256> {
        self.provider
            .get_balance(self.address, None)
            .await
            .map_err(|e| anyhow::anyhow!("{}", e))
            .context("读取原生币余额失败")
    }

    async fn token_balance(&self, token: Address) -> Result<U256> {
        Erc20::new(token, self.provider.clone())
            .balance_of(self.address)
            .call()
            .await
            .with_context(|| format!("读取代币余额失败: {:?}", token))
    }

    async fn block_number(&self) -> Result<u64> {
        let number = self
            .provider
            .get_block_number()
            .await
            .map_err(|e| anyhow::anyhow!("{}", e))
            .context("读取区块高度失败")?;
        Ok(number.as_u64())
    }
}

/// 可共享的钱包读取器
pub type SharedWalletReader = Arc<dyn WalletReader>;
