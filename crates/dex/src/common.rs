use anyhow::Result;
use async_trait::async_trait;
use ethers::types::{Address, U256};
use models::{ExchangeId, PoolHandle, Reserves};

/// 单个 V2 风格交易所 (池子 + Router) 的只读交互
///
/// 套利核心只依赖此 trait，测试中可用内存实现替换。
#[async_trait]
pub trait ExchangeClient: Send + Sync {
    /// 该交易所监控的池子
    fn pool(&self) -> &PoolHandle;

    fn exchange(&self) -> ExchangeId {
        self.pool().exchange
    }

    /// 读取池子当前储备量
    async fn get_reserves(&self) -> Result<Reserves>;

    /// 当前区块高度 (与储备读取同一节点)
    async fn block_number(&self) -> Result<u64>;

    /// Router.getAmountsIn: 得到 `amount_out` 需要投入多少
    async fn get_amounts_in(&self, amount_out: U256, path: &[Address]) -> Result<Vec<U256>>;

    /// Router.getAmountsOut: 投入 `amount_in` 能得到多少
    async fn get_amounts_out(&self, amount_in: U256, path: &[Address]) -> Result<Vec<U256>>;
}
