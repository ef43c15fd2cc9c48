use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use ethers::prelude::*;
use ethers::types::{Address, H256, U256};
use models::{ExchangeId, PoolHandle, Reserves};
use std::sync::Arc;
use tracing::info;

use crate::common::ExchangeClient;

// Uniswap V2 Pair ABI
abigen!(
    UniswapV2Pair,
    r#"[
        function token0() external view returns (address)
        function token1() external view returns (address)
        function getReserves() external view returns (uint112 reserve0, uint112 reserve1, uint32 blockTimestampLast)
        event Swap(address indexed sender, uint amount0In, uint amount1In, uint amount0Out, uint amount1Out, address indexed to)
    ]"#
);

// Uniswap V2 Factory ABI
abigen!(
    UniswapV2Factory,
    r#"[
        function getPair(address tokenA, address tokenB) external view returns (address pair)
    ]"#
);

// Uniswap V2 Router02 ABI (只需要报价函数)
abigen!(
    UniswapV2Router,
    r#"[
        function getAmountsOut(uint256 amountIn, address[] path) external view returns (uint256[] amounts)
        function getAmountsIn(uint256 amountOut, address[] path) external view returns (uint256[] amounts)
    ]"#
);

lazy_static::lazy_static! {
    /// Swap 事件 topic0, 用于 WebSocket 日志订阅
    pub static ref SWAP_EVENT_TOPIC: H256 = SwapFilter::signature();
}

/// Uniswap V2 风格交易所 (Uniswap / SushiSwap 等 fork 共用)
pub struct UniswapV2Exchange<M: Middleware> {
    pool: PoolHandle,
    provider: Arc<M>,
    pair: UniswapV2Pair<M>,
    router: UniswapV2Router<M>,
}

impl<M: Middleware + 'static> UniswapV2Exchange<M> {
    pub fn new(provider: Arc<M>, pool: PoolHandle) -> Self {
        let pair = UniswapV2Pair::new(pool.pair_address, provider.clone());
        let router = UniswapV2Router::new(pool.router_address, provider.clone());
        Self {
            pool,
            provider,
            pair,
            router,
        }
    }

    /// 通过 Factory 查找交易对并读取 token0/token1
    ///
    /// 交易对不存在 (getPair 返回零地址) 视为配置错误。
    pub async fn discover(
        provider: Arc<M>,
        exchange: ExchangeId,
        name: &str,
        factory_address: Address,
        router_address: Address,
        token_a: Address,
        token_b: Address,
    ) -> Result<Self> {
        let factory = UniswapV2Factory::new(factory_address, provider.clone());
        let pair_address = factory
            .get_pair(token_a, token_b)
            .call()
            .await
            .with_context(|| format!("[{}] 调用 getPair 失败", name))?;

        if pair_address == Address::zero() {
            bail!("[{}] 交易对不存在: {:?} / {:?}", name, token_a, token_b);
        }

        let pair = UniswapV2Pair::new(pair_address, provider.clone());
        let token0 = pair
            .token_0()
            .call()
            .await
            .with_context(|| format!("[{}] 读取 token0 失败", name))?;
        let token1 = pair
            .token_1()
            .call()
            .await
            .with_context(|| format!("[{}] 读取 token1 失败", name))?;

        info!(
            "[{}] 交易对: {:?} (token0={:?}, token1={:?})",
            name, pair_address, token0, token1
        );

        let pool = PoolHandle {
            exchange,
            name: name.to_string(),
            pair_address,
            router_address,
            token0,
            token1,
        };

        Ok(Self::new(provider, pool))
    }
}

#[async_trait]
impl<M: Middleware + 'static> ExchangeClient for UniswapV2Exchange<M> {
    fn pool(&self) -> &PoolHandle {
        &self.pool
    }

    async fn get_reserves(&self) -> Result<Reserves> {
        let (reserve0, reserve1, timestamp) = self
            .pair
            .get_reserves()
            .call()
            .await
            .with_context(|| format!("[{}] getReserves 失败", self.pool.name))?;

        Ok(Reserves {
            reserve0: U256::from(reserve0),
            reserve1: U256::from(reserve1),
            block_timestamp_last: timestamp,
        })
    }

    async fn block_number(&self) -> Result<u64> {
        let block = self
            .provider
            .get_block_number()
            .await
            .map_err(|e| anyhow!("[{}] eth_blockNumber 失败: {}", self.pool.name, e))?;
        Ok(block.as_u64())
    }

    async fn get_amounts_in(&self, amount_out: U256, path: &[Address]) -> Result<Vec<U256>> {
        self.router
            .get_amounts_in(amount_out, path.to_vec())
            .call()
            .await
            .with_context(|| format!("[{}] getAmountsIn 失败", self.pool.name))
    }

    async fn get_amounts_out(&self, amount_in: U256, path: &[Address]) -> Result<Vec<U256>> {
        self.router
            .get_amounts_out(amount_in, path.to_vec())
            .call()
            .await
            .with_context(|| format!("[{}] getAmountsOut 失败", self.pool.name))
    }
}

/// 计算输出数量 (纯计算，不调用合约)
pub fn calculate_amount_out(amount_in: U256, reserve_in: U256, reserve_out: U256) -> U256 {
    if amount_in.is_zero() || reserve_in.is_zero() || reserve_out.is_zero() {
        return U256::zero();
    }

    // Uniswap V2 公式:
    // amountOut = (amountIn * 997 * reserveOut) / (reserveIn * 1000 + amountIn * 997)
    let amount_in_with_fee = amount_in * U256::from(997);
    let numerator = amount_in_with_fee * reserve_out;
    let denominator = reserve_in * U256::from(1000) + amount_in_with_fee;

    numerator / denominator
}

/// 计算输入数量 (纯计算)
pub fn calculate_amount_in(amount_out: U256, reserve_in: U256, reserve_out: U256) -> U256 {
    if amount_out.is_zero() || reserve_in.is_zero() || reserve_out.is_zero() {
        return U256::zero();
    }

    if amount_out >= reserve_out {
        return U256::MAX; // 无法满足
    }

    // amountIn = (reserveIn * amountOut * 1000) / ((reserveOut - amountOut) * 997) + 1
    let numerator = reserve_in * amount_out * U256::from(1000);
    let denominator = (reserve_out - amount_out) * U256::from(997);

    (numerator / denominator) + U256::from(1)
}

/// 单跳 getAmountsOut 的本地复现, 错误信息与 Router 的 revert 一致
pub fn quote_amounts_out(amount_in: U256, reserve_in: U256, reserve_out: U256) -> Result<Vec<U256>> {
    if amount_in.is_zero() {
        return Err(anyhow!("UniswapV2Library: INSUFFICIENT_INPUT_AMOUNT"));
    }
    if reserve_in.is_zero() || reserve_out.is_zero() {
        return Err(anyhow!("UniswapV2Library: INSUFFICIENT_LIQUIDITY"));
    }
    Ok(vec![amount_in, calculate_amount_out(amount_in, reserve_in, reserve_out)])
}

/// 单跳 getAmountsIn 的本地复现
pub fn quote_amounts_in(amount_out: U256, reserve_in: U256, reserve_out: U256) -> Result<Vec<U256>> {
    if amount_out.is_zero() {
        return Err(anyhow!("UniswapV2Library: INSUFFICIENT_OUTPUT_AMOUNT"));
    }
    if reserve_in.is_zero() || reserve_out.is_zero() || amount_out >= reserve_out {
        return Err(anyhow!("UniswapV2Library: INSUFFICIENT_LIQUIDITY"));
    }
    Ok(vec![calculate_amount_in(amount_out, reserve_in, reserve_out), amount_out])
}
