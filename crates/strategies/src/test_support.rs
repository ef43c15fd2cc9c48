//! 测试用的内存实现

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use dex::{quote_amounts_in, quote_amounts_out, ExchangeClient};
use ethers::types::{Address, H256, U256};
use executor::{ExecutionError, TradeExecutor};
use models::{ExchangeId, PoolHandle, Reserves, Token, TokenPair, TradeReceipt, TradeRequest};
use parking_lot::Mutex;
use services::WalletReader;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

pub fn ether(n: u64) -> U256 {
    U256::from(n) * U256::exp10(18)
}

pub fn base_token() -> Token {
    Token::new(Address::repeat_byte(0x01), "WETH".into(), "Wrapped Ether".into(), 18)
}

pub fn quote_token() -> Token {
    Token::new(Address::repeat_byte(0x02), "SHIB".into(), "SHIBA INU".into(), 18)
}

pub fn pair() -> TokenPair {
    TokenPair::new(base_token(), quote_token())
}

/// token0 = base, token1 = quote
pub fn pool(exchange: ExchangeId) -> PoolHandle {
    let (name, byte) = match exchange {
        ExchangeId::A => ("Uniswap", 0xa0),
        ExchangeId::B => ("Sushiswap", 0xb0),
    };
    PoolHandle {
        exchange,
        name: name.to_string(),
        pair_address: Address::repeat_byte(byte),
        router_address: Address::repeat_byte(byte + 1),
        token0: base_token().address,
        token1: quote_token().address,
    }
}

/// token0 = quote, token1 = base
pub fn quote_first_pool(exchange: ExchangeId) -> PoolHandle {
    let mut handle = pool(exchange);
    std::mem::swap(&mut handle.token0, &mut handle.token1);
    handle
}

/// 基于恒定乘积公式的内存交易所
pub struct MockExchange {
    pool: PoolHandle,
    reserves: Mutex<Reserves>,
    fail_reads: bool,
    fail_quotes: bool,
    read_delay: Option<Duration>,
    reserve_reads: AtomicUsize,
    block_number: AtomicU64,
}

impl MockExchange {
    /// 池子 token0 = base
    pub fn new(exchange: ExchangeId, base_reserve: U256, quote_reserve: U256) -> Self {
        Self::with_pool(pool(exchange), base_reserve, quote_reserve)
    }

    /// 池子 token0 = quote (地址排序 quote 在前)
    pub fn quote_first(exchange: ExchangeId, base_reserve: U256, quote_reserve: U256) -> Self {
        Self::with_pool(quote_first_pool(exchange), base_reserve, quote_reserve)
    }

    /// 储备按 (base, quote) 给出，内部按池子的 token0 顺序保存
    pub fn with_pool(pool: PoolHandle, base_reserve: U256, quote_reserve: U256) -> Self {
        let reserves = Mutex::new(Self::ordered(&pool, base_reserve, quote_reserve));
        Self {
            pool,
            reserves,
            fail_reads: false,
            fail_quotes: false,
            read_delay: None,
            reserve_reads: AtomicUsize::new(0),
            block_number: AtomicU64::new(19_000_100),
        }
    }

    fn ordered(pool: &PoolHandle, base_reserve: U256, quote_reserve: U256) -> Reserves {
        if pool.token0 == base_token().address {
            Reserves::new(base_reserve, quote_reserve)
        } else {
            Reserves::new(quote_reserve, base_reserve)
        }
    }

    pub fn set_block_number(&self, block: u64) {
        self.block_number.store(block, Ordering::SeqCst);
    }

    pub fn failing_reads(mut self) -> Self {
        self.fail_reads = true;
        self
    }

    pub fn failing_quotes(mut self) -> Self {
        self.fail_quotes = true;
        self
    }

    pub fn with_read_delay(mut self, delay: Duration) -> Self {
        self.read_delay = Some(delay);
        self
    }

    pub fn set_reserves(&self, base_reserve: U256, quote_reserve: U256) {
        *self.reserves.lock() = Self::ordered(&self.pool, base_reserve, quote_reserve);
    }

    pub fn current_reserves(&self) -> Reserves {
        *self.reserves.lock()
    }

    pub fn reserve_reads(&self) -> usize {
        self.reserve_reads.load(Ordering::SeqCst)
    }

    /// 按路径方向返回 (reserve_in, reserve_out)
    fn oriented(&self, path: &[Address]) -> Result<(U256, U256)> {
        if self.fail_quotes {
            return Err(anyhow!("execution reverted"));
        }
        let token_in = path.first().ok_or_else(|| anyhow!("UniswapV2Library: INVALID_PATH"))?;
        let reserves = self.current_reserves();
        Ok(if *token_in == self.pool.token0 {
            (reserves.reserve0, reserves.reserve1)
        } else {
            (reserves.reserve1, reserves.reserve0)
        })
    }
}

#[async_trait]
impl ExchangeClient for MockExchange {
    fn pool(&self) -> &PoolHandle {
        &self.pool
    }

    async fn get_reserves(&self) -> Result<Reserves> {
        self.reserve_reads.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.read_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_reads {
            return Err(anyhow!("connection refused"));
        }
        Ok(self.current_reserves())
    }

    async fn block_number(&self) -> Result<u64> {
        if self.fail_reads {
            return Err(anyhow!("connection refused"));
        }
        Ok(self.block_number.load(Ordering::SeqCst))
    }

    async fn get_amounts_in(&self, amount_out: U256, path: &[Address]) -> Result<Vec<U256>> {
        let (reserve_in, reserve_out) = self.oriented(path)?;
        quote_amounts_in(amount_out, reserve_in, reserve_out)
    }

    async fn get_amounts_out(&self, amount_in: U256, path: &[Address]) -> Result<Vec<U256>> {
        let (reserve_in, reserve_out) = self.oriented(path)?;
        quote_amounts_out(amount_in, reserve_in, reserve_out)
    }
}

/// 记录调用次数的执行器
#[derive(Default)]
pub struct MockExecutor {
    pub fail: bool,
    pub calls: AtomicUsize,
    pub last_request: Mutex<Option<TradeRequest>>,
}

impl MockExecutor {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TradeExecutor for MockExecutor {
    async fn execute_trade(&self, request: &TradeRequest) -> Result<TradeReceipt, ExecutionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock() = Some(request.clone());

        if self.fail {
            return Err(ExecutionError::Reverted {
                tx_hash: H256::repeat_byte(0x42),
                block_number: Some(100),
            });
        }
        Ok(TradeReceipt {
            tx_hash: H256::repeat_byte(0x42),
            block_number: Some(100),
            gas_used: Some(U256::from(250_000)),
            effective_gas_price: Some(U256::from(20_000_000_000u64)),
        })
    }
}

/// 固定余额的钱包
pub struct MockWallet {
    pub native: Mutex<U256>,
    pub base: Mutex<U256>,
    pub fail: bool,
}

impl MockWallet {
    pub fn new(native: U256, base: U256) -> Self {
        Self {
            native: Mutex::new(native),
            base: Mutex::new(base),
            fail: false,
        }
    }
}

#[async_trait]
impl WalletReader for MockWallet {
    fn address(&self) -> Address {
        Address::repeat_byte(0xee)
    }

    async fn native_balance(&self) -> Result<U256> {
        if self.fail {
            return Err(anyhow!("rpc unavailable"));
        }
        Ok(*self.native.lock())
    }

    async fn token_balance(&self, _token: Address) -> Result<U256> {
        if self.fail {
            return Err(anyhow!("rpc unavailable"));
        }
        Ok(*self.base.lock())
    }

    async fn block_number(&self) -> Result<u64> {
        Ok(100)
    }
}
