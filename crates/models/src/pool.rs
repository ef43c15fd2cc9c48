use ethers::types::{Address, U256};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 被监控的两个交易所
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExchangeId {
    A,
    B,
}

impl ExchangeId {
    /// 另一侧交易所
    pub fn other(&self) -> Self {
        match self {
            ExchangeId::A => ExchangeId::B,
            ExchangeId::B => ExchangeId::A,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExchangeId::A => "A",
            ExchangeId::B => "B",
        }
    }
}

impl fmt::Display for ExchangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 单个 V2 流动性池的引用 (启动时创建，核心只读)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolHandle {
    pub exchange: ExchangeId,
    /// 交易所展示名称, 如 "Uniswap"
    pub name: String,
    pub pair_address: Address,
    pub router_address: Address,
    pub token0: Address,
    pub token1: Address,
}

impl PoolHandle {
    /// 池子是否包含该代币
    pub fn contains(&self, token: Address) -> bool {
        self.token0 == token || self.token1 == token
    }
}

/// 某一时刻从池子读取的储备量快照
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reserves {
    pub reserve0: U256,
    pub reserve1: U256,
    pub block_timestamp_last: u32,
}

impl Reserves {
    pub fn new(reserve0: U256, reserve1: U256) -> Self {
        Self {
            reserve0,
            reserve1,
            block_timestamp_last: 0,
        }
    }

    /// 任一侧储备为零时池子无法定价
    pub fn is_empty(&self) -> bool {
        self.reserve0.is_zero() || self.reserve1.is_zero()
    }

    /// 按 token0 排序返回 (base 储备, quote 储备)
    pub fn oriented(&self, token0: Address, base: Address) -> (U256, U256) {
        if token0 == base {
            (self.reserve0, self.reserve1)
        } else {
            (self.reserve1, self.reserve0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_other_exchange() {
        assert_eq!(ExchangeId::A.other(), ExchangeId::B);
        assert_eq!(ExchangeId::B.other(), ExchangeId::A);
        assert_eq!(ExchangeId::B.to_string(), "B");
    }

    #[test]
    fn test_reserves_orientation() {
        let base = Address::repeat_byte(0x01);
        let quote = Address::repeat_byte(0x02);
        let reserves = Reserves::new(U256::from(10), U256::from(1000));

        // base 是 token0
        assert_eq!(reserves.oriented(base, base), (U256::from(10), U256::from(1000)));
        // base 是 token1
        assert_eq!(reserves.oriented(quote, base), (U256::from(1000), U256::from(10)));
    }

    #[test]
    fn test_empty_reserves() {
        assert!(Reserves::new(U256::zero(), U256::from(1)).is_empty());
        assert!(!Reserves::new(U256::from(1), U256::from(1)).is_empty());
    }
}
