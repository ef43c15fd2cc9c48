use ethers::types::{Address, H256, U256};
use serde::{Deserialize, Serialize};

use crate::ExchangeId;

/// 交易 gas 参数 (链上单位)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GasParams {
    pub gas_limit: U256,
    /// gas 价格 (wei)
    pub gas_price: U256,
}

/// 提交给执行器的套利请求
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeRequest {
    pub buy_on: ExchangeId,
    pub sell_on: ExchangeId,
    /// base 代币 (借入并归还)
    pub token0: Address,
    /// quote 代币
    pub token1: Address,
    /// 输入金额 (base 代币链上单位)
    pub amount_in: U256,
    pub gas: GasParams,
}

impl TradeRequest {
    /// 合约参数 `_startOnUniswap`: 是否在交易所 A 买入
    pub fn start_on_a(&self) -> bool {
        self.buy_on == ExchangeId::A
    }
}

/// 已确认交易的回执摘要
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeReceipt {
    pub tx_hash: H256,
    pub block_number: Option<u64>,
    pub gas_used: Option<U256>,
    pub effective_gas_price: Option<U256>,
}

impl TradeReceipt {
    /// 实际花费的 gas (wei)，回执缺字段时返回 None
    pub fn gas_spent_wei(&self) -> Option<U256> {
        match (self.gas_used, self.effective_gas_price) {
            (Some(used), Some(price)) => used.checked_mul(price),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gas_spent() {
        let receipt = TradeReceipt {
            tx_hash: H256::zero(),
            block_number: Some(1),
            gas_used: Some(U256::from(150_000)),
            effective_gas_price: Some(U256::from(20_000_000_000u64)),
        };
        assert_eq!(receipt.gas_spent_wei(), Some(U256::from(3_000_000_000_000_000u64)));

        let partial = TradeReceipt { gas_used: None, ..receipt };
        assert_eq!(partial.gas_spent_wei(), None);
    }
}
