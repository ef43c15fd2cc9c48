use chrono::{DateTime, Utc};
use ethers::types::U256;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{ExchangeId, Reserves};

/// 单个池子的现货价格报价 (每轮重新计算，不持久化)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceQuote {
    pub exchange: ExchangeId,
    pub exchange_name: String,
    /// reserve0 / reserve1 (按各自精度换算后的比值)
    pub price: Decimal,
    /// 计算价格所用的储备快照，同一轮内供利润模拟复用
    pub reserves: Reserves,
    /// 采样时的区块高度 (仅用于诊断)
    pub block_number: Option<u64>,
    pub sampled_at: DateTime<Utc>,
}

/// 套利方向: 在 buy_on 买入, 在 sell_on 卖出
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectionPlan {
    pub buy_on: ExchangeId,
    pub sell_on: ExchangeId,
    /// (priceA - priceB) / priceB * 100, 全精度
    pub pct_diff: Decimal,
    /// 保留两位小数的展示值
    pub pct_diff_display: Decimal,
}

impl DirectionPlan {
    /// 是否从交易所 A 开始 (对应合约参数 `_startOnUniswap`)
    pub fn starts_on_a(&self) -> bool {
        self.buy_on == ExchangeId::A
    }
}

/// 一次往返交易的模拟结果 (base 代币展示单位)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeSimulation {
    pub amount_in: Decimal,
    pub amount_out: Decimal,
    pub estimated_gas_cost: Decimal,
    pub net_profit: Decimal,
    /// 链上单位的输入金额，直接作为执行参数
    pub amount_in_raw: U256,
    pub amount_out_raw: U256,
}

impl TradeSimulation {
    /// 扣除 gas 之前的利润
    pub fn gross_profit(&self) -> Decimal {
        self.amount_out - self.amount_in
    }

    pub fn is_profitable(&self) -> bool {
        self.net_profit > Decimal::ZERO
    }
}
